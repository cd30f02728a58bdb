//! Front matter parser and printer.
//!
//! A front matter block is the `---` delimited header at the very top of a
//! note. Only the small subset of YAML that notes actually use is understood:
//! top-level `key: value` fields, inline lists (`key: [a, b]`) and block
//! lists (`key:` followed by `- item` lines). Every other line is kept
//! verbatim, so printing an unmodified block reproduces the original bytes.

use std::ops::Range;

use crate::link;

/// Opening and closing delimiter of a front matter block.
pub const DELIMITER: &str = "---";

const BOM: char = '\u{feff}';

/// One top-level field together with its continuation lines.
///
/// Lines that do not start a field (comments, blank lines) are stored as
/// fields without a key so that the printer can emit them unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    key: Option<String>,
    lines: Vec<String>,
}

impl Field {
    fn keyed(key: &str, lines: Vec<String>) -> Self {
        Self {
            key: Some(key.to_string()),
            lines,
        }
    }

    /// Text after the first `:` on the field's first line.
    fn inline_value(&self) -> &str {
        let first = self.lines.first().map(String::as_str).unwrap_or_default();
        first
            .split_once(':')
            .map(|(_, value)| value.trim())
            .unwrap_or_default()
    }

    fn continuation(&self) -> &[String] {
        self.lines.get(1..).unwrap_or_default()
    }
}

/// How a list-valued field is written in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEncoding {
    /// `key: [a, b]`
    Inline,
    /// `key:` followed by indented `- item` lines
    Block,
    /// Anything else. Items are harvested from wiki links found in the value.
    Unrecognized,
}

/// A list-valued field, items unquoted and in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValue {
    pub encoding: ListEncoding,
    pub items: Vec<String>,
}

/// Parsed front matter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    fields: Vec<Field>,
    eol: &'static str,
}

/// Location of a front matter block inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatterBlock {
    pub front_matter: FrontMatter,
    /// Byte range covering both delimiter lines and everything between.
    pub span: Range<usize>,
}

impl FrontMatter {
    /// An empty block using `\n` line endings.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            eol: "\n",
        }
    }

    /// Locate and parse the front matter block at the top of `text`.
    ///
    /// Returns `None` when the document does not open with a delimiter line
    /// or the block is never closed.
    pub fn locate(text: &str) -> Option<FrontMatterBlock> {
        let start = if text.starts_with(BOM) { BOM.len_utf8() } else { 0 };
        let mut lines = text[start..].split_inclusive('\n');

        let opening = lines.next()?;
        if opening.trim_end() != DELIMITER {
            return None;
        }
        let eol = if opening.ends_with("\r\n") { "\r\n" } else { "\n" };

        let mut offset = start + opening.len();
        let mut body: Vec<&str> = Vec::new();
        for line in lines {
            let end = offset + line.len();
            if line.trim_end() == DELIMITER {
                return Some(FrontMatterBlock {
                    front_matter: Self::parse_lines(&body, eol),
                    span: start..end,
                });
            }
            body.push(line.trim_end_matches(['\r', '\n']));
            offset = end;
        }

        None
    }

    /// Parse the lines between the delimiters.
    fn parse_lines(lines: &[&str], eol: &'static str) -> Self {
        let mut fields: Vec<Field> = Vec::new();

        for &line in lines {
            if let Some(key) = field_key(line) {
                fields.push(Field::keyed(key, vec![line.to_string()]));
                continue;
            }

            let continues = !line.trim().is_empty()
                && (line.starts_with([' ', '\t']) || line.starts_with('-'));
            match fields.last_mut() {
                Some(field) if continues && field.key.is_some() => {
                    field.lines.push(line.to_string());
                }
                _ => fields.push(Field {
                    key: None,
                    lines: vec![line.to_string()],
                }),
            }
        }

        Self { fields, eol }
    }

    fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key.as_deref() == Some(key))
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.fields
            .iter_mut()
            .find(|f| f.key.as_deref() == Some(key))
    }

    /// Whether `key` is declared at all.
    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Scalar value of `key`, unquoted. Empty values read as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = unquote(self.field(key)?.inline_value());
        if value.is_empty() { None } else { Some(value) }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.parse().ok()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key)?.parse().ok()
    }

    /// List value of `key`, with the encoding it was written in.
    pub fn list(&self, key: &str) -> Option<ListValue> {
        let field = self.field(key)?;
        let value = field.inline_value();
        let continuation = field.continuation();

        if value.is_empty() {
            let items: Option<Vec<String>> =
                continuation.iter().map(|line| block_item(line)).collect();
            if let Some(items) = items {
                return Some(ListValue {
                    encoding: ListEncoding::Block,
                    items,
                });
            }
        } else if let Some(raw) = inline_items(value).filter(|_| continuation.is_empty()) {
            return Some(ListValue {
                encoding: ListEncoding::Inline,
                items: raw
                    .into_iter()
                    .map(|raw| unquote(raw).to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
            });
        }

        let mut items: Vec<String> = link::find_links(value)
            .into_iter()
            .map(str::to_string)
            .collect();
        for line in continuation {
            items.extend(link::find_links(line).into_iter().map(str::to_string));
        }
        Some(ListValue {
            encoding: ListEncoding::Unrecognized,
            items,
        })
    }

    /// Set `key` to the raw YAML `value`, replacing any previous value and
    /// its continuation lines. An absent key is appended at the end.
    pub fn set(&mut self, key: &str, value: &str) {
        let line = if value.is_empty() {
            format!("{key}:")
        } else {
            format!("{key}: {value}")
        };
        match self.field_mut(key) {
            Some(field) => field.lines = vec![line],
            None => self.fields.push(Field::keyed(key, vec![line])),
        }
    }

    /// Append `item` (quoted on output) to the list stored under `key`,
    /// keeping whichever encoding is already in use.
    ///
    /// An absent key becomes a new block list. Returns `false`, leaving the
    /// block untouched, when the existing value is in an unrecognized form.
    pub fn push_list_item(&mut self, key: &str, item: &str) -> bool {
        let quoted = quote(item);
        let Some(list) = self.list(key) else {
            self.fields
                .push(Field::keyed(key, vec![format!("{key}:"), format!("  - {quoted}")]));
            return true;
        };

        let Some(field) = self.field_mut(key) else {
            return false;
        };
        match list.encoding {
            ListEncoding::Inline => {
                let mut raw: Vec<String> = inline_items(field.inline_value())
                    .unwrap_or_default()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                raw.push(quoted);
                field.lines = vec![format!("{key}: [{}]", raw.join(", "))];
                true
            }
            ListEncoding::Block => {
                let indent = field
                    .continuation()
                    .last()
                    .map(|line| line[..line.len() - line.trim_start().len()].to_string())
                    .unwrap_or_else(|| "  ".to_string());
                field.lines.push(format!("{indent}- {quoted}"));
                true
            }
            ListEncoding::Unrecognized => false,
        }
    }

    /// Print the block including both delimiter lines.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(DELIMITER);
        out.push_str(self.eol);
        for line in self.fields.iter().flat_map(|f| f.lines.iter()) {
            out.push_str(line);
            out.push_str(self.eol);
        }
        out.push_str(DELIMITER);
        out.push_str(self.eol);
        out
    }
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the front matter of `text`, if it has any.
pub fn read_front_matter(text: &str) -> Option<FrontMatter> {
    FrontMatter::locate(text).map(|block| block.front_matter)
}

/// Replace the front matter block of `text` with `front_matter`.
///
/// A document without a block is returned unchanged.
pub fn write_front_matter(text: &str, front_matter: &FrontMatter) -> String {
    match FrontMatter::locate(text) {
        Some(block) => {
            let mut out = String::with_capacity(text.len() + 64);
            out.push_str(&text[..block.span.start]);
            out.push_str(&front_matter.render());
            out.push_str(&text[block.span.end..]);
            out
        }
        None => text.to_string(),
    }
}

/// Byte offset where the document body starts (just past the front matter).
pub fn body_offset(text: &str) -> usize {
    FrontMatter::locate(text)
        .map(|block| block.span.end)
        .unwrap_or(0)
}

/// Quote a scalar for output, escaping backslashes and double quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Strip one layer of matching single or double quotes.
pub fn unquote(value: &str) -> &str {
    let value = value.trim();
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Key of a line that starts a top-level field.
fn field_key(line: &str) -> Option<&str> {
    if line.starts_with([' ', '\t', '-', '#']) {
        return None;
    }
    let (key, _) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some(key)
}

/// Item of a `- item` continuation line, or `None` for any other line.
fn block_item(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix('-')?;
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some(unquote(rest).to_string())
}

/// Raw items of an inline list `[a, b]`, trimmed but still quoted.
///
/// Returns `None` unless the outer brackets enclose the whole value and every
/// item is a quoted scalar, a single `[[Name]]` link or a bracket-free
/// scalar. A bare run of links such as `[[A]], [[B]]` is not a list.
fn inline_items(value: &str) -> Option<Vec<&str>> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?;

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;

    for (i, c) in inner.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1)?,
            (None, ',') if depth == 0 => {
                items.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    items.push(inner[start..].trim());
    items.retain(|item| !item.is_empty());

    items.iter().all(|item| is_inline_item(item)).then_some(items)
}

fn is_inline_item(item: &str) -> bool {
    let quoted = item.len() >= 2
        && ['"', '\''].iter().any(|&q| item.starts_with(q) && item.ends_with(q));
    if quoted {
        return true;
    }
    match item.strip_prefix("[[").and_then(|i| i.strip_suffix("]]")) {
        Some(target) => !target.is_empty() && !target.contains(['[', ']']),
        None => !item.contains(['[', ']']),
    }
}
