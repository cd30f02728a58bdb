//! Reentrancy guard for mutation operations.
//!
//! One guard per engine. Holding its token means "a logical update is in
//! progress"; anything that finds the guard taken skips its work instead of
//! waiting for it.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct UpdateGuard {
    busy: AtomicBool,
}

impl UpdateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard, or `None` if another update already holds it.
    pub fn try_acquire(&self) -> Option<UpdateToken<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| UpdateToken { guard: self })
    }

    pub fn is_held(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof that the guard is held. Released on drop, whatever the outcome of
/// the work done under it.
#[derive(Debug)]
pub struct UpdateToken<'a> {
    guard: &'a UpdateGuard,
}

impl Drop for UpdateToken<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let guard = UpdateGuard::new();
        let token = guard.try_acquire().expect("free guard");
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());
        drop(token);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_guards_are_independent() {
        let a = UpdateGuard::new();
        let b = UpdateGuard::new();
        let _held = a.try_acquire().unwrap();
        assert!(b.try_acquire().is_some());
    }
}
