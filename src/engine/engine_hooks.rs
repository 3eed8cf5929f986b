//! engine::engine_hooks
//!
//! Test-only hooks for apply-time fault injection.
//!
//! # Architecture
//!
//! The executor consults these hooks at two points:
//!
//! - `before_apply` fires once, after validation and before the first op
//!   is applied to the copy-on-write tree
//! - `fail_at` makes the op at a given index fail as if the tree had
//!   rejected it
//!
//! Together they let tests prove that a commit failing at step k leaves
//! both trees exactly as they were.
//!
//! # Usage
//!
//! ```ignore
//! use cstore::engine::engine_hooks;
//!
//! engine_hooks::set_fail_at(2);
//! let err = store.commit().unwrap_err();
//! engine_hooks::clear();
//! ```
//!
//! # Thread Safety
//!
//! Hooks live in thread-local storage; each test thread sees only its own.
//!
//! # Invariants
//!
//! - Only compiled under `cfg(test)` or the `fault_injection` feature
//! - Each test must call `clear()` when done

use std::cell::RefCell;

use super::plan::CommitPlan;

/// Container for engine hooks.
#[derive(Default)]
pub struct EngineHooks {
    /// Called with the plan before the first op is applied.
    pub before_apply: Option<Box<dyn Fn(&CommitPlan)>>,
    /// Index of the op that should fail during apply.
    pub fail_at: Option<usize>,
}

thread_local! {
    static HOOKS: RefCell<Option<EngineHooks>> = const { RefCell::new(None) };
}

fn with_hooks_mut(f: impl FnOnce(&mut EngineHooks)) {
    HOOKS.with(|h| {
        let mut hooks = h.borrow_mut();
        f(hooks.get_or_insert_with(EngineHooks::default));
    });
}

/// Run `f` with the plan before apply begins.
pub fn set_before_apply<F>(f: F)
where
    F: Fn(&CommitPlan) + 'static,
{
    with_hooks_mut(|hooks| hooks.before_apply = Some(Box::new(f)));
}

/// Make the op at `step` (zero-based) fail during apply.
pub fn set_fail_at(step: usize) {
    with_hooks_mut(|hooks| hooks.fail_at = Some(step));
}

/// Clear all hooks.
pub fn clear() {
    HOOKS.with(|h| *h.borrow_mut() = None);
}

/// True if any hook is set.
pub fn has_hooks() -> bool {
    HOOKS.with(|h| h.borrow().is_some())
}

pub(crate) fn invoke_before_apply(plan: &CommitPlan) {
    HOOKS.with(|h| {
        if let Some(f) = h.borrow().as_ref().and_then(|hooks| hooks.before_apply.as_ref()) {
            f(plan);
        }
    });
}

/// Injected failure message for `step`, if one is armed.
pub(crate) fn injected_failure(step: usize) -> Option<String> {
    HOOKS.with(|h| {
        h.borrow()
            .as_ref()
            .and_then(|hooks| hooks.fail_at)
            .filter(|&k| k == step)
            .map(|k| format!("injected fault at step {k}"))
    })
}
