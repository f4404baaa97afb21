//! Thread-local resolution stack for circular-dependency and depth-limit detection.

use std::cell::RefCell;
use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
}

/// RAII guard pushing `name` onto the thread-local resolution stack for the
/// duration of one `construct()` call, and popping it on drop regardless of
/// success or failure.
///
/// Construction fails with `DiError::Circular` if `name` is already on the
/// stack (a cycle), or `DiError::DepthExceeded` if the stack is already at
/// `MAX_DEPTH` — both checked before the push, so a failed guard never
/// leaves a stale frame behind.
pub(crate) struct StackGuard {
    popped: bool,
}

impl StackGuard {
    pub(crate) fn enter(name: &'static str) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|&n| n == name) {
                let mut path: Vec<&'static str> = stack.clone();
                path.push(name);
                return Err(DiError::Circular(path));
            }
            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(MAX_DEPTH));
            }
            stack.push(name);
            Ok(())
        })?;
        Ok(Self { popped: false })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        if self.popped {
            return;
        }
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
        self.popped = true;
    }
}
