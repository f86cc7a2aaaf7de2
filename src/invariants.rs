//! Runtime invariant checks with contract-test support.
//!
//! Production code states its invariants with [`assert_invariant!`]. Every
//! check is recorded per thread, so a contract test can run a scenario and
//! then prove the invariants it depends on were actually exercised.
//!
//! ```rust,ignore
//! assert_invariant!(live_streams <= 1, "At most one live stream", "session");
//!
//! #[test]
//! fn contract_single_stream() {
//!     // ... drive a session ...
//!     contract_test("single stream", &["At most one live stream"]);
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashSet;

/// Crop rectangle lies inside the source frame.
pub const CROP_WITHIN_FRAME: &str = "Crop rectangle must lie within the source frame";
/// Crop rectangle has the requested aspect ratio.
pub const CROP_MATCHES_RATIO: &str = "Crop rectangle must match the target aspect ratio";
/// The session never holds two streams.
pub const SINGLE_LIVE_STREAM: &str = "Session must hold at most one live stream";

thread_local! {
    static CHECKED: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Assert an invariant and record that it was checked.
///
/// Panics with the message (and optional context) when the condition is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariants::check($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariants::check($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn check(condition: bool, message: &str, context: Option<&str>) {
    CHECKED.with(|checked| {
        checked.borrow_mut().insert(message.to_string());
    });

    if !condition {
        log::error!("Invariant violated: {}", message);
        panic!(
            "INVARIANT VIOLATION [{}]: {}",
            context.unwrap_or("crabsnap"),
            message
        );
    }
}

/// Whether `message` has been checked on this thread since the last clear.
pub fn was_checked(message: &str) -> bool {
    CHECKED.with(|checked| checked.borrow().contains(message))
}

/// Panics unless every invariant in `required` has been checked on this thread.
pub fn contract_test(name: &str, required: &[&str]) {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|message| !was_checked(message))
        .collect();

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: invariants never checked:\n  - {}",
            name,
            missing.join("\n  - ")
        );
    }
}

pub fn clear_checked() {
    CHECKED.with(|checked| checked.borrow_mut().clear());
}
