//! Small helpers used across the crate.

/// Returns `Err($error)` from the enclosing function unless `$predicate` holds.
///
/// `$error` is evaluated only when the check fails, so it may record state on
/// the way out, e.g. `ensure!(!self.chunked, self.fail(SendError::ChunkedResponse))`.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
