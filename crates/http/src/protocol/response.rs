//! Response heads.

use http::Response;

/// Status, version and header fields of a response, without its body.
///
/// The body is handed to the encoder separately as payload items, so the head
/// is an `http::Response` carrying `()`.
pub type ResponseHead = Response<()>;
