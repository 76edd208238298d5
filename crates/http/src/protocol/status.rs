use http::StatusCode;

/// The reason phrase the server writes for `status`.
///
/// Only the codes below are supported; a response carrying any other code
/// fails to serialize.
pub fn reason_phrase(status: StatusCode) -> Option<&'static str> {
    let reason = match status {
        StatusCode::OK => "OK",
        StatusCode::CREATED => "Created",
        StatusCode::NO_CONTENT => "No Content",
        StatusCode::BAD_REQUEST => "Bad Request",
        StatusCode::NOT_FOUND => "Not Found",
        StatusCode::METHOD_NOT_ALLOWED => "Method Not Allowed",
        StatusCode::REQUEST_TIMEOUT => "Request Timeout",
        StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
        StatusCode::SERVICE_UNAVAILABLE => "Service Unavailable",
        _ => return None,
    };
    Some(reason)
}
