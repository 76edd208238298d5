//! Core HTTP protocol types.
//!
//! - **Messages** ([`Message`], [`PayloadItem`], [`PayloadSize`]): what the
//!   response encoder consumes, a head followed by payload pieces.
//! - **Requests** ([`RequestHeader`], [`Request`]): the decoded request head
//!   and the full request handed to handlers.
//! - **Responses** ([`ResponseHead`], [`reason_phrase`]).
//! - **Persistence** ([`ConnectionType`]): keep-alive negotiation.
//! - **Errors** ([`HttpError`], [`ParseError`], [`SendError`]).

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::Request;
pub use request::RequestHeader;

mod response;
pub use response::ResponseHead;

mod status;
pub use status::reason_phrase;

mod connection_type;
pub use connection_type::ConnectionType;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
