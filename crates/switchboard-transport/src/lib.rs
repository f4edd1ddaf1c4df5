//! Switchboard Transport
//!
//! Sends exactly one task request to a resolved peer and hands back the raw
//! response body. The transport knows nothing about the response schema;
//! interpreting it is the dispatcher's job.

mod error;
mod http;
mod request;

pub use error::TransportError;
pub use http::{HttpTransport, Transport};
pub use request::{TaskRequest, message_object};
