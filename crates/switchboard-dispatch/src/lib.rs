//! Switchboard Dispatch
//!
//! Composes peer lookup, descriptor resolution, transport and response
//! extraction into one operation: send text to a named peer and get back a
//! normalized [`TaskResult`]. Nothing in this crate returns an error past
//! [`TaskDispatcher::dispatch`]; every failure is a typed result.

mod dispatcher;
mod extract;
mod result;

pub use dispatcher::TaskDispatcher;
pub use extract::extract;
pub use result::{ErrorKind, TaskResult};
