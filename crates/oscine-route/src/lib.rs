//! Address-pattern matching and message dispatch for the Oscine OSC
//! endpoint.
//!
//! The receiving half of OSC 1.0 addressing lives here: validating
//! registered addresses, compiling patterns (`?`, `*`, `[a-c]`,
//! `{foo,bar}`), and routing decoded messages to every matching handler in
//! registration order.

mod address;
mod dispatcher;
mod error;
mod pattern;

pub use address::{validate_address, validate_concrete};
pub use dispatcher::{Dispatcher, Handler};
pub use error::{DispatchError, HandlerError, RouteError};
pub use pattern::{MatchMode, Pattern};
