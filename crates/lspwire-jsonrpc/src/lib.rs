//! JSON-RPC 2.0 envelopes as spoken by language servers.
//!
//! - [`Id`]: request identifier, integer or string, round-tripped as received
//! - [`RequestMessage`] / [`Request`]: inbound requests and notifications
//! - [`ResponseMessage`]: outbound responses, `result` xor `error`
//! - [`ErrorCode`] / [`ResponseError`]: reserved error codes and the error member

pub mod error;
pub mod error_code;
pub mod id;
pub mod request;
pub mod response;

pub use error::{MessageError, Result};
pub use error_code::{ErrorCode, ResponseError};
pub use id::Id;
pub use request::{to_params, Request, RequestMessage, JSONRPC_VERSION};
pub use response::ResponseMessage;
