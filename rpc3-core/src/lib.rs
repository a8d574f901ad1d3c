//! This library is the foundation for the `rpc3-in` and `rpc3-out` crates.
//! It can be built either with serialization support, or in a slightly more
//! lightweight manner without it (see features).
#![allow(clippy::derive_partial_eq_without_eq)]

#[cfg(any(feature = "to_json", feature = "serde"))]
extern crate serde;
#[cfg(feature = "to_json")]
extern crate serde_json;

pub mod aggregate;
pub mod analytics;
pub mod bitconverter;
pub mod channel;
pub mod enums;
pub mod equivalent_signal;
pub mod errors;
pub mod header;
pub mod primitives;
pub mod rainflow;
#[cfg(test)]
mod tests;

pub use aggregate::Event;
pub use channel::{Channel, RainflowState};
pub use enums::DataType;
pub use errors::RpcError;
pub use header::{HeaderValue, RpcHeaderFields, HEADER_BLOCK_LEN, HEADER_NAME_LEN, HEADER_VALUE_LEN};

/// `FORMAT` field value every RPC-III file must open with.
pub const FORMAT_TAG: &str = "RPC3_DATA";
