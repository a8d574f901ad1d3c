//! Enumerations used to interpret RPC-III header fields.
//!
//! RPC-III stores every header value as free text, so values that really are
//! a closed set (such as `DATA_TYPE`) are parsed into these enums rather than
//! kept as raw strings once the mandatory headers have been read.
use crate::errors::*;

/// The on-disk sample representation declared by the `DATA_TYPE` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// `FLOATING_POINT`: samples are 4-byte little-endian IEEE-754 floats.
    FloatingPoint,
    /// `SHORT_INTEGER`: samples are 2-byte little-endian signed integers,
    /// multiplied by the channel's `SCALE.CHAN_<n>` on read and on write.
    ShortInteger,
}

impl DataType {
    /// Parse the textual `DATA_TYPE` header value.
    ///
    /// ```
    /// use rpc3_core::enums::DataType;
    /// assert_eq!(DataType::new("FLOATING_POINT").unwrap(), DataType::FloatingPoint);
    /// assert_eq!(DataType::new("SHORT_INTEGER").unwrap(), DataType::ShortInteger);
    /// assert!(DataType::new("BOGUS").is_err());
    /// ```
    pub fn new(source: &str) -> Result<Self, RpcError> {
        match source.trim() {
            "FLOATING_POINT" => Ok(Self::FloatingPoint),
            "SHORT_INTEGER" => Ok(Self::ShortInteger),
            other => Err(RpcError::ParseEnum {
                f: "DataType".to_string(),
                code: other.to_string(),
            }),
        }
    }

    /// The textual form written back into a `DATA_TYPE` header field.
    pub fn as_header_str(self) -> &'static str {
        match self {
            Self::FloatingPoint => "FLOATING_POINT",
            Self::ShortInteger => "SHORT_INTEGER",
        }
    }

    /// The on-disk byte length of one sample of this type.
    pub fn sample_byte_length(self) -> usize {
        match self {
            Self::FloatingPoint => 4,
            Self::ShortInteger => 2,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_str())
    }
}
