//! This submodule deals with turning raw little-endian sample bytes into
//! numbers once the data section of an RPC-III file has been located.
use crate::enums::DataType;
use crate::errors::*;

use std::array::TryFromSliceError;
use std::convert::TryInto;

pub type BitConverter = fn(&[u8]) -> Result<f64, TryFromSliceError>;

/// Choose the converter for the raw bytes of one sample.
///
/// The converter should be chosen once per file (or once per channel) for
/// efficiency; it only turns bytes into the *raw* numeric representation on
/// disk. For [`DataType::ShortInteger`] the caller is still responsible for
/// applying `raw * scale` afterwards — the conversion here only undoes the
/// byte encoding, not the physical-unit scaling. `INT_FULL_SCALE` is a
/// mandatory header field for short-integer files but does not itself enter
/// this formula; `SCALE.CHAN_<n>` alone carries the physical conversion.
/// ```
/// # use rpc3_core::bitconverter::converter_chooser;
/// # use rpc3_core::enums::DataType;
/// let f = converter_chooser(DataType::FloatingPoint);
/// let bytes = 42.0f32.to_le_bytes();
/// assert_eq!(f(&bytes[..]).unwrap(), 42.0);
/// ```
pub fn converter_chooser(format: DataType) -> BitConverter {
    match format {
        DataType::FloatingPoint => {
            fn x(input: &[u8]) -> Result<f64, TryFromSliceError> {
                Ok(f32::from_le_bytes(input.try_into()?) as f64)
            }
            x
        }
        DataType::ShortInteger => {
            fn x(input: &[u8]) -> Result<f64, TryFromSliceError> {
                Ok(i16::from_le_bytes(input.try_into()?) as f64)
            }
            x
        }
    }
}

/// Apply the per-channel scale conversion from a raw decoded number to a
/// physical sample value.
///
/// For [`DataType::FloatingPoint`] the raw value already is the physical
/// value and is returned unchanged.
pub fn apply_scale(format: DataType, raw: f64, scale: f64) -> f64 {
    match format {
        DataType::FloatingPoint => raw,
        DataType::ShortInteger => raw * scale,
    }
}

pub type BitWriter = fn(f64) -> Vec<u8>;

/// Choose the encoder that turns a raw numeric value back into its on-disk
/// little-endian byte representation -- the write-side mirror of
/// [`converter_chooser`]. As on the read side, [`DataType::ShortInteger`]
/// values must already have had [`unapply_scale`] applied; this function
/// only performs the byte encoding, truncating/rounding to `i16` range.
/// ```
/// # use rpc3_core::bitconverter::writer_chooser;
/// # use rpc3_core::enums::DataType;
/// let w = writer_chooser(DataType::FloatingPoint);
/// assert_eq!(w(42.0), 42.0f32.to_le_bytes().to_vec());
/// ```
pub fn writer_chooser(format: DataType) -> BitWriter {
    match format {
        DataType::FloatingPoint => |v: f64| (v as f32).to_le_bytes().to_vec(),
        DataType::ShortInteger => |v: f64| (v.round() as i16).to_le_bytes().to_vec(),
    }
}

/// Invert [`apply_scale`]: turn a physical sample value back into the raw
/// number that should be byte-encoded.
pub fn unapply_scale(format: DataType, sample: f64, scale: f64) -> f64 {
    match format {
        DataType::FloatingPoint => sample,
        DataType::ShortInteger => {
            if scale == 0.0 {
                0.0
            } else {
                sample / scale
            }
        }
    }
}

/// Encode a string as windows-1251 bytes, truncated or null-padded to
/// exactly `len` bytes.
/// ```
/// # use rpc3_core::bitconverter::string_to_windows1251_bytes;
/// let bytes = string_to_windows1251_bytes("hi", 5);
/// assert_eq!(bytes, vec![b'h', b'i', 0, 0, 0]);
/// ```
pub fn string_to_windows1251_bytes(s: &str, len: usize) -> Vec<u8> {
    let (encoded, _, _) = encoding_rs::WINDOWS_1251.encode(s);
    let mut out = vec![0u8; len];
    let n = encoded.len().min(len);
    out[..n].copy_from_slice(&encoded[..n]);
    out
}

/// A helper to decode a fixed-width header value blob (windows-1251) into a
/// trimmed, null/newline-stripped string.
///
/// ```
/// # use rpc3_core::bitconverter::windows1251_bytes_to_string;
/// let input = b"hello\0\0\0";
/// assert_eq!(&windows1251_bytes_to_string(input), "hello");
/// ```
pub fn windows1251_bytes_to_string(bytes: &[u8]) -> String {
    let (decoded, _, _) = encoding_rs::WINDOWS_1251.decode(bytes);
    decoded
        .trim_end_matches(|c: char| c == '\0' || c == '\n' || c == '\r' || c.is_whitespace())
        .to_string()
}
