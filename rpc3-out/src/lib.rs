//! This is a library for writing RPC-III durability signal files from rust.
//!
//! A file is assembled from a set of [`Channel`]s carrying real-valued,
//! physical-unit samples; [`RpcWriter`] always emits `SHORT_INTEGER` data,
//! normalizing each channel independently to the full 16-bit range, builds
//! the header block section with the required test-rig field set, and
//! multiplexes the sample data to match.
pub mod write_data;
pub mod write_headers;
#[cfg(test)]
mod integration_tests;

pub use rpc3_core::channel::Channel;
pub use rpc3_core::enums::DataType;
pub use rpc3_core::errors::*;
pub use rpc3_core::header::{HeaderValue, RpcHeaderFields};

use rpc3_core::primitives::normalize_int16;
use std::collections::HashMap;

/// Samples per frame fixed by the encoder; see `write` for how `FRAMES` and
/// `PTS_PER_GROUP` are derived from it.
const PTS_PER_FRAME: u32 = 1024;

/// Assembles a set of channels into the bytes of an RPC-III short-integer file.
///
/// Every channel is normalized independently by [`normalize_int16`] and
/// right-padded with its own last sample out to a shared `PTS_PER_GROUP`
/// boundary; the resulting file deliberately omits `INT_FULL_SCALE` (the
/// reader must be told what it was -- conventionally `32768` -- through its
/// own `extra_headers`, mirroring the "file value wins, caller value fills
/// gaps" default rule `rpc3-in` applies on read).
pub struct RpcWriter {
    channels: Vec<Channel>,
    extra_headers: HashMap<String, HeaderValue>,
}

impl RpcWriter {
    /// Construct a writer from a non-empty set of channels.
    /// ```
    /// use rpc3_out::{Channel, RpcWriter};
    /// use std::collections::HashMap;
    ///
    /// let ch = Channel::new(1, "CH1".to_string(), "g".to_string(), 1.0, 0.001, None, vec![0.0, 1.0, 0.0]);
    /// let writer = RpcWriter::new(vec![ch], HashMap::new()).unwrap();
    /// let bytes = writer.write();
    /// assert_eq!(bytes.len() % 512, 0);
    /// ```
    pub fn new(channels: Vec<Channel>, extra_headers: HashMap<String, HeaderValue>) -> Result<Self, RpcError> {
        if channels.is_empty() {
            return Err(RpcError::InvalidEquivalentSignalParams { msg: "cannot write a file with no channels".to_string() });
        }
        Ok(RpcWriter { channels, extra_headers })
    }

    /// Normalize and pad every channel to a shared `PTS_PER_GROUP`-length
    /// `SHORT_INTEGER` representation, returning the padded channels (their
    /// `scale` field replaced by the per-channel `normalizeInt16` factor)
    /// alongside the derived [`RpcHeaderFields`].
    fn prepare(&self) -> (Vec<Channel>, RpcHeaderFields) {
        let max_len = self.channels.iter().map(|c| c.get_samples().len()).max().unwrap_or(0);
        let frames = ((max_len as f64 / PTS_PER_FRAME as f64).ceil() as u32).max(1);
        let pts_per_group = frames * PTS_PER_FRAME;

        let padded: Vec<Channel> = self
            .channels
            .iter()
            .map(|c| {
                let (_int16, factor) = normalize_int16(c.get_samples());
                let mut samples = c.get_samples().to_vec();
                let last = samples.last().copied().unwrap_or(0.0);
                samples.resize(pts_per_group as usize, last);
                Channel::new(
                    c.get_number(),
                    c.get_name().to_string(),
                    c.get_units().to_string(),
                    factor,
                    c.get_delta_t(),
                    c.get_source_file_name().map(|s| s.to_string()),
                    samples,
                )
            })
            .collect();

        let fields = RpcHeaderFields {
            channels: padded.len() as u32,
            delta_t: padded.first().map(|c| c.get_delta_t()).unwrap_or(0.0),
            pts_per_frame: PTS_PER_FRAME,
            pts_per_group,
            frames,
            data_type: DataType::ShortInteger,
            int_full_scale: None,
        };
        (padded, fields)
    }

    /// Serialize the header-block section and data section into one
    /// contiguous byte buffer, ready to be written to disk.
    pub fn write(&self) -> Vec<u8> {
        let (padded, fields) = self.prepare();
        let lines = write_headers::build_header_lines(
            &padded,
            fields.pts_per_frame,
            fields.pts_per_group,
            fields.frames,
            &self.extra_headers,
        );
        let mut bytes = write_headers::encode_header_blocks(lines);
        // `multiplex` cannot fail here: `prepare` pads every channel to
        // exactly `frames * pts_per_frame` samples, so the length check it
        // performs always succeeds.
        let data = write_data::multiplex(&padded, &fields).expect("channel shapes match derived header fields");
        bytes.extend(data);
        bytes
    }
}
