//! This is a library for reading RPC-III durability signal files into rust.
//!
//! It is designed to follow the layout RPC-III test-rig software emits: a
//! sequence of fixed-width header blocks followed by a data section of
//! frames grouped for efficient sequential writing, and to never panic or
//! bubble a hard error out of content problems -- [`RpcFile::parse`]
//! instead records them and reports failure through its return value, the
//! way a batch-processing pipeline that has to get through a folder of
//! files of varying quality needs it to.
pub mod demux;
pub mod header_parse;
#[cfg(test)]
mod tests;

pub use rpc3_core::channel::{Channel, RainflowState};
pub use rpc3_core::enums::DataType;
pub use rpc3_core::errors::*;
pub use rpc3_core::header::{HeaderValue, RpcHeaderFields};

use std::collections::HashMap;

/// A parsed (or parse-attempted) RPC-III file.
///
/// Constructed from an in-memory byte buffer rather than a path, so that
/// callers control how the bytes were obtained (a file, a network
/// transfer, a test fixture). [`RpcFile::parse`] is the only fallible step,
/// and it reports failure through its `bool` return and
/// [`RpcFile::get_errors`] rather than an `Err` -- content problems in one
/// file should not unwind a batch job processing many.
pub struct RpcFile {
    bytes: Vec<u8>,
    file_name: String,
    debug: bool,
    extra_headers: HashMap<String, HeaderValue>,
    headers: HashMap<String, HeaderValue>,
    fields: Option<RpcHeaderFields>,
    channels: Vec<Channel>,
    errors: Vec<String>,
}

impl RpcFile {
    /// Construct an unparsed file from its raw bytes.
    ///
    /// `extra_headers` are merged over whatever headers get parsed from
    /// `bytes` (they win on key collision), so a caller that knows the file
    /// is missing a field, or wants to override one, can supply it here
    /// rather than editing the bytes.
    /// ```
    /// use rpc3_in::RpcFile;
    /// use std::collections::HashMap;
    ///
    /// let file = RpcFile::new(vec![], "empty.rsp".to_string(), false, HashMap::new());
    /// assert_eq!(file.get_file_name(), "empty.rsp");
    /// assert!(file.get_channels().is_empty());
    /// ```
    pub fn new(bytes: Vec<u8>, file_name: String, debug: bool, extra_headers: HashMap<String, HeaderValue>) -> Self {
        RpcFile {
            bytes,
            file_name,
            debug,
            extra_headers,
            headers: HashMap::new(),
            fields: None,
            channels: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Parse the header blocks and demultiplex the data section.
    ///
    /// Returns `true` if parsing succeeded and [`RpcFile::get_channels`] is
    /// now populated; `false` otherwise, with the reason appended to
    /// [`RpcFile::get_errors`]. Never panics on malformed content.
    pub fn parse(&mut self) -> bool {
        let result = header_parse::parse_headers(&self.bytes, &self.extra_headers).and_then(|(headers, fields, data_offset)| {
            let source_name = Some(self.file_name.clone());
            let channels = demux::demultiplex(&self.bytes[data_offset..], &fields, &headers, source_name)?;
            Ok((headers, fields, channels))
        });
        match result {
            Ok((headers, fields, channels)) => {
                self.headers = headers;
                self.fields = Some(fields);
                self.channels = channels;
                let hash = self.get_file_hash();
                for channel in &mut self.channels {
                    channel.set_source_file_hash(hash.clone());
                }
                true
            }
            Err(e) => {
                if self.debug {
                    self.errors.push(format!("{}: {}", self.file_name, e));
                } else {
                    self.errors.push(e.to_string());
                }
                false
            }
        }
    }

    pub fn get_file_name(&self) -> &str {
        &self.file_name
    }

    /// The byte length of the input buffer.
    pub fn get_file_size(&self) -> usize {
        self.bytes.len()
    }

    /// Hex-encoded SHA-256 digest of the input buffer, for identifying a
    /// file independent of its name or path (used by the cross-event
    /// aggregator to match a channel's source back to an `Event`).
    pub fn get_file_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Accumulated parse diagnostics; empty until [`RpcFile::parse`] has
    /// been called and failed (or succeeded with nothing to report).
    pub fn get_errors(&self) -> &[String] {
        &self.errors
    }

    /// The raw header map, including any `extra_headers` overrides. Empty
    /// until [`RpcFile::parse`] has succeeded.
    pub fn get_raw_headers(&self) -> &HashMap<String, HeaderValue> {
        &self.headers
    }

    /// The mandatory, strongly-typed header fields. `None` until
    /// [`RpcFile::parse`] has succeeded.
    pub fn get_header_fields(&self) -> Option<&RpcHeaderFields> {
        self.fields.as_ref()
    }

    /// The demultiplexed channels. Empty until [`RpcFile::parse`] has
    /// succeeded.
    pub fn get_channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Mutable access to the demultiplexed channels, for running rainflow
    /// counting in place.
    pub fn get_channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    pub fn get_channel(&self, i: usize) -> Option<&Channel> {
        self.channels.get(i)
    }
}
