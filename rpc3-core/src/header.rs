//! This file contains the definitions for the header blocks of an RPC-III file.
//!
//! RPC-III headers are a sequence of fixed-size 128-byte blocks, each holding
//! one `NAME = VALUE` pair. Unlike a SEG-Y binary header, the set of keys is
//! open-ended (per-channel keys such as `DESC.CHAN_3` are generated, not
//! fixed), so the raw header is kept as a map and the handful of mandatory,
//! strongly-typed fields are promoted into [`RpcHeaderFields`] once parsing
//! succeeds.
use crate::enums::DataType;

/// A single header value, tagged by the shape RPC-III allows a header line
/// to take: free text, an integer count, or a real-valued parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderValue {
    Text(String),
    Int(i64),
    Real(f64),
}

impl HeaderValue {
    /// View this value as text regardless of its tag, the way it would read
    /// back from the file.
    pub fn as_text(&self) -> String {
        match self {
            HeaderValue::Text(s) => s.clone(),
            HeaderValue::Int(i) => i.to_string(),
            HeaderValue::Real(r) => format!("{:E}", r),
        }
    }

    /// Read this value as an integer, if it holds one (or text that parses as one).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(i) => Some(*i),
            HeaderValue::Text(s) => s.trim().parse::<i64>().ok(),
            HeaderValue::Real(_) => None,
        }
    }

    /// Read this value as a real number, if it holds one (or text that parses as one).
    pub fn as_real(&self) -> Option<f64> {
        match self {
            HeaderValue::Real(r) => Some(*r),
            HeaderValue::Int(i) => Some(*i as f64),
            HeaderValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// The mandatory, strongly-typed fields of an RPC-III header, promoted out of
/// the raw `HashMap<String, HeaderValue>` once every required key has been
/// found and parsed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(any(feature = "to_json", feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
pub struct RpcHeaderFields {
    /// `CHANNELS`: number of channels multiplexed into the data section.
    pub channels: u32,
    /// `DELTA_T`: sampling interval, in seconds.
    pub delta_t: f64,
    /// `PTS_PER_FRAME`: samples per channel per frame.
    pub pts_per_frame: u32,
    /// `PTS_PER_GROUP`: samples per channel per group of frames written together.
    pub pts_per_group: u32,
    /// `FRAMES`: total number of frames in the data section.
    pub frames: u32,
    /// `DATA_TYPE`: on-disk sample representation.
    pub data_type: DataType,
    /// `INT_FULL_SCALE`: present (and mandatory) only when `data_type` is
    /// [`DataType::ShortInteger`].
    pub int_full_scale: Option<i64>,
}

impl RpcHeaderFields {
    /// Number of frames that make up one group (`PTS_PER_GROUP / PTS_PER_FRAME`).
    pub fn frames_per_group(&self) -> u32 {
        self.pts_per_group / self.pts_per_frame
    }

    /// Number of groups needed to hold all frames (`ceil(FRAMES / frames_per_group)`).
    pub fn number_of_groups(&self) -> u32 {
        let fpg = self.frames_per_group().max(1);
        (self.frames + fpg - 1) / fpg
    }
}

pub const HEADER_BLOCK_LEN: usize = 128;
pub const HEADER_NAME_LEN: usize = 32;
pub const HEADER_VALUE_LEN: usize = 96;
pub const DATA_SECTION_ALIGNMENT: usize = 512;

/// Keys that must appear before any other header block.
pub const LEADING_KEYS: [&str; 3] = ["FORMAT", "NUM_HEADER_BLOCKS", "NUM_PARAMS"];

/// Keys that must be present (besides the per-channel ones) for a file to be decodable.
pub const MANDATORY_KEYS: [&str; 5] = ["CHANNELS", "DELTA_T", "PTS_PER_FRAME", "PTS_PER_GROUP", "FRAMES"];
