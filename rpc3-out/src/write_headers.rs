//! Building and serializing the header-block section of an RPC-III file.
use chrono::Local;
use rpc3_core::bitconverter::string_to_windows1251_bytes;
use rpc3_core::header::{HeaderValue, DATA_SECTION_ALIGNMENT, HEADER_BLOCK_LEN, HEADER_NAME_LEN, HEADER_VALUE_LEN};
use rpc3_core::{Channel, FORMAT_TAG};

use std::collections::HashMap;

/// Real-valued header fields (`DELTA_T`, `SCALE.CHAN_<n>`, ...) are written
/// in scientific notation with six digits of mantissa precision and a
/// three-digit signed exponent (`1.000000E+001`), the conventional format
/// test-rig software expects for these fields.
pub fn format_exponential(v: f64) -> String {
    if v == 0.0 {
        return "0.000000E+000".to_string();
    }
    let exponent = v.abs().log10().floor() as i32;
    let mantissa = v / 10f64.powi(exponent);
    format!("{:.6}E{}{:03}", mantissa, if exponent >= 0 { "+" } else { "-" }, exponent.abs())
}

fn format_value(v: &HeaderValue) -> String {
    match v {
        HeaderValue::Text(s) => s.clone(),
        HeaderValue::Int(i) => i.to_string(),
        HeaderValue::Real(r) => format_exponential(*r),
    }
}

/// Assemble the ordered list of `(name, value)` header lines for a
/// short-integer file with the given channels and framing parameters,
/// folding in any extra headers the caller wants appended (skipping any key
/// already generated).
///
/// The writer always emits `DATA_TYPE = SHORT_INTEGER`; `INT_FULL_SCALE` is
/// deliberately not written (see the module-level docs on [`super::RpcWriter`])
/// -- a caller reading the file back must supply it (conventionally `32768`)
/// through `extra_headers`.
pub fn build_header_lines(
    channels: &[Channel],
    pts_per_frame: u32,
    pts_per_group: u32,
    frames: u32,
    extra_headers: &HashMap<String, HeaderValue>,
) -> Vec<(String, HeaderValue)> {
    let mut lines = vec![
        ("FORMAT".to_string(), HeaderValue::Text(FORMAT_TAG.to_string())),
        // NUM_HEADER_BLOCKS is a placeholder; patched in by `encode_header_blocks`
        // once the final line count (and hence block count) is known.
        ("NUM_HEADER_BLOCKS".to_string(), HeaderValue::Int(0)),
        // NUM_PARAMS is likewise patched once every line (including extras) is known.
        ("NUM_PARAMS".to_string(), HeaderValue::Int(0)),
        ("FILE_TYPE".to_string(), HeaderValue::Text("TIME_HISTORY".to_string())),
        ("TIME_TYPE".to_string(), HeaderValue::Text("RESPONSE".to_string())),
        (
            "DELTA_T".to_string(),
            HeaderValue::Real(channels.first().map(|c| c.get_delta_t()).unwrap_or(0.0)),
        ),
        ("CHANNELS".to_string(), HeaderValue::Int(channels.len() as i64)),
        ("DATE".to_string(), HeaderValue::Text(Local::now().format("%H:%M:%S %d-%m-%Y").to_string())),
        ("REPEATS".to_string(), HeaderValue::Int(1)),
        ("DATA_TYPE".to_string(), HeaderValue::Text("SHORT_INTEGER".to_string())),
        ("PTS_PER_FRAME".to_string(), HeaderValue::Int(pts_per_frame as i64)),
        ("PTS_PER_GROUP".to_string(), HeaderValue::Int(pts_per_group as i64)),
        ("FRAMES".to_string(), HeaderValue::Int(frames as i64)),
    ];
    for (i, channel) in channels.iter().enumerate() {
        let n = i + 1;
        lines.push((format!("DESC.CHAN_{}", n), HeaderValue::Text(channel.get_name().to_string())));
        lines.push((format!("UNITS.CHAN_{}", n), HeaderValue::Text(channel.get_units().to_string())));
        lines.push((format!("SCALE.CHAN_{}", n), HeaderValue::Real(channel.get_scale())));
        lines.push((format!("LOWER_LIMIT.CHAN_{}", n), HeaderValue::Int(1)));
        lines.push((format!("UPPER_LIMIT.CHAN_{}", n), HeaderValue::Int(-1)));
    }
    let generated: std::collections::HashSet<&str> = lines.iter().map(|(k, _)| k.as_str()).collect();
    for (k, v) in extra_headers {
        if !generated.contains(k.as_str()) {
            lines.push((k.clone(), v.clone()));
        }
    }
    lines
}

/// Serialize header lines into the 128-byte-block form, patching
/// `NUM_HEADER_BLOCKS` and `NUM_PARAMS` to their final values and padding
/// the block section out to a `NUM_HEADER_BLOCKS * 512` boundary.
pub fn encode_header_blocks(mut lines: Vec<(String, HeaderValue)>) -> Vec<u8> {
    let num_params = lines.len() as i64;
    let num_header_blocks = ((lines.len() * HEADER_BLOCK_LEN) as f64 / DATA_SECTION_ALIGNMENT as f64).ceil() as i64;
    lines[1].1 = HeaderValue::Int(num_header_blocks);
    lines[2].1 = HeaderValue::Int(num_params);

    let mut bytes = Vec::with_capacity(num_header_blocks as usize * DATA_SECTION_ALIGNMENT);
    for (name, value) in &lines {
        bytes.extend(string_to_windows1251_bytes(name, HEADER_NAME_LEN));
        bytes.extend(string_to_windows1251_bytes(&format_value(value), HEADER_VALUE_LEN));
    }
    bytes.resize(num_header_blocks as usize * DATA_SECTION_ALIGNMENT, 0);
    bytes
}
