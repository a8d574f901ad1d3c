//! Parsing the sequence of 128-byte `NAME = VALUE` header blocks that open
//! an RPC-III file into a raw header map, and promoting the mandatory keys
//! out of that map into a [`RpcHeaderFields`].
use rpc3_core::bitconverter::windows1251_bytes_to_string;
use rpc3_core::enums::DataType;
use rpc3_core::errors::*;
use rpc3_core::header::{
    HeaderValue, RpcHeaderFields, DATA_SECTION_ALIGNMENT, HEADER_BLOCK_LEN, HEADER_NAME_LEN, HEADER_VALUE_LEN,
    LEADING_KEYS,
};

use std::collections::HashMap;

fn parse_value(raw: &str) -> HeaderValue {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return HeaderValue::Int(i);
    }
    if let Ok(r) = trimmed.parse::<f64>() {
        return HeaderValue::Real(r);
    }
    HeaderValue::Text(trimmed.to_string())
}

fn read_block(bytes: &[u8]) -> Result<(String, HeaderValue), RpcError> {
    if bytes.len() != HEADER_BLOCK_LEN {
        return Err(RpcError::HeaderBlockLength { l: bytes.len() });
    }
    let name = windows1251_bytes_to_string(&bytes[..HEADER_NAME_LEN]);
    let value_raw = windows1251_bytes_to_string(&bytes[HEADER_NAME_LEN..HEADER_NAME_LEN + HEADER_VALUE_LEN]);
    Ok((name, parse_value(&value_raw)))
}

/// Parse every header block, merge in the caller-supplied `extra_headers`
/// overrides/additions, and promote the mandatory fields into a typed
/// [`RpcHeaderFields`].
///
/// Returns `(raw headers, mandatory fields, data section byte offset)`.
pub fn parse_headers(
    bytes: &[u8],
    extra_headers: &HashMap<String, HeaderValue>,
) -> Result<(HashMap<String, HeaderValue>, RpcHeaderFields, usize), RpcError> {
    if bytes.len() < HEADER_BLOCK_LEN * LEADING_KEYS.len() {
        return Err(RpcError::FileTooShort);
    }

    let mut headers = HashMap::new();
    let mut offset = 0usize;
    for expected in LEADING_KEYS {
        let (name, value) = read_block(&bytes[offset..offset + HEADER_BLOCK_LEN])?;
        if name != expected {
            return Err(RpcError::InvalidFieldValue {
                name: expected.to_string(),
                raw: name,
            });
        }
        headers.insert(name, value);
        offset += HEADER_BLOCK_LEN;
    }

    let num_header_blocks = headers
        .get("NUM_HEADER_BLOCKS")
        .and_then(HeaderValue::as_int)
        .ok_or_else(|| RpcError::MissingField { name: "NUM_HEADER_BLOCKS".to_string() })?;
    let num_params = headers
        .get("NUM_PARAMS")
        .and_then(HeaderValue::as_int)
        .ok_or_else(|| RpcError::MissingField { name: "NUM_PARAMS".to_string() })?;
    if num_params <= 3 {
        return Err(RpcError::InvalidFieldValue {
            name: "NUM_PARAMS".to_string(),
            raw: num_params.to_string(),
        });
    }

    let data_offset = num_header_blocks as usize * DATA_SECTION_ALIGNMENT;
    if bytes.len() < data_offset {
        return Err(RpcError::FileTooShort);
    }

    // The remaining header lines, up to NUM_PARAMS of them, continue
    // immediately after the three leading blocks.
    let remaining = (num_params as usize).saturating_sub(LEADING_KEYS.len());
    for _ in 0..remaining {
        if offset + HEADER_BLOCK_LEN > data_offset {
            break;
        }
        let (name, value) = read_block(&bytes[offset..offset + HEADER_BLOCK_LEN])?;
        if !name.is_empty() {
            headers.insert(name, value);
        }
        offset += HEADER_BLOCK_LEN;
    }

    // A caller-supplied header only fills in a field the file itself did
    // not provide; a field the file did supply always wins.
    for (k, v) in extra_headers {
        headers.entry(k.clone()).or_insert_with(|| v.clone());
    }

    let get_u32 = |headers: &HashMap<String, HeaderValue>, key: &str| -> Result<u32, RpcError> {
        headers
            .get(key)
            .and_then(HeaderValue::as_int)
            .map(|v| v as u32)
            .ok_or_else(|| RpcError::MissingField { name: key.to_string() })
    };
    let get_f64 = |headers: &HashMap<String, HeaderValue>, key: &str| -> Result<f64, RpcError> {
        headers
            .get(key)
            .and_then(HeaderValue::as_real)
            .ok_or_else(|| RpcError::MissingField { name: key.to_string() })
    };

    let channels = get_u32(&headers, "CHANNELS")?;
    let delta_t = get_f64(&headers, "DELTA_T")?;
    let pts_per_frame = get_u32(&headers, "PTS_PER_FRAME")?;
    let pts_per_group = get_u32(&headers, "PTS_PER_GROUP")?;
    let frames = get_u32(&headers, "FRAMES")?;
    let data_type_raw = headers
        .get("DATA_TYPE")
        .map(HeaderValue::as_text)
        .ok_or_else(|| RpcError::MissingField { name: "DATA_TYPE".to_string() })?;
    let data_type = DataType::new(&data_type_raw)?;
    let int_full_scale = match data_type {
        DataType::ShortInteger => Some(
            headers
                .get("INT_FULL_SCALE")
                .and_then(HeaderValue::as_int)
                .ok_or_else(|| RpcError::MissingField { name: "INT_FULL_SCALE".to_string() })?,
        ),
        DataType::FloatingPoint => None,
    };

    let fields = RpcHeaderFields {
        channels,
        delta_t,
        pts_per_frame,
        pts_per_group,
        frames,
        data_type,
        int_full_scale,
    };

    Ok((headers, fields, data_offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(name: &str, value: &str) -> Vec<u8> {
        let mut block = vec![0u8; HEADER_BLOCK_LEN];
        block[..name.len()].copy_from_slice(name.as_bytes());
        block[HEADER_NAME_LEN..HEADER_NAME_LEN + value.len()].copy_from_slice(value.as_bytes());
        block
    }

    #[test]
    fn rejects_too_short_file() {
        let err = parse_headers(&[0u8; 10], &HashMap::new()).unwrap_err();
        assert!(matches!(err, RpcError::FileTooShort));
    }

    #[test]
    fn rejects_wrong_leading_key_order() {
        let mut bytes = Vec::new();
        bytes.extend(pad("NOT_FORMAT", "RPC3_DATA"));
        bytes.extend(pad("NUM_HEADER_BLOCKS", "1"));
        bytes.extend(pad("NUM_PARAMS", "3"));
        let err = parse_headers(&bytes, &HashMap::new()).unwrap_err();
        assert!(matches!(err, RpcError::InvalidFieldValue { .. }));
    }
}
