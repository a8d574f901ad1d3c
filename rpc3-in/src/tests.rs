use crate::RpcFile;
use std::collections::HashMap;

const HEADER_BLOCK_LEN: usize = 128;
const HEADER_NAME_LEN: usize = 32;

fn block(name: &str, value: &str) -> Vec<u8> {
    let mut b = vec![0u8; HEADER_BLOCK_LEN];
    b[..name.len()].copy_from_slice(name.as_bytes());
    b[HEADER_NAME_LEN..HEADER_NAME_LEN + value.len()].copy_from_slice(value.as_bytes());
    b
}

/// Build a minimal, valid two-channel floating-point RPC-III file with three
/// frames of one sample each, no grouping (`PTS_PER_GROUP == PTS_PER_FRAME`).
fn minimal_file_bytes() -> Vec<u8> {
    let header_lines = vec![
        block("FORMAT", "RPC3_DATA"),
        block("NUM_HEADER_BLOCKS", "4"),
        block("NUM_PARAMS", "15"),
        block("CHANNELS", "2"),
        block("DELTA_T", "0.001"),
        block("PTS_PER_FRAME", "1"),
        block("PTS_PER_GROUP", "1"),
        block("FRAMES", "3"),
        block("DATA_TYPE", "FLOATING_POINT"),
        block("DESC.CHAN_1", "Front Left"),
        block("UNITS.CHAN_1", "g"),
        block("SCALE.CHAN_1", "1.0"),
        block("DESC.CHAN_2", "Front Right"),
        block("UNITS.CHAN_2", "g"),
        block("SCALE.CHAN_2", "1.0"),
    ];
    let mut bytes = Vec::new();
    for line in header_lines {
        bytes.extend(line);
    }
    // Pad up to NUM_HEADER_BLOCKS * 512.
    bytes.resize(4 * 512, 0);

    let frames: [[f32; 2]; 3] = [[1.0, -1.0], [2.0, -2.0], [3.0, -3.0]];
    for frame in frames {
        for v in frame {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
    }
    bytes
}

#[test]
fn parses_minimal_file_end_to_end() {
    let bytes = minimal_file_bytes();
    let mut file = RpcFile::new(bytes, "fixture.rsp".to_string(), false, HashMap::new());
    assert!(file.parse());
    assert!(file.get_errors().is_empty());

    let fields = file.get_header_fields().unwrap();
    assert_eq!(fields.channels, 2);
    assert_eq!(fields.frames, 3);

    let channels = file.get_channels();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].get_name(), "Front Left");
    assert_eq!(channels[0].get_samples(), &[1.0, 2.0, 3.0]);
    assert_eq!(channels[1].get_samples(), &[-1.0, -2.0, -3.0]);
}

#[test]
fn extra_headers_are_ignored_when_the_file_already_has_the_field() {
    // A field present in the file always wins over a caller-supplied default.
    let bytes = minimal_file_bytes();
    let mut extra = HashMap::new();
    extra.insert(
        "DESC.CHAN_1".to_string(),
        rpc3_core::header::HeaderValue::Text("Overridden".to_string()),
    );
    let mut file = RpcFile::new(bytes, "fixture.rsp".to_string(), false, extra);
    assert!(file.parse());
    assert_eq!(file.get_channel(0).unwrap().get_name(), "Front Left");
}

#[test]
fn extra_headers_fill_in_a_field_missing_from_the_file() {
    let bytes = minimal_file_bytes();
    let mut extra = HashMap::new();
    extra.insert(
        "TEST_RIG".to_string(),
        rpc3_core::header::HeaderValue::Text("Rig-7".to_string()),
    );
    let mut file = RpcFile::new(bytes, "fixture.rsp".to_string(), false, extra);
    assert!(file.parse());
    assert_eq!(file.get_raw_headers().get("TEST_RIG").unwrap().as_text(), "Rig-7");
}

#[test]
fn parse_exposes_file_size_and_hash_and_stamps_channels_with_it() {
    let bytes = minimal_file_bytes();
    let expected_size = bytes.len();
    let mut file = RpcFile::new(bytes, "fixture.rsp".to_string(), false, HashMap::new());
    assert!(file.parse());
    assert_eq!(file.get_file_size(), expected_size);
    let hash = file.get_file_hash();
    assert_eq!(hash.len(), 64);
    for channel in file.get_channels() {
        assert_eq!(channel.get_source_file_hash(), Some(hash.as_str()));
    }
}

#[test]
fn parse_reports_failure_without_panicking_on_garbage() {
    let mut file = RpcFile::new(vec![1, 2, 3], "garbage.rsp".to_string(), false, HashMap::new());
    assert!(!file.parse());
    assert!(!file.get_errors().is_empty());
    assert!(file.get_channels().is_empty());
}
