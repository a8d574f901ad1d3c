//! Writes a multi-channel file with `rpc3-out` and reads it back with
//! `rpc3-in`, checking that headers and samples survive the trip.
use super::*;
use std::collections::HashMap;
use std::io::Write;

fn make_channels() -> Vec<Channel> {
    vec![
        Channel::new(1, "Front Left".to_string(), "g".to_string(), 1.0, 0.0005, None, vec![0.0, 1.5, -1.5, 0.0, 3.2, -3.2]),
        Channel::new(2, "Front Right".to_string(), "g".to_string(), 1.0, 0.0005, None, vec![0.0, -2.0, 2.0, 0.0, 1.0, -1.0]),
    ]
}

/// `rpc3-out` never writes `INT_FULL_SCALE`; a reader supplies the
/// conventional default through `extra_headers`, exactly as `rpc3-in`'s
/// "file value wins, caller value fills gaps" rule expects.
fn reader_defaults() -> HashMap<String, HeaderValue> {
    let mut defaults = HashMap::new();
    defaults.insert("INT_FULL_SCALE".to_string(), HeaderValue::Int(32768));
    defaults
}

#[test]
fn channels_round_trip_through_a_temp_file_within_quantization_error() {
    let channels = make_channels();
    let original: Vec<Vec<f64>> = channels.iter().map(|c| c.get_samples().to_vec()).collect();

    let writer = RpcWriter::new(channels, HashMap::new()).unwrap();
    let bytes = writer.write();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.rsp");
    std::fs::File::create(&path).unwrap().write_all(&bytes).unwrap();
    let read_back = std::fs::read(&path).unwrap();

    let mut file = rpc3_in::RpcFile::new(read_back, "roundtrip.rsp".to_string(), false, reader_defaults());
    assert!(file.parse(), "{:?}", file.get_errors());

    let fields = file.get_header_fields().unwrap();
    assert_eq!(fields.channels, 2);
    assert_eq!(fields.data_type, DataType::ShortInteger);
    assert_eq!(fields.pts_per_frame, 1024);
    assert_eq!(fields.frames, 1);

    let decoded = file.get_channels();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].get_name(), "Front Left");
    assert_eq!(decoded[1].get_name(), "Front Right");
    for (d, o) in decoded.iter().zip(original.iter()) {
        // Only the real samples are checked; the rest of the frame is the
        // channel's own last-sample padding.
        for (a, b) in d.get_samples().iter().zip(o.iter()) {
            assert!((a - b).abs() < 1e-2, "{} != {}", a, b);
        }
    }
}

#[test]
fn padding_repeats_each_channels_own_last_sample() {
    let channels = make_channels();
    let last_values: Vec<f64> = channels.iter().map(|c| *c.get_samples().last().unwrap()).collect();

    let writer = RpcWriter::new(channels, HashMap::new()).unwrap();
    let bytes = writer.write();

    let mut file = rpc3_in::RpcFile::new(bytes, "pad.rsp".to_string(), false, reader_defaults());
    assert!(file.parse(), "{:?}", file.get_errors());

    let decoded = file.get_channels();
    for (d, last) in decoded.iter().zip(last_values.iter()) {
        let tail = d.get_samples().last().unwrap();
        assert!((tail - last).abs() < 1e-2, "{} != {}", tail, last);
    }
}

#[test]
fn channels_round_trip_across_a_multi_frame_group() {
    // Force FRAMES > 1 so PTS_PER_GROUP spans more than one frame per
    // channel, exercising the channel-major-within-a-group data layout
    // rather than the single-frame-per-group case every other test here
    // happens to use.
    let long_signal: Vec<f64> = (0..2500).map(|i| (i as f64 * 0.01).sin() * 50.0).collect();
    let a = Channel::new(1, "Front Left".to_string(), "g".to_string(), 1.0, 0.0005, None, long_signal.clone());
    let b = Channel::new(2, "Front Right".to_string(), "g".to_string(), 1.0, 0.0005, None, long_signal.iter().map(|v| v * 2.0).collect());

    let writer = RpcWriter::new(vec![a, b], HashMap::new()).unwrap();
    let bytes = writer.write();

    let mut file = rpc3_in::RpcFile::new(bytes, "multiframe.rsp".to_string(), false, reader_defaults());
    assert!(file.parse(), "{:?}", file.get_errors());
    let fields = file.get_header_fields().unwrap();
    assert!(fields.frames > 1, "test fixture should span multiple frames per group");

    let decoded = file.get_channels();
    for (a, b) in decoded[0].get_samples().iter().zip(long_signal.iter()) {
        assert!((a - b).abs() < 1e-1, "{} != {}", a, b);
    }
    for (a, b) in decoded[1].get_samples().iter().zip(long_signal.iter()) {
        assert!((a - b * 2.0).abs() < 2e-1, "{} != {}", a, b * 2.0);
    }
}

#[test]
fn extra_headers_are_written_and_survive_the_round_trip() {
    let channels = make_channels();
    let mut extra = HashMap::new();
    extra.insert("TEST_RIG".to_string(), HeaderValue::Text("Rig-7".to_string()));

    let writer = RpcWriter::new(channels, extra).unwrap();
    let bytes = writer.write();

    let mut file = rpc3_in::RpcFile::new(bytes, "extra.rsp".to_string(), false, reader_defaults());
    assert!(file.parse());
    assert_eq!(file.get_raw_headers().get("TEST_RIG").unwrap().as_text(), "Rig-7");
}
