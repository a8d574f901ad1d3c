//! Turning the raw data section bytes of an RPC-III file into demultiplexed,
//! physical-unit [`Channel`]s.
use rpc3_core::bitconverter::{apply_scale, converter_chooser};
use rpc3_core::errors::*;
use rpc3_core::header::{HeaderValue, RpcHeaderFields};
use rpc3_core::Channel;

use std::collections::HashMap;

/// Demultiplex the data section into one [`Channel`] per `CHANNELS` entry.
///
/// Samples in the data section are organized channel-major *within a group*:
/// for each group, channel 0's full `frames_per_group` contiguous frames of
/// `PTS_PER_FRAME` samples come first, then channel 1's, and so on. Groups
/// are laid out one after another, and the on-disk data section always
/// reserves a full `frames_per_group` worth of frames per channel per group
/// -- including the last group, which may be only partially filled with
/// real data. Only the first `FRAMES` frames actually get appended to the
/// returned channels; any padding in a partial final group is skipped.
pub fn demultiplex(
    bytes: &[u8],
    fields: &RpcHeaderFields,
    headers: &HashMap<String, HeaderValue>,
    source_file_name: Option<String>,
) -> Result<Vec<Channel>, RpcError> {
    let channels_n = fields.channels as usize;
    let pts_per_frame = fields.pts_per_frame as usize;
    let frames_per_group = fields.frames_per_group().max(1) as usize;
    let number_of_groups = fields.number_of_groups() as usize;
    let sample_len = fields.data_type.sample_byte_length();

    let channel_block_bytes = frames_per_group * pts_per_frame * sample_len;
    let group_bytes = channels_n * channel_block_bytes;
    let need = number_of_groups * group_bytes;
    if bytes.len() != need {
        return Err(RpcError::IncompleteDataSection { have: bytes.len(), need });
    }

    let converter = converter_chooser(fields.data_type);
    let mut raw: Vec<Vec<f64>> = (0..channels_n)
        .map(|_| Vec::with_capacity(fields.frames as usize * pts_per_frame))
        .collect();

    for g in 0..number_of_groups {
        let group_offset = g * group_bytes;
        for ch in 0..channels_n {
            let ch_block_offset = group_offset + ch * channel_block_bytes;
            for f in 0..frames_per_group {
                let global_frame = g * frames_per_group + f;
                if global_frame >= fields.frames as usize {
                    break;
                }
                let frame_offset = ch_block_offset + f * pts_per_frame * sample_len;
                for p in 0..pts_per_frame {
                    let s = frame_offset + p * sample_len;
                    let value = converter(&bytes[s..s + sample_len]).map_err(|_| RpcError::NumericConversion {
                        msg: format!("could not decode sample at byte {}", s),
                    })?;
                    raw[ch].push(value);
                }
            }
        }
    }

    let mut channels = Vec::with_capacity(channels_n);
    for (ch, raw_samples) in raw.into_iter().enumerate() {
        let idx = ch + 1;
        let name = headers
            .get(&format!("DESC.CHAN_{}", idx))
            .map(HeaderValue::as_text)
            .unwrap_or_else(|| format!("CHAN_{}", idx));
        let units = headers
            .get(&format!("UNITS.CHAN_{}", idx))
            .map(HeaderValue::as_text)
            .unwrap_or_default();
        let scale = headers
            .get(&format!("SCALE.CHAN_{}", idx))
            .and_then(HeaderValue::as_real)
            .unwrap_or(1.0);
        let samples = raw_samples
            .into_iter()
            .map(|v| apply_scale(fields.data_type, v, scale))
            .collect();
        channels.push(Channel::new(
            idx as u32,
            name,
            units,
            scale,
            fields.delta_t,
            source_file_name.clone(),
            samples,
        ));
    }
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc3_core::enums::DataType;

    fn fields(channels: u32, pts_per_frame: u32, pts_per_group: u32, frames: u32) -> RpcHeaderFields {
        RpcHeaderFields {
            channels,
            delta_t: 0.001,
            pts_per_frame,
            pts_per_group,
            frames,
            data_type: DataType::FloatingPoint,
            int_full_scale: None,
        }
    }

    #[test]
    fn demultiplexes_two_channels_one_frame_per_group() {
        let f = fields(2, 1, 1, 3);
        // 3 frames, each with 2 channels x 1 sample x 4 bytes = 8 bytes/frame.
        let mut bytes = Vec::new();
        let values: [[f32; 2]; 3] = [[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]];
        for frame in values {
            for v in frame {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        let channels = demultiplex(&bytes, &f, &HashMap::new(), None).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].get_samples(), &[1.0, 2.0, 3.0]);
        assert_eq!(channels[1].get_samples(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn demultiplexes_channel_major_layout_within_a_multi_frame_group() {
        // One group of 2 frames/channel: channel 0's block, then channel 1's.
        let f = fields(2, 1, 2, 2);
        let mut bytes = Vec::new();
        // Channel 0's two frames: 1.0, 2.0; then channel 1's two frames: 10.0, 20.0.
        for v in [1.0f32, 2.0, 10.0, 20.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let channels = demultiplex(&bytes, &f, &HashMap::new(), None).unwrap();
        assert_eq!(channels[0].get_samples(), &[1.0, 2.0]);
        assert_eq!(channels[1].get_samples(), &[10.0, 20.0]);
    }

    #[test]
    fn rejects_incomplete_data_section() {
        let f = fields(2, 1, 1, 3);
        let err = demultiplex(&[0u8; 4], &f, &HashMap::new(), None).unwrap_err();
        assert!(matches!(err, RpcError::IncompleteDataSection { .. }));
    }
}
