//! Turning a set of [`Channel`]s back into the raw, multiplexed data-section
//! bytes of an RPC-III file -- the write-side mirror of `rpc3-in`'s
//! `demux::demultiplex`.
use rpc3_core::bitconverter::{unapply_scale, writer_chooser};
use rpc3_core::errors::*;
use rpc3_core::header::RpcHeaderFields;
use rpc3_core::Channel;

/// Re-interleave `channels`' samples into one channel-major-within-group,
/// frame-grouped byte buffer matching `fields`. Every channel must carry
/// exactly `fields.frames * fields.pts_per_frame` samples; groups are
/// always written in full, with any padding past the real frame count
/// filled with zeros.
pub fn multiplex(channels: &[Channel], fields: &RpcHeaderFields) -> Result<Vec<u8>, RpcError> {
    let channels_n = fields.channels as usize;
    if channels.len() != channels_n {
        return Err(RpcError::BadDataVector { have: channels.len(), need: channels_n });
    }
    let pts_per_frame = fields.pts_per_frame as usize;
    let frames_per_group = fields.frames_per_group().max(1) as usize;
    let number_of_groups = fields.number_of_groups() as usize;
    let sample_len = fields.data_type.sample_byte_length();
    let total_samples = fields.frames as usize * pts_per_frame;

    for channel in channels {
        if channel.get_samples().len() != total_samples {
            return Err(RpcError::BadDataVector { have: channel.get_samples().len(), need: total_samples });
        }
    }

    let channel_block_bytes = frames_per_group * pts_per_frame * sample_len;
    let group_bytes = channels_n * channel_block_bytes;
    let mut bytes = vec![0u8; number_of_groups * group_bytes];

    let writer = writer_chooser(fields.data_type);

    for g in 0..number_of_groups {
        let group_offset = g * group_bytes;
        for (ch, channel) in channels.iter().enumerate() {
            let ch_block_offset = group_offset + ch * channel_block_bytes;
            for f in 0..frames_per_group {
                let global_frame = g * frames_per_group + f;
                if global_frame >= fields.frames as usize {
                    break;
                }
                let frame_offset = ch_block_offset + f * pts_per_frame * sample_len;
                for p in 0..pts_per_frame {
                    let sample = channel.get_samples()[global_frame * pts_per_frame + p];
                    let raw = unapply_scale(fields.data_type, sample, channel.get_scale());
                    let encoded = writer(raw);
                    let s = frame_offset + p * sample_len;
                    bytes[s..s + sample_len].copy_from_slice(&encoded);
                }
            }
        }
    }
    Ok(bytes)
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
    fn multiplex_round_trips_through_demultiplex() {
        let f = fields(2, 1, 1, 3);
        let a = Channel::new(1, "A".to_string(), "g".to_string(), 1.0, 0.001, None, vec![1.0, 2.0, 3.0]);
        let b = Channel::new(2, "B".to_string(), "g".to_string(), 1.0, 0.001, None, vec![10.0, 20.0, 30.0]);
        let bytes = multiplex(&[a, b], &f).unwrap();
        assert_eq!(bytes.len(), 2 * 3 * 4);

        let decoded = rpc3_in::demux::demultiplex(&bytes, &f, &std::collections::HashMap::new(), None).unwrap();
        assert_eq!(decoded[0].get_samples(), &[1.0, 2.0, 3.0]);
        assert_eq!(decoded[1].get_samples(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn multiplex_rejects_wrong_channel_count() {
        let f = fields(2, 1, 1, 3);
        let a = Channel::new(1, "A".to_string(), "g".to_string(), 1.0, 0.001, None, vec![1.0, 2.0, 3.0]);
        let err = multiplex(&[a], &f).unwrap_err();
        assert!(matches!(err, RpcError::BadDataVector { .. }));
    }
}
