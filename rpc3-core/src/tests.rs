mod header {
    use crate::header::*;

    #[test]
    fn frames_per_group_and_number_of_groups() {
        let fields = RpcHeaderFields {
            channels: 4,
            delta_t: 0.001,
            pts_per_frame: 256,
            pts_per_group: 1024,
            frames: 10,
            data_type: crate::enums::DataType::FloatingPoint,
            int_full_scale: None,
        };
        assert_eq!(fields.frames_per_group(), 4);
        assert_eq!(fields.number_of_groups(), 3);
    }

    #[test]
    fn header_value_conversions() {
        let v = HeaderValue::Text("42".to_string());
        assert_eq!(v.as_int(), Some(42));
        assert_eq!(v.as_real(), Some(42.0));

        let v = HeaderValue::Real(3.5);
        assert_eq!(v.as_int(), None);
        assert_eq!(v.as_text(), format!("{:E}", 3.5));
    }
}

mod enums {
    use crate::enums::DataType;

    #[test]
    fn data_type_round_trips_through_header_string() {
        for dt in [DataType::FloatingPoint, DataType::ShortInteger] {
            let parsed = DataType::new(dt.as_header_str()).unwrap();
            assert_eq!(parsed, dt);
        }
    }

    #[test]
    fn data_type_byte_lengths() {
        assert_eq!(DataType::FloatingPoint.sample_byte_length(), 4);
        assert_eq!(DataType::ShortInteger.sample_byte_length(), 2);
    }
}

mod bitconverter {
    use crate::bitconverter::*;
    use crate::enums::DataType;

    #[test]
    fn converter_chooser_decodes_le_int16() {
        let f = converter_chooser(DataType::ShortInteger);
        let bytes = (-100i16).to_le_bytes();
        assert_eq!(f(&bytes[..]).unwrap(), -100.0);
    }

    #[test]
    fn apply_scale_is_identity_for_floating_point() {
        assert_eq!(apply_scale(DataType::FloatingPoint, 3.5, 10.0), 3.5);
    }

    #[test]
    fn apply_scale_multiplies_short_integer_by_channel_scale() {
        let v = apply_scale(DataType::ShortInteger, 16384.0, 0.5);
        assert!((v - 8192.0).abs() < 1e-9);
    }

    #[test]
    fn unapply_scale_inverts_apply_scale() {
        let raw = 16384.0;
        let physical = apply_scale(DataType::ShortInteger, raw, 0.5);
        let back = unapply_scale(DataType::ShortInteger, physical, 0.5);
        assert!((back - raw).abs() < 1e-6);
    }

    #[test]
    fn writer_chooser_round_trips_with_converter_chooser() {
        let write = writer_chooser(DataType::ShortInteger);
        let read = converter_chooser(DataType::ShortInteger);
        let bytes = write(-1234.0);
        assert_eq!(read(&bytes).unwrap(), -1234.0);
    }

    #[test]
    fn string_round_trips_through_windows1251() {
        let bytes = string_to_windows1251_bytes("CHAN_1", 32);
        assert_eq!(bytes.len(), 32);
        assert_eq!(windows1251_bytes_to_string(&bytes), "CHAN_1");
    }
}
