//! Integration tests exercising the public `read_fwf` entry point end to
//! end, covering the scenarios unit tests inside `coordinator.rs` don't
//! already reach.

use std::collections::HashMap;

use arrow::array::Int64Array;
use pretty_assertions::assert_eq;

use fwf_rs::{read_fwf, ConvertOptions, DataType, FwfSource, ParseOptions, ReadOptions};

#[test]
fn big5_encoded_ascii_digits_parse_same_as_utf8() {
    let widths = vec![3, 3, 3];
    let read_options = ReadOptions {
        column_names: vec!["a".into(), "b".into(), "c".into()],
        encoding: "Big5".to_string(),
        ..ReadOptions::default()
    };
    let parse_options = ParseOptions::try_new(widths).unwrap();
    let batch = read_fwf(
        FwfSource::from_bytes(&b"111222333"[..]),
        parse_options,
        Some(read_options),
        None,
    )
    .unwrap();

    assert_eq!(batch.num_rows(), 1);
    for (index, expected) in [111i64, 222, 333].into_iter().enumerate() {
        let column = batch
            .column(index)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(column.value(0), expected);
    }
}

#[test]
fn skip_rows_applies_after_header_and_empty_lines_are_dropped_first() {
    let parse_options = ParseOptions::try_new(vec![3]).unwrap();
    let read_options = ReadOptions {
        skip_rows: 1,
        ..ReadOptions::default()
    };
    let batch = read_fwf(
        FwfSource::from_bytes(&b"abc\r\n\r\n111\r\n222\r\n333"[..]),
        parse_options,
        Some(read_options),
        None,
    )
    .unwrap();

    assert_eq!(batch.schema().field(0).name(), "abc");
    assert_eq!(batch.num_rows(), 2);
    let column = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(column.values(), &[222, 333]);
}

#[test]
fn declared_column_type_rejects_unparseable_values_instead_of_widening() {
    let parse_options = ParseOptions::try_new(vec![3])
        .unwrap()
        .with_header_rows(0);
    let read_options = ReadOptions {
        column_names: vec!["a".into()],
        ..ReadOptions::default()
    };
    let mut column_types = HashMap::new();
    column_types.insert("a".to_string(), DataType::Int64);
    let convert_options = ConvertOptions {
        column_types,
        ..ConvertOptions::default()
    };

    let result = read_fwf(
        FwfSource::from_bytes(&b"abc"[..]),
        parse_options,
        Some(read_options),
        Some(convert_options),
    );
    assert!(result.is_err());
}

#[test]
fn undersized_buffer_safety_factor_still_decodes_via_internal_growth() {
    // windows-1252 0x80 expands to a 3-byte UTF-8 euro sign; a block_size of
    // 4 bytes with buffer_safety_factor 1.0 cannot hold the expanded output
    // of a 4-byte input block in one pass, so the transcoder must grow its
    // buffer and continue from the unconsumed tail (spec §4.2) rather than
    // surfacing BufferTooSmall for an ordinary undersized starting factor.
    let parse_options = ParseOptions::try_new(vec![3]).unwrap().with_header_rows(0);
    let read_options = ReadOptions {
        column_names: vec!["a".into()],
        encoding: "windows-1252".to_string(),
        block_size: 4,
        buffer_safety_factor: 1.0,
        ..ReadOptions::default()
    };
    let input: Vec<u8> = vec![0x80, 0x80, 0x80, b'\n'];
    let batch = read_fwf(
        FwfSource::from_bytes(input),
        parse_options,
        Some(read_options),
        None,
    )
    .unwrap();

    assert_eq!(batch.num_rows(), 1);
    let column = batch
        .column(0)
        .as_any()
        .downcast_ref::<arrow::array::StringArray>()
        .unwrap();
    assert_eq!(column.value(0), "€€€");
}

#[test]
fn every_output_column_has_equal_length() {
    let parse_options = ParseOptions::try_new(vec![2, 2, 2]).unwrap();
    let batch = read_fwf(
        FwfSource::from_bytes(&b"abcdef\r\n112233\r\n445566"[..]),
        parse_options,
        None,
        None,
    )
    .unwrap();

    let lengths: Vec<usize> = (0..batch.num_columns())
        .map(|i| batch.column(i).len())
        .collect();
    assert!(lengths.iter().all(|&len| len == lengths[0]));
    assert_eq!(lengths[0], batch.num_rows());
}
