//! Export row wire format.
//!
//! Each row is serialized as:
//!
//! ```text
//! [ i32 row_length ][ null_bitmap ][ metadata_cols ][ user_cols ]
//! ```
//!
//! `row_length` excludes its own 4 bytes but includes the bitmap and all
//! column data. The bitmap carries one bit per column (metadata first),
//! MSB-first within each byte, set bit ⇔ NULL, and is zero-initialized so
//! non-null is the default. The six metadata columns are big-endian i64s:
//! `txn_id, timestamp, seq_no, partition_id, site_id, op_type`.

use estuary_types::encoding::{BeReader, BeWriter};
use estuary_types::{ColumnType, ColumnValue, PartitionId, SiteId, TxnId};

use crate::METADATA_COLUMN_COUNT;

/// Serialized width of the metadata columns: six big-endian i64s.
const METADATA_WIDTH: usize = METADATA_COLUMN_COUNT * 8;

/// Row operation kind, the last metadata column on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Insert,
    Delete,
}

impl OpType {
    /// Wire encoding: 1 for insert, 0 for delete.
    pub const fn as_wire(self) -> i64 {
        match self {
            Self::Insert => 1,
            Self::Delete => 0,
        }
    }

    pub const fn from_wire(v: i64) -> Option<Self> {
        match v {
            1 => Some(Self::Insert),
            0 => Some(Self::Delete),
            _ => None,
        }
    }
}

/// The fixed metadata columns leading every export row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMetadata {
    pub txn_id: TxnId,
    pub timestamp: i64,
    pub seq_no: i64,
    pub partition_id: PartitionId,
    pub site_id: SiteId,
    pub op_type: OpType,
}

/// Bitmap length for `column_count` columns, one bit per column.
const fn null_mask_len(column_count: usize) -> usize {
    column_count.div_ceil(8)
}

/// Size of the row header: the 4-byte length prefix plus the null bitmap
/// covering metadata and user columns.
pub const fn row_header_size(user_column_count: usize) -> usize {
    4 + null_mask_len(METADATA_COLUMN_COUNT + user_column_count)
}

/// Upper bound on the serialized size of a row carrying `tuple`.
pub fn max_row_size(tuple: &[ColumnValue]) -> usize {
    let user_width: usize = tuple.iter().map(ColumnValue::export_width).sum();
    row_header_size(tuple.len()) + METADATA_WIDTH + user_width
}

fn set_null_bit(mask: &mut [u8], column: usize) {
    mask[column / 8] |= 0x80 >> (column % 8);
}

fn null_bit_set(mask: &[u8], column: usize) -> bool {
    mask[column / 8] & (0x80 >> (column % 8)) != 0
}

/// Serialize one row into the front of `dst`.
///
/// Returns the number of bytes written, or `None` if `dst` is too small —
/// callers reserve at least [`max_row_size`] bytes, so `None` indicates a
/// broken invariant rather than an expected condition.
pub fn encode_row(dst: &mut [u8], meta: &RowMetadata, tuple: &[ColumnValue]) -> Option<usize> {
    let header_size = row_header_size(tuple.len());
    if dst.len() < header_size {
        return None;
    }
    let (header, body) = dst.split_at_mut(header_size);

    // Zero the length prefix and bitmap; every column starts out non-null.
    header.fill(0);
    let mask = &mut header[4..];

    let mut io = BeWriter::new(body);
    io.write_i64(meta.txn_id.get())?;
    io.write_i64(meta.timestamp)?;
    io.write_i64(meta.seq_no)?;
    io.write_i64(i64::from(meta.partition_id.get()))?;
    io.write_i64(i64::from(meta.site_id.get()))?;
    io.write_i64(meta.op_type.as_wire())?;

    for (i, value) in tuple.iter().enumerate() {
        match value {
            ColumnValue::Null => set_null_bit(mask, METADATA_COLUMN_COUNT + i),
            ColumnValue::BigInt(v) | ColumnValue::Timestamp(v) => io.write_i64(*v)?,
            ColumnValue::Double(v) => io.write_f64(*v)?,
            ColumnValue::Text(s) => io.write_len_prefixed(s.as_bytes())?,
            ColumnValue::Binary(b) => io.write_len_prefixed(b)?,
        }
    }

    // Back-patch the row length: everything after the 4-byte prefix.
    let row_length = header_size + io.position() - 4;
    header[..4].copy_from_slice(&(row_length as i32).to_be_bytes());

    Some(header_size + io.position())
}

/// Decode one row from the front of `data` against the published user
/// column schema.
///
/// Returns the metadata, the user column values, and the total bytes
/// consumed. `None` means the input is truncated or malformed.
pub fn decode_row(
    data: &[u8],
    schema: &[ColumnType],
) -> Option<(RowMetadata, Vec<ColumnValue>, usize)> {
    let mut io = BeReader::new(data);
    let row_length = usize::try_from(io.read_i32()?).ok()?;
    if row_length + 4 > data.len() {
        return None;
    }

    let mask = io.read_bytes(null_mask_len(METADATA_COLUMN_COUNT + schema.len()))?;

    let txn_id = TxnId::new(io.read_i64()?);
    let timestamp = io.read_i64()?;
    let seq_no = io.read_i64()?;
    let partition_id = PartitionId::new(i32::try_from(io.read_i64()?).ok()?);
    let site_id = SiteId::new(i32::try_from(io.read_i64()?).ok()?);
    let op_type = OpType::from_wire(io.read_i64()?)?;

    let mut values = Vec::with_capacity(schema.len());
    for (i, column_type) in schema.iter().enumerate() {
        if null_bit_set(mask, METADATA_COLUMN_COUNT + i) {
            values.push(ColumnValue::Null);
            continue;
        }
        let value = match column_type {
            ColumnType::BigInt => ColumnValue::BigInt(io.read_i64()?),
            ColumnType::Timestamp => ColumnValue::Timestamp(io.read_i64()?),
            ColumnType::Double => ColumnValue::Double(io.read_f64()?),
            ColumnType::Text => {
                ColumnValue::Text(String::from_utf8(io.read_len_prefixed()?.to_vec()).ok()?)
            }
            ColumnType::Binary => ColumnValue::Binary(io.read_len_prefixed()?.to_vec()),
        };
        values.push(value);
    }

    if io.position() != row_length + 4 {
        return None;
    }

    let meta = RowMetadata {
        txn_id,
        timestamp,
        seq_no,
        partition_id,
        site_id,
        op_type,
    };
    Some((meta, values, row_length + 4))
}

/// Decode every row in a block payload.
pub fn decode_block(
    payload: &[u8],
    schema: &[ColumnType],
) -> Option<Vec<(RowMetadata, Vec<ColumnValue>)>> {
    let mut rows = Vec::new();
    let mut rest = payload;
    while !rest.is_empty() {
        let (meta, values, consumed) = decode_row(rest, schema)?;
        rows.push((meta, values));
        rest = &rest[consumed..];
    }
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta() -> RowMetadata {
        RowMetadata {
            txn_id: TxnId::new(100),
            timestamp: 1_700_000_000_000,
            seq_no: 3,
            partition_id: PartitionId::new(7),
            site_id: SiteId::new(1),
            op_type: OpType::Insert,
        }
    }

    #[test]
    fn header_size_covers_metadata_bitmap() {
        // 6 metadata columns alone fit one bitmap byte.
        assert_eq!(row_header_size(0), 5);
        // 6 + 2 = 8 columns still fit one byte; a 9th column spills over.
        assert_eq!(row_header_size(2), 5);
        assert_eq!(row_header_size(3), 6);
    }

    #[test]
    fn row_length_excludes_own_prefix() {
        let tuple = vec![ColumnValue::BigInt(42)];
        let mut buf = vec![0u8; max_row_size(&tuple)];
        let written = encode_row(&mut buf, &sample_meta(), &tuple).unwrap();

        let row_length = i32::from_be_bytes(buf[..4].try_into().unwrap()) as usize;
        assert_eq!(row_length, written - 4);
        // bitmap (1) + metadata (48) + one bigint (8)
        assert_eq!(row_length, 1 + 48 + 8);
    }

    #[test]
    fn null_bits_are_msb_first() {
        let tuple = vec![
            ColumnValue::Null,
            ColumnValue::BigInt(1),
            ColumnValue::Null,
        ];
        let mut buf = vec![0u8; max_row_size(&tuple)];
        encode_row(&mut buf, &sample_meta(), &tuple).unwrap();

        // Columns 6 and 8 are null: bits 0x80 >> 6 and 0x80 >> 8 (spilling
        // into the second bitmap byte).
        let mask = &buf[4..4 + null_mask_len(9)];
        assert_eq!(mask[0], 0x80 >> 6);
        assert_eq!(mask[1], 0x80);
    }

    #[test]
    fn round_trip_all_types() {
        let tuple = vec![
            ColumnValue::BigInt(-5),
            ColumnValue::Double(2.5),
            ColumnValue::Timestamp(99),
            ColumnValue::Text("hello".to_owned()),
            ColumnValue::Binary(vec![0xde, 0xad]),
            ColumnValue::Null,
        ];
        let schema = [
            ColumnType::BigInt,
            ColumnType::Double,
            ColumnType::Timestamp,
            ColumnType::Text,
            ColumnType::Binary,
            ColumnType::Text,
        ];
        let mut buf = vec![0u8; max_row_size(&tuple)];
        let written = encode_row(&mut buf, &sample_meta(), &tuple).unwrap();

        let (meta, values, consumed) = decode_row(&buf[..written], &schema).unwrap();
        assert_eq!(meta, sample_meta());
        assert_eq!(values, tuple);
        assert_eq!(consumed, written);
    }

    #[test]
    fn decode_rejects_truncated_row() {
        let tuple = vec![ColumnValue::Text("abcdef".to_owned())];
        let schema = [ColumnType::Text];
        let mut buf = vec![0u8; max_row_size(&tuple)];
        let written = encode_row(&mut buf, &sample_meta(), &tuple).unwrap();
        assert!(decode_row(&buf[..written - 1], &schema).is_none());
    }

    #[test]
    fn encode_rejects_undersized_destination() {
        let tuple = vec![ColumnValue::BigInt(1)];
        let mut buf = vec![0u8; max_row_size(&tuple) - 1];
        assert!(encode_row(&mut buf, &sample_meta(), &tuple).is_none());
    }

    #[test]
    fn decode_block_walks_consecutive_rows() {
        let schema = [ColumnType::BigInt];
        let mut buf = vec![0u8; 256];
        let mut total = 0;
        for i in 0..3 {
            let tuple = vec![ColumnValue::BigInt(i)];
            total += encode_row(&mut buf[total..], &sample_meta(), &tuple).unwrap();
        }
        let rows = decode_block(&buf[..total], &schema).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].1, vec![ColumnValue::BigInt(2)]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn value_strategy() -> impl Strategy<Value = (ColumnType, ColumnValue)> {
            prop_oneof![
                any::<i64>().prop_map(|v| (ColumnType::BigInt, ColumnValue::BigInt(v))),
                (-1.0e12..1.0e12f64).prop_map(|v| (ColumnType::Double, ColumnValue::Double(v))),
                any::<i64>().prop_map(|v| (ColumnType::Timestamp, ColumnValue::Timestamp(v))),
                "[a-z0-9]{0,24}".prop_map(|s| (ColumnType::Text, ColumnValue::Text(s))),
                prop::collection::vec(any::<u8>(), 0..32)
                    .prop_map(|b| (ColumnType::Binary, ColumnValue::Binary(b))),
                Just((ColumnType::BigInt, ColumnValue::Null)),
            ]
        }

        proptest! {
            #[test]
            fn prop_row_round_trip(columns in prop::collection::vec(value_strategy(), 0..12)) {
                let schema: Vec<ColumnType> = columns.iter().map(|(t, _)| *t).collect();
                let tuple: Vec<ColumnValue> = columns.into_iter().map(|(_, v)| v).collect();

                let mut buf = vec![0u8; max_row_size(&tuple)];
                let written = encode_row(&mut buf, &sample_meta(), &tuple).unwrap();
                prop_assert!(written <= max_row_size(&tuple));

                let (meta, values, consumed) = decode_row(&buf[..written], &schema).unwrap();
                prop_assert_eq!(meta, sample_meta());
                prop_assert_eq!(values, tuple);
                prop_assert_eq!(consumed, written);
            }
        }
    }
}
