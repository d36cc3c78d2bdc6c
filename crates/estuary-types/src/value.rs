//! Dynamically-typed export column values.
//!
//! An export row carries a slice of [`ColumnValue`]s after its fixed
//! metadata columns. Each value knows its wire width so the stream can
//! compute an upper bound on a row's serialized size before reserving
//! block space.

use std::fmt;

/// The declared type of an export column or plan placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
    BigInt,
    Double,
    Timestamp,
    Text,
    Binary,
}

impl ColumnType {
    /// Whether a value may occupy a slot of this type.
    ///
    /// NULL is acceptable everywhere; integers widen into doubles and
    /// timestamps; everything else must match exactly.
    pub const fn accepts(self, value: &ColumnValue) -> bool {
        match (self, value) {
            (_, ColumnValue::Null) => true,
            (Self::BigInt, ColumnValue::BigInt(_)) => true,
            (Self::Double, ColumnValue::Double(_) | ColumnValue::BigInt(_)) => true,
            (Self::Timestamp, ColumnValue::Timestamp(_) | ColumnValue::BigInt(_)) => true,
            (Self::Text, ColumnValue::Text(_)) => true,
            (Self::Binary, ColumnValue::Binary(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Timestamp => "TIMESTAMP",
            Self::Text => "VARCHAR",
            Self::Binary => "VARBINARY",
        };
        f.write_str(name)
    }
}

/// A single export column value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ColumnValue {
    /// SQL NULL; contributes a bitmap bit and no payload bytes.
    Null,
    /// 64-bit signed integer.
    BigInt(i64),
    /// 64-bit IEEE 754 float.
    Double(f64),
    /// Microseconds since the epoch.
    Timestamp(i64),
    /// UTF-8 text, length-prefixed on the wire.
    Text(String),
    /// Raw bytes, length-prefixed on the wire.
    Binary(Vec<u8>),
}

impl ColumnValue {
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The type tag of this value, if it carries one.
    pub const fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::BigInt(_) => Some(ColumnType::BigInt),
            Self::Double(_) => Some(ColumnType::Double),
            Self::Timestamp(_) => Some(ColumnType::Timestamp),
            Self::Text(_) => Some(ColumnType::Text),
            Self::Binary(_) => Some(ColumnType::Binary),
        }
    }

    /// Worst-case number of payload bytes this value occupies on the wire.
    ///
    /// NULL occupies only its bitmap bit. Variable-width values pay a
    /// 4-byte length prefix.
    pub fn export_width(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::BigInt(_) | Self::Double(_) | Self::Timestamp(_) => 8,
            Self::Text(s) => 4 + s.len(),
            Self::Binary(b) => 4 + b.len(),
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "ts({v})"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Binary(b) => write!(f, "x'{}b'", b.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_widths() {
        assert_eq!(ColumnValue::Null.export_width(), 0);
        assert_eq!(ColumnValue::BigInt(1).export_width(), 8);
        assert_eq!(ColumnValue::Double(1.5).export_width(), 8);
        assert_eq!(ColumnValue::Timestamp(0).export_width(), 8);
        assert_eq!(ColumnValue::Text("abc".to_owned()).export_width(), 7);
        assert_eq!(ColumnValue::Binary(vec![0; 10]).export_width(), 14);
    }

    #[test]
    fn type_compatibility() {
        assert!(ColumnType::BigInt.accepts(&ColumnValue::Null));
        assert!(ColumnType::BigInt.accepts(&ColumnValue::BigInt(3)));
        assert!(!ColumnType::BigInt.accepts(&ColumnValue::Text("3".to_owned())));
        assert!(ColumnType::Double.accepts(&ColumnValue::BigInt(3)));
        assert!(ColumnType::Timestamp.accepts(&ColumnValue::BigInt(3)));
        assert!(!ColumnType::Binary.accepts(&ColumnValue::Text(String::new())));
    }
}
