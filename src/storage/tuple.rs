//! Tuples, fields, and record layout.
//!
//! A table's record layout is fixed: every tuple of a table occupies the
//! same number of bytes, which is what lets a heap page compute its slot
//! count up front. Two field types are supported:
//! - `Int` - 4-byte little-endian signed integer
//! - `Text` - 4-byte length prefix plus [`TEXT_LEN`] content bytes

use std::fmt;

use crate::common::config::TEXT_LEN;
use crate::common::{Error, PageId, Result};

/// The type of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Text,
}

impl FieldType {
    /// On-page size of a field of this type.
    #[inline]
    pub fn byte_len(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Text => 4 + TEXT_LEN,
        }
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Int(i32),
    Text(String),
}

impl Field {
    /// The type this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Text(_) => FieldType::Text,
        }
    }

    /// Serialize into `buf`, which must be exactly `field_type().byte_len()`
    /// bytes long.
    fn write_to(&self, buf: &mut [u8]) {
        match self {
            Field::Int(v) => buf.copy_from_slice(&v.to_le_bytes()),
            Field::Text(s) => {
                let bytes = s.as_bytes();
                let len = bytes.len().min(TEXT_LEN);
                buf[..4].copy_from_slice(&(len as u32).to_le_bytes());
                buf[4..4 + len].copy_from_slice(&bytes[..len]);
                buf[4 + len..].fill(0);
            }
        }
    }

    /// Deserialize a field of type `ty` from `buf`.
    fn read_from(ty: FieldType, buf: &[u8]) -> Result<Field> {
        match ty {
            FieldType::Int => {
                let v = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                Ok(Field::Int(v))
            }
            FieldType::Text => {
                let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
                if len > TEXT_LEN {
                    return Err(Error::Corruption(format!(
                        "text field length {} exceeds maximum {}",
                        len, TEXT_LEN
                    )));
                }
                let s = std::str::from_utf8(&buf[4..4 + len])
                    .map_err(|_| Error::Corruption("text field is not valid UTF-8".into()))?;
                Ok(Field::Text(s.to_string()))
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One column of a schema: a type plus an optional name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: Option<String>,
    pub ty: FieldType,
}

/// The fixed record layout of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema from column types alone.
    pub fn new(types: Vec<FieldType>) -> Self {
        Schema {
            columns: types.into_iter().map(|ty| Column { name: None, ty }).collect(),
        }
    }

    /// Build a schema with named columns.
    pub fn with_names(columns: Vec<(&str, FieldType)>) -> Self {
        Schema {
            columns: columns
                .into_iter()
                .map(|(name, ty)| Column {
                    name: Some(name.to_string()),
                    ty,
                })
                .collect(),
        }
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Total on-page bytes of one tuple.
    pub fn tuple_bytes(&self) -> usize {
        self.columns.iter().map(|c| c.ty.byte_len()).sum()
    }

    /// Type of column `i`.
    pub fn field_type(&self, i: usize) -> FieldType {
        self.columns[i].ty
    }

    /// Name of column `i`, if any.
    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.columns[i].name.as_deref()
    }

    /// Whether `other` has the same column types, ignoring names.
    ///
    /// This is the layout-compatibility check used when routing tuples into
    /// a table.
    pub fn same_types(&self, other: &Schema) -> bool {
        self.len() == other.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.ty == b.ty)
    }
}

/// The stored location of a tuple: which page, which slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page: PageId,
    pub slot: usize,
}

/// A tuple: field values plus, once stored, its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(fields: Vec<Field>) -> Self {
        Tuple {
            fields,
            record_id: None,
        }
    }

    #[inline]
    pub fn field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Where this tuple lives on disk, if it has been stored.
    #[inline]
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub(crate) fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    /// Whether this tuple's field types match `schema`.
    pub fn matches(&self, schema: &Schema) -> bool {
        self.fields.len() == schema.len()
            && self
                .fields
                .iter()
                .enumerate()
                .all(|(i, f)| f.field_type() == schema.field_type(i))
    }

    /// Serialize into `buf`, which must be exactly `schema.tuple_bytes()`
    /// bytes long. The record id is not part of the on-page representation;
    /// it is implied by the slot the bytes occupy.
    pub fn write_to(&self, schema: &Schema, buf: &mut [u8]) {
        debug_assert_eq!(buf.len(), schema.tuple_bytes());
        let mut off = 0;
        for (i, field) in self.fields.iter().enumerate() {
            let len = schema.field_type(i).byte_len();
            field.write_to(&mut buf[off..off + len]);
            off += len;
        }
    }

    /// Deserialize a tuple laid out per `schema` from `buf`.
    pub fn read_from(schema: &Schema, buf: &[u8]) -> Result<Tuple> {
        let mut fields = Vec::with_capacity(schema.len());
        let mut off = 0;
        for i in 0..schema.len() {
            let ty = schema.field_type(i);
            let len = ty.byte_len();
            fields.push(Field::read_from(ty, &buf[off..off + len])?);
            off += len;
        }
        Ok(Tuple::new(fields))
    }
}
