//! Fixed-layout big-endian record decoding
//!
//! Every MDV header is a flat sequence of 32-bit integers, 32-bit floats and
//! NUL-padded character blocks. A header kind is described once by a static
//! [`RecordLayout`]; reading consumes exactly [`RecordLayout::byte_len`] bytes
//! and yields a name→value map that the typed header structs are built from.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use super::error::MdvError;

/// Storage type of a single layout entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Signed 32-bit integer
    Si32,
    /// Unsigned 32-bit integer
    Ui32,
    /// IEEE 32-bit float
    Fl32,
    /// Fixed-length character block, NUL padded
    Char,
}

/// One named entry of a record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Entry name, used as the key in [`RecordValues`]
    pub name: &'static str,
    /// Storage type
    pub kind: Kind,
    /// Number of elements (characters for [`Kind::Char`])
    pub count: usize,
}

impl FieldSpec {
    /// Single signed integer
    pub const fn si32(name: &'static str) -> Self {
        Self::array(name, Kind::Si32, 1)
    }

    /// Signed integer array
    pub const fn si32s(name: &'static str, count: usize) -> Self {
        Self::array(name, Kind::Si32, count)
    }

    /// Single unsigned integer
    pub const fn ui32(name: &'static str) -> Self {
        Self::array(name, Kind::Ui32, 1)
    }

    /// Single float
    pub const fn fl32(name: &'static str) -> Self {
        Self::array(name, Kind::Fl32, 1)
    }

    /// Float array
    pub const fn fl32s(name: &'static str, count: usize) -> Self {
        Self::array(name, Kind::Fl32, count)
    }

    /// Character block of `len` bytes
    pub const fn chars(name: &'static str, len: usize) -> Self {
        Self::array(name, Kind::Char, len)
    }

    const fn array(name: &'static str, kind: Kind, count: usize) -> Self {
        Self { name, kind, count }
    }

    /// Bytes occupied on disk
    pub const fn byte_len(&self) -> usize {
        match self.kind {
            Kind::Char => self.count,
            Kind::Si32 | Kind::Ui32 | Kind::Fl32 => 4 * self.count,
        }
    }
}

/// Declarative description of a fixed-size record
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    /// Record name, used in error messages
    pub name: &'static str,
    /// Entries in on-disk order
    pub fields: &'static [FieldSpec],
}

impl RecordLayout {
    /// Create a layout from its entries
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { name, fields }
    }

    /// Total record size in bytes
    pub const fn byte_len(&self) -> usize {
        let mut total = 0;
        let mut i = 0;
        while i < self.fields.len() {
            total += self.fields[i].byte_len();
            i += 1;
        }
        total
    }

    /// Read exactly one record from `reader`.
    ///
    /// A short read is reported as [`MdvError::Truncated`]; the record is never padded.
    pub fn read<R: Read>(&self, reader: &mut R) -> Result<RecordValues, MdvError> {
        let bytes = read_exact_bytes(reader, self.byte_len(), self.name)?;
        self.decode(&bytes)
    }

    /// Decode one record from an in-memory buffer
    pub fn decode(&self, bytes: &[u8]) -> Result<RecordValues, MdvError> {
        let expected = self.byte_len();
        if bytes.len() < expected {
            return Err(MdvError::Truncated {
                record: self.name.to_string(),
                expected,
                available: bytes.len(),
            });
        }

        let mut cursor = Cursor::new(&bytes[..expected]);
        let mut values = HashMap::with_capacity(self.fields.len());

        for spec in self.fields {
            let value = match (spec.kind, spec.count) {
                (Kind::Char, len) => {
                    let start = cursor.position() as usize;
                    let block = &bytes[start..start + len];
                    cursor.set_position((start + len) as u64);
                    Value::Text(nul_terminated(block))
                }
                (Kind::Si32, 1) => Value::Int(cursor.read_i32::<BigEndian>()? as i64),
                (Kind::Ui32, 1) => Value::Int(cursor.read_u32::<BigEndian>()? as i64),
                (Kind::Fl32, 1) => Value::Float(cursor.read_f32::<BigEndian>()? as f64),
                (Kind::Si32, n) => {
                    let mut out = Vec::with_capacity(n);
                    for _ in 0..n {
                        out.push(cursor.read_i32::<BigEndian>()? as i64);
                    }
                    Value::Ints(out)
                }
                (Kind::Ui32, n) => {
                    let mut out = Vec::with_capacity(n);
                    for _ in 0..n {
                        out.push(cursor.read_u32::<BigEndian>()? as i64);
                    }
                    Value::Ints(out)
                }
                (Kind::Fl32, n) => {
                    let mut out = Vec::with_capacity(n);
                    for _ in 0..n {
                        out.push(cursor.read_f32::<BigEndian>()? as f64);
                    }
                    Value::Floats(out)
                }
            };
            values.insert(spec.name, value);
        }

        Ok(RecordValues {
            record: self.name,
            values,
        })
    }
}

impl RecordLayout {
    /// Encode one record, zero-filling entries absent from `values`.
    ///
    /// Scalars and arrays are accepted interchangeably; arrays shorter than the
    /// layout count are zero-padded and text is truncated to the block length.
    pub fn encode(&self, values: &[(&str, Value)]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for spec in self.fields {
            let value = values
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, value)| value);
            match spec.kind {
                Kind::Char => {
                    let mut block = vec![0u8; spec.count];
                    if let Some(Value::Text(text)) = value {
                        let len = text.len().min(spec.count);
                        block[..len].copy_from_slice(&text.as_bytes()[..len]);
                    }
                    out.extend_from_slice(&block);
                }
                Kind::Si32 | Kind::Ui32 => {
                    let ints = value.map(Value::to_ints).unwrap_or_default();
                    for i in 0..spec.count {
                        let v = ints.get(i).copied().unwrap_or(0);
                        if spec.kind == Kind::Si32 {
                            out.extend_from_slice(&(v as i32).to_be_bytes());
                        } else {
                            out.extend_from_slice(&(v as u32).to_be_bytes());
                        }
                    }
                }
                Kind::Fl32 => {
                    let floats = value.map(Value::to_floats).unwrap_or_default();
                    for i in 0..spec.count {
                        let v = floats.get(i).copied().unwrap_or(0.0);
                        out.extend_from_slice(&(v as f32).to_be_bytes());
                    }
                }
            }
        }
        out
    }
}

/// A decoded layout entry
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Scalar integer (signed or unsigned source)
    Int(i64),
    /// Scalar float
    Float(f64),
    /// Integer array
    Ints(Vec<i64>),
    /// Float array
    Floats(Vec<f64>),
    /// Character block up to the first NUL
    Text(String),
}

impl Value {
    fn to_ints(&self) -> Vec<i64> {
        match self {
            Value::Int(v) => vec![*v],
            Value::Float(v) => vec![*v as i64],
            Value::Ints(v) => v.clone(),
            Value::Floats(v) => v.iter().map(|&f| f as i64).collect(),
            Value::Text(_) => Vec::new(),
        }
    }

    fn to_floats(&self) -> Vec<f64> {
        match self {
            Value::Int(v) => vec![*v as f64],
            Value::Float(v) => vec![*v],
            Value::Ints(v) => v.iter().map(|&i| i as f64).collect(),
            Value::Floats(v) => v.clone(),
            Value::Text(_) => Vec::new(),
        }
    }
}

/// Name→value map produced by [`RecordLayout::read`]
#[derive(Debug, Clone)]
pub struct RecordValues {
    record: &'static str,
    values: HashMap<&'static str, Value>,
}

impl RecordValues {
    /// Raw access to an entry
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Scalar integer entry
    pub fn int(&self, name: &str) -> Result<i64, MdvError> {
        match self.values.get(name) {
            Some(Value::Int(v)) => Ok(*v),
            _ => Err(self.missing(name, "integer")),
        }
    }

    /// Scalar integer entry narrowed to `i32`
    pub fn i32(&self, name: &str) -> Result<i32, MdvError> {
        let v = self.int(name)?;
        i32::try_from(v).map_err(|_| {
            MdvError::InvalidHeader(format!("{}.{} out of range: {}", self.record, name, v))
        })
    }

    /// Scalar integer entry narrowed to `u32`
    pub fn u32(&self, name: &str) -> Result<u32, MdvError> {
        let v = self.int(name)?;
        u32::try_from(v).map_err(|_| {
            MdvError::InvalidHeader(format!("{}.{} out of range: {}", self.record, name, v))
        })
    }

    /// Scalar float entry
    pub fn float(&self, name: &str) -> Result<f64, MdvError> {
        match self.values.get(name) {
            Some(Value::Float(v)) => Ok(*v),
            _ => Err(self.missing(name, "float")),
        }
    }

    /// Scalar float entry as `f32`
    pub fn f32(&self, name: &str) -> Result<f32, MdvError> {
        self.float(name).map(|v| v as f32)
    }

    /// Integer array entry
    pub fn ints(&self, name: &str) -> Result<&[i64], MdvError> {
        match self.values.get(name) {
            Some(Value::Ints(v)) => Ok(v),
            _ => Err(self.missing(name, "integer array")),
        }
    }

    /// Float array entry
    pub fn floats(&self, name: &str) -> Result<&[f64], MdvError> {
        match self.values.get(name) {
            Some(Value::Floats(v)) => Ok(v),
            _ => Err(self.missing(name, "float array")),
        }
    }

    /// Text entry
    pub fn text(&self, name: &str) -> Result<&str, MdvError> {
        match self.values.get(name) {
            Some(Value::Text(v)) => Ok(v),
            _ => Err(self.missing(name, "text")),
        }
    }

    fn missing(&self, name: &str, kind: &str) -> MdvError {
        MdvError::InvalidHeader(format!("{} has no {} entry '{}'", self.record, kind, name))
    }
}

/// A typed record produced from a fixed layout
pub trait BinaryRecord: Sized {
    /// On-disk layout of the record
    const LAYOUT: RecordLayout;

    /// Build the typed record from decoded values
    fn from_values(values: &RecordValues) -> Result<Self, MdvError>;

    /// Read and decode one record
    fn read_from<R: Read>(reader: &mut R) -> Result<Self, MdvError> {
        let values = Self::LAYOUT.read(reader)?;
        Self::from_values(&values)
    }
}

/// Read exactly `len` bytes, reporting a short read as `Truncated`.
pub(crate) fn read_exact_bytes<R: Read>(
    reader: &mut R,
    len: usize,
    record: &str,
) -> Result<Vec<u8>, MdvError> {
    // Lengths come from the file; don't trust them for the allocation.
    let mut bytes = Vec::with_capacity(len.min(1 << 20));
    reader.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() < len {
        return Err(MdvError::Truncated {
            record: record.to_string(),
            expected: len,
            available: bytes.len(),
        });
    }
    Ok(bytes)
}

fn nul_terminated(block: &[u8]) -> String {
    let end = block.iter().position(|&b| b == 0).unwrap_or(block.len());
    String::from_utf8_lossy(&block[..end]).into_owned()
}
