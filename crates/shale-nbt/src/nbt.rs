use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// NBT tag type IDs.
pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Maximum nesting depth accepted when decoding.
const MAX_DEPTH: usize = 32;
/// Maximum element count accepted for any list or array.
const MAX_LEN: i32 = 1 << 21;

/// The two NBT encodings Bedrock uses on the wire and on disk.
///
/// `LittleEndian` is the persistent format: fixed-width little-endian
/// numbers. `NetworkLittleEndian` is the network format: varuint string
/// lengths and zigzag varints for ints, longs and lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    LittleEndian,
    NetworkLittleEndian,
}

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("unexpected end of NBT data")]
    UnexpectedEof,
    #[error("unknown NBT tag {0}")]
    UnknownTag(u8),
    #[error("NBT nesting deeper than {MAX_DEPTH}")]
    DepthLimit,
    #[error("NBT length {0} out of bounds")]
    LengthOutOfBounds(i32),
    #[error("NBT varint too big")]
    VarIntTooBig,
}

pub type NbtResult<T> = Result<T, NbtError>;

/// An NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn tag_id(&self) -> u8 {
        match self {
            NbtValue::Byte(_) => TAG_BYTE,
            NbtValue::Short(_) => TAG_SHORT,
            NbtValue::Int(_) => TAG_INT,
            NbtValue::Long(_) => TAG_LONG,
            NbtValue::Float(_) => TAG_FLOAT,
            NbtValue::Double(_) => TAG_DOUBLE,
            NbtValue::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtValue::String(_) => TAG_STRING,
            NbtValue::List(_) => TAG_LIST,
            NbtValue::Compound(_) => TAG_COMPOUND,
            NbtValue::IntArray(_) => TAG_INT_ARRAY,
            NbtValue::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Look up an entry of a compound by name.
    pub fn get(&self, name: &str) -> Option<&NbtValue> {
        match self {
            NbtValue::Compound(entries) => entries
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Insert or replace an entry of a compound.
    pub fn insert(&mut self, name: impl Into<String>, value: NbtValue) {
        if let NbtValue::Compound(entries) = self {
            let name = name.into();
            if let Some(entry) = entries.iter_mut().find(|(n, _)| *n == name) {
                entry.1 = value;
            } else {
                entries.push((name, value));
            }
        }
    }

    /// Remove an entry of a compound by name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<NbtValue> {
        if let NbtValue::Compound(entries) = self {
            if let Some(pos) = entries.iter().position(|(n, _)| n == name) {
                return Some(entries.remove(pos).1);
            }
        }
        None
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NbtValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Write this value as a named root tag.
    pub fn write_root(&self, name: &str, buf: &mut BytesMut, enc: Encoding) {
        buf.put_u8(self.tag_id());
        write_string(name, buf, enc);
        self.write_payload(buf, enc);
    }

    /// Write just the payload (no tag type or name).
    pub fn write_payload(&self, buf: &mut BytesMut, enc: Encoding) {
        match self {
            NbtValue::Byte(v) => buf.put_i8(*v),
            NbtValue::Short(v) => buf.put_i16_le(*v),
            NbtValue::Int(v) => write_i32(*v, buf, enc),
            NbtValue::Long(v) => write_i64(*v, buf, enc),
            NbtValue::Float(v) => buf.put_f32_le(*v),
            NbtValue::Double(v) => buf.put_f64_le(*v),
            NbtValue::ByteArray(v) => {
                write_i32(v.len() as i32, buf, enc);
                for b in v {
                    buf.put_i8(*b);
                }
            }
            NbtValue::String(v) => write_string(v, buf, enc),
            NbtValue::List(v) => {
                let elem_tag = v.first().map_or(TAG_END, NbtValue::tag_id);
                buf.put_u8(elem_tag);
                write_i32(v.len() as i32, buf, enc);
                for item in v {
                    item.write_payload(buf, enc);
                }
            }
            NbtValue::Compound(entries) => {
                for (name, value) in entries {
                    buf.put_u8(value.tag_id());
                    write_string(name, buf, enc);
                    value.write_payload(buf, enc);
                }
                buf.put_u8(TAG_END);
            }
            NbtValue::IntArray(v) => {
                write_i32(v.len() as i32, buf, enc);
                for i in v {
                    write_i32(*i, buf, enc);
                }
            }
            NbtValue::LongArray(v) => {
                write_i32(v.len() as i32, buf, enc);
                for l in v {
                    write_i64(*l, buf, enc);
                }
            }
        }
    }

    /// Read a named root tag, returning its name and value.
    pub fn read_root(buf: &mut BytesMut, enc: Encoding) -> NbtResult<(String, NbtValue)> {
        if !buf.has_remaining() {
            return Err(NbtError::UnexpectedEof);
        }
        let tag = buf.get_u8();
        let name = read_string(buf, enc)?;
        let value = read_payload(tag, buf, enc, 0)?;
        Ok((name, value))
    }
}

fn read_payload(tag: u8, buf: &mut BytesMut, enc: Encoding, depth: usize) -> NbtResult<NbtValue> {
    if depth > MAX_DEPTH {
        return Err(NbtError::DepthLimit);
    }
    Ok(match tag {
        TAG_BYTE => NbtValue::Byte(read_exact(buf, 1)?.get_i8()),
        TAG_SHORT => NbtValue::Short(read_exact(buf, 2)?.get_i16_le()),
        TAG_INT => NbtValue::Int(read_i32(buf, enc)?),
        TAG_LONG => NbtValue::Long(read_i64(buf, enc)?),
        TAG_FLOAT => NbtValue::Float(read_exact(buf, 4)?.get_f32_le()),
        TAG_DOUBLE => NbtValue::Double(read_exact(buf, 8)?.get_f64_le()),
        TAG_BYTE_ARRAY => {
            let len = read_len(buf, enc)?;
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                out.push(read_exact(buf, 1)?.get_i8());
            }
            NbtValue::ByteArray(out)
        }
        TAG_STRING => NbtValue::String(read_string(buf, enc)?),
        TAG_LIST => {
            let elem_tag = read_exact(buf, 1)?.get_u8();
            let len = read_len(buf, enc)?;
            if elem_tag == TAG_END && len > 0 {
                return Err(NbtError::UnknownTag(TAG_END));
            }
            let mut out = Vec::with_capacity(len.min(256));
            for _ in 0..len {
                out.push(read_payload(elem_tag, buf, enc, depth + 1)?);
            }
            NbtValue::List(out)
        }
        TAG_COMPOUND => {
            let mut entries = Vec::new();
            loop {
                if !buf.has_remaining() {
                    return Err(NbtError::UnexpectedEof);
                }
                let tag = buf.get_u8();
                if tag == TAG_END {
                    break;
                }
                let name = read_string(buf, enc)?;
                let value = read_payload(tag, buf, enc, depth + 1)?;
                entries.push((name, value));
            }
            NbtValue::Compound(entries)
        }
        TAG_INT_ARRAY => {
            let len = read_len(buf, enc)?;
            let mut out = Vec::with_capacity(len.min(256));
            for _ in 0..len {
                out.push(read_i32(buf, enc)?);
            }
            NbtValue::IntArray(out)
        }
        TAG_LONG_ARRAY => {
            let len = read_len(buf, enc)?;
            let mut out = Vec::with_capacity(len.min(256));
            for _ in 0..len {
                out.push(read_i64(buf, enc)?);
            }
            NbtValue::LongArray(out)
        }
        other => return Err(NbtError::UnknownTag(other)),
    })
}

// === Encoding-dependent primitives ===

fn read_exact<'a>(buf: &'a mut BytesMut, n: usize) -> NbtResult<&'a mut BytesMut> {
    if buf.remaining() < n {
        return Err(NbtError::UnexpectedEof);
    }
    Ok(buf)
}

fn write_i32(value: i32, buf: &mut BytesMut, enc: Encoding) {
    match enc {
        Encoding::LittleEndian => buf.put_i32_le(value),
        Encoding::NetworkLittleEndian => write_zigzag32(value, buf),
    }
}

fn read_i32(buf: &mut BytesMut, enc: Encoding) -> NbtResult<i32> {
    match enc {
        Encoding::LittleEndian => Ok(read_exact(buf, 4)?.get_i32_le()),
        Encoding::NetworkLittleEndian => read_zigzag32(buf),
    }
}

fn write_i64(value: i64, buf: &mut BytesMut, enc: Encoding) {
    match enc {
        Encoding::LittleEndian => buf.put_i64_le(value),
        Encoding::NetworkLittleEndian => {
            write_varu64(((value << 1) ^ (value >> 63)) as u64, buf)
        }
    }
}

fn read_i64(buf: &mut BytesMut, enc: Encoding) -> NbtResult<i64> {
    match enc {
        Encoding::LittleEndian => Ok(read_exact(buf, 8)?.get_i64_le()),
        Encoding::NetworkLittleEndian => {
            let raw = read_varu64(buf)?;
            Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
        }
    }
}

fn read_len(buf: &mut BytesMut, enc: Encoding) -> NbtResult<usize> {
    let len = read_i32(buf, enc)?;
    if !(0..=MAX_LEN).contains(&len) {
        return Err(NbtError::LengthOutOfBounds(len));
    }
    Ok(len as usize)
}

fn write_string(s: &str, buf: &mut BytesMut, enc: Encoding) {
    match enc {
        Encoding::LittleEndian => {
            buf.put_u16_le(s.len() as u16);
        }
        Encoding::NetworkLittleEndian => {
            write_varu64(s.len() as u64, buf);
        }
    }
    buf.put_slice(s.as_bytes());
}

fn read_string(buf: &mut BytesMut, enc: Encoding) -> NbtResult<String> {
    let len = match enc {
        Encoding::LittleEndian => read_exact(buf, 2)?.get_u16_le() as usize,
        Encoding::NetworkLittleEndian => {
            let len = read_varu64(buf)?;
            if len > MAX_LEN as u64 {
                return Err(NbtError::LengthOutOfBounds(len as i32));
            }
            len as usize
        }
    };
    if buf.remaining() < len {
        return Err(NbtError::UnexpectedEof);
    }
    let bytes = buf.split_to(len);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_zigzag32(value: i32, buf: &mut BytesMut) {
    write_varu64(((value << 1) ^ (value >> 31)) as u32 as u64, buf);
}

fn read_zigzag32(buf: &mut BytesMut) -> NbtResult<i32> {
    let raw = read_varu64(buf)? as u32;
    Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
}

fn write_varu64(mut value: u64, buf: &mut BytesMut) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

fn read_varu64(buf: &mut BytesMut) -> NbtResult<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(NbtError::UnexpectedEof);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 70 {
            return Err(NbtError::VarIntTooBig);
        }
    }
}

/// Helper macro for building compound tags.
#[macro_export]
macro_rules! nbt_compound {
    ($($key:expr => $val:expr),* $(,)?) => {
        $crate::NbtValue::Compound(vec![
            $(($key.into(), $val)),*
        ])
    };
}
