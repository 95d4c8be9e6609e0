use bytes::{Buf, BufMut, BytesMut};
use shale_types::{BlockPos, Vec2, Vec3};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while decoding or encoding packet data. Decode violations
/// carry the offending field and value so the transport layer can log and
/// drop a single malformed packet without tearing down the connection.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("varint too big")]
    VarIntTooBig,
    #[error("not enough data")]
    NotEnoughData,
    #[error("string too long: {0} > {1}")]
    StringTooLong(usize, usize),
    #[error("unknown value {value} for {field}")]
    UnknownEnumTag { value: u64, field: &'static str },
    #[error("invalid value {value} for {field}: {reason}")]
    InvalidValue {
        value: i64,
        field: &'static str,
        reason: &'static str,
    },
    #[error("length {len} for {field} exceeds limit {max}")]
    LengthOutOfBounds {
        len: u64,
        max: u64,
        field: &'static str,
    },
    #[error("packet {0} has no representation in this protocol version")]
    UnsupportedPacket(&'static str),
    #[error("NBT error: {0}")]
    Nbt(#[from] shale_nbt::NbtError),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Validate a decoded repetition count before allocating for it.
pub fn check_len(len: u64, max: u64, field: &'static str) -> CodecResult<usize> {
    if len > max {
        return Err(CodecError::LengthOutOfBounds { len, max, field });
    }
    Ok(len as usize)
}

fn ensure(buf: &BytesMut, n: usize) -> CodecResult<()> {
    if buf.remaining() < n {
        return Err(CodecError::NotEnoughData);
    }
    Ok(())
}

// === Fixed-width primitives (Bedrock is little-endian on the wire) ===

pub fn read_u8(buf: &mut BytesMut) -> CodecResult<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn write_u8(buf: &mut BytesMut, v: u8) {
    buf.put_u8(v);
}

pub fn read_bool(buf: &mut BytesMut) -> CodecResult<bool> {
    Ok(read_u8(buf)? != 0)
}

pub fn write_bool(buf: &mut BytesMut, v: bool) {
    buf.put_u8(v as u8);
}

pub fn read_i16(buf: &mut BytesMut) -> CodecResult<i16> {
    ensure(buf, 2)?;
    Ok(buf.get_i16_le())
}

pub fn write_i16(buf: &mut BytesMut, v: i16) {
    buf.put_i16_le(v);
}

pub fn read_u16(buf: &mut BytesMut) -> CodecResult<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16_le())
}

pub fn write_u16(buf: &mut BytesMut, v: u16) {
    buf.put_u16_le(v);
}

pub fn read_u32(buf: &mut BytesMut) -> CodecResult<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32_le())
}

pub fn write_u32(buf: &mut BytesMut, v: u32) {
    buf.put_u32_le(v);
}

pub fn read_i64(buf: &mut BytesMut) -> CodecResult<i64> {
    ensure(buf, 8)?;
    Ok(buf.get_i64_le())
}

pub fn write_i64(buf: &mut BytesMut, v: i64) {
    buf.put_i64_le(v);
}

pub fn read_f32(buf: &mut BytesMut) -> CodecResult<f32> {
    ensure(buf, 4)?;
    Ok(buf.get_f32_le())
}

pub fn write_f32(buf: &mut BytesMut, v: f32) {
    buf.put_f32_le(v);
}

// === Variable-length integers ===

/// Read an unsigned varint of at most 32 bits.
pub fn read_varu32(buf: &mut BytesMut) -> CodecResult<u32> {
    let mut result: u32 = 0;
    let mut shift: u32 = 0;
    loop {
        ensure(buf, 1)?;
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 35 {
            return Err(CodecError::VarIntTooBig);
        }
    }
}

pub fn write_varu32(buf: &mut BytesMut, mut value: u32) {
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

/// Read a zigzag-encoded signed varint of at most 32 bits.
pub fn read_vari32(buf: &mut BytesMut) -> CodecResult<i32> {
    let raw = read_varu32(buf)?;
    Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
}

pub fn write_vari32(buf: &mut BytesMut, value: i32) {
    write_varu32(buf, ((value << 1) ^ (value >> 31)) as u32);
}

pub fn read_varu64(buf: &mut BytesMut) -> CodecResult<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        ensure(buf, 1)?;
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 70 {
            return Err(CodecError::VarIntTooBig);
        }
    }
}

pub fn write_varu64(buf: &mut BytesMut, mut value: u64) {
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

/// Read a zigzag-encoded signed varint of at most 64 bits.
pub fn read_vari64(buf: &mut BytesMut) -> CodecResult<i64> {
    let raw = read_varu64(buf)?;
    Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
}

pub fn write_vari64(buf: &mut BytesMut, value: i64) {
    write_varu64(buf, ((value << 1) ^ (value >> 63)) as u64);
}

/// Byte length of an unsigned varint.
pub fn varu32_len(mut value: u32) -> usize {
    let mut len = 0;
    loop {
        len += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    len
}

// === Compound primitives ===

pub const MAX_STRING_LEN: usize = 32767;

/// Read a varuint-prefixed UTF-8 string.
pub fn read_string(buf: &mut BytesMut, max_len: usize) -> CodecResult<String> {
    let len = read_varu32(buf)? as usize;
    if len > max_len {
        return Err(CodecError::StringTooLong(len, max_len));
    }
    ensure(buf, len)?;
    let bytes = buf.split_to(len);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_string(buf: &mut BytesMut, s: &str) {
    write_varu32(buf, s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Read a varuint-prefixed byte slice.
pub fn read_byte_slice(buf: &mut BytesMut, field: &'static str) -> CodecResult<Vec<u8>> {
    let len = check_len(read_varu32(buf)? as u64, 1 << 22, field)?;
    ensure(buf, len)?;
    Ok(buf.split_to(len).to_vec())
}

pub fn write_byte_slice(buf: &mut BytesMut, data: &[u8]) {
    write_varu32(buf, data.len() as u32);
    buf.put_slice(data);
}

/// Read a UUID (16 raw bytes).
pub fn read_uuid(buf: &mut BytesMut) -> CodecResult<Uuid> {
    ensure(buf, 16)?;
    let mut bytes = [0u8; 16];
    buf.copy_to_slice(&mut bytes);
    Ok(Uuid::from_bytes(bytes))
}

pub fn write_uuid(buf: &mut BytesMut, uuid: &Uuid) {
    buf.put_slice(uuid.as_bytes());
}

pub fn read_vec3(buf: &mut BytesMut) -> CodecResult<Vec3> {
    Ok(Vec3::new(read_f32(buf)?, read_f32(buf)?, read_f32(buf)?))
}

pub fn write_vec3(buf: &mut BytesMut, v: &Vec3) {
    write_f32(buf, v.x);
    write_f32(buf, v.y);
    write_f32(buf, v.z);
}

pub fn read_vec2(buf: &mut BytesMut) -> CodecResult<Vec2> {
    Ok(Vec2::new(read_f32(buf)?, read_f32(buf)?))
}

pub fn write_vec2(buf: &mut BytesMut, v: &Vec2) {
    write_f32(buf, v.x);
    write_f32(buf, v.y);
}

/// Read a block position with an unsigned Y, the layout block placements use.
pub fn read_ublock_pos(buf: &mut BytesMut) -> CodecResult<BlockPos> {
    let x = read_vari32(buf)?;
    let y = read_varu32(buf)? as i32;
    let z = read_vari32(buf)?;
    Ok(BlockPos::new(x, y, z))
}

pub fn write_ublock_pos(buf: &mut BytesMut, pos: &BlockPos) {
    write_vari32(buf, pos.x);
    write_varu32(buf, pos.y as u32);
    write_vari32(buf, pos.z);
}

/// Read a fully signed block position.
pub fn read_block_pos(buf: &mut BytesMut) -> CodecResult<BlockPos> {
    Ok(BlockPos::new(
        read_vari32(buf)?,
        read_vari32(buf)?,
        read_vari32(buf)?,
    ))
}

pub fn write_block_pos(buf: &mut BytesMut, pos: &BlockPos) {
    write_vari32(buf, pos.x);
    write_vari32(buf, pos.y);
    write_vari32(buf, pos.z);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varu32_roundtrip() {
        for value in [0u32, 1, 127, 128, 255, 25565, 2097151, u32::MAX] {
            let mut buf = BytesMut::new();
            write_varu32(&mut buf, value);
            assert_eq!(read_varu32(&mut buf).unwrap(), value);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_vari32_zigzag() {
        // Zigzag: small magnitudes stay small regardless of sign.
        let mut buf = BytesMut::new();
        write_vari32(&mut buf, -1);
        assert_eq!(buf.to_vec(), vec![0x01]);
        assert_eq!(read_vari32(&mut buf).unwrap(), -1);

        for value in [0, 1, -1, i32::MIN, i32::MAX, 419] {
            let mut buf = BytesMut::new();
            write_vari32(&mut buf, value);
            assert_eq!(read_vari32(&mut buf).unwrap(), value);
        }
    }

    #[test]
    fn test_vari64_roundtrip() {
        for value in [0i64, -1, i64::MIN, i64::MAX, 1 << 40] {
            let mut buf = BytesMut::new();
            write_vari64(&mut buf, value);
            assert_eq!(read_vari64(&mut buf).unwrap(), value);
        }
    }

    #[test]
    fn test_varint_overlong_rejected() {
        let mut buf = BytesMut::from(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F][..]);
        assert!(matches!(
            read_varu32(&mut buf),
            Err(CodecError::VarIntTooBig)
        ));
    }

    #[test]
    fn test_string_roundtrip_and_limit() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "minecraft:shield");
        assert_eq!(read_string(&mut buf, MAX_STRING_LEN).unwrap(), "minecraft:shield");

        let mut buf = BytesMut::new();
        write_string(&mut buf, "too long for the cap");
        assert!(matches!(
            read_string(&mut buf, 4),
            Err(CodecError::StringTooLong(_, 4))
        ));
    }

    #[test]
    fn test_block_pos_roundtrip() {
        let pos = BlockPos::new(-30_000_000, 255, 30_000_000);
        let mut buf = BytesMut::new();
        write_ublock_pos(&mut buf, &pos);
        assert_eq!(read_ublock_pos(&mut buf).unwrap(), pos);

        let below = BlockPos::new(1, -64, -1);
        let mut buf = BytesMut::new();
        write_block_pos(&mut buf, &below);
        assert_eq!(read_block_pos(&mut buf).unwrap(), below);
    }

    #[test]
    fn test_check_len_guards_allocation() {
        assert!(check_len(1024, 1024, "stack list").is_ok());
        assert!(matches!(
            check_len(1025, 1024, "stack list"),
            Err(CodecError::LengthOutOfBounds { len: 1025, .. })
        ));
    }

    #[test]
    fn test_truncated_fixed_reads() {
        let mut buf = BytesMut::from(&[0x01][..]);
        assert!(matches!(read_u32(&mut buf), Err(CodecError::NotEnoughData)));
    }
}
