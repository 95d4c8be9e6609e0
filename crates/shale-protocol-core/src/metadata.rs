use std::collections::BTreeMap;

use bytes::BytesMut;
use shale_nbt::{Encoding, NbtValue};
use shale_types::{BlockPos, Vec3};

use crate::codec::{
    check_len, read_block_pos, read_f32, read_string, read_varu32, read_vari32, read_vari64,
    read_vec3, write_block_pos, write_f32, write_string, write_varu32, write_vari32, write_vari64,
    write_vec3, CodecError, CodecResult, MAX_STRING_LEN,
};

/// Key of the first 64-bit packed flag word.
pub const DATA_KEY_FLAGS: u32 = 0;

/// Latest-layout entity data keys that differ from the legacy compact range.
/// The legacy counterparts live in the version crate's translation table.
pub mod data_key {
    pub const RADIUS: u32 = 61;
    pub const WAITING: u32 = 62;
    pub const PARTICLE: u32 = 63;
    pub const ATTACH_FACE: u32 = 65;
    pub const ATTACHED_POSITION: u32 = 67;
    pub const TRADE_TARGET: u32 = 68;
    pub const COMMAND_NAME: u32 = 71;
    pub const LAST_COMMAND_OUTPUT: u32 = 72;
    pub const TRACK_COMMAND_OUTPUT: u32 = 73;
    pub const CONTROLLING_SEAT_INDEX: u32 = 74;
    pub const STRENGTH: u32 = 75;
    pub const STRENGTH_MAX: u32 = 76;
    pub const LIFETIME_TICKS: u32 = 78;
    pub const POSE_INDEX: u32 = 79;
    pub const TICK_OFFSET: u32 = 80;
    pub const ALWAYS_SHOW_NAME_TAG: u32 = 81;
    pub const COLOR_TWO_INDEX: u32 = 82;
    pub const SCORE: u32 = 84;
    pub const BALLOON_ANCHOR: u32 = 85;
    pub const PUFFED_STATE: u32 = 86;
    pub const BUBBLE_TIME: u32 = 87;
    pub const AGENT: u32 = 88;
    pub const EATING_COUNTER: u32 = 91;
    pub const FLAGS_TWO: u32 = 92;
    pub const DURATION: u32 = 96;
    pub const SPAWN_TIME: u32 = 97;
    pub const CHANGE_RATE: u32 = 98;
    pub const CHANGE_ON_PICKUP: u32 = 99;
    pub const PICKUP_COUNT: u32 = 100;
    pub const INTERACT_TEXT: u32 = 101;
    pub const TRADE_TIER: u32 = 102;
    pub const MAX_TRADE_TIER: u32 = 103;
    pub const TRADE_EXPERIENCE: u32 = 104;
    pub const SKIN_ID: u32 = 105;
    pub const COMMAND_BLOCK_TICK_DELAY: u32 = 106;
    pub const COMMAND_BLOCK_EXECUTE_ON_FIRST_TICK: u32 = 107;
    pub const AMBIENT_SOUND_INTERVAL: u32 = 108;
    pub const AMBIENT_SOUND_INTERVAL_RANGE: u32 = 109;
    pub const AMBIENT_SOUND_EVENT_NAME: u32 = 110;
}

// Wire type tags for metadata values.
const TYPE_BYTE: u32 = 0;
const TYPE_SHORT: u32 = 1;
const TYPE_INT: u32 = 2;
const TYPE_FLOAT: u32 = 3;
const TYPE_STRING: u32 = 4;
const TYPE_NBT: u32 = 5;
const TYPE_BLOCK_POS: u32 = 6;
const TYPE_LONG: u32 = 7;
const TYPE_VEC3: u32 = 8;

/// A single replicated entity data value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Float(f32),
    String(String),
    Nbt(NbtValue),
    BlockPos(BlockPos),
    Long(i64),
    Vec3(Vec3),
}

/// Replicated entity state, keyed by the version-specific data key space.
pub type EntityMetadataMap = BTreeMap<u32, MetadataValue>;

/// Read an entity metadata map. The entry layout is shared between the
/// supported versions; only the key spaces differ.
pub fn read_metadata(buf: &mut BytesMut) -> CodecResult<EntityMetadataMap> {
    let count = check_len(read_varu32(buf)? as u64, 4096, "entity metadata")?;
    let mut map = EntityMetadataMap::new();
    for _ in 0..count {
        let key = read_varu32(buf)?;
        let type_tag = read_varu32(buf)?;
        let value = match type_tag {
            TYPE_BYTE => MetadataValue::Byte(crate::codec::read_u8(buf)? as i8),
            TYPE_SHORT => MetadataValue::Short(crate::codec::read_i16(buf)?),
            TYPE_INT => MetadataValue::Int(read_vari32(buf)?),
            TYPE_FLOAT => MetadataValue::Float(read_f32(buf)?),
            TYPE_STRING => MetadataValue::String(read_string(buf, MAX_STRING_LEN)?),
            TYPE_NBT => {
                let (_, nbt) = NbtValue::read_root(buf, Encoding::NetworkLittleEndian)?;
                MetadataValue::Nbt(nbt)
            }
            TYPE_BLOCK_POS => MetadataValue::BlockPos(read_block_pos(buf)?),
            TYPE_LONG => MetadataValue::Long(read_vari64(buf)?),
            TYPE_VEC3 => MetadataValue::Vec3(read_vec3(buf)?),
            other => {
                return Err(CodecError::UnknownEnumTag {
                    value: other as u64,
                    field: "entity metadata type",
                })
            }
        };
        map.insert(key, value);
    }
    Ok(map)
}

pub fn write_metadata(buf: &mut BytesMut, map: &EntityMetadataMap) {
    write_varu32(buf, map.len() as u32);
    for (key, value) in map {
        write_varu32(buf, *key);
        match value {
            MetadataValue::Byte(v) => {
                write_varu32(buf, TYPE_BYTE);
                crate::codec::write_u8(buf, *v as u8);
            }
            MetadataValue::Short(v) => {
                write_varu32(buf, TYPE_SHORT);
                crate::codec::write_i16(buf, *v);
            }
            MetadataValue::Int(v) => {
                write_varu32(buf, TYPE_INT);
                write_vari32(buf, *v);
            }
            MetadataValue::Float(v) => {
                write_varu32(buf, TYPE_FLOAT);
                write_f32(buf, *v);
            }
            MetadataValue::String(v) => {
                write_varu32(buf, TYPE_STRING);
                write_string(buf, v);
            }
            MetadataValue::Nbt(v) => {
                write_varu32(buf, TYPE_NBT);
                v.write_root("", buf, Encoding::NetworkLittleEndian);
            }
            MetadataValue::BlockPos(v) => {
                write_varu32(buf, TYPE_BLOCK_POS);
                write_block_pos(buf, v);
            }
            MetadataValue::Long(v) => {
                write_varu32(buf, TYPE_LONG);
                write_vari64(buf, *v);
            }
            MetadataValue::Vec3(v) => {
                write_varu32(buf, TYPE_VEC3);
                write_vec3(buf, v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_roundtrip() {
        let mut map = EntityMetadataMap::new();
        map.insert(DATA_KEY_FLAGS, MetadataValue::Long(0b1011));
        map.insert(data_key::SCORE, MetadataValue::String("12".into()));
        map.insert(data_key::RADIUS, MetadataValue::Float(2.5));
        map.insert(
            data_key::BALLOON_ANCHOR,
            MetadataValue::BlockPos(BlockPos::new(1, -2, 3)),
        );

        let mut buf = BytesMut::new();
        write_metadata(&mut buf, &map);
        let decoded = read_metadata(&mut buf).unwrap();
        assert_eq!(decoded, map);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_metadata_unknown_type_tag() {
        let mut buf = BytesMut::new();
        write_varu32(&mut buf, 1);
        write_varu32(&mut buf, 0); // key
        write_varu32(&mut buf, 99); // bogus type
        assert!(matches!(
            read_metadata(&mut buf),
            Err(CodecError::UnknownEnumTag { value: 99, .. })
        ));
    }
}
