use bytes::{Buf, BufMut, BytesMut};
use shale_nbt::{Encoding, NbtValue};
use shale_types::{ItemInstance, ItemStack, ItemType};

use shale_protocol_core::{
    check_len, read_i16, read_i64, read_u16, read_u32, read_u8, read_string, read_varu32,
    read_vari32, validate_instance, write_i16, write_i64, write_u16, write_u32, write_u8,
    write_string, write_varu32, write_vari32, CodecError, CodecResult, ItemDescriptor,
    ItemDescriptorCount, ItemIo, SessionContext, MAX_STRING_LEN,
};

/// NBT marker inside the stack's extra data: a versioned compound follows.
const NBT_MARKER_VERSIONED: i16 = -1;

/// Item wire codec of the latest version. Extra stack data lives in a
/// length-prefixed sub-buffer after the fixed fields.
pub struct LatestItemIo {
    shield_network_id: i32,
}

impl LatestItemIo {
    pub fn new(shield_network_id: i32) -> Self {
        Self { shield_network_id }
    }
}

fn read_u16_string(buf: &mut BytesMut) -> CodecResult<String> {
    let len = check_len(read_u16(buf)? as u64, MAX_STRING_LEN as u64, "block name")?;
    if buf.remaining() < len {
        return Err(CodecError::NotEnoughData);
    }
    let bytes = buf.split_to(len);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_u16_string(buf: &mut BytesMut, s: &str) {
    write_u16(buf, s.len() as u16);
    buf.put_slice(s.as_bytes());
}

fn read_block_name_list(buf: &mut BytesMut) -> CodecResult<Vec<String>> {
    let count = check_len(read_u32(buf)? as u64, 1024, "block name list")?;
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        names.push(read_u16_string(buf)?);
    }
    Ok(names)
}

fn write_block_name_list(buf: &mut BytesMut, names: &[String]) {
    write_u32(buf, names.len() as u32);
    for name in names {
        write_u16_string(buf, name);
    }
}

impl ItemIo for LatestItemIo {
    fn read_item_stack(&self, buf: &mut BytesMut, _ctx: &SessionContext) -> CodecResult<ItemStack> {
        let network_id = read_vari32(buf)?;
        if network_id == 0 {
            return Ok(ItemStack::empty());
        }
        let count = read_u16(buf)?;
        let metadata = read_varu32(buf)?;
        let block_runtime_id = read_vari32(buf)?;

        let extra_len = check_len(read_varu32(buf)? as u64, 1 << 20, "stack extra data")?;
        if buf.remaining() < extra_len {
            return Err(CodecError::NotEnoughData);
        }
        let mut extra = buf.split_to(extra_len);

        let marker = read_i16(&mut extra)?;
        let nbt = match marker {
            0 => None,
            NBT_MARKER_VERSIONED => {
                let version = read_u8(&mut extra)?;
                if version != 1 {
                    return Err(CodecError::UnknownEnumTag {
                        value: version as u64,
                        field: "stack NBT version",
                    });
                }
                let (_, value) = NbtValue::read_root(&mut extra, Encoding::LittleEndian)?;
                Some(value)
            }
            len if len > 0 => {
                let (_, value) = NbtValue::read_root(&mut extra, Encoding::LittleEndian)?;
                Some(value)
            }
            other => {
                return Err(CodecError::InvalidValue {
                    value: other as i64,
                    field: "stack NBT marker",
                    reason: "negative and not the versioned marker",
                })
            }
        };
        let can_be_placed_on = read_block_name_list(&mut extra)?;
        let can_break = read_block_name_list(&mut extra)?;
        if network_id == self.shield_network_id {
            // Blocking tick; meaningless outside the tick it was sent in.
            let _ = read_i64(&mut extra)?;
        }

        Ok(ItemStack {
            item_type: ItemType {
                network_id,
                metadata,
            },
            block_runtime_id,
            count,
            nbt,
            can_be_placed_on,
            can_break,
        })
    }

    fn write_item_stack(&self, buf: &mut BytesMut, stack: &ItemStack, _ctx: &SessionContext) {
        if stack.is_empty() {
            write_vari32(buf, 0);
            return;
        }
        write_vari32(buf, stack.item_type.network_id);
        write_u16(buf, stack.count);
        write_varu32(buf, stack.item_type.metadata);
        write_vari32(buf, stack.block_runtime_id);

        let mut extra = BytesMut::new();
        match &stack.nbt {
            Some(nbt) => {
                write_i16(&mut extra, NBT_MARKER_VERSIONED);
                write_u8(&mut extra, 1);
                nbt.write_root("", &mut extra, Encoding::LittleEndian);
            }
            None => write_i16(&mut extra, 0),
        }
        write_block_name_list(&mut extra, &stack.can_be_placed_on);
        write_block_name_list(&mut extra, &stack.can_break);
        if stack.item_type.network_id == self.shield_network_id {
            write_i64(&mut extra, 0);
        }
        write_varu32(buf, extra.len() as u32);
        buf.put_slice(&extra);
    }

    fn read_item_instance(
        &self,
        buf: &mut BytesMut,
        ctx: &SessionContext,
    ) -> CodecResult<ItemInstance> {
        let stack_network_id = read_vari32(buf)?;
        let stack = self.read_item_stack(buf, ctx)?;
        let inst = ItemInstance {
            stack_network_id,
            stack,
        };
        validate_instance(&inst)?;
        Ok(inst)
    }

    fn write_item_instance(&self, buf: &mut BytesMut, inst: &ItemInstance, ctx: &SessionContext) {
        write_vari32(buf, inst.stack_network_id);
        self.write_item_stack(buf, &inst.stack, ctx);
    }

    fn read_item_descriptor(&self, buf: &mut BytesMut) -> CodecResult<ItemDescriptorCount> {
        use shale_protocol_core::descriptor_type as t;
        let tag = read_u8(buf)?;
        let descriptor = match tag {
            t::INVALID => ItemDescriptor::Invalid,
            t::DEFAULT => {
                let network_id = read_i16(buf)?;
                let metadata = if network_id != 0 { read_i16(buf)? } else { 0 };
                ItemDescriptor::Default {
                    network_id,
                    metadata,
                }
            }
            t::ITEM_TAG => ItemDescriptor::ItemTag {
                tag: read_string(buf, MAX_STRING_LEN)?,
            },
            t::DEFERRED => ItemDescriptor::Deferred {
                name: read_string(buf, MAX_STRING_LEN)?,
                metadata: read_i16(buf)?,
            },
            t::COMPLEX_ALIAS => ItemDescriptor::ComplexAlias {
                name: read_string(buf, MAX_STRING_LEN)?,
            },
            other => {
                return Err(CodecError::UnknownEnumTag {
                    value: other as u64,
                    field: "item descriptor type",
                })
            }
        };
        let count = read_vari32(buf)?;
        Ok(ItemDescriptorCount { descriptor, count })
    }

    fn write_item_descriptor(&self, buf: &mut BytesMut, desc: &ItemDescriptorCount) {
        write_u8(buf, desc.descriptor.type_tag());
        match &desc.descriptor {
            ItemDescriptor::Invalid => {}
            ItemDescriptor::Default {
                network_id,
                metadata,
            } => {
                write_i16(buf, *network_id);
                if *network_id != 0 {
                    write_i16(buf, *metadata);
                }
            }
            ItemDescriptor::ItemTag { tag } => write_string(buf, tag),
            ItemDescriptor::Deferred { name, metadata } => {
                write_string(buf, name);
                write_i16(buf, *metadata);
            }
            ItemDescriptor::ComplexAlias { name } => write_string(buf, name),
        }
        write_vari32(buf, desc.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shale_nbt::nbt_compound;

    fn ctx() -> SessionContext {
        SessionContext::new(589, 589)
    }

    fn io() -> LatestItemIo {
        LatestItemIo::new(355)
    }

    #[test]
    fn test_air_stack_is_one_byte() {
        let mut buf = BytesMut::new();
        io().write_item_stack(&mut buf, &ItemStack::empty(), &ctx());
        assert_eq!(buf.len(), 1);
        let decoded = io().read_item_stack(&mut buf, &ctx()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_stack_roundtrip_with_nbt_and_lists() {
        let stack = ItemStack {
            item_type: ItemType {
                network_id: 316,
                metadata: 0,
            },
            block_runtime_id: 0,
            count: 1,
            nbt: Some(nbt_compound! {
                "Damage" => NbtValue::Int(12),
            }),
            can_be_placed_on: vec!["minecraft:obsidian".into()],
            can_break: vec!["minecraft:stone".into(), "minecraft:dirt".into()],
        };
        let mut buf = BytesMut::new();
        io().write_item_stack(&mut buf, &stack, &ctx());
        let decoded = io().read_item_stack(&mut buf, &ctx()).unwrap();
        assert_eq!(decoded, stack);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_shield_carries_blocking_tick() {
        let shield = ItemStack {
            item_type: ItemType {
                network_id: 355,
                metadata: 0,
            },
            block_runtime_id: 0,
            count: 1,
            nbt: None,
            can_be_placed_on: Vec::new(),
            can_break: Vec::new(),
        };
        let mut with_shield = BytesMut::new();
        io().write_item_stack(&mut with_shield, &shield, &ctx());

        let mut other = shield.clone();
        other.item_type.network_id = 321;
        let mut without = BytesMut::new();
        io().write_item_stack(&mut without, &other, &ctx());

        // The shield's extra data is 8 bytes longer for the blocking tick.
        assert_eq!(with_shield.len(), without.len() + 8);
        assert_eq!(io().read_item_stack(&mut with_shield, &ctx()).unwrap(), shield);
    }

    #[test]
    fn test_phantom_instance_rejected() {
        let mut buf = BytesMut::new();
        write_vari32(&mut buf, 9); // stack network ID
        write_vari32(&mut buf, 0); // air stack
        assert!(matches!(
            io().read_item_instance(&mut buf, &ctx()),
            Err(CodecError::InvalidValue { value: 9, .. })
        ));
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let descs = [
            ItemDescriptorCount {
                descriptor: ItemDescriptor::Default {
                    network_id: 321,
                    metadata: 0,
                },
                count: 4,
            },
            ItemDescriptorCount {
                descriptor: ItemDescriptor::ItemTag {
                    tag: "minecraft:planks".into(),
                },
                count: 1,
            },
            ItemDescriptorCount {
                descriptor: ItemDescriptor::Invalid,
                count: 0,
            },
        ];
        for desc in &descs {
            let mut buf = BytesMut::new();
            io().write_item_descriptor(&mut buf, desc);
            assert_eq!(&io().read_item_descriptor(&mut buf).unwrap(), desc);
            assert!(buf.is_empty());
        }
    }
}
