use bytes::BytesMut;
use shale_nbt::{Encoding, NbtValue};
use shale_types::{ItemInstance, ItemStack, ItemType};

use shale_protocol_core::{
    check_len, read_i16, read_u8, read_string, read_vari32, read_vari64, validate_instance,
    write_i16, write_u8, write_string, write_vari32, write_vari64, CodecError, CodecResult,
    ItemDescriptor, ItemDescriptorCount, ItemIo, SessionContext, MAX_STRING_LEN,
};

/// NBT marker: a versioned network-encoded compound follows.
const NBT_MARKER_VERSIONED: i16 = -1;

/// Item wire codec of the legacy version. Count and metadata share one
/// auxiliary varint and there is no sub-buffer around the extra data.
pub struct LegacyItemIo {
    shield_network_id: i32,
}

impl LegacyItemIo {
    pub fn new(shield_network_id: i32) -> Self {
        Self { shield_network_id }
    }
}

fn read_block_name_list(buf: &mut BytesMut) -> CodecResult<Vec<String>> {
    let count = read_vari32(buf)?;
    let count = check_len(count.max(0) as u64, 1024, "block name list")?;
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        names.push(read_string(buf, MAX_STRING_LEN)?);
    }
    Ok(names)
}

fn write_block_name_list(buf: &mut BytesMut, names: &[String]) {
    write_vari32(buf, names.len() as i32);
    for name in names {
        write_string(buf, name);
    }
}

impl ItemIo for LegacyItemIo {
    fn read_item_stack(&self, buf: &mut BytesMut, _ctx: &SessionContext) -> CodecResult<ItemStack> {
        let network_id = read_vari32(buf)?;
        if network_id == 0 {
            return Ok(ItemStack::empty());
        }
        let aux = read_vari32(buf)?;
        let count = (aux & 0xff) as u16;
        let metadata = (aux >> 8) as u32;

        let marker = read_i16(buf)?;
        let nbt = match marker {
            0 => None,
            NBT_MARKER_VERSIONED => {
                let version = read_u8(buf)?;
                if version != 1 {
                    return Err(CodecError::UnknownEnumTag {
                        value: version as u64,
                        field: "stack NBT version",
                    });
                }
                let (_, value) = NbtValue::read_root(buf, Encoding::NetworkLittleEndian)?;
                Some(value)
            }
            len if len > 0 => {
                let (_, value) = NbtValue::read_root(buf, Encoding::LittleEndian)?;
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
        let can_be_placed_on = read_block_name_list(buf)?;
        let can_break = read_block_name_list(buf)?;
        if network_id == self.shield_network_id {
            let _ = read_vari64(buf)?;
        }

        Ok(ItemStack {
            item_type: ItemType {
                network_id,
                metadata,
            },
            // The legacy layout has no block runtime ID on item stacks.
            block_runtime_id: 0,
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
        let aux = ((stack.item_type.metadata as i32) << 8) | (stack.count as i32 & 0xff);
        write_vari32(buf, aux);
        match &stack.nbt {
            Some(nbt) => {
                write_i16(buf, NBT_MARKER_VERSIONED);
                write_u8(buf, 1);
                nbt.write_root("", buf, Encoding::NetworkLittleEndian);
            }
            None => write_i16(buf, 0),
        }
        write_block_name_list(buf, &stack.can_be_placed_on);
        write_block_name_list(buf, &stack.can_break);
        if stack.item_type.network_id == self.shield_network_id {
            write_vari64(buf, 0);
        }
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
        let network_id = read_vari32(buf)?;
        if network_id == 0 {
            return Ok(ItemDescriptorCount {
                descriptor: ItemDescriptor::Invalid,
                count: 0,
            });
        }
        let metadata = read_vari32(buf)?;
        let count = read_vari32(buf)?;
        Ok(ItemDescriptorCount {
            descriptor: ItemDescriptor::Default {
                network_id: network_id as i16,
                metadata: metadata as i16,
            },
            count,
        })
    }

    fn write_item_descriptor(&self, buf: &mut BytesMut, desc: &ItemDescriptorCount) {
        match &desc.descriptor {
            ItemDescriptor::Default {
                network_id,
                metadata,
            } if *network_id != 0 => {
                write_vari32(buf, *network_id as i32);
                write_vari32(buf, *metadata as i32);
                write_vari32(buf, desc.count);
            }
            // Everything the legacy layout cannot express is an empty slot.
            _ => write_vari32(buf, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shale_nbt::nbt_compound;

    fn ctx() -> SessionContext {
        SessionContext::new(419, 589)
    }

    fn io() -> LegacyItemIo {
        LegacyItemIo::new(513)
    }

    #[test]
    fn test_air_stack_is_one_byte() {
        let mut buf = BytesMut::new();
        io().write_item_stack(&mut buf, &ItemStack::empty(), &ctx());
        assert_eq!(buf.to_vec(), vec![0x00]);
    }

    #[test]
    fn test_aux_packs_metadata_and_count() {
        let stack = ItemStack {
            item_type: ItemType {
                network_id: 351,
                metadata: 4,
            },
            block_runtime_id: 0,
            count: 12,
            nbt: None,
            can_be_placed_on: Vec::new(),
            can_break: Vec::new(),
        };
        let mut buf = BytesMut::new();
        io().write_item_stack(&mut buf, &stack, &ctx());
        let decoded = io().read_item_stack(&mut buf, &ctx()).unwrap();
        assert_eq!(decoded, stack);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_stack_nbt_uses_network_encoding() {
        let stack = ItemStack {
            item_type: ItemType {
                network_id: 276,
                metadata: 0,
            },
            block_runtime_id: 0,
            count: 1,
            nbt: Some(nbt_compound! {
                "Damage" => NbtValue::Int(3),
                "display" => nbt_compound! {
                    "Name" => NbtValue::String("Borrowed Sword".into()),
                },
            }),
            can_be_placed_on: Vec::new(),
            can_break: vec!["minecraft:web".into()],
        };
        let mut buf = BytesMut::new();
        io().write_item_stack(&mut buf, &stack, &ctx());
        assert_eq!(io().read_item_stack(&mut buf, &ctx()).unwrap(), stack);
    }

    #[test]
    fn test_shield_blocking_tick() {
        let shield = ItemStack {
            item_type: ItemType {
                network_id: 513,
                metadata: 0,
            },
            block_runtime_id: 0,
            count: 1,
            nbt: None,
            can_be_placed_on: Vec::new(),
            can_break: Vec::new(),
        };
        let mut buf = BytesMut::new();
        io().write_item_stack(&mut buf, &shield, &ctx());
        assert_eq!(io().read_item_stack(&mut buf, &ctx()).unwrap(), shield);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_phantom_instance_rejected() {
        let mut buf = BytesMut::new();
        write_vari32(&mut buf, 3);
        write_vari32(&mut buf, 0);
        assert!(matches!(
            io().read_item_instance(&mut buf, &ctx()),
            Err(CodecError::InvalidValue { value: 3, .. })
        ));
    }

    #[test]
    fn test_descriptor_flattens_to_default_form() {
        let desc = ItemDescriptorCount {
            descriptor: ItemDescriptor::Default {
                network_id: 280,
                metadata: 0,
            },
            count: 2,
        };
        let mut buf = BytesMut::new();
        io().write_item_descriptor(&mut buf, &desc);
        assert_eq!(io().read_item_descriptor(&mut buf).unwrap(), desc);

        // Forms with no legacy representation collapse to an empty slot.
        let tagged = ItemDescriptorCount {
            descriptor: ItemDescriptor::ItemTag {
                tag: "minecraft:planks".into(),
            },
            count: 1,
        };
        let mut buf = BytesMut::new();
        io().write_item_descriptor(&mut buf, &tagged);
        assert_eq!(
            io().read_item_descriptor(&mut buf).unwrap(),
            ItemDescriptorCount {
                descriptor: ItemDescriptor::Invalid,
                count: 0,
            }
        );
    }
}
