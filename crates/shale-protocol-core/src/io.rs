use bytes::BytesMut;
use shale_types::{ItemInstance, ItemStack};

use crate::codec::{
    check_len, read_bool, read_u8, read_varu32, read_vari32, write_bool, write_u8, write_varu32,
    write_vari32, CodecError, CodecResult,
};
use crate::packets::{stack_request_action_type, StackRequestAction, StackRequestSlotInfo};
use crate::recipe::ItemDescriptorCount;
use crate::session::SessionContext;

/// Per-version codec for the item-shaped wire structures. The two supported
/// versions disagree on every one of these layouts, so the packet and recipe
/// codecs take the version's implementation instead of hard-coding one.
pub trait ItemIo {
    /// Read a bare item stack without a stack network ID.
    fn read_item_stack(&self, buf: &mut BytesMut, ctx: &SessionContext) -> CodecResult<ItemStack>;

    fn write_item_stack(&self, buf: &mut BytesMut, stack: &ItemStack, ctx: &SessionContext);

    /// Read an item instance: a stack network ID followed by the stack.
    /// A non-zero network ID on an empty stack is a decode violation.
    fn read_item_instance(
        &self,
        buf: &mut BytesMut,
        ctx: &SessionContext,
    ) -> CodecResult<ItemInstance>;

    fn write_item_instance(&self, buf: &mut BytesMut, inst: &ItemInstance, ctx: &SessionContext);

    /// Read a recipe ingredient descriptor with its count.
    fn read_item_descriptor(&self, buf: &mut BytesMut) -> CodecResult<ItemDescriptorCount>;

    fn write_item_descriptor(&self, buf: &mut BytesMut, desc: &ItemDescriptorCount);
}

/// Enforce the item instance invariant shared by all versions.
pub fn validate_instance(inst: &ItemInstance) -> CodecResult<()> {
    if inst.stack_network_id != 0 && inst.stack.is_empty() {
        return Err(CodecError::InvalidValue {
            value: inst.stack_network_id as i64,
            field: "stack network ID",
            reason: "non-zero on an empty stack",
        });
    }
    Ok(())
}

fn read_slot_info(buf: &mut BytesMut) -> CodecResult<StackRequestSlotInfo> {
    Ok(StackRequestSlotInfo {
        container_id: read_u8(buf)?,
        slot: read_u8(buf)?,
        stack_network_id: read_vari32(buf)?,
    })
}

fn write_slot_info(buf: &mut BytesMut, info: &StackRequestSlotInfo) {
    write_u8(buf, info.container_id);
    write_u8(buf, info.slot);
    write_vari32(buf, info.stack_network_id);
}

/// Read a single stack request action. The action layouts are shared between
/// the supported versions; only the embedded item stacks go through `io`.
pub fn read_stack_request_action(
    buf: &mut BytesMut,
    io: &dyn ItemIo,
    ctx: &SessionContext,
) -> CodecResult<StackRequestAction> {
    use crate::packets::stack_request_action_type as t;
    let tag = read_u8(buf)?;
    let action = match tag {
        t::TAKE => StackRequestAction::Take {
            count: read_u8(buf)?,
            source: read_slot_info(buf)?,
            destination: read_slot_info(buf)?,
        },
        t::PLACE => StackRequestAction::Place {
            count: read_u8(buf)?,
            source: read_slot_info(buf)?,
            destination: read_slot_info(buf)?,
        },
        t::SWAP => StackRequestAction::Swap {
            source: read_slot_info(buf)?,
            destination: read_slot_info(buf)?,
        },
        t::DROP => StackRequestAction::Drop {
            count: read_u8(buf)?,
            source: read_slot_info(buf)?,
            randomly: read_bool(buf)?,
        },
        t::DESTROY => StackRequestAction::Destroy {
            count: read_u8(buf)?,
            source: read_slot_info(buf)?,
        },
        t::CONSUME => StackRequestAction::Consume {
            count: read_u8(buf)?,
            source: read_slot_info(buf)?,
        },
        t::CREATE => StackRequestAction::Create {
            results_slot: read_u8(buf)?,
        },
        t::LAB_TABLE_COMBINE => StackRequestAction::LabTableCombine,
        t::BEACON_PAYMENT => StackRequestAction::BeaconPayment {
            primary_effect: read_vari32(buf)?,
            secondary_effect: read_vari32(buf)?,
        },
        t::MINE_BLOCK => StackRequestAction::MineBlock {
            hotbar_slot: read_vari32(buf)?,
            predicted_durability: read_vari32(buf)?,
            stack_network_id: read_vari32(buf)?,
        },
        t::CRAFT_RECIPE => StackRequestAction::CraftRecipe {
            recipe_network_id: read_varu32(buf)?,
        },
        t::CRAFT_RECIPE_AUTO => StackRequestAction::CraftRecipeAuto {
            recipe_network_id: read_varu32(buf)?,
            times_crafted: read_u8(buf)?,
        },
        t::CRAFT_CREATIVE => StackRequestAction::CraftCreative {
            creative_item_network_id: read_varu32(buf)?,
        },
        t::CRAFT_RESULTS_DEPRECATED => {
            let count = check_len(read_varu32(buf)? as u64, 256, "crafting results")?;
            let mut result_items = Vec::with_capacity(count);
            for _ in 0..count {
                result_items.push(io.read_item_stack(buf, ctx)?);
            }
            StackRequestAction::CraftResultsDeprecated {
                result_items,
                times_crafted: read_u8(buf)?,
            }
        }
        other => {
            return Err(CodecError::UnknownEnumTag {
                value: other as u64,
                field: "stack request action type",
            })
        }
    };
    Ok(action)
}

pub fn write_stack_request_action(
    buf: &mut BytesMut,
    action: &StackRequestAction,
    io: &dyn ItemIo,
    ctx: &SessionContext,
) {
    write_u8(buf, action.type_tag());
    match action {
        StackRequestAction::Take {
            count,
            source,
            destination,
        }
        | StackRequestAction::Place {
            count,
            source,
            destination,
        } => {
            write_u8(buf, *count);
            write_slot_info(buf, source);
            write_slot_info(buf, destination);
        }
        StackRequestAction::Swap {
            source,
            destination,
        } => {
            write_slot_info(buf, source);
            write_slot_info(buf, destination);
        }
        StackRequestAction::Drop {
            count,
            source,
            randomly,
        } => {
            write_u8(buf, *count);
            write_slot_info(buf, source);
            write_bool(buf, *randomly);
        }
        StackRequestAction::Destroy { count, source }
        | StackRequestAction::Consume { count, source } => {
            write_u8(buf, *count);
            write_slot_info(buf, source);
        }
        StackRequestAction::Create { results_slot } => {
            write_u8(buf, *results_slot);
        }
        StackRequestAction::LabTableCombine => {}
        StackRequestAction::BeaconPayment {
            primary_effect,
            secondary_effect,
        } => {
            write_vari32(buf, *primary_effect);
            write_vari32(buf, *secondary_effect);
        }
        StackRequestAction::MineBlock {
            hotbar_slot,
            predicted_durability,
            stack_network_id,
        } => {
            write_vari32(buf, *hotbar_slot);
            write_vari32(buf, *predicted_durability);
            write_vari32(buf, *stack_network_id);
        }
        StackRequestAction::CraftRecipe { recipe_network_id } => {
            write_varu32(buf, *recipe_network_id);
        }
        StackRequestAction::CraftRecipeAuto {
            recipe_network_id,
            times_crafted,
        } => {
            write_varu32(buf, *recipe_network_id);
            write_u8(buf, *times_crafted);
        }
        StackRequestAction::CraftCreative {
            creative_item_network_id,
        } => {
            write_varu32(buf, *creative_item_network_id);
        }
        StackRequestAction::CraftResultsDeprecated {
            result_items,
            times_crafted,
        } => {
            write_varu32(buf, result_items.len() as u32);
            for item in result_items {
                io.write_item_stack(buf, item, ctx);
            }
            write_u8(buf, *times_crafted);
        }
    }
}
