use bytes::BytesMut;
use shale_types::ItemStack;
use uuid::Uuid;

use crate::codec::{
    check_len, read_string, read_uuid, read_varu32, read_vari32, write_string, write_uuid,
    write_varu32, write_vari32, CodecError, CodecResult, MAX_STRING_LEN,
};
use crate::io::ItemIo;
use crate::session::SessionContext;

/// Leading recipe type tags of the CraftingData packet. Both supported
/// versions use the same tags; the smithing tag exists only in the latest
/// version and is dropped when downgrading.
pub mod recipe_type {
    pub const SHAPELESS: i32 = 0;
    pub const SHAPED: i32 = 1;
    pub const FURNACE: i32 = 2;
    pub const FURNACE_DATA: i32 = 3;
    pub const MULTI: i32 = 4;
    pub const SHULKER_BOX: i32 = 5;
    pub const SHAPELESS_CHEMISTRY: i32 = 6;
    pub const SHAPED_CHEMISTRY: i32 = 7;
    pub const SMITHING_TRANSFORM: i32 = 8;
}

/// Type tags of recipe ingredient descriptors in the latest layout. The
/// legacy layout has no tag byte; every ingredient is the default form.
pub mod descriptor_type {
    pub const INVALID: u8 = 0;
    pub const DEFAULT: u8 = 1;
    pub const ITEM_TAG: u8 = 2;
    pub const DEFERRED: u8 = 3;
    pub const COMPLEX_ALIAS: u8 = 4;
}

/// A recipe ingredient. Forms beyond `Default` cannot be expressed in the
/// legacy layout and are downgraded to their resolved default form, or to
/// `Invalid` when no resolution exists.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDescriptor {
    Invalid,
    Default { network_id: i16, metadata: i16 },
    ItemTag { tag: String },
    Deferred { name: String, metadata: i16 },
    ComplexAlias { name: String },
}

impl ItemDescriptor {
    pub fn type_tag(&self) -> u8 {
        match self {
            ItemDescriptor::Invalid => descriptor_type::INVALID,
            ItemDescriptor::Default { .. } => descriptor_type::DEFAULT,
            ItemDescriptor::ItemTag { .. } => descriptor_type::ITEM_TAG,
            ItemDescriptor::Deferred { .. } => descriptor_type::DEFERRED,
            ItemDescriptor::ComplexAlias { .. } => descriptor_type::COMPLEX_ALIAS,
        }
    }
}

/// An ingredient descriptor with the required count.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDescriptorCount {
    pub descriptor: ItemDescriptor,
    pub count: i32,
}

/// A crafting-table recipe with unordered inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapelessRecipe {
    pub recipe_id: String,
    pub input: Vec<ItemDescriptorCount>,
    pub output: Vec<ItemStack>,
    pub uuid: Uuid,
    pub block: String,
    pub priority: i32,
    pub recipe_network_id: u32,
}

/// A crafting-table recipe with a fixed input grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRecipe {
    pub recipe_id: String,
    pub width: i32,
    pub height: i32,
    /// Row-major grid of width * height ingredients.
    pub input: Vec<ItemDescriptorCount>,
    pub output: Vec<ItemStack>,
    pub uuid: Uuid,
    pub block: String,
    pub priority: i32,
    pub recipe_network_id: u32,
}

/// A furnace recipe, optionally restricted to one input metadata value.
#[derive(Debug, Clone, PartialEq)]
pub struct FurnaceRecipe {
    pub input_type: i32,
    /// Input metadata. None encodes as the metadata-agnostic furnace tag.
    pub input_metadata: Option<i32>,
    pub output: ItemStack,
    pub block: String,
}

/// A special recipe matched client-side by UUID alone.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRecipe {
    pub uuid: Uuid,
    pub recipe_network_id: u32,
}

/// A smithing-table transform recipe. Latest-only.
#[derive(Debug, Clone, PartialEq)]
pub struct SmithingRecipe {
    pub recipe_id: String,
    pub template: ItemDescriptorCount,
    pub base: ItemDescriptorCount,
    pub addition: ItemDescriptorCount,
    pub output: ItemStack,
    pub block: String,
    pub recipe_network_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recipe {
    Shapeless(ShapelessRecipe),
    Shaped(ShapedRecipe),
    Furnace(FurnaceRecipe),
    Multi(MultiRecipe),
    ShulkerBox(ShapelessRecipe),
    ShapelessChemistry(ShapelessRecipe),
    ShapedChemistry(ShapedRecipe),
    SmithingTransform(SmithingRecipe),
}

impl Recipe {
    pub fn type_tag(&self) -> i32 {
        use crate::recipe::recipe_type as t;
        match self {
            Recipe::Shapeless(_) => t::SHAPELESS,
            Recipe::Shaped(_) => t::SHAPED,
            Recipe::Furnace(r) => {
                if r.input_metadata.is_some() {
                    t::FURNACE_DATA
                } else {
                    t::FURNACE
                }
            }
            Recipe::Multi(_) => t::MULTI,
            Recipe::ShulkerBox(_) => t::SHULKER_BOX,
            Recipe::ShapelessChemistry(_) => t::SHAPELESS_CHEMISTRY,
            Recipe::ShapedChemistry(_) => t::SHAPED_CHEMISTRY,
            Recipe::SmithingTransform(_) => t::SMITHING_TRANSFORM,
        }
    }
}

/// Read one tagged recipe. Item stacks and ingredient descriptors go
/// through the version's codec; the surrounding shape is shared.
pub fn read_recipe(
    buf: &mut BytesMut,
    io: &dyn ItemIo,
    ctx: &SessionContext,
) -> CodecResult<Recipe> {
    use crate::recipe::recipe_type as t;

    fn read_shapeless(
        buf: &mut BytesMut,
        io: &dyn ItemIo,
        ctx: &SessionContext,
    ) -> CodecResult<ShapelessRecipe> {
        let recipe_id = read_string(buf, MAX_STRING_LEN)?;
        let input_count = check_len(read_varu32(buf)? as u64, 128, "recipe input list")?;
        let mut input = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            input.push(io.read_item_descriptor(buf)?);
        }
        let output_count = check_len(read_varu32(buf)? as u64, 128, "recipe output list")?;
        let mut output = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            output.push(io.read_item_stack(buf, ctx)?);
        }
        Ok(ShapelessRecipe {
            recipe_id,
            input,
            output,
            uuid: read_uuid(buf)?,
            block: read_string(buf, MAX_STRING_LEN)?,
            priority: read_vari32(buf)?,
            recipe_network_id: read_varu32(buf)?,
        })
    }

    fn read_shaped(
        buf: &mut BytesMut,
        io: &dyn ItemIo,
        ctx: &SessionContext,
    ) -> CodecResult<ShapedRecipe> {
        let recipe_id = read_string(buf, MAX_STRING_LEN)?;
        let width = read_vari32(buf)?;
        let height = read_vari32(buf)?;
        let cells = check_len(
            width.max(0) as u64 * height.max(0) as u64,
            64,
            "recipe grid",
        )?;
        let mut input = Vec::with_capacity(cells);
        for _ in 0..cells {
            input.push(io.read_item_descriptor(buf)?);
        }
        let output_count = check_len(read_varu32(buf)? as u64, 128, "recipe output list")?;
        let mut output = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            output.push(io.read_item_stack(buf, ctx)?);
        }
        Ok(ShapedRecipe {
            recipe_id,
            width,
            height,
            input,
            output,
            uuid: read_uuid(buf)?,
            block: read_string(buf, MAX_STRING_LEN)?,
            priority: read_vari32(buf)?,
            recipe_network_id: read_varu32(buf)?,
        })
    }

    let recipe = match read_vari32(buf)? {
        t::SHAPELESS => Recipe::Shapeless(read_shapeless(buf, io, ctx)?),
        t::SHAPED => Recipe::Shaped(read_shaped(buf, io, ctx)?),
        t::FURNACE => Recipe::Furnace(FurnaceRecipe {
            input_type: read_vari32(buf)?,
            input_metadata: None,
            output: io.read_item_stack(buf, ctx)?,
            block: read_string(buf, MAX_STRING_LEN)?,
        }),
        t::FURNACE_DATA => Recipe::Furnace(FurnaceRecipe {
            input_type: read_vari32(buf)?,
            input_metadata: Some(read_vari32(buf)?),
            output: io.read_item_stack(buf, ctx)?,
            block: read_string(buf, MAX_STRING_LEN)?,
        }),
        t::MULTI => Recipe::Multi(MultiRecipe {
            uuid: read_uuid(buf)?,
            recipe_network_id: read_varu32(buf)?,
        }),
        t::SHULKER_BOX => Recipe::ShulkerBox(read_shapeless(buf, io, ctx)?),
        t::SHAPELESS_CHEMISTRY => Recipe::ShapelessChemistry(read_shapeless(buf, io, ctx)?),
        t::SHAPED_CHEMISTRY => Recipe::ShapedChemistry(read_shaped(buf, io, ctx)?),
        t::SMITHING_TRANSFORM => Recipe::SmithingTransform(SmithingRecipe {
            recipe_id: read_string(buf, MAX_STRING_LEN)?,
            template: io.read_item_descriptor(buf)?,
            base: io.read_item_descriptor(buf)?,
            addition: io.read_item_descriptor(buf)?,
            output: io.read_item_stack(buf, ctx)?,
            block: read_string(buf, MAX_STRING_LEN)?,
            recipe_network_id: read_varu32(buf)?,
        }),
        other => {
            return Err(CodecError::UnknownEnumTag {
                value: other as u64,
                field: "recipe type",
            })
        }
    };
    Ok(recipe)
}

pub fn write_recipe(buf: &mut BytesMut, recipe: &Recipe, io: &dyn ItemIo, ctx: &SessionContext) {
    fn write_shapeless(
        buf: &mut BytesMut,
        r: &ShapelessRecipe,
        io: &dyn ItemIo,
        ctx: &SessionContext,
    ) {
        write_string(buf, &r.recipe_id);
        write_varu32(buf, r.input.len() as u32);
        for desc in &r.input {
            io.write_item_descriptor(buf, desc);
        }
        write_varu32(buf, r.output.len() as u32);
        for stack in &r.output {
            io.write_item_stack(buf, stack, ctx);
        }
        write_uuid(buf, &r.uuid);
        write_string(buf, &r.block);
        write_vari32(buf, r.priority);
        write_varu32(buf, r.recipe_network_id);
    }

    fn write_shaped(buf: &mut BytesMut, r: &ShapedRecipe, io: &dyn ItemIo, ctx: &SessionContext) {
        write_string(buf, &r.recipe_id);
        write_vari32(buf, r.width);
        write_vari32(buf, r.height);
        for desc in &r.input {
            io.write_item_descriptor(buf, desc);
        }
        write_varu32(buf, r.output.len() as u32);
        for stack in &r.output {
            io.write_item_stack(buf, stack, ctx);
        }
        write_uuid(buf, &r.uuid);
        write_string(buf, &r.block);
        write_vari32(buf, r.priority);
        write_varu32(buf, r.recipe_network_id);
    }

    write_vari32(buf, recipe.type_tag());
    match recipe {
        Recipe::Shapeless(r) | Recipe::ShulkerBox(r) | Recipe::ShapelessChemistry(r) => {
            write_shapeless(buf, r, io, ctx)
        }
        Recipe::Shaped(r) | Recipe::ShapedChemistry(r) => write_shaped(buf, r, io, ctx),
        Recipe::Furnace(r) => {
            write_vari32(buf, r.input_type);
            if let Some(metadata) = r.input_metadata {
                write_vari32(buf, metadata);
            }
            io.write_item_stack(buf, &r.output, ctx);
            write_string(buf, &r.block);
        }
        Recipe::Multi(r) => {
            write_uuid(buf, &r.uuid);
            write_varu32(buf, r.recipe_network_id);
        }
        Recipe::SmithingTransform(r) => {
            write_string(buf, &r.recipe_id);
            io.write_item_descriptor(buf, &r.template);
            io.write_item_descriptor(buf, &r.base);
            io.write_item_descriptor(buf, &r.addition);
            io.write_item_stack(buf, &r.output, ctx);
            write_string(buf, &r.block);
            write_varu32(buf, r.recipe_network_id);
        }
    }
}

/// A brewing-stand potion recipe, carried by item network IDs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotionRecipe {
    pub input_potion_id: i32,
    pub input_potion_metadata: i32,
    pub reagent_item_id: i32,
    pub reagent_item_metadata: i32,
    pub output_potion_id: i32,
    pub output_potion_metadata: i32,
}

/// A brewing-stand container change, such as splash conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotionContainerChangeRecipe {
    pub input_item_id: i32,
    pub reagent_item_id: i32,
    pub output_item_id: i32,
}
