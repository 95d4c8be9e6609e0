use shale_nbt::NbtValue;
use shale_types::{ItemInstance, ItemStack, ItemType};
use tracing::trace;

use crate::chunk;
use crate::codec::CodecResult;
use crate::mapping::{BlockMapping, ItemMapping};
use crate::packets::Packet;
use crate::recipe::{ItemDescriptor, ItemDescriptorCount, Recipe};

/// One-directional identifier translator between two protocol versions.
///
/// Identifiers the source version knows but the target version does not are
/// replaced by the target's air, never reported as errors: a peer sending a
/// valid-for-its-version ID must not be able to break the session.
pub struct PacketTranslator<'a> {
    source_items: &'a ItemMapping,
    target_items: &'a ItemMapping,
    source_blocks: &'a BlockMapping,
    target_blocks: &'a BlockMapping,
    actor_remap: Option<fn(NbtValue) -> NbtValue>,
}

impl<'a> PacketTranslator<'a> {
    pub fn new(
        source_items: &'a ItemMapping,
        target_items: &'a ItemMapping,
        source_blocks: &'a BlockMapping,
        target_blocks: &'a BlockMapping,
    ) -> Self {
        Self {
            source_items,
            target_items,
            source_blocks,
            target_blocks,
            actor_remap: None,
        }
    }

    /// Attach the block-actor data rewrite applied to BlockActorData and
    /// embedded actor compounds for this direction.
    pub fn with_actor_remap(mut self, remap: fn(NbtValue) -> NbtValue) -> Self {
        self.actor_remap = Some(remap);
        self
    }

    pub fn item_type(&self, item: ItemType) -> ItemType {
        if item.network_id == 0 {
            return item;
        }
        let translated = self
            .source_items
            .name_for(item.network_id)
            .and_then(|name| self.target_items.runtime_id_for(name, item.metadata));
        match translated {
            Some(network_id) => ItemType {
                network_id,
                metadata: item.metadata,
            },
            // Unknown on either side becomes air.
            None => {
                trace!("item network id {} has no target mapping", item.network_id);
                ItemType {
                    network_id: 0,
                    metadata: 0,
                }
            }
        }
    }

    pub fn item_stack(&self, mut stack: ItemStack) -> ItemStack {
        stack.item_type = self.item_type(stack.item_type);
        if stack.item_type.network_id == 0 {
            return ItemStack::empty();
        }
        if stack.block_runtime_id != 0 {
            stack.block_runtime_id = self.block_runtime_id(stack.block_runtime_id as u32) as i32;
        }
        stack
    }

    pub fn item_instance(&self, mut inst: ItemInstance) -> ItemInstance {
        inst.stack = self.item_stack(inst.stack);
        if inst.stack.is_empty() {
            inst.stack_network_id = 0;
        }
        inst
    }

    pub fn block_runtime_id(&self, runtime_id: u32) -> u32 {
        self.source_blocks
            .state_for(runtime_id)
            .and_then(|state| self.target_blocks.runtime_id_for(state))
            .unwrap_or_else(|| self.target_blocks.air_runtime_id())
    }

    fn descriptor(&self, mut desc: ItemDescriptorCount) -> ItemDescriptorCount {
        if let ItemDescriptor::Default {
            network_id,
            metadata,
        } = desc.descriptor
        {
            if network_id != 0 {
                let translated = self.item_type(ItemType {
                    network_id: network_id as i32,
                    metadata: metadata as u32,
                });
                desc.descriptor = if translated.network_id == 0 {
                    ItemDescriptor::Invalid
                } else {
                    ItemDescriptor::Default {
                        network_id: translated.network_id as i16,
                        metadata,
                    }
                };
            }
        }
        desc
    }

    fn item_network_id(&self, network_id: i32, metadata: i32) -> i32 {
        self.item_type(ItemType {
            network_id,
            metadata: metadata as u32,
        })
        .network_id
    }

    fn recipe(&self, recipe: Recipe) -> Recipe {
        match recipe {
            Recipe::Shapeless(mut r) => {
                r.input = r.input.into_iter().map(|d| self.descriptor(d)).collect();
                r.output = r.output.into_iter().map(|s| self.item_stack(s)).collect();
                Recipe::Shapeless(r)
            }
            Recipe::Shaped(mut r) => {
                r.input = r.input.into_iter().map(|d| self.descriptor(d)).collect();
                r.output = r.output.into_iter().map(|s| self.item_stack(s)).collect();
                Recipe::Shaped(r)
            }
            Recipe::Furnace(mut r) => {
                r.input_type = self.item_network_id(r.input_type, r.input_metadata.unwrap_or(0));
                r.output = self.item_stack(r.output);
                Recipe::Furnace(r)
            }
            Recipe::Multi(r) => Recipe::Multi(r),
            Recipe::ShulkerBox(mut r) => {
                r.input = r.input.into_iter().map(|d| self.descriptor(d)).collect();
                r.output = r.output.into_iter().map(|s| self.item_stack(s)).collect();
                Recipe::ShulkerBox(r)
            }
            Recipe::ShapelessChemistry(mut r) => {
                r.input = r.input.into_iter().map(|d| self.descriptor(d)).collect();
                r.output = r.output.into_iter().map(|s| self.item_stack(s)).collect();
                Recipe::ShapelessChemistry(r)
            }
            Recipe::ShapedChemistry(mut r) => {
                r.input = r.input.into_iter().map(|d| self.descriptor(d)).collect();
                r.output = r.output.into_iter().map(|s| self.item_stack(s)).collect();
                Recipe::ShapedChemistry(r)
            }
            Recipe::SmithingTransform(mut r) => {
                r.template = self.descriptor(r.template);
                r.base = self.descriptor(r.base);
                r.addition = self.descriptor(r.addition);
                r.output = self.item_stack(r.output);
                Recipe::SmithingTransform(r)
            }
        }
    }

    fn actor_nbt(&self, nbt: NbtValue) -> NbtValue {
        match self.actor_remap {
            Some(remap) => remap(nbt),
            None => nbt,
        }
    }

    /// Rewrite every item and block identifier inside a packet from the
    /// source version's ID space to the target's. Packets carrying no
    /// translatable identifiers pass through untouched.
    pub fn translate(&self, packet: Packet) -> CodecResult<Packet> {
        let translated = match packet {
            Packet::MobEquipment {
                entity_runtime_id,
                new_item,
                inventory_slot,
                hotbar_slot,
                window_id,
            } => Packet::MobEquipment {
                entity_runtime_id,
                new_item: self.item_instance(new_item),
                inventory_slot,
                hotbar_slot,
                window_id,
            },
            Packet::MobArmourEquipment {
                entity_runtime_id,
                helmet,
                chestplate,
                leggings,
                boots,
            } => Packet::MobArmourEquipment {
                entity_runtime_id,
                helmet: self.item_instance(helmet),
                chestplate: self.item_instance(chestplate),
                leggings: self.item_instance(leggings),
                boots: self.item_instance(boots),
            },
            Packet::AddPlayer(mut fields) => {
                fields.held_item = self.item_instance(fields.held_item);
                Packet::AddPlayer(fields)
            }
            Packet::InventoryContent { window_id, content } => Packet::InventoryContent {
                window_id,
                content: content
                    .into_iter()
                    .map(|inst| self.item_instance(inst))
                    .collect(),
            },
            Packet::InventorySlot {
                window_id,
                slot,
                new_item,
            } => Packet::InventorySlot {
                window_id,
                slot,
                new_item: self.item_instance(new_item),
            },
            Packet::CreativeContent { mut items } => {
                for entry in &mut items {
                    entry.item = self.item_stack(entry.item.clone());
                }
                Packet::CreativeContent { items }
            }
            Packet::CraftingData {
                recipes,
                mut potion_recipes,
                mut potion_container_change_recipes,
                clear_recipes,
            } => {
                let recipes = recipes.into_iter().map(|r| self.recipe(r)).collect();
                for r in &mut potion_recipes {
                    r.input_potion_id =
                        self.item_network_id(r.input_potion_id, r.input_potion_metadata);
                    r.reagent_item_id =
                        self.item_network_id(r.reagent_item_id, r.reagent_item_metadata);
                    r.output_potion_id =
                        self.item_network_id(r.output_potion_id, r.output_potion_metadata);
                }
                for r in &mut potion_container_change_recipes {
                    r.input_item_id = self.item_network_id(r.input_item_id, 0);
                    r.reagent_item_id = self.item_network_id(r.reagent_item_id, 0);
                    r.output_item_id = self.item_network_id(r.output_item_id, 0);
                }
                Packet::CraftingData {
                    recipes,
                    potion_recipes,
                    potion_container_change_recipes,
                    clear_recipes,
                }
            }
            Packet::ItemStackRequest { mut requests } => {
                for request in &mut requests {
                    for action in &mut request.actions {
                        if let crate::packets::StackRequestAction::CraftResultsDeprecated {
                            result_items,
                            ..
                        } = action
                        {
                            for item in result_items.iter_mut() {
                                *item = self.item_stack(item.clone());
                            }
                        }
                    }
                }
                Packet::ItemStackRequest { requests }
            }
            Packet::UpdateBlock {
                position,
                new_block_runtime_id,
                flags,
                layer,
            } => Packet::UpdateBlock {
                position,
                new_block_runtime_id: self.block_runtime_id(new_block_runtime_id),
                flags,
                layer,
            },
            Packet::UpdateBlockSynced {
                position,
                new_block_runtime_id,
                flags,
                layer,
                entity_unique_id,
                transition_type,
            } => Packet::UpdateBlockSynced {
                position,
                new_block_runtime_id: self.block_runtime_id(new_block_runtime_id),
                flags,
                layer,
                entity_unique_id,
                transition_type,
            },
            Packet::LevelChunk {
                position,
                sub_chunk_count,
                cache_enabled,
                blob_hashes,
                raw_payload,
            } => Packet::LevelChunk {
                position,
                sub_chunk_count,
                cache_enabled,
                blob_hashes,
                raw_payload: chunk::rewrite_chunk_payload(
                    &raw_payload,
                    sub_chunk_count,
                    &|runtime_id| self.block_runtime_id(runtime_id),
                )?,
            },
            Packet::BlockActorData { position, nbt } => Packet::BlockActorData {
                position,
                nbt: self.actor_nbt(nbt),
            },
            other => other,
        };
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shale_types::BlockPos;

    const SOURCE_ITEMS: &str = r#"{
        "minecraft:stick": {"runtime_id": 320},
        "minecraft:netherite_sword": {"runtime_id": 743}
    }"#;
    const TARGET_ITEMS: &str = r#"{
        "minecraft:stick": {"runtime_id": 600}
    }"#;
    const SOURCE_BLOCKS: &str = r#"[
        {"name": "minecraft:air"},
        {"name": "minecraft:stone"},
        {"name": "minecraft:crying_obsidian"}
    ]"#;
    const TARGET_BLOCKS: &str = r#"[
        {"name": "minecraft:stone"},
        {"name": "minecraft:air"}
    ]"#;

    fn mappings() -> (ItemMapping, ItemMapping, BlockMapping, BlockMapping) {
        (
            ItemMapping::from_palette(SOURCE_ITEMS).unwrap(),
            ItemMapping::from_palette(TARGET_ITEMS).unwrap(),
            BlockMapping::from_palette(SOURCE_BLOCKS).unwrap(),
            BlockMapping::from_palette(TARGET_BLOCKS).unwrap(),
        )
    }

    #[test]
    fn test_item_translation_with_air_fallback() {
        let (si, ti, sb, tb) = mappings();
        let translator = PacketTranslator::new(&si, &ti, &sb, &tb);

        let stick = ItemType {
            network_id: 320,
            metadata: 0,
        };
        assert_eq!(translator.item_type(stick).network_id, 600);

        // The target version has no netherite sword.
        let sword = ItemType {
            network_id: 743,
            metadata: 0,
        };
        assert_eq!(translator.item_type(sword).network_id, 0);
    }

    #[test]
    fn test_block_translation_with_air_fallback() {
        let (si, ti, sb, tb) = mappings();
        let translator = PacketTranslator::new(&si, &ti, &sb, &tb);

        // Stone exists in both palettes at different runtime IDs.
        assert_eq!(translator.block_runtime_id(1), 0);
        // Air maps to the target's air.
        assert_eq!(translator.block_runtime_id(0), 1);
        // Crying obsidian does not exist in the target; it becomes air.
        assert_eq!(translator.block_runtime_id(2), 1);
    }

    #[test]
    fn test_update_block_packet_rewrite() {
        let (si, ti, sb, tb) = mappings();
        let translator = PacketTranslator::new(&si, &ti, &sb, &tb);

        let packet = Packet::UpdateBlock {
            position: BlockPos::new(4, 70, -3),
            new_block_runtime_id: 1,
            flags: 3,
            layer: 0,
        };
        match translator.translate(packet).unwrap() {
            Packet::UpdateBlock {
                new_block_runtime_id,
                position,
                ..
            } => {
                assert_eq!(new_block_runtime_id, 0);
                assert_eq!(position, BlockPos::new(4, 70, -3));
            }
            other => panic!("unexpected packet {}", other.name()),
        }
    }

    #[test]
    fn test_unrelated_packet_untouched() {
        let (si, ti, sb, tb) = mappings();
        let translator = PacketTranslator::new(&si, &ti, &sb, &tb);

        let packet = Packet::RequestChunkRadius {
            chunk_radius: 8,
            max_chunk_radius: 8,
        };
        assert_eq!(translator.translate(packet.clone()).unwrap(), packet);
    }
}
