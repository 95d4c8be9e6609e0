use shale_protocol_core::{BlockMapping, ItemMapping};

/// Network protocol version of the latest supported release.
pub const PROTOCOL_VERSION: i32 = 589;

/// Game version string of the latest supported release.
pub const VERSION: &str = "1.20.0";

const ITEM_PALETTE: &str = include_str!("../data/item_palette.json");
const BLOCK_STATES: &str = include_str!("../data/block_states.json");

/// Build the item table of the latest version from the embedded palette.
pub fn item_mapping() -> ItemMapping {
    ItemMapping::from_palette(ITEM_PALETTE).expect("embedded item palette is valid")
}

/// Build the block state table of the latest version. Runtime IDs follow the
/// palette order.
pub fn block_mapping() -> BlockMapping {
    BlockMapping::from_palette(BLOCK_STATES).expect("embedded block palette is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_palettes_parse() {
        let items = item_mapping();
        assert!(items.runtime_id_for("minecraft:shield", 0).is_some());
        let blocks = block_mapping();
        assert_eq!(blocks.air_runtime_id(), 0);
        assert!(blocks.len() > 1);
    }
}
