use shale_protocol_core::{BlockMapping, ItemMapping};

/// Network protocol version of the 1.16.100 release line.
pub const PROTOCOL_VERSION: i32 = 419;

/// Game version string this adapter reports.
pub const VERSION: &str = "1.16.100";

const ITEM_PALETTE: &str = include_str!("../data/item_palette.json");
const BLOCK_STATES: &str = include_str!("../data/block_states.json");

pub fn item_mapping() -> ItemMapping {
    ItemMapping::from_palette(ITEM_PALETTE).expect("embedded item palette is valid")
}

pub fn block_mapping() -> BlockMapping {
    BlockMapping::from_palette(BLOCK_STATES).expect("embedded block palette is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_palettes_parse() {
        let items = item_mapping();
        assert_eq!(items.runtime_id_for("minecraft:shield", 0), Some(513));
        let blocks = block_mapping();
        // Air is not the first palette entry in this version.
        assert_eq!(blocks.air_runtime_id(), 4);
    }
}
