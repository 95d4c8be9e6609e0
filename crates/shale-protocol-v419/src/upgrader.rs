//! Structural upgrades from the legacy shapes to the latest ones: entity
//! data key remapping, packed flag word repacking, sign data and the
//! synthesis of ability data from the flat adventure permission set.

use shale_nbt::{nbt_compound, NbtValue};
use shale_protocol_core::{
    ability, action_permission, adventure_flag, data_key, AbilityData, AbilityLayer,
    EntityMetadataMap, MetadataValue, DATA_KEY_FLAGS,
};

/// Bit position at which the latest flag word gained an extra flag. Every
/// legacy flag at or above this index sits one bit higher in the latest
/// word, cascading the overflow into the second word.
pub const DASH_FLAG_BIT: u32 = 58;

/// Key of the second packed flag word in the legacy key space.
pub const LEGACY_DATA_KEY_FLAGS_TWO: u32 = 91;

const LOW_MASK: u64 = (1 << DASH_FLAG_BIT) - 1;
const HIGH_BITS: u32 = 63 - DASH_FLAG_BIT;

/// Repack the legacy flag words into the latest layout. Inverse of
/// [`crate::downgrader::downgrade_flag_words`] over the defined bit range:
/// bit [`DASH_FLAG_BIT`] of the first latest word is always left clear,
/// since no legacy flag maps to it, and the top bit of the legacy second
/// word has no latest slot and is discarded. Neither excluded bit backs a
/// defined flag in its version.
pub fn upgrade_flag_words(l1: i64, l2: i64) -> (i64, i64) {
    let (l1, l2) = (l1 as u64, l2 as u64);
    let f2 = (l2 << 1) | (l1 >> 63);
    let high = (l1 >> DASH_FLAG_BIT) & ((1 << HIGH_BITS) - 1);
    let f1 = (l1 & LOW_MASK) | (high << (DASH_FLAG_BIT + 1));
    (f1 as i64, f2 as i64)
}

/// Translate a legacy entity data key into the latest key space. Keys the
/// two versions agree on pass through unchanged.
///
/// This table and [`crate::downgrader::downgrade_data_key`] invert each
/// other over the legacy key space. The slot numbers the latest insertions
/// vacated (63, 65, 68, 76, 82, 88, 92, 103 and 110) are not legacy keys;
/// passing one through would land on a remapped latest value.
pub fn upgrade_data_key(key: u32) -> u32 {
    use data_key as k;
    match key {
        60 => k::RADIUS,
        61 => k::WAITING,
        62 => k::PARTICLE,
        64 => k::ATTACH_FACE,
        66 => k::ATTACHED_POSITION,
        67 => k::TRADE_TARGET,
        70 => k::COMMAND_NAME,
        71 => k::LAST_COMMAND_OUTPUT,
        72 => k::TRACK_COMMAND_OUTPUT,
        73 => k::CONTROLLING_SEAT_INDEX,
        74 => k::STRENGTH,
        75 => k::STRENGTH_MAX,
        77 => k::LIFETIME_TICKS,
        78 => k::POSE_INDEX,
        79 => k::TICK_OFFSET,
        80 => k::ALWAYS_SHOW_NAME_TAG,
        81 => k::COLOR_TWO_INDEX,
        83 => k::SCORE,
        84 => k::BALLOON_ANCHOR,
        85 => k::PUFFED_STATE,
        86 => k::BUBBLE_TIME,
        87 => k::AGENT,
        90 => k::EATING_COUNTER,
        LEGACY_DATA_KEY_FLAGS_TWO => k::FLAGS_TWO,
        94 => k::DURATION,
        95 => k::SPAWN_TIME,
        96 => k::CHANGE_RATE,
        97 => k::CHANGE_ON_PICKUP,
        98 => k::PICKUP_COUNT,
        99 => k::INTERACT_TEXT,
        100 => k::TRADE_TIER,
        101 => k::MAX_TRADE_TIER,
        102 => k::TRADE_EXPERIENCE,
        104 => k::SKIN_ID,
        105 => k::COMMAND_BLOCK_TICK_DELAY,
        106 => k::COMMAND_BLOCK_EXECUTE_ON_FIRST_TICK,
        107 => k::AMBIENT_SOUND_INTERVAL,
        108 => k::AMBIENT_SOUND_INTERVAL_RANGE,
        109 => k::AMBIENT_SOUND_EVENT_NAME,
        other => other,
    }
}

/// Rebuild an entity metadata map in the latest key space, repacking the
/// flag words. Maps without any flag entry keep having none.
pub fn upgrade_metadata(metadata: EntityMetadataMap) -> EntityMetadataMap {
    let mut out = EntityMetadataMap::new();
    let mut flags = None;
    let mut flags_two = None;
    for (key, value) in metadata {
        match (key, &value) {
            (DATA_KEY_FLAGS, MetadataValue::Long(v)) => flags = Some(*v),
            (LEGACY_DATA_KEY_FLAGS_TWO, MetadataValue::Long(v)) => flags_two = Some(*v),
            _ => {
                out.insert(upgrade_data_key(key), value);
            }
        }
    }
    if flags.is_some() || flags_two.is_some() {
        let (f1, f2) = upgrade_flag_words(flags.unwrap_or(0), flags_two.unwrap_or(0));
        out.insert(DATA_KEY_FLAGS, MetadataValue::Long(f1));
        out.insert(data_key::FLAGS_TWO, MetadataValue::Long(f2));
    }
    out
}

/// Rewrite legacy sign block-actor data into the two-sided latest schema.
pub fn upgrade_block_actor(nbt: NbtValue) -> NbtValue {
    let is_sign = nbt
        .get("id")
        .and_then(NbtValue::as_str)
        .map(|id| id == "Sign")
        .unwrap_or(false);
    if !is_sign {
        return nbt;
    }
    let mut nbt = nbt;
    if let Some(text) = nbt.remove("Text") {
        nbt.insert("FrontText", nbt_compound! { "Text" => text });
        nbt.insert(
            "BackText",
            nbt_compound! { "Text" => NbtValue::String(String::new()) },
        );
    }
    nbt
}

/// Build layered ability data equivalent to a flat adventure permission set.
pub fn abilities_from_adventure(
    flags: u32,
    action_permissions: u32,
    command_permission_level: u32,
    permission_level: u32,
    player_unique_id: i64,
) -> AbilityData {
    let mut values = 0;
    let pairs = [
        (action_permission::BUILD, ability::BUILD),
        (action_permission::MINE, ability::MINE),
        (
            action_permission::DOORS_AND_SWITCHES,
            ability::DOORS_AND_SWITCHES,
        ),
        (
            action_permission::OPEN_CONTAINERS,
            ability::OPEN_CONTAINERS,
        ),
        (action_permission::ATTACK_PLAYERS, ability::ATTACK_PLAYERS),
        (action_permission::ATTACK_MOBS, ability::ATTACK_MOBS),
        (
            action_permission::OPERATOR_COMMANDS,
            ability::OPERATOR_COMMANDS,
        ),
        (action_permission::TELEPORT, ability::TELEPORT),
    ];
    for (permission, ability_bit) in pairs {
        if action_permissions & permission != 0 {
            values |= ability_bit;
        }
    }
    let flag_pairs = [
        (adventure_flag::ALLOW_FLIGHT, ability::MAY_FLY),
        (adventure_flag::FLYING, ability::FLYING),
        (adventure_flag::NO_CLIP, ability::NO_CLIP),
        (adventure_flag::WORLD_BUILDER, ability::WORLD_BUILDER),
        (adventure_flag::MUTED, ability::MUTED),
    ];
    for (flag, ability_bit) in flag_pairs {
        if flags & flag != 0 {
            values |= ability_bit;
        }
    }
    AbilityData {
        entity_unique_id: player_unique_id,
        player_permissions: permission_level as u8,
        command_permissions: command_permission_level as u8,
        layers: vec![AbilityLayer {
            layer_type: 1,
            abilities: u32::MAX,
            values,
            fly_speed: 0.05,
            walk_speed: 0.1,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downgrader::downgrade_flag_words;

    #[test]
    fn test_flag_repack_shifts_high_bits() {
        // A flag below the split keeps its position.
        let (f1, f2) = upgrade_flag_words(1 << 10, 0);
        assert_eq!(f1, 1 << 10);
        assert_eq!(f2, 0);

        // A flag at the split moves one bit up.
        let (f1, f2) = upgrade_flag_words(1 << DASH_FLAG_BIT, 0);
        assert_eq!(f1, 1 << (DASH_FLAG_BIT + 1));
        assert_eq!(f2, 0);

        // The top legacy bit overflows into the second word.
        let (f1, f2) = upgrade_flag_words(1u64.wrapping_shl(63) as i64, 0);
        assert_eq!(f1, 0);
        assert_eq!(f2, 1);

        // Second-word flags shift up by one.
        let (f1, f2) = upgrade_flag_words(0, 0b101);
        assert_eq!(f1, 0);
        assert_eq!(f2, 0b1010);
    }

    #[test]
    fn test_flag_repack_is_bijective() {
        // The top bit of the legacy second word has no latest slot, so the
        // repack is a bijection over pairs with it clear.
        for (l1, l2) in [
            (0i64, 0i64),
            (-1, i64::MAX),
            (0x0123_4567_89ab_cdef, 0x7edc_ba98),
            (1 << DASH_FLAG_BIT, 1),
            (i64::MIN, i64::MAX >> 1),
        ] {
            let (f1, f2) = upgrade_flag_words(l1, l2);
            // The dash bit never appears in an upgraded word.
            assert_eq!(f1 & (1 << DASH_FLAG_BIT), 0);
            assert_eq!(downgrade_flag_words(f1, f2), (l1, l2));
        }
        // And back up again for latest pairs with the dash bit clear.
        for (f1, f2) in [
            (0i64, 0i64),
            (-1 & !(1 << DASH_FLAG_BIT), -1),
            (i64::MIN, 42),
        ] {
            let (l1, l2) = downgrade_flag_words(f1, f2);
            assert_eq!(upgrade_flag_words(l1, l2), (f1, f2));
        }
    }

    #[test]
    fn test_legacy_second_word_top_bit_outside_range() {
        // Bit 63 of legacy word two is dropped by the upgrade; everything
        // else in the pair survives the round trip.
        let (f1, f2) = upgrade_flag_words(-1, -1);
        assert_eq!(downgrade_flag_words(f1, f2), (-1, i64::MAX));
    }

    #[test]
    fn test_metadata_key_remap() {
        let mut map = EntityMetadataMap::new();
        map.insert(4, MetadataValue::String("Steve".into()));
        map.insert(83, MetadataValue::String("12".into()));
        map.insert(0, MetadataValue::Long(1 << DASH_FLAG_BIT));

        let upgraded = upgrade_metadata(map);
        assert_eq!(
            upgraded.get(&4),
            Some(&MetadataValue::String("Steve".into()))
        );
        assert_eq!(
            upgraded.get(&data_key::SCORE),
            Some(&MetadataValue::String("12".into()))
        );
        assert_eq!(
            upgraded.get(&DATA_KEY_FLAGS),
            Some(&MetadataValue::Long(1 << (DASH_FLAG_BIT + 1)))
        );
        assert_eq!(
            upgraded.get(&data_key::FLAGS_TWO),
            Some(&MetadataValue::Long(0))
        );
    }

    #[test]
    fn test_metadata_without_flags_stays_flagless() {
        let mut map = EntityMetadataMap::new();
        map.insert(60, MetadataValue::Float(1.5));
        let upgraded = upgrade_metadata(map);
        assert!(!upgraded.contains_key(&DATA_KEY_FLAGS));
        assert!(!upgraded.contains_key(&data_key::FLAGS_TWO));
        assert_eq!(upgraded.get(&data_key::RADIUS), Some(&MetadataValue::Float(1.5)));
    }

    #[test]
    fn test_sign_text_upgrade() {
        let sign = nbt_compound! {
            "id" => NbtValue::String("Sign".into()),
            "Text" => NbtValue::String("stay out".into()),
        };
        let upgraded = upgrade_block_actor(sign);
        let front = upgraded.get("FrontText").unwrap();
        assert_eq!(front.get("Text").and_then(NbtValue::as_str), Some("stay out"));
        assert!(upgraded.get("BackText").is_some());
        assert!(upgraded.get("Text").is_none());

        let chest = nbt_compound! { "id" => NbtValue::String("Chest".into()) };
        assert_eq!(upgrade_block_actor(chest.clone()), chest);
    }

    #[test]
    fn test_abilities_from_adventure() {
        let data = abilities_from_adventure(
            adventure_flag::ALLOW_FLIGHT | adventure_flag::FLYING,
            action_permission::MINE | action_permission::BUILD,
            1,
            2,
            -9,
        );
        assert_eq!(data.entity_unique_id, -9);
        assert_eq!(data.player_permissions, 2);
        assert_eq!(data.command_permissions, 1);
        let layer = &data.layers[0];
        assert_ne!(layer.values & ability::MAY_FLY, 0);
        assert_ne!(layer.values & ability::FLYING, 0);
        assert_ne!(layer.values & ability::MINE, 0);
        assert_ne!(layer.values & ability::BUILD, 0);
        assert_eq!(layer.values & ability::NO_CLIP, 0);
    }
}
