//! Component names of the Kamigotchi store schema.
//!
//! Tags mark entity classes; fields carry values. [`register_all`] declares
//! every one of them on a reference [`World`] so fixtures and snapshots agree
//! on the schema.

use kami_store::world::World;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

pub const IS_ACCOUNT: &str = "IsAccount";
pub const IS_KAMI: &str = "IsKami";
pub const IS_HARVEST: &str = "IsHarvest";
pub const IS_NODE: &str = "IsNode";
pub const IS_REGISTRY: &str = "IsRegistry";
pub const IS_ITEM: &str = "IsItem";
pub const IS_INVENTORY: &str = "IsInventory";
pub const IS_TRADE: &str = "IsTrade";
pub const IS_LISTING: &str = "IsListing";
pub const IS_CONDITION: &str = "IsCondition";
pub const IS_ALLO: &str = "IsAllo";
pub const IS_BONUS: &str = "IsBonus";
pub const IS_CONFIG: &str = "IsConfig";
pub const IS_SKILL: &str = "IsSkill";
pub const IS_FRIENDSHIP: &str = "IsFriendship";
pub const IS_DATA: &str = "IsData";
pub const IS_TRAIT: &str = "IsTrait";
pub const IS_FLAG: &str = "IsFlag";
pub const IS_SCAVENGE: &str = "IsScavenge";

pub const TAGS: &[&str] = &[
    IS_ACCOUNT,
    IS_KAMI,
    IS_HARVEST,
    IS_NODE,
    IS_REGISTRY,
    IS_ITEM,
    IS_INVENTORY,
    IS_TRADE,
    IS_LISTING,
    IS_CONDITION,
    IS_ALLO,
    IS_BONUS,
    IS_CONFIG,
    IS_SKILL,
    IS_FRIENDSHIP,
    IS_DATA,
    IS_TRAIT,
    IS_FLAG,
    IS_SCAVENGE,
];

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

// identity
pub const INDEX: &str = "Index";
pub const NAME: &str = "Name";
pub const MEDIA_URI: &str = "MediaURI";
pub const DESCRIPTION: &str = "Description";
pub const OWNER_ADDRESS: &str = "OwnerAddress";
pub const OPERATOR_ADDRESS: &str = "OperatorAddress";

// references
pub const OWNER_ID: &str = "OwnerID";
pub const HOLDER_ID: &str = "HolderID";
pub const SOURCE_ID: &str = "SourceID";
pub const TARGET_ID: &str = "TargetID";
pub const PARENT_ID: &str = "ParentID";
pub const NODE_ID: &str = "NodeID";
pub const MAKER_ID: &str = "MakerID";
pub const TAKER_ID: &str = "TakerID";

// numbers
pub const VALUE: &str = "Value";
pub const LEVEL: &str = "Level";
pub const EXPERIENCE: &str = "Experience";
pub const REPUTATION: &str = "Reputation";
pub const ROOM_INDEX: &str = "RoomIndex";
pub const ITEM_INDEX: &str = "ItemIndex";
pub const NPC_INDEX: &str = "NPCIndex";
pub const SCALE: &str = "Scale";
pub const RARITY: &str = "Rarity";

// packed stats
pub const HEALTH: &str = "Health";
pub const POWER: &str = "Power";
pub const HARMONY: &str = "Harmony";
pub const VIOLENCE: &str = "Violence";
pub const STAMINA: &str = "Stamina";

// enumerations
pub const STATE: &str = "State";
pub const TYPE: &str = "Type";
pub const AFFINITY: &str = "Affinity";
pub const LOGIC_TYPE: &str = "LogicType";
pub const FOR: &str = "For";

// time
pub const START_TIME: &str = "StartTime";
pub const LAST_TIME: &str = "LastTime";
pub const RESET_TIME: &str = "ResetTime";
pub const LAST_ACTION_TIME: &str = "LastActionTime";
pub const CREATION_TIME: &str = "CreationTime";
pub const LAST_MOVE_TIME: &str = "LastMoveTime";

// kami trait slots
pub const BODY_INDEX: &str = "BodyIndex";
pub const HAND_INDEX: &str = "HandIndex";
pub const FACE_INDEX: &str = "FaceIndex";
pub const BACKGROUND_INDEX: &str = "BackgroundIndex";
pub const COLOR_INDEX: &str = "ColorIndex";

// arrays
pub const KEYS: &str = "Keys";
pub const WEIGHTS: &str = "Weights";
pub const BUY_KEYS: &str = "BuyKeys";
pub const BUY_VALUES: &str = "BuyValues";
pub const SELL_KEYS: &str = "SellKeys";
pub const SELL_VALUES: &str = "SellValues";

pub const FIELDS: &[&str] = &[
    INDEX,
    NAME,
    MEDIA_URI,
    DESCRIPTION,
    OWNER_ADDRESS,
    OPERATOR_ADDRESS,
    OWNER_ID,
    HOLDER_ID,
    SOURCE_ID,
    TARGET_ID,
    PARENT_ID,
    NODE_ID,
    MAKER_ID,
    TAKER_ID,
    VALUE,
    LEVEL,
    EXPERIENCE,
    REPUTATION,
    ROOM_INDEX,
    ITEM_INDEX,
    NPC_INDEX,
    SCALE,
    RARITY,
    HEALTH,
    POWER,
    HARMONY,
    VIOLENCE,
    STAMINA,
    STATE,
    TYPE,
    AFFINITY,
    LOGIC_TYPE,
    FOR,
    START_TIME,
    LAST_TIME,
    RESET_TIME,
    LAST_ACTION_TIME,
    CREATION_TIME,
    LAST_MOVE_TIME,
    BODY_INDEX,
    HAND_INDEX,
    FACE_INDEX,
    BACKGROUND_INDEX,
    COLOR_INDEX,
    KEYS,
    WEIGHTS,
    BUY_KEYS,
    BUY_VALUES,
    SELL_KEYS,
    SELL_VALUES,
];

/// Declare the full schema on `world`.
pub fn register_all(world: &mut World) {
    for tag in TAGS {
        world.register_tag(tag);
    }
    for field in FIELDS {
        world.register_field(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kami_store::component::ComponentKind;

    #[test]
    fn schema_names_are_unique() {
        let mut world = World::new();
        register_all(&mut world);
        assert_eq!(world.registry().len(), TAGS.len() + FIELDS.len());
        assert_eq!(world.registry().kind_of(IS_KAMI), Some(ComponentKind::Tag));
        assert_eq!(world.registry().kind_of(HEALTH), Some(ComponentKind::Field));
    }
}
