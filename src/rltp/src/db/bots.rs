use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A bot type definition. Only the loot pools are typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotType {
    #[serde(default)]
    pub inventory: BotInventory,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotInventory {
    #[serde(default)]
    pub items: BotLootPools,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Template → spawn weight, per carry pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotLootPools {
    #[serde(rename = "Backpack", default, skip_serializing_if = "IndexMap::is_empty")]
    pub backpack: IndexMap<String, i64>,

    #[serde(rename = "Pockets", default, skip_serializing_if = "IndexMap::is_empty")]
    pub pockets: IndexMap<String, i64>,

    #[serde(rename = "SpecialLoot", default, skip_serializing_if = "IndexMap::is_empty")]
    pub special_loot: IndexMap<String, i64>,

    #[serde(rename = "TacticalVest", default, skip_serializing_if = "IndexMap::is_empty")]
    pub tactical_vest: IndexMap<String, i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BotLootPools {
    pub fn pools_mut(&mut self) -> [&mut IndexMap<String, i64>; 4] {
        [
            &mut self.backpack,
            &mut self.pockets,
            &mut self.special_loot,
            &mut self.tactical_vest,
        ]
    }
}
