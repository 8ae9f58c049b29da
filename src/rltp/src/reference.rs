//! Reference data for the host's game content
//!
//! Hardcoded identifiers and lookup tables: well-known template ids, trader
//! ids and their short codes, enemy type display names, item rarities and
//! hideout area names.

// ============================================================================
// Templates
// ============================================================================

pub const AMMO_PARENT: &str = "5485a8684bdc2da71d8b4567";
pub const AMMO_BOX_PARENT: &str = "543be5cb4bdc2deb348b4568";
pub const MEDICAL_PARENT: &str = "543be5664bdc2dd4348b4569";

pub const ROUBLES: &str = "5449016a4bdc2d6f028b456f";
pub const DOLLARS: &str = "5696686a4bdc2da3298b456a";
pub const EUROS: &str = "569668774bdc2da2298b4568";
pub const MONEY: &[&str] = &[ROUBLES, DOLLARS, EUROS];

pub const DOGTAG_BEAR: &str = "59f32bb586f774757e1e8442";
pub const DOGTAG_USEC: &str = "59f32c3b86f77472a31742f0";

/// Default inventory (equipment root) template
pub const DEFAULT_INVENTORY: &str = "55d7217a4bdc2d86028b456d";
pub const DEFAULT_POCKETS: &str = "627a4e6b255f7527fb05a0f6";
pub const POCKETS_BASE: &str = "557596e64bdc2dc2118b4571";

/// Item paid out in roubles on survival
pub const CASH_OUT_ITEM: &str = "60b0f7057897d47c5b04ab94";
pub const CASH_OUT_RATE: i64 = 2000;

pub const HANDBOOK_OVERRIDE_PARENT: &str = "5b5f746686f77447ec5d7708";

/// Game version prefix of rogue-lite profiles
pub const GAME_VERSION_PREFIX: &str = "VAI Rogue-lite";

/// Assort parent of root listings
pub const HIDEOUT: &str = "hideout";

// ============================================================================
// Traders
// ============================================================================

/// Trader identity and short code used in configs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraderInfo {
    pub code: &'static str,
    pub id: &'static str,
    pub name: &'static str,
}

pub const PRAPOR: &str = "54cb50c76803fa8b248b4571";
pub const THERAPIST: &str = "54cb57776803fa99248b456e";
pub const FENCE: &str = "579dc571d53a0658a154fbec";
pub const SKIER: &str = "58330581ace78e27b8b10cee";
pub const PEACEKEEPER: &str = "5935c25fb3acc3127c3d8cd9";
pub const MECHANIC: &str = "5a7c2eca46aef81a7ca2145d";
pub const RAGMAN: &str = "5ac3b934156ae10c4430e83c";
pub const JAEGER: &str = "5c0647fdd443bc2504c2d371";
pub const REF: &str = "6617beeaa9cfa777ca915b7c";

pub const TRADERS: &[TraderInfo] = &[
    TraderInfo {
        code: "p",
        id: PRAPOR,
        name: "Prapor",
    },
    TraderInfo {
        code: "t",
        id: THERAPIST,
        name: "Therapist",
    },
    TraderInfo {
        code: "f",
        id: FENCE,
        name: "Fence",
    },
    TraderInfo {
        code: "s",
        id: SKIER,
        name: "Skier",
    },
    TraderInfo {
        code: "pk",
        id: PEACEKEEPER,
        name: "Peacekeeper",
    },
    TraderInfo {
        code: "m",
        id: MECHANIC,
        name: "Mechanic",
    },
    TraderInfo {
        code: "r",
        id: RAGMAN,
        name: "Ragman",
    },
    TraderInfo {
        code: "j",
        id: JAEGER,
        name: "Jaeger",
    },
    TraderInfo {
        code: "re",
        id: REF,
        name: "Ref",
    },
];

/// Traders whose ammo is sold in batches
pub const AMMO_BATCH_TRADERS: &[&str] = &[PRAPOR, SKIER, PEACEKEEPER, MECHANIC, JAEGER];

/// Rounds per ammo batch
pub const AMMO_BATCH_SIZE: i64 = 30;

/// Trader id by config short code
pub fn trader_by_code(code: &str) -> Option<&'static str> {
    TRADERS.iter().find(|t| t.code == code).map(|t| t.id)
}

pub fn is_ammo_batch_trader(trader_id: &str) -> bool {
    AMMO_BATCH_TRADERS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(trader_id))
}

/// The same value for every original trader, keyed by trader id
pub fn trader_records<T: Clone>(value: T) -> Vec<(String, T)> {
    TRADERS
        .iter()
        .filter(|t| t.code != "re")
        .map(|t| (t.id.to_string(), value.clone()))
        .collect()
}

// ============================================================================
// Enemies
// ============================================================================

pub const ENEMY_NAMES: &[(&str, &str)] = &[
    ("bossBully", "Reshala"),
    ("followerBully", "Reshala Guard"),
    ("bossTagilla", "Tagilla"),
    ("bossKojaniy", "Shturman"),
    ("followerKojaniy", "Shturman Guard"),
    ("bossSanitar", "Sanitar"),
    ("followerSanitar", "Sanitar Guard"),
    ("bossKilla", "Killa"),
    ("bossBoar", "Kaban"),
    ("bossBoarSniper", "Kaban Sniper"),
    ("followerBoar", "Kaban Guard"),
    ("exUsec", "Rogue"),
    ("bossKnight", "Knight"),
    ("followerBirdEye", "Bird Eye"),
    ("followerBigPipe", "Big Pipe"),
    ("bossGluhar", "Glukhar"),
    ("followerGluharAssault", "Glukhar Assault"),
    ("followerGluharScout", "Glukhar Scout"),
    ("followerGluharSecurity", "Glukhar Security"),
    ("followerGluharSnipe", "Glukhar Sniper"),
    ("sectantPriest", "Cultist Priest"),
    ("sectantWarrior", "Cultist Warrior"),
    ("marksman", "Scav Sniper"),
    ("pmcBot", "Raider"),
    ("pmcUSEC", "USEC PMC"),
    ("pmcBEAR", "BEAR PMC"),
];

/// Display name of an enemy role
pub fn enemy_name(role: &str) -> String {
    ENEMY_NAMES
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("UNKNOWN SCAV TYPE ({role})"))
}

// ============================================================================
// Rarity
// ============================================================================

/// Rarity tier information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RarityTier {
    pub tier: u8,
    pub code: &'static str,
    pub name: &'static str,
    pub color: &'static str,
}

/// All rarity tiers in order
pub const RARITY_TIERS: &[RarityTier] = &[
    RarityTier {
        tier: 1,
        code: "c",
        name: "common",
        color: "grey",
    },
    RarityTier {
        tier: 2,
        code: "uc",
        name: "uncommon",
        color: "green",
    },
    RarityTier {
        tier: 3,
        code: "e",
        name: "epic",
        color: "violet",
    },
    RarityTier {
        tier: 4,
        code: "r",
        name: "rare",
        color: "yellow",
    },
    RarityTier {
        tier: 5,
        code: "l",
        name: "legendary",
        color: "red",
    },
    RarityTier {
        tier: 6,
        code: "u",
        name: "unique",
        color: "orange",
    },
    RarityTier {
        tier: 7,
        code: "q",
        name: "quest",
        color: "blue",
    },
];

/// Background color for a rarity given as tier number, code or name.
///
/// Unknown rarities are grey.
pub fn rarity_color(rarity: &str) -> &'static str {
    RARITY_TIERS
        .iter()
        .find(|r| r.tier.to_string() == rarity || r.code == rarity || r.name == rarity)
        .map_or("grey", |r| r.color)
}

// ============================================================================
// Hideout
// ============================================================================

pub const AREA_SECURITY: i64 = 1;
pub const AREA_GENERATOR: i64 = 4;
pub const AREA_WATER_COLLECTOR: i64 = 6;

/// Hideout area names, indexed by area type
pub const AREA_NAMES: &[&str] = &[
    "Vents",
    "Security",
    "Lavatory",
    "Stash",
    "Generator",
    "Heating",
    "WaterCollector",
    "MedStation",
    "NutritionUnit",
    "RestSpace",
    "Workbench",
    "IntelligenceCenter",
    "ShootingRange",
    "Library",
    "ScavCase",
    "Illumination",
    "PlaceOfFame",
    "AirFilteringUnit",
    "SolarPower",
    "BoozeGenerator",
    "BitcoinFarm",
    "ChristmasTree",
    "EmergencyWall",
    "Gym",
    "WeaponStand",
    "WeaponStandSecondary",
    "EquipmentPresetsStand",
    "CircleOfCultists",
];

/// Area type by name, case-insensitive
pub fn area_by_name(name: &str) -> Option<i64> {
    AREA_NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(name))
        .map(|p| p as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trader_by_code() {
        assert_eq!(trader_by_code("pk"), Some(PEACEKEEPER));
        assert_eq!(trader_by_code("re"), Some(REF));
        assert_eq!(trader_by_code("x"), None);
    }

    #[test]
    fn test_trader_records_skip_ref() {
        let records = trader_records(1);
        assert_eq!(records.len(), 8);
        assert!(records.iter().all(|(id, v)| id != REF && *v == 1));
    }

    #[test]
    fn test_ammo_batch_traders() {
        assert!(is_ammo_batch_trader(PRAPOR));
        assert!(is_ammo_batch_trader(&JAEGER.to_uppercase()));
        assert!(!is_ammo_batch_trader(THERAPIST));
        assert!(!is_ammo_batch_trader("ragfair"));
    }

    #[test]
    fn test_enemy_name() {
        assert_eq!(enemy_name("bossKilla"), "Killa");
        assert_eq!(enemy_name("assault"), "UNKNOWN SCAV TYPE (assault)");
    }

    #[test]
    fn test_rarity_color() {
        assert_eq!(rarity_color("1"), "grey");
        assert_eq!(rarity_color("uc"), "green");
        assert_eq!(rarity_color("legendary"), "red");
        assert_eq!(rarity_color("7"), "blue");
        assert_eq!(rarity_color("mythic"), "grey");
    }

    #[test]
    fn test_area_by_name() {
        assert_eq!(area_by_name("generator"), Some(AREA_GENERATOR));
        assert_eq!(area_by_name("WaterCollector"), Some(AREA_WATER_COLLECTOR));
        assert_eq!(area_by_name("Garage"), None);
    }
}
