//! Resource catalog
//!
//! One static [`ResourceSpec`] per CRUD resource. The world list is listed
//! unscoped; every entity kind is listed per world.

use crate::value_objects::{EntityKind, FieldRemap, ResourceSpec, ScopeRule, StatGroup};

// ============================================================================
// Worlds
// ============================================================================

pub static WORLD_SPEC: ResourceSpec = ResourceSpec {
    key: "world",
    label: "World",
    endpoint: "/api/worlds",
    scope: ScopeRule::Unscoped,
    name_field: "name",
    category_field: Some("world_type"),
    categories: &[
        "fantasy",
        "science_fiction",
        "wuxia",
        "xianxia",
        "urban",
        "historical",
        "other",
    ],
    status_field: Some("status"),
    required_fields: &["name", "world_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "eastern",
        members: &["wuxia", "xianxia"],
    }],
};

// ============================================================================
// Cast and places
// ============================================================================

pub static CHARACTER_SPEC: ResourceSpec = ResourceSpec {
    key: "character",
    label: "Character",
    endpoint: "/api/characters",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("character_type"),
    categories: &["protagonist", "antagonist", "supporting", "minor"],
    status_field: Some("status"),
    required_fields: &["name", "character_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "main",
        members: &["protagonist", "antagonist"],
    }],
};

pub static LOCATION_SPEC: ResourceSpec = ResourceSpec {
    key: "location",
    label: "Location",
    endpoint: "/api/locations",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("location_type"),
    categories: &[
        "continent",
        "country",
        "city",
        "town",
        "village",
        "dungeon",
        "landmark",
        "realm",
    ],
    status_field: None,
    required_fields: &["name", "location_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "settlements",
        members: &["city", "town", "village"],
    }],
};

pub static ITEM_SPEC: ResourceSpec = ResourceSpec {
    key: "item",
    label: "Item",
    endpoint: "/api/items",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("item_type"),
    categories: &[
        "weapon",
        "armor",
        "artifact",
        "consumable",
        "treasure",
        "tool",
        "material",
    ],
    status_field: None,
    required_fields: &["name", "item_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "equipment",
        members: &["weapon", "armor"],
    }],
};

pub static FACTION_SPEC: ResourceSpec = ResourceSpec {
    key: "faction",
    label: "Faction",
    endpoint: "/api/factions",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("faction_type"),
    categories: &[
        "sect",
        "guild",
        "kingdom",
        "clan",
        "organization",
        "religion",
    ],
    status_field: Some("status"),
    required_fields: &["name", "faction_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "martial",
        members: &["sect", "clan"],
    }],
};

// ============================================================================
// Power systems
// ============================================================================

pub static ENERGY_SYSTEM_SPEC: ResourceSpec = ResourceSpec {
    key: "energy_system",
    label: "Energy System",
    endpoint: "/api/energy-systems",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("system_type"),
    categories: &[
        "magic",
        "cultivation",
        "psionic",
        "technology",
        "divine",
        "other",
    ],
    status_field: None,
    required_fields: &["name", "system_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "supernatural",
        members: &["magic", "cultivation", "divine"],
    }],
};

/// Power levels show `level_number` / `level_title` / `level_description`
/// in the form and store `level` / `level_name` / `description`.
pub static POWER_LEVEL_SPEC: ResourceSpec = ResourceSpec {
    key: "power_level",
    label: "Power Level",
    endpoint: "/api/power-levels",
    scope: ScopeRule::World,
    name_field: "level_name",
    category_field: None,
    categories: &[],
    status_field: None,
    required_fields: &["level", "level_name"],
    remap: FieldRemap::new(&[
        ("level_number", "level"),
        ("level_title", "level_name"),
        ("level_description", "description"),
    ]),
    stat_groups: &[],
};

pub static COMMON_SKILL_SPEC: ResourceSpec = ResourceSpec {
    key: "common_skill",
    label: "Common Skill",
    endpoint: "/api/common-skills",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("skill_type"),
    categories: &["attack", "defense", "support", "movement", "utility"],
    status_field: None,
    required_fields: &["name", "skill_type"],
    remap: FieldRemap::new(&[
        ("skill_name", "name"),
        ("skill_category", "skill_type"),
        ("skill_description", "description"),
    ]),
    stat_groups: &[StatGroup {
        label: "combat",
        members: &["attack", "defense"],
    }],
};

// ============================================================================
// History and society
// ============================================================================

pub static HISTORICAL_EVENT_SPEC: ResourceSpec = ResourceSpec {
    key: "historical_event",
    label: "Historical Event",
    endpoint: "/api/history-events",
    scope: ScopeRule::World,
    name_field: "title",
    category_field: Some("event_type"),
    categories: &[
        "war",
        "founding",
        "disaster",
        "discovery",
        "revolution",
        "cataclysm",
        "other",
    ],
    status_field: None,
    required_fields: &["title", "event_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "conflicts",
        members: &["war", "revolution"],
    }],
};

pub static CIVILIZATION_SPEC: ResourceSpec = ResourceSpec {
    key: "civilization",
    label: "Civilization",
    endpoint: "/api/civilizations",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("civilization_type"),
    categories: &[
        "tribal",
        "feudal",
        "imperial",
        "republic",
        "theocratic",
        "magical",
        "technological",
    ],
    status_field: None,
    required_fields: &["name", "civilization_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[],
};

pub static SOCIAL_CLASS_SPEC: ResourceSpec = ResourceSpec {
    key: "social_class",
    label: "Social Class",
    endpoint: "/api/social-classes",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("class_tier"),
    categories: &[
        "ruling",
        "noble",
        "clergy",
        "merchant",
        "commoner",
        "serf",
        "outcast",
    ],
    status_field: None,
    required_fields: &["name", "class_tier"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "elite",
        members: &["ruling", "noble", "clergy"],
    }],
};

pub static ECONOMIC_SYSTEM_SPEC: ResourceSpec = ResourceSpec {
    key: "economic_system",
    label: "Economic System",
    endpoint: "/api/economic-systems",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("economy_type"),
    categories: &["barter", "feudal", "mercantile", "market", "planned", "mixed"],
    status_field: None,
    required_fields: &["name", "economy_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[],
};

pub static POLITICAL_SYSTEM_SPEC: ResourceSpec = ResourceSpec {
    key: "political_system",
    label: "Political System",
    endpoint: "/api/political-systems",
    scope: ScopeRule::World,
    name_field: "name",
    category_field: Some("government_type"),
    categories: &[
        "monarchy",
        "republic",
        "theocracy",
        "oligarchy",
        "empire",
        "federation",
        "anarchy",
    ],
    status_field: None,
    required_fields: &["name", "government_type"],
    remap: FieldRemap::IDENTITY,
    stat_groups: &[StatGroup {
        label: "autocratic",
        members: &["monarchy", "theocracy", "empire"],
    }],
};

/// Every resource in catalog order, worlds first
pub static ALL_SPECS: [&ResourceSpec; 13] = [
    &WORLD_SPEC,
    &CHARACTER_SPEC,
    &LOCATION_SPEC,
    &ITEM_SPEC,
    &FACTION_SPEC,
    &ENERGY_SYSTEM_SPEC,
    &POWER_LEVEL_SPEC,
    &COMMON_SKILL_SPEC,
    &HISTORICAL_EVENT_SPEC,
    &CIVILIZATION_SPEC,
    &SOCIAL_CLASS_SPEC,
    &ECONOMIC_SYSTEM_SPEC,
    &POLITICAL_SYSTEM_SPEC,
];

impl EntityKind {
    /// Static CRUD configuration for this kind
    pub fn spec(&self) -> &'static ResourceSpec {
        match self {
            Self::Character => &CHARACTER_SPEC,
            Self::Location => &LOCATION_SPEC,
            Self::Item => &ITEM_SPEC,
            Self::Faction => &FACTION_SPEC,
            Self::EnergySystem => &ENERGY_SYSTEM_SPEC,
            Self::PowerLevel => &POWER_LEVEL_SPEC,
            Self::CommonSkill => &COMMON_SKILL_SPEC,
            Self::HistoricalEvent => &HISTORICAL_EVENT_SPEC,
            Self::Civilization => &CIVILIZATION_SPEC,
            Self::SocialClass => &SOCIAL_CLASS_SPEC,
            Self::EconomicSystem => &ECONOMIC_SYSTEM_SPEC,
            Self::PoliticalSystem => &POLITICAL_SYSTEM_SPEC,
        }
    }
}

/// Look up a resource by key ("world" or any entity kind)
pub fn resolve(key: &str) -> Option<&'static ResourceSpec> {
    let normalized = key.trim().to_lowercase().replace('-', "_");
    ALL_SPECS.iter().copied().find(|spec| spec.key == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::FormValues;
    use serde_json::{json, Map, Value};

    #[test]
    fn every_remap_table_is_a_bijection() {
        for spec in ALL_SPECS {
            assert!(spec.remap.validate().is_ok(), "{} remap", spec.key);
        }
    }

    #[test]
    fn kind_keys_match_spec_keys() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.spec().key, kind.as_str());
            assert_eq!(kind.spec().label, kind.display_name());
            assert!(kind.spec().is_world_scoped());
        }
        assert!(!WORLD_SPEC.is_world_scoped());
    }

    #[test]
    fn stat_groups_only_name_known_categories() {
        for spec in ALL_SPECS {
            for group in spec.stat_groups {
                for member in group.members {
                    assert!(spec.accepts_category(member), "{}: {}", spec.key, member);
                }
            }
        }
    }

    #[test]
    fn remap_round_trip_holds_for_every_kind() {
        for spec in ALL_SPECS {
            let mut stored = Map::new();
            for (_, storage) in spec.remap.pairs() {
                stored.insert(storage.to_string(), json!(format!("{}-value", storage)));
            }
            stored.insert(spec.name_field.to_string(), json!("Name"));
            stored.insert("notes".to_string(), Value::from("kept as-is"));

            let form: FormValues = spec.remap.to_form(&stored);
            assert_eq!(spec.remap.to_storage(&form), stored, "{}", spec.key);
        }
    }

    #[test]
    fn resolve_accepts_world_and_dashed_keys() {
        assert_eq!(resolve("world"), Some(&WORLD_SPEC));
        assert_eq!(resolve("power-level"), Some(&POWER_LEVEL_SPEC));
        assert_eq!(resolve("spaceship"), None);
    }
}
