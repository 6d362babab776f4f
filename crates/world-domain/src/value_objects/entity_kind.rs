//! The fixed set of world-scoped entity kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Kind of a world-scoped entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Character,
    Location,
    Item,
    Faction,
    EnergySystem,
    PowerLevel,
    CommonSkill,
    HistoricalEvent,
    Civilization,
    SocialClass,
    EconomicSystem,
    PoliticalSystem,
}

impl EntityKind {
    /// Every kind, in catalog order
    pub const ALL: [EntityKind; 12] = [
        Self::Character,
        Self::Location,
        Self::Item,
        Self::Faction,
        Self::EnergySystem,
        Self::PowerLevel,
        Self::CommonSkill,
        Self::HistoricalEvent,
        Self::Civilization,
        Self::SocialClass,
        Self::EconomicSystem,
        Self::PoliticalSystem,
    ];

    /// Get the string representation used on the wire and the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Item => "item",
            Self::Faction => "faction",
            Self::EnergySystem => "energy_system",
            Self::PowerLevel => "power_level",
            Self::CommonSkill => "common_skill",
            Self::HistoricalEvent => "historical_event",
            Self::Civilization => "civilization",
            Self::SocialClass => "social_class",
            Self::EconomicSystem => "economic_system",
            Self::PoliticalSystem => "political_system",
        }
    }

    /// Get a display-friendly name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Location => "Location",
            Self::Item => "Item",
            Self::Faction => "Faction",
            Self::EnergySystem => "Energy System",
            Self::PowerLevel => "Power Level",
            Self::CommonSkill => "Common Skill",
            Self::HistoricalEvent => "Historical Event",
            Self::Civilization => "Civilization",
            Self::SocialClass => "Social Class",
            Self::EconomicSystem => "Economic System",
            Self::PoliticalSystem => "Political System",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    /// Parse a kind (case-insensitive, `-` and `_` interchangeable)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| DomainError::parse(format!("unknown entity kind '{}'", s)))
    }
}
