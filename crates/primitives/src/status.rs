//! Closed lifecycle and placement enumerations.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a block.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BlockStatus {
    /// Scaffolding for subdivision; does not claim space itself.
    Container,
    #[default]
    Active,
    Reserved,
}

impl BlockStatus {
    /// Whether a block in this status claims its address range.
    pub const fn is_claiming(self) -> bool {
        match self {
            Self::Container => false,
            Self::Active | Self::Reserved => true,
        }
    }
}

/// Lifecycle status of a host address.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AddressStatus {
    #[default]
    Active,
    Reserved,
}

/// Placement strategy used when carving child blocks.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum CarveStrategy {
    /// Lowest-address candidates first.
    #[default]
    FirstFit,
    /// Smallest free gap first, to keep large runs of free space intact.
    Dense,
}
