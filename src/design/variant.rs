//! Design variants and their structural configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit-group granularity of the multiplier tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BitGroup {
    /// 2-bit groups at level 2
    L2,
    /// 2-bit groups at level 3
    L3,
    /// Bit-serial
    BitSerial,
}

impl BitGroup {
    /// Tag used in design identifiers and setup scripts.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::BitSerial => "BS",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "L2" => Some(Self::L2),
            "L3" => Some(Self::L3),
            "BS" => Some(Self::BitSerial),
            _ => None,
        }
    }
}

/// Interconnect mode of one hierarchy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelMode {
    /// Input sharing (`00`)
    InputSharing,
    /// Hybrid sharing (`10`)
    HybridSharing,
    /// Output sharing (`11`)
    OutputSharing,
}

impl LevelMode {
    /// Two-bit mode code as written into setup scripts.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputSharing => "00",
            Self::HybridSharing => "10",
            Self::OutputSharing => "11",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "00" => Some(Self::InputSharing),
            "10" => Some(Self::HybridSharing),
            "11" => Some(Self::OutputSharing),
            _ => None,
        }
    }
}

/// Structural configuration owned by a design variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructuralConfig {
    /// Bit-group granularity
    pub bit_group: BitGroup,
    /// Level-4 interconnect mode
    pub l4: LevelMode,
    /// Level-3 interconnect mode
    pub l3: LevelMode,
    /// Level-2 interconnect mode
    pub l2: LevelMode,
    /// Precision-scaling (sub-word unit) design
    pub dvafs: bool,
}

impl StructuralConfig {
    /// Canonical `BG_..._DVAFS_x` identifier for this configuration.
    #[must_use]
    pub fn canonical_id(&self) -> String {
        format!(
            "BG_{}_L4_{}_L3_{}_L2_{}_DVAFS_{}",
            self.bit_group.tag(),
            self.l4.code(),
            self.l3.code(),
            self.l2.code(),
            u8::from(self.dvafs)
        )
    }

    /// Timing-constraint mode selected for synthesis.
    ///
    /// Constraint files are keyed by bit-group granularity.
    #[must_use]
    pub const fn sdc_mode(&self) -> &'static str {
        self.bit_group.tag()
    }

    fn parse_canonical(id: &str) -> Option<Self> {
        let parts: Vec<&str> = id.split('_').collect();
        match parts.as_slice() {
            ["BG", bg, "L4", l4, "L3", l3, "L2", l2, "DVAFS", dvafs] => Some(Self {
                bit_group: BitGroup::from_tag(bg)?,
                l4: LevelMode::from_code(l4)?,
                l3: LevelMode::from_code(l3)?,
                l2: LevelMode::from_code(l2)?,
                dvafs: match *dvafs {
                    "0" => false,
                    "1" => true,
                    _ => return None,
                },
            }),
            _ => None,
        }
    }
}

/// Named architectures from the literature and the configuration they map to.
const NAMED_VARIANTS: &[(&str, &str)] = &[
    ("BITFUSION", "BG_L2_L4_00_L3_11_L2_11_DVAFS_0"),
    ("BITBLADE", "BG_L3_L4_00_L3_11_L2_11_DVAFS_0"),
    ("LOOM", "BG_BS_L4_00_L3_00_L2_11_DVAFS_0"),
];

/// One hardware configuration point in the sweep.
///
/// The identifier is the only thing persisted; the structural configuration
/// is always recomputed from it, so the mapping cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DesignVariant {
    id: String,
    config: StructuralConfig,
}

impl DesignVariant {
    /// Parse a design identifier (`BG_L2_L4_00_L3_10_L2_11_DVAFS_0`, or a
    /// named alias such as `BITFUSION`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDesign`] if the identifier is not in the grammar.
    pub fn parse(id: &str) -> Result<Self> {
        let canonical = NAMED_VARIANTS
            .iter()
            .find(|&&(name, _)| name == id)
            .map_or(id, |&(_, canonical)| canonical);

        StructuralConfig::parse_canonical(canonical)
            .map(|config| Self {
                id: id.to_string(),
                config,
            })
            .ok_or_else(|| Error::UnknownDesign(id.to_string()))
    }

    /// Build a variant directly from its configuration (canonical identifier).
    #[must_use]
    pub fn from_config(config: StructuralConfig) -> Self {
        Self {
            id: config.canonical_id(),
            config,
        }
    }

    /// Design identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Structural configuration.
    #[must_use]
    pub const fn config(&self) -> &StructuralConfig {
        &self.config
    }
}

impl fmt::Display for DesignVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl TryFrom<String> for DesignVariant {
    type Error = Error;

    fn try_from(id: String) -> Result<Self> {
        Self::parse(&id)
    }
}

impl From<DesignVariant> for String {
    fn from(design: DesignVariant) -> Self {
        design.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_identifier() {
        let design = DesignVariant::parse("BG_L3_L4_10_L3_00_L2_11_DVAFS_1").unwrap();
        let config = design.config();
        assert_eq!(config.bit_group, BitGroup::L3);
        assert_eq!(config.l4, LevelMode::HybridSharing);
        assert_eq!(config.l3, LevelMode::InputSharing);
        assert_eq!(config.l2, LevelMode::OutputSharing);
        assert!(config.dvafs);
        assert_eq!(config.canonical_id(), design.id());
    }

    #[test]
    fn test_named_alias_resolves() {
        let loom = DesignVariant::parse("LOOM").unwrap();
        assert_eq!(loom.id(), "LOOM");
        assert_eq!(loom.config().bit_group, BitGroup::BitSerial);
        assert_eq!(loom.config().canonical_id(), "BG_BS_L4_00_L3_00_L2_11_DVAFS_0");
    }

    #[test]
    fn test_unknown_identifier_rejected() {
        assert!(matches!(
            DesignVariant::parse("BG_L5_L4_00_L3_00_L2_00_DVAFS_0"),
            Err(Error::UnknownDesign(_))
        ));
        assert!(DesignVariant::parse("BG_L2_L4_01_L3_00_L2_00_DVAFS_0").is_err());
        assert!(DesignVariant::parse("").is_err());
    }

    #[test]
    fn test_serde_as_identifier() {
        let design = DesignVariant::parse("BITBLADE").unwrap();
        let json = serde_json::to_string(&design).unwrap();
        assert_eq!(json, "\"BITBLADE\"");
        let back: DesignVariant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, design);
    }
}
