use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How two center tags are compared when checking center affinity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterMatching {
    /// Case-insensitive, and either tag may contain the other ("North" ~ "North Center").
    #[default]
    Tolerant,
    /// Case-insensitive equality after trimming.
    Strict,
}

impl FromStr for CenterMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tolerant" => Ok(Self::Tolerant),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown center matching mode: {other}, expected tolerant/strict")),
        }
    }
}

/// Free-text distribution center name as stored on orders, drivers and vehicles.
///
/// Records carry inconsistent spellings, so the stored text is kept as-is and
/// every comparison goes through [`CenterTag::matches`] or [`CenterTag::same_as`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CenterTag(String);

impl CenterTag {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn normalized(&self) -> String {
        self.0.trim().to_lowercase()
    }

    /// Center affinity check. A blank tag never matches anything.
    pub fn matches(&self, other: &CenterTag, mode: CenterMatching) -> bool {
        let ours = self.normalized();
        let theirs = other.normalized();
        if ours.is_empty() || theirs.is_empty() {
            return false;
        }

        match mode {
            CenterMatching::Strict => ours == theirs,
            CenterMatching::Tolerant => ours.contains(&theirs) || theirs.contains(&ours),
        }
    }

    /// Case-insensitive equality, used where a filter names one center exactly.
    pub fn same_as(&self, other: &CenterTag) -> bool {
        self.matches(other, CenterMatching::Strict)
    }
}

impl fmt::Display for CenterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CenterTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CenterTag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{CenterMatching, CenterTag};

    #[test]
    fn tolerant_match_accepts_containment_either_way() {
        let north = CenterTag::from("North");
        let north_center = CenterTag::from("north center");

        assert!(north.matches(&north_center, CenterMatching::Tolerant));
        assert!(north_center.matches(&north, CenterMatching::Tolerant));
    }

    #[test]
    fn tolerant_match_rejects_unrelated_centers() {
        let north = CenterTag::from("North");
        let central = CenterTag::from("Central");

        assert!(!north.matches(&central, CenterMatching::Tolerant));
    }

    #[test]
    fn strict_match_requires_same_name() {
        let north = CenterTag::from(" NORTH ");

        assert!(north.matches(&CenterTag::from("north"), CenterMatching::Strict));
        assert!(!north.matches(&CenterTag::from("North Center"), CenterMatching::Strict));
    }

    #[test]
    fn blank_tags_never_match() {
        let blank = CenterTag::from("   ");
        let north = CenterTag::from("North");

        assert!(!blank.matches(&north, CenterMatching::Tolerant));
        assert!(!north.matches(&blank, CenterMatching::Tolerant));
        assert!(!blank.same_as(&blank));
    }

    #[test]
    fn matching_mode_parses_from_config_strings() {
        assert_eq!("Strict".parse::<CenterMatching>(), Ok(CenterMatching::Strict));
        assert_eq!("tolerant".parse::<CenterMatching>(), Ok(CenterMatching::Tolerant));
        assert!("fuzzy".parse::<CenterMatching>().is_err());
    }
}
