use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionGroup {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    Other,
}

impl PositionGroup {
    pub const ALL: [PositionGroup; 5] = [
        PositionGroup::Goalkeeper,
        PositionGroup::Defender,
        PositionGroup::Midfielder,
        PositionGroup::Forward,
        PositionGroup::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PositionGroup::Goalkeeper => "GK",
            PositionGroup::Defender => "DF",
            PositionGroup::Midfielder => "MF",
            PositionGroup::Forward => "FW",
            PositionGroup::Other => "OT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PositionGroup::Goalkeeper => "Goalkeeper",
            PositionGroup::Defender => "Defender",
            PositionGroup::Midfielder => "Midfielder",
            PositionGroup::Forward => "Forward",
            PositionGroup::Other => "Other",
        }
    }

    pub fn is_outfield(self) -> bool {
        matches!(
            self,
            PositionGroup::Defender | PositionGroup::Midfielder | PositionGroup::Forward
        )
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Strict parse of a group name or short code. Unlike [`map_position`] this
/// rejects anything that is not a position group.
impl FromStr for PositionGroup {
    type Err = SimError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = normalize_position(raw);
        PositionGroup::ALL
            .into_iter()
            .find(|g| key == g.code().to_ascii_lowercase() || key == g.label().to_ascii_lowercase())
            .ok_or_else(|| SimError::InvalidInput(format!("unknown position group `{}`", raw.trim())))
    }
}

// Wyscout main-position codes plus the plain-English names seen in squad lists.
const POSITION_TABLE: &[(&str, PositionGroup)] = &[
    ("gk", PositionGroup::Goalkeeper),
    ("goalkeeper", PositionGroup::Goalkeeper),
    ("keeper", PositionGroup::Goalkeeper),
    ("df", PositionGroup::Defender),
    ("defender", PositionGroup::Defender),
    ("cb", PositionGroup::Defender),
    ("lcb", PositionGroup::Defender),
    ("rcb", PositionGroup::Defender),
    ("lcb3", PositionGroup::Defender),
    ("rcb3", PositionGroup::Defender),
    ("lb", PositionGroup::Defender),
    ("rb", PositionGroup::Defender),
    ("lb5", PositionGroup::Defender),
    ("rb5", PositionGroup::Defender),
    ("lwb", PositionGroup::Defender),
    ("rwb", PositionGroup::Defender),
    ("centre back", PositionGroup::Defender),
    ("center back", PositionGroup::Defender),
    ("full back", PositionGroup::Defender),
    ("left back", PositionGroup::Defender),
    ("right back", PositionGroup::Defender),
    ("wing back", PositionGroup::Defender),
    ("mf", PositionGroup::Midfielder),
    ("midfielder", PositionGroup::Midfielder),
    ("midfield", PositionGroup::Midfielder),
    ("dmf", PositionGroup::Midfielder),
    ("ldmf", PositionGroup::Midfielder),
    ("rdmf", PositionGroup::Midfielder),
    ("cmf", PositionGroup::Midfielder),
    ("lcmf", PositionGroup::Midfielder),
    ("rcmf", PositionGroup::Midfielder),
    ("lcmf3", PositionGroup::Midfielder),
    ("rcmf3", PositionGroup::Midfielder),
    ("amf", PositionGroup::Midfielder),
    ("lamf", PositionGroup::Midfielder),
    ("ramf", PositionGroup::Midfielder),
    ("defensive midfielder", PositionGroup::Midfielder),
    ("central midfielder", PositionGroup::Midfielder),
    ("attacking midfielder", PositionGroup::Midfielder),
    ("fw", PositionGroup::Forward),
    ("forward", PositionGroup::Forward),
    ("attacker", PositionGroup::Forward),
    ("striker", PositionGroup::Forward),
    ("winger", PositionGroup::Forward),
    ("cf", PositionGroup::Forward),
    ("ss", PositionGroup::Forward),
    ("lw", PositionGroup::Forward),
    ("rw", PositionGroup::Forward),
    ("lwf", PositionGroup::Forward),
    ("rwf", PositionGroup::Forward),
    ("centre forward", PositionGroup::Forward),
    ("center forward", PositionGroup::Forward),
    ("left winger", PositionGroup::Forward),
    ("right winger", PositionGroup::Forward),
];

static POSITION_LOOKUP: Lazy<HashMap<&'static str, PositionGroup>> =
    Lazy::new(|| POSITION_TABLE.iter().copied().collect());

/// Map free-text position to its group. Composite values such as
/// `"RCMF, DMF"` resolve by their first listed position; anything unknown
/// lands in [`PositionGroup::Other`].
pub fn map_position(raw_position: &str) -> PositionGroup {
    let first = raw_position
        .split([',', '/', ';'])
        .next()
        .unwrap_or_default();
    let key = normalize_position(first);
    POSITION_LOOKUP
        .get(key.as_str())
        .copied()
        .unwrap_or(PositionGroup::Other)
}

fn normalize_position(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    let mut out = String::with_capacity(lower.len());
    for word in lower.split(|c: char| c.is_whitespace() || c == '-' || c == '_') {
        if word.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    // Plural group titles ("Defenders", "Forwards").
    if out.len() > 3 && out.ends_with('s') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_codes_and_names() {
        assert_eq!(map_position("GK"), PositionGroup::Goalkeeper);
        assert_eq!(map_position(" rcb "), PositionGroup::Defender);
        assert_eq!(map_position("Centre-Back"), PositionGroup::Defender);
        assert_eq!(map_position("DMF"), PositionGroup::Midfielder);
        assert_eq!(map_position("Attacking  Midfielder"), PositionGroup::Midfielder);
        assert_eq!(map_position("CF"), PositionGroup::Forward);
        assert_eq!(map_position("Forwards"), PositionGroup::Forward);
    }

    #[test]
    fn composite_uses_first_position() {
        assert_eq!(map_position("LW, CF"), PositionGroup::Forward);
        assert_eq!(map_position("RCMF, DMF, AMF"), PositionGroup::Midfielder);
    }

    #[test]
    fn unknown_falls_back_to_other() {
        assert_eq!(map_position(""), PositionGroup::Other);
        assert_eq!(map_position("manager"), PositionGroup::Other);
        assert_eq!(map_position("???"), PositionGroup::Other);
    }

    #[test]
    fn every_table_entry_maps_to_its_group() {
        for (raw, group) in POSITION_TABLE {
            assert_eq!(map_position(raw), *group, "{raw}");
            assert_eq!(map_position(&raw.to_ascii_uppercase()), *group, "{raw}");
        }
    }

    #[test]
    fn strict_parse_rejects_positions() {
        assert_eq!("forward".parse::<PositionGroup>(), Ok(PositionGroup::Forward));
        assert_eq!("DF".parse::<PositionGroup>(), Ok(PositionGroup::Defender));
        assert!(matches!(
            "winger".parse::<PositionGroup>(),
            Err(SimError::InvalidInput(_))
        ));
    }
}
