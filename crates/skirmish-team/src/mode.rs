//! Team modes: how many players make up one team.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TeamError;

/// The size of the teams in a game (solo, duos, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamMode {
    /// Lowercase identifier, e.g. `"duos"`.
    name: String,
    /// Human-readable label, e.g. `"Duos"`.
    display_name: String,
    max_members: usize,
}

impl TeamMode {
    pub fn solo() -> Self {
        Self::custom("solo", "Solo", 1)
    }

    pub fn duos() -> Self {
        Self::custom("duos", "Duos", 2)
    }

    pub fn trios() -> Self {
        Self::custom("trios", "Trios", 3)
    }

    pub fn squads() -> Self {
        Self::custom("squads", "Squads", 4)
    }

    pub fn five_man() -> Self {
        Self::custom("five_man", "Five Man", 5)
    }

    pub fn ultra_squads() -> Self {
        Self::custom("ultra_squads", "Ultra Squads", 10)
    }

    /// Every built-in mode, smallest first.
    pub fn presets() -> [TeamMode; 6] {
        [
            Self::solo(),
            Self::duos(),
            Self::trios(),
            Self::squads(),
            Self::five_man(),
            Self::ultra_squads(),
        ]
    }

    /// A mode that is not one of the presets.
    pub fn custom(name: impl Into<String>, display_name: impl Into<String>, max_members: usize) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            max_members,
        }
    }

    /// Looks up a preset by identifier or display name, ignoring case.
    ///
    /// # Errors
    /// [`TeamError::UnknownMode`] if no preset matches.
    pub fn from_name(name: &str) -> Result<Self, TeamError> {
        Self::presets()
            .into_iter()
            .find(|mode| mode.name.eq_ignore_ascii_case(name) || mode.display_name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TeamError::UnknownMode(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn max_members(&self) -> usize {
        self.max_members
    }
}

impl Default for TeamMode {
    fn default() -> Self {
        Self::solo()
    }
}

impl fmt::Display for TeamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_sizes() {
        let sizes: Vec<usize> = TeamMode::presets().iter().map(TeamMode::max_members).collect();
        assert_eq!(sizes, vec![1, 2, 3, 4, 5, 10]);
    }

    #[test]
    fn test_from_name_accepts_id_and_display_name() {
        assert_eq!(TeamMode::from_name("duos").unwrap(), TeamMode::duos());
        assert_eq!(TeamMode::from_name("Five Man").unwrap(), TeamMode::five_man());
        assert_eq!(TeamMode::from_name("ULTRA_SQUADS").unwrap(), TeamMode::ultra_squads());
    }

    #[test]
    fn test_from_name_unknown() {
        assert_eq!(
            TeamMode::from_name("octets"),
            Err(TeamError::UnknownMode("octets".into()))
        );
    }

    #[test]
    fn test_custom_mode_is_not_a_preset() {
        let mode = TeamMode::custom("pairs", "Pairs", 2);
        assert_eq!(mode.to_string(), "Pairs");
        assert!(TeamMode::from_name("pairs").is_err());
    }

    #[test]
    fn test_default_is_solo() {
        assert_eq!(TeamMode::default(), TeamMode::solo());
    }
}
