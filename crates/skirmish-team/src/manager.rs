//! The team manager: every team of one game and their liveness.
//!
//! # Ownership
//!
//! A `TeamManager` belongs to exactly one game and is only touched from
//! that game's tick and event callbacks, so it uses plain collections
//! with no locking.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use skirmish_protocol::{Player, PlayerId, TeamId};

use crate::{MemberState, Team, TeamError, TeamMode, TeamState};

/// Colour used when the palette is empty.
const FALLBACK_COLOR: &str = "white";

// ---------------------------------------------------------------------------
// TeamConfig
// ---------------------------------------------------------------------------

/// Settings for team generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    /// Colour labels new teams draw from.
    pub palette: Vec<String>,
    /// Seed for the colour picker. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            palette: [
                "dark_blue",
                "dark_green",
                "dark_aqua",
                "dark_purple",
                "gold",
                "blue",
                "green",
                "aqua",
                "red",
                "light_purple",
                "yellow",
                "minecoin_gold",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            seed: None,
        }
    }
}

/// A fresh id and colour for a team about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamData {
    pub id: TeamId,
    pub color: String,
}

impl TeamData {
    pub fn into_team(self) -> Team {
        Team::new(self.id, self.color)
    }
}

// ---------------------------------------------------------------------------
// TeamManager
// ---------------------------------------------------------------------------

/// Rosters and liveness for every team in a game.
///
/// Invariant: for every registered team, its [`TeamState`] has exactly one
/// entry per roster member.
#[derive(Debug)]
pub struct TeamManager {
    mode: TeamMode,
    palette: Vec<String>,
    rng: StdRng,
    /// Ids handed out by `generate_team_data`.
    team_counter: u32,
    teams: BTreeMap<TeamId, Team>,
    states: HashMap<TeamId, TeamState>,
}

impl TeamManager {
    pub fn new(mode: TeamMode, config: TeamConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            mode,
            palette: config.palette,
            rng,
            team_counter: 0,
            teams: BTreeMap::new(),
            states: HashMap::new(),
        }
    }

    pub fn mode(&self) -> &TeamMode {
        &self.mode
    }

    // -- teams ------------------------------------------------------------

    /// Registers a team with its current roster, every member alive.
    ///
    /// # Errors
    /// - [`TeamError::DuplicateTeam`] if the id is taken
    /// - [`TeamError::TeamFull`] if the roster exceeds the team mode
    /// - [`TeamError::AlreadyOnTeam`] if a member is on another team
    pub fn add(&mut self, team: Team) -> Result<(), TeamError> {
        if self.teams.contains_key(&team.id()) {
            return Err(TeamError::DuplicateTeam(team.id()));
        }
        if team.len() > self.mode.max_members() {
            return Err(TeamError::TeamFull {
                team: team.id(),
                max: self.mode.max_members(),
            });
        }
        for member in team.member_ids() {
            if let Some(other) = self.find_team(member) {
                return Err(TeamError::AlreadyOnTeam(member, other.id()));
            }
        }

        tracing::debug!(team = %team.id(), members = team.len(), "team added");
        self.states.insert(team.id(), TeamState::for_team(&team));
        self.teams.insert(team.id(), team);
        Ok(())
    }

    /// Unregisters a team and drops its liveness entries.
    pub fn remove(&mut self, team: TeamId) -> Option<Team> {
        self.states.remove(&team);
        let removed = self.teams.remove(&team);
        if removed.is_some() {
            tracing::debug!(%team, "team removed");
        }
        removed
    }

    pub fn get(&self, team: TeamId) -> Option<&Team> {
        self.teams.get(&team)
    }

    /// All teams, ordered by id.
    pub fn all(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    pub fn team_state(&self, team: TeamId) -> Option<&TeamState> {
        self.states.get(&team)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// How many team ids [`generate_team_data`](Self::generate_team_data)
    /// has handed out.
    pub fn starting_count(&self) -> u32 {
        self.team_counter
    }

    // -- membership -------------------------------------------------------

    /// Adds a player to a registered team, alive.
    ///
    /// # Errors
    /// - [`TeamError::TeamNotFound`] if the team is not registered
    /// - [`TeamError::AlreadyOnTeam`] if the player is on any team
    /// - [`TeamError::TeamFull`] if the team is at the mode's limit
    pub fn add_member(&mut self, team: TeamId, player: &Player) -> Result<(), TeamError> {
        if let Some(current) = self.find_team(player.id) {
            return Err(TeamError::AlreadyOnTeam(player.id, current.id()));
        }
        let max = self.mode.max_members();
        let roster = self.teams.get_mut(&team).ok_or(TeamError::TeamNotFound(team))?;
        if roster.len() >= max {
            return Err(TeamError::TeamFull { team, max });
        }

        roster.add_member(player);
        self.states
            .entry(team)
            .or_insert_with(|| TeamState::for_team(roster))
            .insert(player.id);
        tracing::debug!(%team, player_id = %player.id, "member added");
        Ok(())
    }

    /// Takes a player off their team and drops their liveness entry.
    /// Returns the team they were on.
    pub fn remove_player_from_team(&mut self, player: PlayerId) -> Option<TeamId> {
        let team = self.find_team(player)?.id();
        if let Some(roster) = self.teams.get_mut(&team) {
            roster.remove_member(player);
        }
        if let Some(state) = self.states.get_mut(&team) {
            state.remove(player);
        }
        tracing::debug!(%team, player_id = %player, "member removed");
        Some(team)
    }

    pub fn has_team(&self, player: PlayerId) -> bool {
        self.find_team(player).is_some()
    }

    /// The player's team.
    ///
    /// # Errors
    /// [`TeamError::NoTeam`] if the player is on no team. Use
    /// [`find_team`](Self::find_team) when that is an expected outcome.
    pub fn team_of(&self, player: PlayerId) -> Result<&Team, TeamError> {
        self.find_team(player).ok_or(TeamError::NoTeam(player))
    }

    /// The player's team, if any.
    pub fn find_team(&self, player: PlayerId) -> Option<&Team> {
        self.teams.values().find(|team| team.is_member(player))
    }

    /// Both players are on teams, and on the same one.
    pub fn check_on_teams(&self, first: PlayerId, second: PlayerId) -> bool {
        match (self.find_team(first), self.find_team(second)) {
            (Some(a), Some(b)) => a.id() == b.id(),
            _ => false,
        }
    }

    /// Every rostered player, team by team in id order.
    pub fn players(&self) -> Vec<PlayerId> {
        self.teams.values().flat_map(|team| team.member_ids()).collect()
    }

    // -- liveness ---------------------------------------------------------

    /// Teams with at least one living member, ordered by id.
    pub fn alive_teams(&self) -> Vec<&Team> {
        self.teams
            .values()
            .filter(|team| self.states.get(&team.id()).is_some_and(TeamState::is_alive))
            .collect()
    }

    /// Every rostered player whose state is alive, in roster order.
    pub fn alive_players(&self) -> Vec<PlayerId> {
        self.teams
            .values()
            .flat_map(|team| {
                let state = self.states.get(&team.id());
                team.member_ids()
                    .filter(move |id| state.and_then(|s| s.get(*id)).is_some_and(MemberState::is_alive))
            })
            .collect()
    }

    /// Sets a member's liveness. Does nothing if the player has no team.
    pub fn set_player_state(&mut self, player: PlayerId, state: MemberState) {
        let Some(team) = self.find_team(player).map(Team::id) else {
            tracing::warn!(player_id = %player, %state, "liveness update for player without a team ignored");
            return;
        };
        if let Some(team_state) = self.states.get_mut(&team) {
            // Rosters and states are kept in step, so the entry exists.
            let _ = team_state.set(player, state);
            tracing::debug!(%team, player_id = %player, %state, "member state changed");
        }
    }

    pub fn player_state(&self, player: PlayerId) -> Option<MemberState> {
        let team = self.find_team(player)?;
        self.states.get(&team.id())?.get(player)
    }

    // -- generation -------------------------------------------------------

    /// The next sequential team id plus a colour drawn from the palette.
    pub fn generate_team_data(&mut self) -> TeamData {
        self.team_counter += 1;
        let color = self
            .palette
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_COLOR.to_string());
        TeamData {
            id: TeamId(self.team_counter),
            color,
        }
    }

    /// Drops every team and liveness entry and restarts id generation.
    pub fn finish(&mut self) {
        self.teams.clear();
        self.states.clear();
        self.team_counter = 0;
    }
}
