//! Rounds for best-of-N games.
//!
//! A round-based game layers a small state machine over its `InGame`
//! phase:
//!
//! ```text
//! Preround ──→ InRound ──→ Postround ──advance_round──→ Preround ...
//! ```
//!
//! Nothing here runs on its own. The game's phase handler increments the
//! current round's timer, ticks the between-round countdown and moves the
//! round state along.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use skirmish_protocol::TeamId;
use skirmish_team::{TeamError, TeamManager};

/// Game ticks between the end of one round and the start of the next.
pub const COUNTDOWN_LENGTH: u64 = 10;

/// Where a round-based game is within the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    #[default]
    Preround,
    InRound,
    Postround,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preround => write!(f, "preround"),
            Self::InRound => write!(f, "in_round"),
            Self::Postround => write!(f, "postround"),
        }
    }
}

/// One timed sub-contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based.
    pub number: u32,
    /// Game ticks played in this round.
    pub time: u64,
}

impl Round {
    pub fn new(number: u32) -> Self {
        Self { number, time: 0 }
    }

    pub fn increment_time(&mut self) {
        self.time += 1;
    }

    /// Elapsed time as `mm:ss`, given how many ticks make a second.
    pub fn format_time(&self, ticks_per_second: u64) -> String {
        let seconds = self.time / ticks_per_second.max(1);
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }
}

/// The game-specific parts of a round format.
pub trait RoundRules: Send {
    /// Rounds in a full match.
    fn round_count(&self) -> u32;

    /// Game ticks a round lasts before it is called.
    fn round_length(&self) -> u64;

    /// Whether `team` has won the match.
    fn has_team_won(&self, team: TeamId, rounds: &RoundManager) -> bool;
}

/// Current round, past rounds and per-team scores.
///
/// Invariant: every key in the score table named a registered team when
/// it was written.
pub struct RoundManager {
    rules: Box<dyn RoundRules>,
    current: Round,
    past: Vec<Round>,
    scores: BTreeMap<TeamId, u32>,
    state: RoundState,
    countdown: u64,
}

impl RoundManager {
    pub fn new(rules: impl RoundRules + 'static) -> Self {
        Self {
            rules: Box::new(rules),
            current: Round::new(1),
            past: Vec::new(),
            scores: BTreeMap::new(),
            state: RoundState::Preround,
            countdown: COUNTDOWN_LENGTH,
        }
    }

    pub fn current(&self) -> &Round {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Round {
        &mut self.current
    }

    pub fn past_rounds(&self) -> &[Round] {
        &self.past
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn set_state(&mut self, state: RoundState) {
        if self.state != state {
            tracing::debug!(round = self.current.number, from = %self.state, to = %state, "round state changed");
            self.state = state;
        }
    }

    pub fn round_count(&self) -> u32 {
        self.rules.round_count()
    }

    pub fn round_length(&self) -> u64 {
        self.rules.round_length()
    }

    /// The current round has run for its full length.
    pub fn is_round_over(&self) -> bool {
        self.current.time >= self.rules.round_length()
    }

    pub fn is_final_round(&self) -> bool {
        self.current.number >= self.rules.round_count()
    }

    // -- countdown --------------------------------------------------------

    /// Game ticks left before the next round may start.
    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    /// Counts down one game tick. Returns `true` once it reaches zero.
    pub fn tick_countdown(&mut self) -> bool {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown == 0
    }

    pub fn reset_countdown(&mut self) {
        self.countdown = COUNTDOWN_LENGTH;
    }

    // -- rounds -----------------------------------------------------------

    /// Archives the current round and starts the next one in `Preround`.
    pub fn advance_round(&mut self) -> &Round {
        let next = Round::new(self.current.number + 1);
        let finished = std::mem::replace(&mut self.current, next);
        tracing::debug!(round = finished.number, time = finished.time, "round archived");
        self.past.push(finished);
        self.state = RoundState::Preround;
        self.countdown = COUNTDOWN_LENGTH;
        &self.current
    }

    /// The team that won the current round: the only alive team, if
    /// exactly one is alive.
    pub fn round_winner(&self, teams: &TeamManager) -> Option<TeamId> {
        match teams.alive_teams().as_slice() {
            [only] => Some(only.id()),
            _ => None,
        }
    }

    // -- scores -----------------------------------------------------------

    pub fn score(&self, team: TeamId) -> u32 {
        self.scores.get(&team).copied().unwrap_or(0)
    }

    pub fn scores(&self) -> &BTreeMap<TeamId, u32> {
        &self.scores
    }

    /// Sets a team's score.
    ///
    /// # Errors
    /// [`TeamError::TeamNotFound`] if the team is not registered in
    /// `teams`.
    pub fn set_score(&mut self, team: TeamId, score: u32, teams: &TeamManager) -> Result<(), TeamError> {
        if teams.get(team).is_none() {
            return Err(TeamError::TeamNotFound(team));
        }
        self.scores.insert(team, score);
        Ok(())
    }

    /// Gives a team one round win and returns its new score.
    ///
    /// # Errors
    /// [`TeamError::TeamNotFound`] if the team is not registered in
    /// `teams`.
    pub fn award_round(&mut self, team: TeamId, teams: &TeamManager) -> Result<u32, TeamError> {
        let score = self.score(team) + 1;
        self.set_score(team, score, teams)?;
        tracing::debug!(round = self.current.number, %team, score, "round awarded");
        Ok(score)
    }

    /// The first team, by id, that the rules say has won the match.
    pub fn match_winner(&self, teams: &TeamManager) -> Option<TeamId> {
        teams
            .all()
            .map(|team| team.id())
            .find(|&team| self.rules.has_team_won(team, self))
    }

    /// Drops all rounds and scores and starts over at round 1.
    pub fn finish(&mut self) {
        self.current = Round::new(1);
        self.past.clear();
        self.scores.clear();
        self.state = RoundState::Preround;
        self.countdown = COUNTDOWN_LENGTH;
    }
}

impl fmt::Debug for RoundManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundManager")
            .field("current", &self.current)
            .field("past", &self.past.len())
            .field("scores", &self.scores)
            .field("state", &self.state)
            .field("countdown", &self.countdown)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::Player;
    use skirmish_team::{MemberState, Team, TeamConfig, TeamMode};

    /// First to two round wins, five rounds of 30 ticks.
    struct FirstToTwo;

    impl RoundRules for FirstToTwo {
        fn round_count(&self) -> u32 {
            5
        }

        fn round_length(&self) -> u64 {
            30
        }

        fn has_team_won(&self, team: TeamId, rounds: &RoundManager) -> bool {
            rounds.score(team) >= 2
        }
    }

    fn two_teams() -> TeamManager {
        let mut teams = TeamManager::new(TeamMode::solo(), TeamConfig::default());
        teams.add(Team::with_members(TeamId(1), "red", [&Player::new(1, "Alice")])).unwrap();
        teams.add(Team::with_members(TeamId(2), "blue", [&Player::new(2, "Bob")])).unwrap();
        teams
    }

    #[test]
    fn test_round_winner_needs_exactly_one_alive_team() {
        let mut teams = two_teams();
        let rounds = RoundManager::new(FirstToTwo);
        assert_eq!(rounds.round_winner(&teams), None);

        teams.set_player_state(skirmish_protocol::PlayerId(2), MemberState::Dead);
        assert_eq!(rounds.round_winner(&teams), Some(TeamId(1)));

        teams.set_player_state(skirmish_protocol::PlayerId(1), MemberState::Dead);
        assert_eq!(rounds.round_winner(&teams), None);
    }

    #[test]
    fn test_scores_only_for_registered_teams() {
        let teams = two_teams();
        let mut rounds = RoundManager::new(FirstToTwo);
        assert_eq!(rounds.award_round(TeamId(1), &teams), Ok(1));
        assert_eq!(
            rounds.award_round(TeamId(7), &teams),
            Err(TeamError::TeamNotFound(TeamId(7)))
        );
        assert!(!rounds.scores().contains_key(&TeamId(7)));
    }

    #[test]
    fn test_match_winner() {
        let teams = two_teams();
        let mut rounds = RoundManager::new(FirstToTwo);
        rounds.award_round(TeamId(2), &teams).unwrap();
        assert_eq!(rounds.match_winner(&teams), None);
        rounds.award_round(TeamId(2), &teams).unwrap();
        assert_eq!(rounds.match_winner(&teams), Some(TeamId(2)));
    }

    #[test]
    fn test_advance_round_archives_and_resets() {
        let mut rounds = RoundManager::new(FirstToTwo);
        rounds.current_mut().increment_time();
        rounds.set_state(RoundState::Postround);
        rounds.tick_countdown();

        let next = *rounds.advance_round();
        assert_eq!(next, Round::new(2));
        assert_eq!(rounds.past_rounds(), &[Round { number: 1, time: 1 }]);
        assert_eq!(rounds.state(), RoundState::Preround);
        assert_eq!(rounds.countdown(), COUNTDOWN_LENGTH);
    }

    #[test]
    fn test_countdown_reaches_zero_after_constant_ticks() {
        let mut rounds = RoundManager::new(FirstToTwo);
        for _ in 1..COUNTDOWN_LENGTH {
            assert!(!rounds.tick_countdown());
        }
        assert!(rounds.tick_countdown());
        assert!(rounds.tick_countdown());
    }

    #[test]
    fn test_final_round_and_round_over() {
        let mut rounds = RoundManager::new(FirstToTwo);
        for _ in 0..4 {
            assert!(!rounds.is_final_round());
            rounds.advance_round();
        }
        assert!(rounds.is_final_round());

        for _ in 0..30 {
            assert!(!rounds.is_round_over());
            rounds.current_mut().increment_time();
        }
        assert!(rounds.is_round_over());
    }

    #[test]
    fn test_format_time() {
        let round = Round { number: 1, time: 20 * 75 };
        assert_eq!(round.format_time(20), "01:15");
        assert_eq!(Round::new(1).format_time(20), "00:00");
        assert_eq!(Round { number: 1, time: 3 }.format_time(0), "00:03");
    }
}
