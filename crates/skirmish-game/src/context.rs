//! Everything a game's handlers can see and change.

use skirmish_protocol::{GameId, GameState, Occurrence, Player, PlayerId, TeamId};
use skirmish_team::{MemberState, Team, TeamData, TeamManager};

use crate::{Arena, Broadcast, BroadcastKind, GameConfig, GameError, RoundManager, SpectatorSet};

/// The mutable state of one game, handed to every handler hook.
///
/// # Membership
///
/// Each player of a game is in exactly one of three places:
///
/// - on a team (the [`TeamManager`]),
/// - a spectator,
/// - unassociated: joined during `Waiting`, not yet put on a team.
///
/// Rosters only change through the context ([`add_team`](Self::add_team),
/// [`assign_team`](Self::assign_team),
/// [`add_spectator`](Self::add_spectator),
/// [`add_unassociated`](Self::add_unassociated),
/// [`remove_player`](Self::remove_player)), which keeps the three disjoint.
#[derive(Debug)]
pub struct GameContext {
    id: GameId,
    arena: Arena,
    config: GameConfig,
    state: GameState,
    elapsed: u64,
    teams: TeamManager,
    rounds: Option<RoundManager>,
    spectators: SpectatorSet,
    unassociated: Vec<Player>,
    requested_state: Option<GameState>,
    finish_requested: bool,
    broadcasts: Vec<Broadcast>,
    emitted: Vec<Occurrence>,
}

impl GameContext {
    pub(crate) fn new(
        id: GameId,
        arena: Arena,
        config: GameConfig,
        teams: TeamManager,
        rounds: Option<RoundManager>,
    ) -> Self {
        Self {
            id,
            arena,
            config,
            state: GameState::Waiting,
            elapsed: 0,
            teams,
            rounds,
            spectators: SpectatorSet::new(),
            unassociated: Vec::new(),
            requested_state: None,
            finish_requested: false,
            broadcasts: Vec::new(),
            emitted: Vec::new(),
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Game ticks since the current phase began.
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn teams(&self) -> &TeamManager {
        &self.teams
    }

    /// See [`TeamManager::generate_team_data`].
    pub fn generate_team_data(&mut self) -> TeamData {
        self.teams.generate_team_data()
    }

    /// Marks a team member alive or dead. A player without a team is
    /// ignored.
    pub fn set_player_state(&mut self, player: PlayerId, state: MemberState) {
        self.teams.set_player_state(player, state);
    }

    /// `None` unless the game is round based.
    pub fn rounds(&self) -> Option<&RoundManager> {
        self.rounds.as_ref()
    }

    pub fn rounds_mut(&mut self) -> Option<&mut RoundManager> {
        self.rounds.as_mut()
    }

    pub fn spectators(&self) -> &SpectatorSet {
        &self.spectators
    }

    /// Players waiting to be put on a team, in join order.
    pub fn unassociated(&self) -> &[Player] {
        &self.unassociated
    }

    // -- membership -------------------------------------------------------

    /// On a team, spectating, or unassociated.
    pub fn is_in_game(&self, player: PlayerId) -> bool {
        self.teams.has_team(player) || self.spectators.contains(player) || self.is_unassociated(player)
    }

    pub fn is_spectator(&self, player: PlayerId) -> bool {
        self.spectators.contains(player)
    }

    pub fn is_unassociated(&self, player: PlayerId) -> bool {
        self.unassociated.iter().any(|p| p.id == player)
    }

    /// Adds a player who has no place in the game yet.
    ///
    /// # Errors
    /// - [`GameError::NotJoinable`] outside the waiting phase
    /// - [`GameError::AlreadyInGame`] if the player is already here
    pub fn add_unassociated(&mut self, player: Player) -> Result<(), GameError> {
        if !self.state.is_joinable() {
            return Err(GameError::NotJoinable {
                game: self.id.clone(),
                state: self.state,
            });
        }
        if self.is_in_game(player.id) {
            return Err(GameError::AlreadyInGame(player.id, self.id.clone()));
        }
        tracing::debug!(game_id = %self.id, player_id = %player.id, "player unassociated");
        self.unassociated.push(player);
        Ok(())
    }

    /// Registers a team with its roster. Its members leave the unassociated
    /// and spectator sets.
    ///
    /// # Errors
    /// Any [`TeamError`](skirmish_team::TeamError) from
    /// [`TeamManager::add`]. Nothing changes on error.
    pub fn add_team(&mut self, team: Team) -> Result<(), GameError> {
        let members: Vec<PlayerId> = team.member_ids().collect();
        self.teams.add(team)?;
        for player in members {
            self.unassociated.retain(|p| p.id != player);
            self.spectators.remove(player);
        }
        Ok(())
    }

    /// Unregisters a team. Its members are no longer in the game.
    pub fn remove_team(&mut self, team: TeamId) -> Option<Team> {
        self.teams.remove(team)
    }

    /// Puts a player on a team, taking them out of the unassociated and
    /// spectator sets.
    ///
    /// # Errors
    /// Any [`TeamError`](skirmish_team::TeamError) from the team manager
    /// (unknown team, full team, already on a team). The player stays
    /// where they were.
    pub fn assign_team(&mut self, player: &Player, team: TeamId) -> Result<(), GameError> {
        self.teams.add_member(team, player)?;
        self.unassociated.retain(|p| p.id != player.id);
        self.spectators.remove(player.id);
        Ok(())
    }

    /// Makes a player a spectator, taking them off their team and out of
    /// the unassociated set.
    ///
    /// # Errors
    /// [`GameError::SpectatorsDisabled`] if the game takes no spectators.
    pub fn add_spectator(&mut self, player: Player) -> Result<(), GameError> {
        if !self.config.allow_spectators {
            return Err(GameError::SpectatorsDisabled(self.id.clone()));
        }
        self.teams.remove_player_from_team(player.id);
        self.unassociated.retain(|p| p.id != player.id);
        tracing::debug!(game_id = %self.id, player_id = %player.id, "player spectating");
        self.spectators.insert(player);
        Ok(())
    }

    /// Removes a player from every membership set. Returns `false` if they
    /// were not in the game.
    pub fn remove_player(&mut self, player: PlayerId) -> bool {
        let on_team = self.teams.remove_player_from_team(player).is_some();
        let spectating = self.spectators.remove(player).is_some();
        let before = self.unassociated.len();
        self.unassociated.retain(|p| p.id != player);
        let waiting = self.unassociated.len() != before;
        on_team || spectating || waiting
    }

    /// Every player in the game: team members by team, then spectators,
    /// then unassociated players.
    pub fn all_players(&self) -> Vec<PlayerId> {
        let mut players = self.teams.players();
        players.extend(self.spectators.ids());
        players.extend(self.unassociated.iter().map(|p| p.id));
        players
    }

    pub fn execute_on_all(&self, f: impl FnMut(PlayerId)) {
        self.all_players().into_iter().for_each(f);
    }

    pub fn execute_on_teams(&self, f: impl FnMut(&Team)) {
        self.teams.all().for_each(f);
    }

    /// Runs `f` for every team member.
    pub fn execute_on_players(&self, f: impl FnMut(PlayerId)) {
        self.teams.players().into_iter().for_each(f);
    }

    pub fn execute_on_spectators(&self, f: impl FnMut(PlayerId)) {
        self.spectators.ids().for_each(f);
    }

    // -- rounds -----------------------------------------------------------

    /// See [`RoundManager::round_winner`]. `None` for games without rounds.
    pub fn round_winner(&self) -> Option<TeamId> {
        self.rounds.as_ref()?.round_winner(&self.teams)
    }

    /// Gives `team` a round win. Returns its new score.
    ///
    /// # Errors
    /// - [`GameError::NoRounds`] if the game is not round based
    /// - a wrapped [`TeamError`](skirmish_team::TeamError) for an
    ///   unregistered team
    pub fn award_round(&mut self, team: TeamId) -> Result<u32, GameError> {
        let rounds = self
            .rounds
            .as_mut()
            .ok_or_else(|| GameError::NoRounds(self.id.clone()))?;
        Ok(rounds.award_round(team, &self.teams)?)
    }

    // -- lifecycle requests -----------------------------------------------

    /// Asks the game to move to `state` once the current hook returns.
    /// A later request in the same hook replaces an earlier one.
    pub fn request_state(&mut self, state: GameState) {
        tracing::trace!(game_id = %self.id, from = %self.state, to = %state, "state requested");
        self.requested_state = Some(state);
    }

    /// The transition requested by the current hook, if any.
    pub fn requested_state(&self) -> Option<GameState> {
        self.requested_state
    }

    /// Asks the registry to finish the game once the current hook returns.
    pub fn request_finish(&mut self) {
        self.finish_requested = true;
    }

    pub fn is_finish_requested(&self) -> bool {
        self.finish_requested
    }

    /// Announces the outcome of the game. `None` is a draw.
    pub fn declare_winner(&mut self, winner: Option<TeamId>) {
        tracing::info!(game_id = %self.id, winner = ?winner, "winner declared");
        self.emit(Occurrence::GameWin {
            game: self.id.clone(),
            winner,
        });
    }

    /// Queues an occurrence for the host event bus. It is dispatched after
    /// the current hook and any transition it requested.
    pub fn emit(&mut self, occurrence: Occurrence) {
        self.emitted.push(occurrence);
    }

    // -- broadcasts -------------------------------------------------------

    /// A chat line for every player, with the configured prefix.
    pub fn broadcast_message(&mut self, text: impl AsRef<str>) {
        let text = self.prefixed(text.as_ref());
        self.broadcast(self.all_players(), BroadcastKind::Message { text });
    }

    /// A chat line for every player, without the prefix.
    pub fn broadcast_raw_message(&mut self, text: impl Into<String>) {
        self.broadcast(self.all_players(), BroadcastKind::Message { text: text.into() });
    }

    pub fn broadcast_tip(&mut self, text: impl Into<String>) {
        self.broadcast(self.all_players(), BroadcastKind::Tip { text: text.into() });
    }

    pub fn broadcast_popup(&mut self, text: impl Into<String>) {
        self.broadcast(self.all_players(), BroadcastKind::Popup { text: text.into() });
    }

    pub fn broadcast_sound(&mut self, name: impl Into<String>, volume: f32, pitch: f32) {
        let kind = BroadcastKind::Sound {
            name: name.into(),
            volume,
            pitch,
        };
        self.broadcast(self.all_players(), kind);
    }

    /// A chat line for one team, with the configured prefix. Does nothing
    /// for an unknown team.
    pub fn broadcast_team_message(&mut self, team: TeamId, text: impl AsRef<str>) {
        let text = self.prefixed(text.as_ref());
        self.broadcast_team(team, BroadcastKind::Message { text });
    }

    pub fn broadcast_team_tip(&mut self, team: TeamId, text: impl Into<String>) {
        self.broadcast_team(team, BroadcastKind::Tip { text: text.into() });
    }

    pub fn broadcast_team_popup(&mut self, team: TeamId, text: impl Into<String>) {
        self.broadcast_team(team, BroadcastKind::Popup { text: text.into() });
    }

    pub fn broadcast_team_sound(&mut self, team: TeamId, name: impl Into<String>, volume: f32, pitch: f32) {
        let kind = BroadcastKind::Sound {
            name: name.into(),
            volume,
            pitch,
        };
        self.broadcast_team(team, kind);
    }

    fn broadcast_team(&mut self, team: TeamId, kind: BroadcastKind) {
        let Some(recipients) = self.teams.get(team).map(|t| t.member_ids().collect()) else {
            return;
        };
        self.broadcast(recipients, kind);
    }

    fn broadcast(&mut self, recipients: Vec<PlayerId>, kind: BroadcastKind) {
        if recipients.is_empty() {
            return;
        }
        self.broadcasts.push(Broadcast::new(recipients, kind));
    }

    fn prefixed(&self, text: &str) -> String {
        format!("{}{}", self.config.message_prefix, text)
    }

    // -- engine side ------------------------------------------------------

    pub(crate) fn set_state(&mut self, state: GameState) {
        self.state = state;
        self.elapsed = 0;
    }

    pub(crate) fn increment_elapsed(&mut self) {
        self.elapsed += 1;
    }

    pub(crate) fn take_requested_state(&mut self) -> Option<GameState> {
        self.requested_state.take()
    }

    pub(crate) fn take_emitted(&mut self) -> Vec<Occurrence> {
        std::mem::take(&mut self.emitted)
    }

    pub(crate) fn take_broadcasts(&mut self) -> Vec<Broadcast> {
        std::mem::take(&mut self.broadcasts)
    }

    /// Clears every membership set and the round table.
    pub(crate) fn clear(&mut self) {
        self.teams.finish();
        if let Some(rounds) = self.rounds.as_mut() {
            rounds.finish();
        }
        self.spectators.clear();
        self.unassociated.clear();
        self.requested_state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::{ArenaId, WorldId};
    use skirmish_team::{TeamConfig, TeamMode};

    fn context(config: GameConfig) -> GameContext {
        let teams = TeamManager::new(config.team_mode.clone(), TeamConfig::default());
        GameContext::new(
            GameId::new("g1"),
            Arena::new(ArenaId(1), "arena", WorldId(1)),
            config,
            teams,
            None,
        )
    }

    fn alice() -> Player {
        Player::new(1, "Alice")
    }

    fn disjoint(ctx: &GameContext, player: PlayerId) -> bool {
        let places = [
            ctx.teams().has_team(player),
            ctx.is_spectator(player),
            ctx.is_unassociated(player),
        ];
        places.iter().filter(|&&b| b).count() <= 1
    }

    #[test]
    fn test_membership_moves_keep_sets_disjoint() {
        let mut ctx = context(GameConfig {
            team_mode: TeamMode::duos(),
            ..GameConfig::default()
        });
        ctx.add_team(Team::new(TeamId(1), "red")).unwrap();

        ctx.add_unassociated(alice()).unwrap();
        assert!(ctx.is_unassociated(PlayerId(1)));
        assert!(disjoint(&ctx, PlayerId(1)));

        ctx.assign_team(&alice(), TeamId(1)).unwrap();
        assert!(!ctx.is_unassociated(PlayerId(1)));
        assert!(ctx.teams().has_team(PlayerId(1)));
        assert!(disjoint(&ctx, PlayerId(1)));

        ctx.add_spectator(alice()).unwrap();
        assert!(ctx.is_spectator(PlayerId(1)));
        assert!(!ctx.teams().has_team(PlayerId(1)));
        assert!(disjoint(&ctx, PlayerId(1)));

        assert!(ctx.is_in_game(PlayerId(1)));
        assert!(ctx.remove_player(PlayerId(1)));
        assert!(!ctx.is_in_game(PlayerId(1)));
        assert!(!ctx.remove_player(PlayerId(1)));
    }

    #[test]
    fn test_adding_a_rostered_team_moves_its_members() {
        let mut ctx = context(GameConfig {
            team_mode: TeamMode::duos(),
            ..GameConfig::default()
        });
        let bob = Player::new(2, "Bob");
        ctx.add_unassociated(alice()).unwrap();
        ctx.add_spectator(bob.clone()).unwrap();

        ctx.add_team(Team::with_members(TeamId(1), "red", [&alice(), &bob]))
            .unwrap();

        for player in [PlayerId(1), PlayerId(2)] {
            assert!(ctx.teams().has_team(player));
            assert!(!ctx.is_unassociated(player));
            assert!(!ctx.is_spectator(player));
            assert!(disjoint(&ctx, player));
        }
        assert_eq!(ctx.all_players(), vec![PlayerId(1), PlayerId(2)]);
    }

    #[test]
    fn test_rejected_team_leaves_members_in_place() {
        let mut ctx = context(GameConfig::default());
        ctx.add_unassociated(alice()).unwrap();
        ctx.add_team(Team::new(TeamId(1), "red")).unwrap();

        let err = ctx.add_team(Team::with_members(TeamId(1), "blue", [&alice()]));
        assert!(err.is_err());
        assert!(ctx.is_unassociated(PlayerId(1)));
        assert!(!ctx.teams().has_team(PlayerId(1)));
    }

    #[test]
    fn test_add_unassociated_only_while_waiting() {
        let mut ctx = context(GameConfig::default());
        ctx.add_unassociated(alice()).unwrap();
        assert_eq!(
            ctx.add_unassociated(alice()),
            Err(GameError::AlreadyInGame(PlayerId(1), GameId::new("g1")))
        );

        ctx.set_state(GameState::Starting);
        let err = ctx.add_unassociated(Player::new(2, "Bob")).unwrap_err();
        assert!(matches!(err, GameError::NotJoinable { state: GameState::Starting, .. }));
    }

    #[test]
    fn test_spectators_can_be_disabled() {
        let mut ctx = context(GameConfig {
            allow_spectators: false,
            ..GameConfig::default()
        });
        assert_eq!(
            ctx.add_spectator(alice()),
            Err(GameError::SpectatorsDisabled(GameId::new("g1")))
        );
    }

    #[test]
    fn test_failed_assignment_leaves_player_in_place() {
        let mut ctx = context(GameConfig::default());
        ctx.add_unassociated(alice()).unwrap();
        assert!(ctx.assign_team(&alice(), TeamId(4)).is_err());
        assert!(ctx.is_unassociated(PlayerId(1)));
    }

    #[test]
    fn test_broadcast_recipients_are_a_snapshot() {
        let mut ctx = context(GameConfig::default());
        ctx.add_unassociated(alice()).unwrap();
        ctx.broadcast_message("hello");
        ctx.add_unassociated(Player::new(2, "Bob")).unwrap();

        let out = ctx.take_broadcasts();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipients, vec![PlayerId(1)]);
        assert_eq!(
            out[0].kind,
            BroadcastKind::Message {
                text: "Game > hello".into()
            }
        );
        assert!(ctx.take_broadcasts().is_empty());
    }

    #[test]
    fn test_team_broadcast_targets_members_only() {
        let mut ctx = context(GameConfig::default());
        ctx.add_team(Team::new(TeamId(1), "red")).unwrap();
        ctx.assign_team(&alice(), TeamId(1)).unwrap();
        ctx.add_spectator(Player::new(2, "Bob")).unwrap();

        ctx.broadcast_team_tip(TeamId(1), "go");
        ctx.broadcast_team_tip(TeamId(9), "nobody");
        ctx.broadcast_raw_message("all");

        let out = ctx.take_broadcasts();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].recipients, vec![PlayerId(1)]);
        assert_eq!(out[1].recipients, vec![PlayerId(1), PlayerId(2)]);
    }

    #[test]
    fn test_execute_helpers_see_current_members() {
        let mut ctx = context(GameConfig::default());
        ctx.add_team(Team::new(TeamId(1), "red")).unwrap();
        ctx.assign_team(&alice(), TeamId(1)).unwrap();
        ctx.add_spectator(Player::new(2, "Bob")).unwrap();

        let mut all = Vec::new();
        ctx.execute_on_all(|p| all.push(p));
        let mut members = Vec::new();
        ctx.execute_on_players(|p| members.push(p));
        let mut spectators = Vec::new();
        ctx.execute_on_spectators(|p| spectators.push(p));
        let mut teams = 0;
        ctx.execute_on_teams(|_| teams += 1);

        assert_eq!(all, vec![PlayerId(1), PlayerId(2)]);
        assert_eq!(members, vec![PlayerId(1)]);
        assert_eq!(spectators, vec![PlayerId(2)]);
        assert_eq!(teams, 1);
    }

    #[test]
    fn test_round_helpers_without_rounds() {
        let mut ctx = context(GameConfig::default());
        assert_eq!(ctx.round_winner(), None);
        assert_eq!(ctx.award_round(TeamId(1)), Err(GameError::NoRounds(GameId::new("g1"))));
    }

    #[test]
    fn test_declare_winner_emits_game_win() {
        let mut ctx = context(GameConfig::default());
        ctx.declare_winner(Some(TeamId(2)));
        assert_eq!(
            ctx.take_emitted(),
            vec![Occurrence::GameWin {
                game: GameId::new("g1"),
                winner: Some(TeamId(2)),
            }]
        );
    }
}
