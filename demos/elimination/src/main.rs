use std::time::Duration;

use skirmish::prelude::*;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

const MIN_PLAYERS: usize = 2;

/// Best of `rounds`, each lasting at most `length` game ticks.
struct BestOf {
    rounds: u32,
    length: u64,
}

impl RoundRules for BestOf {
    fn round_count(&self) -> u32 {
        self.rounds
    }

    fn round_length(&self) -> u64 {
        self.length
    }

    fn has_team_won(&self, team: TeamId, rounds: &RoundManager) -> bool {
        rounds.score(team) > self.rounds / 2
    }
}

/// First member's name, or the team name for an empty roster.
fn team_label(ctx: &GameContext, team: TeamId) -> String {
    match ctx.teams().get(team) {
        Some(t) => t
            .members()
            .first()
            .map(|m| m.username.clone())
            .unwrap_or_else(|| t.formatted_name()),
        None => team.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Waits for enough players.
struct Lobby;

impl GameStateHandler for Lobby {
    fn handle_setup(&mut self, _ctx: &mut GameContext) {}

    fn handle_tick(&mut self, ctx: &mut GameContext, _elapsed: u64) {
        let waiting = ctx.unassociated().len();
        if waiting >= MIN_PLAYERS {
            ctx.request_state(GameState::Starting);
        } else {
            ctx.broadcast_tip(format!("Waiting for players ({waiting}/{MIN_PLAYERS})"));
        }
    }

    fn handle_finish(&mut self, _ctx: &mut GameContext) {}
}

/// Puts every waiting player on a team of their own, then counts down.
struct Countdown;

impl GameStateHandler for Countdown {
    fn handle_setup(&mut self, ctx: &mut GameContext) {
        let players = ctx.unassociated().to_vec();
        for player in &players {
            let team = ctx.generate_team_data();
            let id = team.id;
            if let Err(err) = ctx.add_team(team.into_team()) {
                tracing::warn!(error = %err, "could not create team");
                continue;
            }
            if let Err(err) = ctx.assign_team(player, id) {
                tracing::warn!(player_id = %player.id, error = %err, "could not assign team");
            }
        }
        if let Some(rounds) = ctx.rounds_mut() {
            rounds.reset_countdown();
        }
        let text = format!("{} teams, get ready", ctx.teams().len());
        ctx.broadcast_message(text);
    }

    fn handle_tick(&mut self, ctx: &mut GameContext, _elapsed: u64) {
        let Some(rounds) = ctx.rounds_mut() else {
            ctx.request_state(GameState::InGame);
            return;
        };
        if rounds.tick_countdown() {
            ctx.request_state(GameState::InGame);
        } else {
            let left = rounds.countdown();
            ctx.broadcast_tip(format!("Starting in {left}"));
        }
    }

    fn handle_finish(&mut self, _ctx: &mut GameContext) {}
}

/// Plays rounds until one team has won enough of them.
struct Fight;

impl Fight {
    fn end_round(ctx: &mut GameContext, winner: Option<TeamId>) {
        match winner {
            Some(team) => match ctx.award_round(team) {
                Ok(score) => {
                    let label = team_label(ctx, team);
                    ctx.broadcast_message(format!("{label} takes the round ({score})"));
                }
                Err(err) => tracing::warn!(%team, error = %err, "round not awarded"),
            },
            None => ctx.broadcast_message("Round drawn"),
        }

        let Some(rounds) = ctx.rounds() else {
            return;
        };
        let champion = rounds.match_winner(ctx.teams());
        if champion.is_some() || rounds.is_final_round() {
            ctx.declare_winner(champion);
            ctx.request_state(GameState::Postgame);
            return;
        }

        if let Some(rounds) = ctx.rounds_mut() {
            rounds.advance_round();
        }
        for player in ctx.teams().players() {
            ctx.set_player_state(player, MemberState::Alive);
        }
    }
}

impl GameStateHandler for Fight {
    fn handle_setup(&mut self, ctx: &mut GameContext) {
        ctx.broadcast_sound("horn", 1.0, 1.0);
    }

    fn handle_tick(&mut self, ctx: &mut GameContext, _elapsed: u64) {
        let Some(rounds) = ctx.rounds_mut() else {
            return;
        };
        match rounds.state() {
            RoundState::Preround => {
                if rounds.tick_countdown() {
                    rounds.set_state(RoundState::InRound);
                    let number = rounds.current().number;
                    ctx.broadcast_message(format!("Round {number}, fight!"));
                }
            }
            RoundState::InRound => {
                rounds.current_mut().increment_time();
                let timed_out = rounds.is_round_over();
                let winner = ctx.round_winner();
                if winner.is_some() || timed_out {
                    Self::end_round(ctx, winner);
                }
            }
            RoundState::Postround => {}
        }
    }

    fn handle_finish(&mut self, ctx: &mut GameContext) {
        if let Some(rounds) = ctx.rounds_mut() {
            rounds.set_state(RoundState::Postround);
        }
    }
}

/// Lingers a few ticks so the result can be read, then ends the game.
struct Celebration {
    linger: u64,
}

impl GameStateHandler for Celebration {
    fn handle_setup(&mut self, ctx: &mut GameContext) {
        ctx.broadcast_popup("Thanks for playing");
    }

    fn handle_tick(&mut self, ctx: &mut GameContext, elapsed: u64) {
        if elapsed + 1 >= self.linger {
            ctx.request_finish();
        }
    }

    fn handle_finish(&mut self, _ctx: &mut GameContext) {}
}

// ---------------------------------------------------------------------------
// Event handlers
// ---------------------------------------------------------------------------

/// Announces the result.
struct Announcer;

impl GameEventHandler for Announcer {
    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(OccurrenceKind::GameWin)]
    }

    fn handle_event(&mut self, ctx: &mut GameContext, event: &mut Event) {
        if let Occurrence::GameWin { winner, .. } = event.occurrence() {
            let text = match winner {
                Some(team) => format!("{} wins the match!", team_label(ctx, *team)),
                None => "The match is a draw".to_string(),
            };
            ctx.broadcast_message(text);
        }
    }
}

/// Nobody breaks or places blocks in the lobby.
struct LobbyProtection;

impl GameEventHandler for LobbyProtection {
    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(OccurrenceKind::BlockBreak).with_priority(EventPriority::Low),
            Subscription::new(OccurrenceKind::BlockPlace).with_priority(EventPriority::Low),
        ]
    }

    fn handle_event(&mut self, _ctx: &mut GameContext, event: &mut Event) {
        event.cancel();
    }
}

/// Marks players dead when they die mid-round.
struct Eliminations;

impl GameEventHandler for Eliminations {
    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(OccurrenceKind::EntityDeath)]
    }

    fn handle_event(&mut self, ctx: &mut GameContext, event: &mut Event) {
        let Occurrence::EntityDeath {
            entity: EntityRef::Player(player),
            ..
        } = *event.occurrence()
        else {
            return;
        };
        if ctx.rounds().map(|r| r.state()) != Some(RoundState::InRound) {
            return;
        }
        if ctx.teams().player_state(player) != Some(MemberState::Alive) {
            return;
        }
        ctx.set_player_state(player, MemberState::Dead);
        let name = ctx
            .teams()
            .find_team(player)
            .and_then(|team| team.members().iter().find(|m| m.id == player))
            .map_or_else(|| player.to_string(), |m| m.username.clone());
        ctx.broadcast_message(format!("{name} was eliminated"));
    }
}

/// Logs the scores every game tick.
struct Scoreboard;

impl Updatable for Scoreboard {
    fn update(&mut self, ctx: &GameContext) {
        let Some(rounds) = ctx.rounds() else {
            return;
        };
        tracing::debug!(
            title = %ctx.config().scoreboard_title,
            round = rounds.current().number,
            time = %rounds.current().format_time(5),
            scores = ?rounds.scores(),
            "scoreboard"
        );
    }
}

struct PhaseLog;

impl StateListener for PhaseLog {
    fn on_state_change(&mut self, game: &GameId, old: GameState, new: GameState) {
        tracing::info!(game_id = %game, %old, %new, "phase changed");
    }
}

// ---------------------------------------------------------------------------
// Game assembly
// ---------------------------------------------------------------------------

fn elimination(id: &str) -> GameBuilder {
    GameBuilder::new(id)
        .config(GameConfig {
            // 5 game ticks per second on a 20 Hz server clock.
            heartbeat_period: 4,
            scoreboard_title: "Elimination".to_string(),
            ..GameConfig::default()
        })
        .team_config(TeamConfig {
            seed: Some(7),
            ..TeamConfig::default()
        })
        .rounds(RoundManager::new(BestOf { rounds: 3, length: 150 }))
        .handler(GameState::Waiting, Lobby)
        .handler(GameState::Starting, Countdown)
        .handler(GameState::InGame, Fight)
        .handler(GameState::Postgame, Celebration { linger: 5 })
        .listener(Announcer)
        .state_listener(GameState::Waiting, LobbyProtection)
        .state_listener(GameState::InGame, Eliminations)
        .updatable(Scoreboard)
        .observer(PhaseLog)
}

fn describe(kind: &BroadcastKind) -> String {
    match kind {
        BroadcastKind::Message { text } => text.clone(),
        BroadcastKind::Tip { text } => format!("(tip) {text}"),
        BroadcastKind::Popup { text } => format!("(popup) {text}"),
        BroadcastKind::Sound { name, .. } => format!("(sound) {name}"),
    }
}

const CONFIG: &str = r#"{
    "clock": { "tick_rate_hz": 20 },
    "arenas": [
        { "id": 1, "name": "Crater", "world": 1,
          "bounds": { "min": [-50.0, 0.0, -50.0], "max": [50.0, 128.0, 50.0] } }
    ]
}"#;

/// Plays one match in which Bob eliminates Alice whenever a round is on.
/// Returns once the game has finished.
async fn play(engine: &EngineHandle, game: &GameId) -> Result<(), SkirmishError> {
    engine.join(game.clone(), Player::new(1, "Alice")).await?;
    engine.join(game.clone(), Player::new(2, "Bob")).await?;

    let death = Occurrence::EntityDeath {
        entity: EntityRef::Player(PlayerId(1)),
        position: Position::new(WorldId(1), 0.0, 64.0, 0.0),
    };
    while let Some(info) = engine.info(game.clone()).await? {
        if info.state == GameState::InGame {
            engine.dispatch(death.clone()).await?;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), SkirmishError> {
    skirmish::init_logging();

    let (engine, mut broadcasts) = Engine::spawn(EngineConfig::from_json_str(CONFIG)?);
    let printer = tokio::spawn(async move {
        while let Some((game, broadcast)) = broadcasts.recv().await {
            println!("[{game}] {}", describe(&broadcast.kind));
        }
    });

    let game = engine.create_game(elimination("elimination-1")).await?;
    play(&engine, &game).await?;

    engine.shutdown().await?;
    let _ = printer.await;
    Ok(())
}
