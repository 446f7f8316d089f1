//! The engine actor: one Tokio task that owns the [`GameRegistry`] and the
//! server clock.
//!
//! Everything the registry does runs on this task, so games never need
//! locks. The outside world talks to it through an [`EngineHandle`] and
//! receives game broadcasts on an unbounded channel returned by
//! [`Engine::spawn`].

use skirmish_game::{
    Arena, Broadcast, GameBuilder, GameError, GameInfo, GameRegistry, JoinOutcome,
};
use skirmish_protocol::{GameId, Occurrence, Player, PlayerId};
use skirmish_tick::TickScheduler;
use tokio::sync::{mpsc, oneshot};

use crate::{EngineConfig, SkirmishError};

/// A broadcast on its way to the host, tagged with the game that sent it.
pub type Delivery = (GameId, Broadcast);

/// Receiving end for [`Delivery`] values.
pub type DeliveryReceiver = mpsc::UnboundedReceiver<Delivery>;

/// Commands sent to the engine actor. Variants with a `reply` carry a
/// oneshot channel the caller waits on.
pub(crate) enum EngineCommand {
    CreateGame {
        builder: GameBuilder,
        reply: oneshot::Sender<Result<GameId, GameError>>,
    },
    AddArena {
        arena: Arena,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Join {
        game: GameId,
        player: Player,
        reply: oneshot::Sender<Result<JoinOutcome, GameError>>,
    },
    Quit {
        player: PlayerId,
        reply: oneshot::Sender<Option<GameId>>,
    },
    /// Dispatch a host occurrence. The reply is the final cancel flag.
    Occurrence {
        occurrence: Occurrence,
        reply: oneshot::Sender<bool>,
    },
    Finish {
        game: GameId,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Info {
        game: GameId,
        reply: oneshot::Sender<Option<GameInfo>>,
    },
    FreeGames {
        reply: oneshot::Sender<Vec<GameId>>,
    },
    Shutdown,
}

/// Entry point for running games on a Tokio runtime.
pub struct Engine;

impl Engine {
    /// Spawns the engine task. Must be called from inside a Tokio runtime.
    ///
    /// Returns the handle used to drive it and the receiver on which game
    /// broadcasts arrive. Broadcasts are forwarded after every server tick
    /// and after every command.
    pub fn spawn(config: EngineConfig) -> (EngineHandle, DeliveryReceiver) {
        let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let actor = EngineActor {
            registry: GameRegistry::new(config.arena_pool()),
            clock: TickScheduler::new(config.clock),
            receiver: rx,
            outbound: outbound_tx,
        };
        tokio::spawn(actor.run());

        (EngineHandle { sender: tx }, outbound_rx)
    }
}

/// Handle to a running engine. Cheap to clone; it wraps an
/// `mpsc::Sender`.
///
/// Every method fails with [`SkirmishError::EngineStopped`] once the
/// engine task has exited.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, SkirmishError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| SkirmishError::EngineStopped)?;
        reply_rx.await.map_err(|_| SkirmishError::EngineStopped)
    }

    /// Builds, registers and starts a game. Claims the first open arena
    /// if the builder has none.
    pub async fn create_game(&self, builder: GameBuilder) -> Result<GameId, SkirmishError> {
        Ok(self
            .request(|reply| EngineCommand::CreateGame { builder, reply })
            .await??)
    }

    pub async fn add_arena(&self, arena: Arena) -> Result<(), SkirmishError> {
        Ok(self.request(|reply| EngineCommand::AddArena { arena, reply }).await??)
    }

    pub async fn join(&self, game: GameId, player: Player) -> Result<JoinOutcome, SkirmishError> {
        Ok(self
            .request(|reply| EngineCommand::Join { game, player, reply })
            .await??)
    }

    /// Takes a player out of whatever game they are in. The game's
    /// handlers see a `PlayerQuit` occurrence first, while the player is
    /// still a member. Returns the game they left.
    pub async fn quit(&self, player: PlayerId) -> Result<Option<GameId>, SkirmishError> {
        self.request(|reply| EngineCommand::Quit { player, reply }).await
    }

    /// Dispatches a host occurrence to every game it concerns. Returns
    /// whether a handler cancelled it.
    pub async fn dispatch(&self, occurrence: Occurrence) -> Result<bool, SkirmishError> {
        self.request(|reply| EngineCommand::Occurrence { occurrence, reply })
            .await
    }

    /// Finishes a game and removes it, releasing its arena.
    pub async fn finish(&self, game: GameId) -> Result<(), SkirmishError> {
        Ok(self.request(|reply| EngineCommand::Finish { game, reply }).await??)
    }

    pub async fn info(&self, game: GameId) -> Result<Option<GameInfo>, SkirmishError> {
        self.request(|reply| EngineCommand::Info { game, reply }).await
    }

    /// Ids of the games still waiting for players.
    pub async fn free_games(&self) -> Result<Vec<GameId>, SkirmishError> {
        self.request(|reply| EngineCommand::FreeGames { reply }).await
    }

    /// Finishes every game and stops the engine task.
    pub async fn shutdown(&self) -> Result<(), SkirmishError> {
        self.sender
            .send(EngineCommand::Shutdown)
            .await
            .map_err(|_| SkirmishError::EngineStopped)
    }
}

/// The engine state. Runs inside a Tokio task.
struct EngineActor {
    registry: GameRegistry,
    clock: TickScheduler,
    receiver: mpsc::Receiver<EngineCommand>,
    outbound: mpsc::UnboundedSender<Delivery>,
}

impl EngineActor {
    async fn run(mut self) {
        tracing::info!(
            tick_rate_hz = self.clock.tick_rate_hz(),
            arenas = self.registry.arenas().len(),
            "engine started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(EngineCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd),
                    }
                    self.forward_broadcasts();
                }
                _ = self.clock.wait_for_tick() => {
                    self.registry.on_server_tick();
                    self.forward_broadcasts();
                    self.clock.record_tick_end();
                }
            }
        }

        self.finish_all();
        tracing::info!(ticks = self.clock.tick_count(), "engine stopped");
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::CreateGame { builder, reply } => {
                let _ = reply.send(self.registry.create_game(builder));
            }
            EngineCommand::AddArena { arena, reply } => {
                let _ = reply.send(self.registry.arenas_mut().add(arena));
            }
            EngineCommand::Join { game, player, reply } => {
                let _ = reply.send(self.registry.join(&game, player));
            }
            EngineCommand::Quit { player, reply } => {
                if self.registry.game_by_player(player).is_some() {
                    self.registry.dispatch(Occurrence::PlayerQuit { player });
                }
                let _ = reply.send(self.registry.quit(player));
            }
            EngineCommand::Occurrence { occurrence, reply } => {
                let event = self.registry.dispatch(occurrence);
                let _ = reply.send(event.is_cancelled());
            }
            EngineCommand::Finish { game, reply } => {
                let _ = reply.send(self.registry.remove(&game).map(|_| ()));
            }
            EngineCommand::Info { game, reply } => {
                let _ = reply.send(self.registry.get(&game).map(|g| g.info()));
            }
            EngineCommand::FreeGames { reply } => {
                let ids = self
                    .registry
                    .free_games()
                    .into_iter()
                    .map(|g| g.id().clone())
                    .collect();
                let _ = reply.send(ids);
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn forward_broadcasts(&mut self) {
        for delivery in self.registry.drain_broadcasts() {
            // Nobody listening is fine; the host may not care.
            let _ = self.outbound.send(delivery);
        }
    }

    fn finish_all(&mut self) {
        let ids: Vec<GameId> = self.registry.games().map(|g| g.id().clone()).collect();
        self.forward_broadcasts();
        for id in ids {
            if let Err(err) = self.registry.remove(&id) {
                tracing::warn!(game_id = %id, error = %err, "game did not finish cleanly");
            }
        }
    }
}
