//! Drives one game at a time against the server.
//!
//! The controller owns the only [`GameSession`]. Player actions and the tick
//! task both go through the same mutex, and whichever of them moves the
//! session to `Completed` finalizes it; finalizing takes the session out of
//! the slot, so it happens once.

use crate::catalog::GameCatalog;
use crate::client::GamesClient;
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::errors::GameError;
use crate::models::GameResult;
use crate::session::{GameSession, SessionSnapshot};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started(SessionSnapshot),
    ActionRecorded(SessionSnapshot),
    Ticked(SessionSnapshot),
    Finished {
        snapshot: SessionSnapshot,
        /// Server scoring, or the reason it could not be fetched.
        outcome: Result<GameResult, String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// No game running; nothing happened.
    NoSession,
    Recorded(SessionSnapshot),
    /// This action ended the game. `result` is `None` if another path
    /// finalized it first.
    Completed {
        snapshot: SessionSnapshot,
        result: Option<GameResult>,
    },
}

#[derive(Default)]
struct Slot {
    session: Option<GameSession>,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FinishedBy {
    Caller,
    Ticker,
}

#[derive(Clone)]
pub struct SessionController {
    client: GamesClient,
    catalog: Arc<GameCatalog>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    slot: Arc<Mutex<Slot>>,
    scores: mpsc::UnboundedSender<u32>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Must be called from within a tokio runtime: it spawns the task that
    /// forwards live scores to the server.
    pub fn new(
        client: GamesClient,
        catalog: GameCatalog,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        let scores = spawn_score_reporter(client.clone());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            catalog: Arc::new(catalog),
            clock,
            tick_interval,
            slot: Arc::new(Mutex::new(Slot::default())),
            scores,
            events,
        }
    }

    /// Builds the HTTP client and fetches the game catalog once.
    pub async fn connect(config: &ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, GameError> {
        let client = GamesClient::new(config)?;
        let raw = client.game_data().await?;
        let catalog = GameCatalog::from_raw(raw);
        info!(games = catalog.len(), "loaded game catalog from {}", config.base_url);
        Ok(Self::new(client, catalog, clock, config.tick_interval))
    }

    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    pub fn client(&self) -> &GamesClient {
        &self.client
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let slot = self.slot.lock().await;
        slot.session.as_ref().map(GameSession::snapshot)
    }

    pub async fn is_active(&self) -> bool {
        let slot = self.slot.lock().await;
        slot.session.as_ref().is_some_and(GameSession::is_active)
    }

    /// Starts a new game. A game already running is dropped without being
    /// ended on the server.
    pub async fn start(&self, variant_id: &str) -> Result<SessionSnapshot, GameError> {
        let variant = self
            .catalog
            .lookup(variant_id)
            .cloned()
            .ok_or_else(|| GameError::InvalidVariant(variant_id.to_string()))?;

        let ack = self.client.start_game(variant.kind).await.map_err(|err| {
            warn!("server refused to start {}: {err}", variant.kind);
            GameError::ServerUnavailable(err)
        })?;

        let session = GameSession::new(variant, self.clock.now())
            .with_server_session_id(ack.session_id);
        let snapshot = session.snapshot();

        {
            let mut slot = self.slot.lock().await;
            if let Some(handle) = slot.ticker.take() {
                handle.abort();
            }
            if let Some(previous) = slot.session.take() {
                info!(
                    game = %previous.kind(),
                    score = previous.score(),
                    "discarding unfinished session"
                );
            }
            slot.generation += 1;
            let generation = slot.generation;
            slot.session = Some(session);
            slot.ticker = Some(tokio::spawn(self.clone().run_ticker(generation)));
        }

        info!(game = %snapshot.kind, target = snapshot.target_score, limit = snapshot.time_limit, "session started");
        self.emit(SessionEvent::Started(snapshot.clone()));
        Ok(snapshot)
    }

    /// Records one player action (a tap, or a plank check-in).
    pub async fn submit_action(&self) -> Result<ActionOutcome, GameError> {
        let now = self.clock.now();
        let (generation, snapshot, completed) = {
            let mut slot = self.slot.lock().await;
            let generation = slot.generation;
            let Some(session) = slot.session.as_mut().filter(|s| s.is_active()) else {
                return Ok(ActionOutcome::NoSession);
            };
            let completed = session.record_action(now);
            (generation, session.snapshot(), completed)
        };

        debug!(game = %snapshot.kind, score = snapshot.score, "action recorded");
        if self.scores.send(snapshot.score).is_err() {
            warn!("score reporter stopped; update for {} not sent", snapshot.score);
        }
        self.emit(SessionEvent::ActionRecorded(snapshot.clone()));

        if !completed {
            return Ok(ActionOutcome::Recorded(snapshot));
        }
        let result = self.finish(Some(generation), FinishedBy::Caller).await?;
        Ok(ActionOutcome::Completed { snapshot, result })
    }

    /// Ends the current game and asks the server for the final scoring.
    /// Returns `Ok(None)` when there is nothing to end. The local session is
    /// gone afterwards even if the server call fails.
    pub async fn finalize(&self) -> Result<Option<GameResult>, GameError> {
        self.finish(None, FinishedBy::Caller).await
    }

    /// Stops the timer and forgets the session without telling the server.
    pub async fn abandon(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(handle) = slot.ticker.take() {
            handle.abort();
        }
        if let Some(session) = slot.session.take() {
            info!(game = %session.kind(), "session abandoned");
        }
    }

    async fn finish(
        &self,
        generation: Option<u64>,
        by: FinishedBy,
    ) -> Result<Option<GameResult>, GameError> {
        let (session, ticker) = {
            let mut slot = self.slot.lock().await;
            if generation.is_some_and(|g| g != slot.generation) {
                return Ok(None);
            }
            let Some(session) = slot.session.take() else {
                return Ok(None);
            };
            (session, slot.ticker.take())
        };
        // The tick task cannot abort itself mid-request; dropping the handle detaches it.
        if let (Some(handle), FinishedBy::Caller) = (ticker, by) {
            handle.abort();
        }

        let snapshot = session.snapshot();
        match self.client.end_game().await {
            Ok(result) => {
                info!(
                    game = %snapshot.kind,
                    score = snapshot.score,
                    points = result.points_earned,
                    badges = result.new_badges.len(),
                    "session finalized"
                );
                self.emit(SessionEvent::Finished {
                    snapshot,
                    outcome: Ok(result.clone()),
                });
                Ok(Some(result))
            }
            Err(err) => {
                error!(game = %snapshot.kind, "failed to finalize session: {err}");
                self.emit(SessionEvent::Finished {
                    snapshot,
                    outcome: Err(err.to_string()),
                });
                Err(GameError::ServerUnavailable(err))
            }
        }
    }

    async fn run_ticker(self, generation: u64) {
        let mut interval = time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let now = self.clock.now();
            let (snapshot, expired) = {
                let mut slot = self.slot.lock().await;
                if slot.generation != generation {
                    break;
                }
                let Some(session) = slot.session.as_mut().filter(|s| s.is_active()) else {
                    break;
                };
                let expired = session.tick(now);
                (session.snapshot(), expired)
            };

            self.emit(SessionEvent::Ticked(snapshot.clone()));
            if expired {
                debug!(game = %snapshot.kind, elapsed = snapshot.elapsed_seconds, "time limit reached");
                // Failures are logged and broadcast by `finish`.
                let _ = self.finish(Some(generation), FinishedBy::Ticker).await;
                break;
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Sends live scores one at a time so the server sees them in action order.
fn spawn_score_reporter(client: GamesClient) -> mpsc::UnboundedSender<u32> {
    let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
    tokio::spawn(async move {
        while let Some(score) = rx.recv().await {
            if let Err(err) = client.update_score(score).await {
                warn!("{}", GameError::UpdateDropped(err));
            }
        }
    });
    tx
}
