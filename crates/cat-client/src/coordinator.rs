//! Sync coordinator: keeps the local mirror of one game in step with the
//! server and owns the player's selection.
//!
//! State is only ever replaced wholesale by a successful fetch. Pushes and
//! submissions trigger fetches; concurrent fetch requests share one network
//! call. Detaching bumps an epoch so late results are dropped on the floor.

use crate::protocol::{PlayCardRequest, PlayResponse, PushEvent};
use crate::transport::{Transport, TransportError};
use cat_core::{
    requirements, resolve, submittable_actions, CardCatalog, CardKind, FigureId, GameRules,
    GameView, Perspective, PlannedAction, Requirement, ResolveError, Selection, SelectionError,
    TurnCountdown,
};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Lifecycle of a coordinator's attachment to a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Detached,
    /// First fetch in flight, nothing to show yet
    Loading,
    /// State available; `stale` after a failed refresh
    Active { stale: bool },
    Refreshing,
    /// The server ended the game session
    Closed { reason: String },
    /// The initial load failed
    Failed { error: String },
}

impl SyncPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Closed { .. } | SyncPhase::Failed { .. })
    }

    pub fn has_state(&self) -> bool {
        matches!(self, SyncPhase::Active { .. } | SyncPhase::Refreshing)
    }
}

/// Notifications for the front end
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new authoritative state was installed
    StateChanged,
    SelectionChanged,
    FetchFailed(TransportError),
    /// Push channel dropped; state only updates on explicit refresh now
    PushLost,
    Closed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Session was detached")]
    Detached,

    #[error("Game session has ended")]
    SessionEnded,

    #[error("Not attached to a game")]
    NotAttached,

    #[error("Player is not part of this game")]
    NotInGame,

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Cannot play yet: {0}")]
    Precondition(#[from] ResolveError),

    #[error("Action does not match the current selection")]
    NotOffered,

    /// The server refused the play; `reason` is its message verbatim
    #[error("{reason}")]
    Rejected { status: u16, reason: String },

    #[error(transparent)]
    Transport(TransportError),

    #[error("A play is already being submitted")]
    Busy,

    #[error("No active game state")]
    NotActive,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<GameView>, TransportError>>>;

struct Session {
    phase: SyncPhase,
    state: Option<Arc<GameView>>,
    selection: Selection,
    catalog: CardCatalog,
    countdown: TurnCountdown,
}

struct Inner<T> {
    transport: Arc<T>,
    game_id: Uuid,
    player_id: Uuid,
    rules: GameRules,
    session: Mutex<Session>,
    in_flight: Mutex<Option<(u64, SharedFetch)>>,
    next_fetch: AtomicU64,
    epoch: AtomicU64,
    submitting: AtomicBool,
    push_task: Mutex<Option<JoinHandle<()>>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

/// Handle to one player's view of one game. Clones share the session.
pub struct SyncCoordinator<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for SyncCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Clears the submit flag however the submission ends
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<T: Transport> SyncCoordinator<T> {
    /// Create a detached coordinator and the receiver for its events.
    pub fn new(
        transport: T,
        game_id: Uuid,
        player_id: Uuid,
        rules: GameRules,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let inner = Inner {
            transport: Arc::new(transport),
            game_id,
            player_id,
            rules,
            session: Mutex::new(Session {
                phase: SyncPhase::Detached,
                state: None,
                selection: Selection::new(),
                catalog: CardCatalog::standard(),
                countdown: TurnCountdown::new(Instant::now()),
            }),
            in_flight: Mutex::new(None),
            next_fetch: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            submitting: AtomicBool::new(false),
            push_task: Mutex::new(None),
            events,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    pub fn game_id(&self) -> Uuid {
        self.inner.game_id
    }

    pub fn player_id(&self) -> Uuid {
        self.inner.player_id
    }

    pub fn rules(&self) -> &GameRules {
        &self.inner.rules
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Load the game and start listening for pushes.
    pub async fn attach(&self) -> Result<(), SyncError> {
        {
            let mut session = self.inner.session.lock();
            match session.phase {
                SyncPhase::Detached => session.phase = SyncPhase::Loading,
                SyncPhase::Closed { .. } | SyncPhase::Failed { .. } => {
                    return Err(SyncError::SessionEnded)
                }
                _ => return Ok(()),
            }
        }
        let epoch = self.epoch();
        info!(
            "Attaching to game {} as {}",
            self.inner.game_id, self.inner.player_id
        );

        let result = self.fetch_shared().await;
        self.apply_fetch(epoch, result)?;

        match self
            .inner
            .transport
            .subscribe(self.inner.game_id, self.inner.player_id)
            .await
        {
            Ok(rx) => {
                let mut slot = self.inner.push_task.lock();
                if self.epoch() != epoch {
                    return Err(SyncError::Detached);
                }
                if let Some(old) = slot.replace(self.spawn_push_task(rx, epoch)) {
                    old.abort();
                }
            }
            Err(e) => {
                warn!("Push channel unavailable: {}", e);
                self.emit(SessionEvent::PushLost);
            }
        }

        match self.inner.transport.fetch_catalog().await {
            Ok(catalog) => {
                if self.epoch() != epoch {
                    return Err(SyncError::Detached);
                }
                self.inner.session.lock().catalog = catalog;
            }
            Err(e) => warn!("Card catalog unavailable, using the standard deck: {}", e),
        }

        Ok(())
    }

    /// Refetch the state. Joins a fetch already in flight.
    pub async fn refresh(&self) -> Result<Arc<GameView>, SyncError> {
        let epoch = self.epoch();
        {
            let mut session = self.inner.session.lock();
            match session.phase {
                SyncPhase::Active { .. } => session.phase = SyncPhase::Refreshing,
                SyncPhase::Refreshing | SyncPhase::Loading => {}
                SyncPhase::Detached => return Err(SyncError::NotAttached),
                SyncPhase::Closed { .. } | SyncPhase::Failed { .. } => {
                    return Err(SyncError::SessionEnded)
                }
            }
        }
        let result = self.fetch_shared().await;
        self.apply_fetch(epoch, result)
    }

    /// Stop syncing. Results of fetches still in flight are discarded.
    pub fn detach(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.inner.push_task.lock().take() {
            handle.abort();
        }
        self.inner.in_flight.lock().take();

        let mut session = self.inner.session.lock();
        if !session.phase.is_terminal() {
            session.phase = SyncPhase::Detached;
            session.state = None;
            session.selection.reset_all();
        }
        info!("Detached from game {}", self.inner.game_id);
    }

    /// Send a planned action to the server.
    ///
    /// The action must be one of those the current selection offers. On
    /// success the selection is reset and the state refetched; on failure
    /// the selection is kept so the player can adjust it.
    pub async fn submit(&self, planned: &PlannedAction) -> Result<PlayResponse, SubmitError> {
        let request = {
            let session = self.inner.session.lock();
            if !session.phase.has_state() {
                return Err(SubmitError::NotActive);
            }
            let state = session.state.as_ref().ok_or(SubmitError::NotActive)?;
            let view = state
                .perspective(self.inner.player_id)
                .ok_or(SubmitError::NotActive)?;
            let offered = resolve(&view, &session.selection, &self.inner.rules)?;
            if !offered.contains(planned) {
                return Err(SubmitError::NotOffered);
            }
            PlayCardRequest {
                player_uuid: self.inner.player_id,
                card_index: planned.card_index,
                action_details: planned.details.clone(),
            }
        };

        if self.inner.submitting.swap(true, Ordering::SeqCst) {
            return Err(SubmitError::Busy);
        }
        let _guard = SubmitGuard(&self.inner.submitting);
        let epoch = self.epoch();

        info!("Submitting {}", planned.describe());
        match self
            .inner
            .transport
            .submit_action(self.inner.game_id, &request)
            .await
        {
            Ok(response) => {
                if self.epoch() == epoch {
                    self.inner.session.lock().selection.reset_all();
                    self.emit(SessionEvent::SelectionChanged);
                }
                if let Err(e) = self.refresh().await {
                    warn!("Refresh after play failed: {}", e);
                }
                Ok(response)
            }
            Err(TransportError::Rejected { status, reason }) => {
                info!("Play rejected: {}", reason);
                Err(SubmitError::Rejected { status, reason })
            }
            Err(e) => {
                error!("Play failed: {}", e);
                Err(SubmitError::Transport(e))
            }
        }
    }

    pub fn select_card(&self, index: usize) -> Result<(), SyncError> {
        self.with_selection(|selection, view, _| selection.select_card(index, view.hand()))
    }

    pub fn select_figure(&self, figure: FigureId) -> Result<(), SyncError> {
        self.with_selection(|selection, view, _| selection.select_figure(figure, view))
    }

    pub fn allocate_inferno(&self, figure: FigureId, steps: i64) -> Result<(), SyncError> {
        self.with_selection(|selection, _, rules| {
            selection.update_inferno_allocation(figure, steps, rules)
        })?
        .map_err(SyncError::from)
    }

    pub fn set_joker_imitation(&self, imitation: CardKind) -> Result<(), SyncError> {
        self.with_selection(|selection, view, _| {
            selection.set_joker_imitation(imitation, view.hand())
        })?
        .map_err(SyncError::from)
    }

    pub fn cancel_joker_imitation(&self) -> Result<(), SyncError> {
        self.with_selection(|selection, _, _| selection.cancel_joker_imitation())
    }

    pub fn reset_selection(&self) -> Result<(), SyncError> {
        self.with_selection(|selection, _, _| selection.reset_all())
    }

    /// Latest authoritative state
    pub fn snapshot(&self) -> Option<Arc<GameView>> {
        self.inner.session.lock().state.clone()
    }

    pub fn selection(&self) -> Selection {
        self.inner.session.lock().selection.clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.inner.session.lock().phase.clone()
    }

    /// Choices the player still has to make
    pub fn requirements(&self) -> Vec<Requirement> {
        self.query(|view, selection, rules| requirements(view, selection, rules))
            .unwrap_or_default()
    }

    pub fn submittable_actions(&self) -> Vec<PlannedAction> {
        self.query(|view, selection, rules| submittable_actions(view, selection, rules))
            .unwrap_or_default()
    }

    /// Cards the selected Joker may imitate
    pub fn joker_options(&self) -> Vec<CardKind> {
        self.inner.session.lock().catalog.joker_options()
    }

    /// Time left in the current turn, by the local clock
    pub fn turn_remaining(&self) -> Option<Duration> {
        self.inner.session.lock().countdown.remaining(Instant::now())
    }

    fn query<R>(
        &self,
        f: impl FnOnce(&Perspective<'_>, &Selection, &GameRules) -> R,
    ) -> Option<R> {
        let session = self.inner.session.lock();
        let state = session.state.as_ref()?;
        let view = state.perspective(self.inner.player_id)?;
        Some(f(&view, &session.selection, &self.inner.rules))
    }

    fn with_selection<R>(
        &self,
        f: impl FnOnce(&mut Selection, &Perspective<'_>, &GameRules) -> R,
    ) -> Result<R, SyncError> {
        let (out, changed) = {
            let mut session = self.inner.session.lock();
            match session.phase {
                SyncPhase::Closed { .. } | SyncPhase::Failed { .. } => {
                    return Err(SyncError::SessionEnded)
                }
                SyncPhase::Detached => return Err(SyncError::NotAttached),
                _ => {}
            }
            let state = session.state.clone().ok_or(SyncError::NotAttached)?;
            let view = state
                .perspective(self.inner.player_id)
                .ok_or(SyncError::NotInGame)?;
            let before = session.selection.clone();
            let out = f(&mut session.selection, &view, &self.inner.rules);
            (out, session.selection != before)
        };
        if changed {
            self.emit(SessionEvent::SelectionChanged);
        }
        Ok(out)
    }

    /// Start a fetch, or join the one already running.
    async fn fetch_shared(&self) -> Result<Arc<GameView>, TransportError> {
        let (id, fetch) = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some((id, fetch)) => {
                    debug!("Joining in-flight fetch {}", id);
                    (*id, fetch.clone())
                }
                None => {
                    let id = self.inner.next_fetch.fetch_add(1, Ordering::SeqCst);
                    let transport = Arc::clone(&self.inner.transport);
                    let (game_id, player_id) = (self.inner.game_id, self.inner.player_id);
                    let fetch = async move {
                        transport
                            .fetch_state(game_id, player_id)
                            .await
                            .map(Arc::new)
                    }
                    .boxed()
                    .shared();
                    *slot = Some((id, fetch.clone()));
                    (id, fetch)
                }
            }
        };

        let result = fetch.await;

        let mut slot = self.inner.in_flight.lock();
        if matches!(slot.as_ref(), Some((current, _)) if *current == id) {
            *slot = None;
        }
        result
    }

    fn apply_fetch(
        &self,
        epoch: u64,
        result: Result<Arc<GameView>, TransportError>,
    ) -> Result<Arc<GameView>, SyncError> {
        let mut session = self.inner.session.lock();
        if self.epoch() != epoch {
            debug!("Discarding fetch result from an old attachment");
            return Err(SyncError::Detached);
        }
        if session.phase.is_terminal() {
            return Err(SyncError::SessionEnded);
        }

        match result {
            Ok(state) => {
                let fresh = !session
                    .state
                    .as_ref()
                    .map_or(false, |current| Arc::ptr_eq(current, &state));
                session.phase = SyncPhase::Active { stale: false };
                if fresh {
                    if session.countdown.observe(&state, Instant::now()) {
                        debug!(
                            "Turn passed to player {} (round {})",
                            state.current_player_index, state.round_number
                        );
                    }
                    session.state = Some(Arc::clone(&state));
                    drop(session);
                    self.emit(SessionEvent::StateChanged);
                }
                Ok(state)
            }
            Err(e) => {
                let next = if session.state.is_some() {
                    SyncPhase::Active { stale: true }
                } else {
                    SyncPhase::Failed {
                        error: e.to_string(),
                    }
                };
                let changed = session.phase != next;
                session.phase = next;
                drop(session);
                if changed {
                    warn!("Fetching game state failed: {}", e);
                    self.emit(SessionEvent::FetchFailed(e.clone()));
                }
                Err(e.into())
            }
        }
    }

    fn spawn_push_task(
        &self,
        mut rx: mpsc::UnboundedReceiver<PushEvent>,
        epoch: u64,
    ) -> JoinHandle<()> {
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let coordinator = SyncCoordinator { inner };
                if coordinator.epoch() != epoch {
                    return;
                }
                match event {
                    PushEvent::Update => {
                        debug!("Push: state updated");
                        if let Err(e) = coordinator.refresh().await {
                            warn!("Refresh after push failed: {}", e);
                        }
                    }
                    PushEvent::Closed { reason } => {
                        coordinator.close(reason);
                        return;
                    }
                }
            }

            if let Some(inner) = weak.upgrade() {
                SyncCoordinator { inner }.push_lost(epoch);
            }
        })
    }

    fn close(&self, reason: String) {
        {
            let mut session = self.inner.session.lock();
            if session.phase.is_terminal() {
                return;
            }
            session.phase = SyncPhase::Closed {
                reason: reason.clone(),
            };
        }
        info!("Game {} closed: {}", self.inner.game_id, reason);
        self.emit(SessionEvent::Closed { reason });
    }

    fn push_lost(&self, epoch: u64) {
        let phase = self.phase();
        if self.epoch() != epoch || phase.is_terminal() || phase == SyncPhase::Detached {
            return;
        }
        warn!("Push channel lost for game {}", self.inner.game_id);
        self.emit(SessionEvent::PushLost);
    }
}
