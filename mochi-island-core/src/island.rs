//! The interaction controller.
//!
//! `Island` owns the pet state store and every background task that mutates
//! it: the decay loop, the auto-revert timer that follows feed/play, and the
//! in-flight chat reply. Gestures take `&mut self`, so only one gesture is
//! processed at a time; background tasks mutate the store through short,
//! synchronous `send_modify` calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use crate::config::IslandConfig;
use crate::decay::{self, DecayRates};
use crate::error::Result;
use crate::event::{channel, emit, Event, EventReceiver, EventSender};
use crate::pet::{IslandState, Message, Mood, PetAction, PetState, PetStats};
use crate::provider::ResponseProvider;

/// The dynamic-island pet.
///
/// Dropping the island shuts it down.
pub struct Island {
    /// Configuration the island was spawned with.
    config: IslandConfig,
    /// The pet state store.
    store: Arc<watch::Sender<PetState>>,
    /// Where chat replies come from.
    provider: Arc<dyn ResponseProvider>,
    /// Event sender for consumers.
    events: EventSender,
    /// Generation of the most recent chat send. Bumped under the store lock.
    generation: Arc<AtomicU64>,
    /// The decay/idle loop task.
    decay_task: Option<JoinHandle<()>>,
    /// Pending auto-revert timer, if any.
    revert_timer: Option<JoinHandle<()>>,
    /// In-flight reply task and its generation.
    reply_task: Option<(u64, AbortHandle)>,
}

/// A chat reply that is still on its way.
///
/// Dropping it does not cancel the reply.
#[derive(Debug)]
pub struct PendingReply {
    generation: u64,
    handle: JoinHandle<ReplyOutcome>,
}

/// How a chat send ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// The pet's reply was appended to the transcript.
    Delivered(Message),
    /// A newer send or a shutdown made this reply stale; it was dropped.
    Discarded,
}

impl PendingReply {
    /// Generation of the send this reply belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the reply to be delivered or dropped.
    pub async fn wait(self) -> ReplyOutcome {
        self.handle.await.unwrap_or(ReplyOutcome::Discarded)
    }
}

impl ReplyOutcome {
    /// The delivered message, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            ReplyOutcome::Delivered(message) => Some(message),
            ReplyOutcome::Discarded => None,
        }
    }

    /// Check if the reply was dropped.
    pub fn is_discarded(&self) -> bool {
        matches!(self, ReplyOutcome::Discarded)
    }
}

impl Island {
    /// Start an island: seed the store and spawn the decay loop.
    ///
    /// Must be called from within a Tokio runtime. Returns the island and the
    /// receiving end of its event channel.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid.
    pub fn spawn(
        config: IslandConfig,
        provider: Arc<dyn ResponseProvider>,
    ) -> Result<(Self, EventReceiver)> {
        config.validate()?;

        let mut state = PetState::new(config.starting_stats());
        if let Some(greeting) = &config.greeting {
            state.push_message(Message::pet(greeting.clone()));
        }
        let (store, _) = watch::channel(state);
        let store = Arc::new(store);
        let (tx, rx) = channel();

        let decay_task = tokio::spawn(decay::run(
            store.clone(),
            config.tick_period,
            DecayRates::from(&config),
            config.idle_seed,
            tx.clone(),
        ));

        tracing::info!(
            tick_ms = config.tick_period.as_millis() as u64,
            "island started"
        );

        let island = Self {
            config,
            store,
            provider,
            events: tx,
            generation: Arc::new(AtomicU64::new(0)),
            decay_task: Some(decay_task),
            revert_timer: None,
            reply_task: None,
        };

        Ok((island, rx))
    }

    /// The configuration this island runs with.
    pub fn config(&self) -> &IslandConfig {
        &self.config
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> PetState {
        self.store.borrow().clone()
    }

    /// Subscribe to state changes. The receiver always sees the latest state.
    pub fn subscribe(&self) -> watch::Receiver<PetState> {
        self.store.subscribe()
    }

    /// Current stats.
    pub fn stats(&self) -> PetStats {
        self.store.borrow().stats
    }

    /// Current pet action.
    pub fn action(&self) -> PetAction {
        self.store.borrow().action
    }

    /// Compact or expanded.
    pub fn island_state(&self) -> IslandState {
        self.store.borrow().island
    }

    /// Whether a chat reply is pending.
    pub fn is_typing(&self) -> bool {
        self.store.borrow().typing
    }

    /// Whether the decay loop is still running.
    pub fn is_running(&self) -> bool {
        self.decay_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Whether `shutdown` has run. A shut-down island ignores every gesture.
    pub fn is_shut_down(&self) -> bool {
        self.decay_task.is_none()
    }

    /// Expand the island. No-op unless it is compact.
    ///
    /// Returns whether the island changed state.
    pub fn expand(&mut self) -> bool {
        self.transition(IslandState::Compact, IslandState::Expanded)
    }

    /// Collapse the island. No-op unless it is expanded.
    ///
    /// Returns whether the island changed state.
    pub fn collapse(&mut self) -> bool {
        self.transition(IslandState::Expanded, IslandState::Compact)
    }

    /// Tap gesture: expand when compact, collapse when expanded.
    ///
    /// Returns the new island state.
    pub fn toggle(&mut self) -> IslandState {
        if !self.expand() {
            self.collapse();
        }
        self.island_state()
    }

    fn transition(&mut self, from: IslandState, to: IslandState) -> bool {
        if self.is_shut_down() {
            return false;
        }

        let mut action_changed = false;
        let transitioned = self.store.send_if_modified(|state| {
            if state.island != from {
                return false;
            }
            state.island = to;
            action_changed = state.action != PetAction::Idle;
            state.action = PetAction::Idle;
            true
        });

        if !transitioned {
            return false;
        }

        self.cancel_revert();
        tracing::debug!(island = %to, "island transitioned");
        emit(
            &self.events,
            match to {
                IslandState::Expanded => Event::Expanded,
                IslandState::Compact => Event::Collapsed,
            },
        );
        if action_changed {
            emit(&self.events, Event::action_changed(PetAction::Idle));
        }
        true
    }

    /// Feed the pet: less hungry, a bit happier, eating until the revert timer fires.
    ///
    /// Returns the stats after feeding. Does nothing once shut down.
    pub fn feed(&mut self) -> PetStats {
        if self.is_shut_down() {
            return self.stats();
        }
        let hunger = self.config.feed_hunger;
        let happiness = self.config.feed_happiness;
        let stats = self.start_temporary_action(PetAction::Eating, |stats| {
            stats.adjust_hunger(-hunger);
            stats.adjust_happiness(happiness);
        });
        emit(&self.events, Event::Fed { stats });
        stats
    }

    /// Play with the pet: happier, walking until the revert timer fires.
    ///
    /// Returns the stats after playing. Does nothing once shut down.
    pub fn play(&mut self) -> PetStats {
        if self.is_shut_down() {
            return self.stats();
        }
        let happiness = self.config.play_happiness;
        let stats = self.start_temporary_action(PetAction::Walking, |stats| {
            stats.adjust_happiness(happiness);
        });
        emit(&self.events, Event::Played { stats });
        stats
    }

    fn start_temporary_action(
        &mut self,
        action: PetAction,
        adjust: impl FnOnce(&mut PetStats),
    ) -> PetStats {
        let mut action_changed = false;
        let mut stats = self.stats();
        self.store.send_modify(|state| {
            adjust(&mut state.stats);
            action_changed = state.action != action;
            state.action = action;
            stats = state.stats;
        });

        tracing::debug!(%action, hunger = stats.hunger(), happiness = stats.happiness(), "temporary action");
        if action_changed {
            emit(&self.events, Event::action_changed(action));
        }
        self.schedule_revert();
        stats
    }

    /// Replace any pending auto-revert with a fresh one.
    fn schedule_revert(&mut self) {
        self.cancel_revert();

        let store = self.store.clone();
        let events = self.events.clone();
        let delay = self.config.revert_delay;
        self.revert_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            set_action(&store, &events, PetAction::Idle);
        }));
    }

    fn cancel_revert(&mut self) {
        if let Some(timer) = self.revert_timer.take() {
            timer.abort();
        }
    }

    /// Send a chat message to the pet.
    ///
    /// Blank input, or any input after shutdown, is ignored and returns
    /// `None`. Otherwise the message is appended, the pet starts thinking,
    /// and the reply is fetched in the background. Starting a new send drops
    /// any reply still in flight.
    pub fn send_message(&mut self, text: &str) -> Option<PendingReply> {
        if text.trim().is_empty() {
            tracing::debug!("ignoring blank chat message");
            return None;
        }
        if self.is_shut_down() {
            tracing::debug!("island is shut down, ignoring chat message");
            return None;
        }

        self.cancel_revert();
        let superseded = self.reply_task.take();

        let message = Message::user(text);
        let threshold = self.config.mood_threshold;
        let counter = &self.generation;
        let mut generation = 0;
        let mut mood = Mood::Grumpy;
        let mut action_changed = false;
        self.store.send_modify(|state| {
            generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
            mood = state.stats.mood(threshold);
            state.push_message(message.clone());
            state.typing = true;
            action_changed = state.action != PetAction::Thinking;
            state.action = PetAction::Thinking;
        });

        // Abort only after the bump so the old task's guard sees it as stale.
        if let Some((previous, task)) = superseded {
            if !task.is_finished() {
                task.abort();
                tracing::debug!(generation = previous, "superseded pending reply");
                emit(&self.events, Event::ReplyDiscarded { generation: previous });
            }
        }

        tracing::debug!(generation, %mood, "chat message sent");
        emit(&self.events, Event::message_appended(message));
        if action_changed {
            emit(&self.events, Event::action_changed(PetAction::Thinking));
        }

        let handle = tokio::spawn(deliver_reply(
            self.store.clone(),
            self.provider.clone(),
            self.events.clone(),
            self.generation.clone(),
            generation,
            text.to_string(),
            mood,
        ));
        self.reply_task = Some((generation, handle.abort_handle()));

        Some(PendingReply { generation, handle })
    }

    /// Stop the decay loop, cancel the revert timer and drop any pending reply.
    ///
    /// The last state stays readable through `snapshot`. Called on drop.
    pub fn shutdown(&mut self) {
        let Some(decay_task) = self.decay_task.take() else {
            return;
        };
        decay_task.abort();
        self.cancel_revert();

        let counter = &self.generation;
        self.store.send_if_modified(|_| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });
        if let Some((_, task)) = self.reply_task.take() {
            task.abort();
        }

        tracing::info!("island shut down");
    }
}

impl Drop for Island {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Island {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Island")
            .field("config", &self.config)
            .field("state", &*self.store.borrow())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

fn set_action(store: &watch::Sender<PetState>, events: &EventSender, action: PetAction) {
    let changed = store.send_if_modified(|state| {
        if state.action == action {
            return false;
        }
        state.action = action;
        true
    });
    if changed {
        emit(events, Event::action_changed(action));
    }
}

/// Settles the store if a reply task ends without delivering, e.g. when the
/// provider panics. Only touches the store while its generation is current.
struct ReplyGuard {
    store: Arc<watch::Sender<PetState>>,
    events: EventSender,
    current: Arc<AtomicU64>,
    generation: u64,
    armed: bool,
}

impl Drop for ReplyGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let current = &self.current;
        let generation = self.generation;
        let mut action_changed = false;
        let settled = self.store.send_if_modified(|state| {
            if current.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.typing = false;
            action_changed = state.action == PetAction::Thinking;
            if action_changed {
                state.action = PetAction::Idle;
            }
            true
        });

        if settled {
            tracing::warn!(generation, "reply task ended without a reply");
            if action_changed {
                emit(&self.events, Event::action_changed(PetAction::Idle));
            }
        }
    }
}

/// Fetch a reply and append it, unless a newer send or a shutdown happened meanwhile.
async fn deliver_reply(
    store: Arc<watch::Sender<PetState>>,
    provider: Arc<dyn ResponseProvider>,
    events: EventSender,
    current: Arc<AtomicU64>,
    generation: u64,
    text: String,
    mood: Mood,
) -> ReplyOutcome {
    let mut guard = ReplyGuard {
        store: store.clone(),
        events: events.clone(),
        current: current.clone(),
        generation,
        armed: true,
    };

    let reply = provider.generate(&text, mood).await;
    guard.armed = false;
    let message = Message::pet(reply);

    let mut action_changed = false;
    let applied = store.send_if_modified(|state| {
        if current.load(Ordering::SeqCst) != generation {
            return false;
        }
        state.push_message(message.clone());
        state.typing = false;
        action_changed = state.action != PetAction::Idle;
        state.action = PetAction::Idle;
        true
    });

    if !applied {
        tracing::debug!(generation, "dropping stale reply");
        emit(&events, Event::ReplyDiscarded { generation });
        return ReplyOutcome::Discarded;
    }

    emit(&events, Event::message_appended(message.clone()));
    if action_changed {
        emit(&events, Event::action_changed(PetAction::Idle));
    }
    ReplyOutcome::Delivered(message)
}
