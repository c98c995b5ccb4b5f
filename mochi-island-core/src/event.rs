//! Event system for the island.
//!
//! The watch-based store tells the presentation *what* the island looks like
//! now; these events tell consumers *what happened*, e.g. so a terminal
//! frontend can print a pet reply the moment it lands. Events are emitted
//! without blocking: if the consumer falls behind, excess events are dropped.

use tokio::sync::mpsc;

use crate::pet::{Message, PetAction, PetStats};

/// Default channel buffer size.
const DEFAULT_CHANNEL_SIZE: usize = 100;

/// Events emitted by the island.
#[derive(Debug, Clone)]
pub enum Event {
    /// The island went from compact to expanded.
    Expanded,

    /// The island went from expanded to compact.
    Collapsed,

    /// The pet switched to a different action.
    ActionChanged {
        /// The new action.
        action: PetAction,
    },

    /// The pet was fed.
    Fed {
        /// Stats after feeding.
        stats: PetStats,
    },

    /// The pet played.
    Played {
        /// Stats after playing.
        stats: PetStats,
    },

    /// The decay loop ran.
    Ticked {
        /// Tick number (1-indexed).
        tick: u64,
        /// Stats after the tick.
        stats: PetStats,
    },

    /// A message was appended to the transcript.
    MessageAppended {
        /// The new message.
        message: Message,
    },

    /// A reply arrived for a send that is no longer current and was dropped.
    ReplyDiscarded {
        /// Generation of the dropped send.
        generation: u64,
    },
}

/// Sender for events.
pub type EventSender = mpsc::Sender<Event>;

/// Receiver for events.
pub type EventReceiver = mpsc::Receiver<Event>;

/// Create a new event channel with the default buffer size.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}

/// Create a new event channel with a custom buffer size.
pub fn channel_with_size(size: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(size)
}

/// Send an event without waiting for buffer space.
///
/// Gestures and timers never wait on the consumer; a full or closed channel
/// just loses the event.
pub(crate) fn emit(events: &EventSender, event: Event) {
    if let Err(err) = events.try_send(event) {
        tracing::trace!("event dropped: {}", err);
    }
}

impl Event {
    /// Create an action change event.
    pub fn action_changed(action: PetAction) -> Self {
        Self::ActionChanged { action }
    }

    /// Create a message event.
    pub fn message_appended(message: Message) -> Self {
        Self::MessageAppended { message }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Expanded => write!(f, "island expanded"),
            Event::Collapsed => write!(f, "island collapsed"),
            Event::ActionChanged { action } => write!(f, "pet is now {}", action),
            Event::Fed { stats } => write!(
                f,
                "fed (hunger {}%, happiness {}%)",
                stats.hunger_percent(),
                stats.happiness_percent()
            ),
            Event::Played { stats } => {
                write!(f, "played (happiness {}%)", stats.happiness_percent())
            }
            Event::Ticked { tick, stats } => write!(
                f,
                "tick {} (hunger {}%, happiness {}%)",
                tick,
                stats.hunger_percent(),
                stats.happiness_percent()
            ),
            Event::MessageAppended { message } => {
                let who = if message.is_from_user() { "you" } else { "pet" };
                write!(f, "{}: {}", who, message.text)
            }
            Event::ReplyDiscarded { generation } => {
                write!(f, "stale reply dropped (send #{})", generation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_creation() {
        let (tx, _rx) = channel();
        // Should be able to send without blocking
        tx.try_send(Event::Expanded).unwrap();
    }

    #[test]
    fn test_emit_drops_when_full() {
        let (tx, mut rx) = channel_with_size(1);
        emit(&tx, Event::Expanded);
        emit(&tx, Event::Collapsed);

        assert!(matches!(rx.try_recv(), Ok(Event::Expanded)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_ignores_closed_channel() {
        let (tx, rx) = channel();
        drop(rx);
        emit(&tx, Event::Expanded);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(
            Event::action_changed(PetAction::Sleeping).to_string(),
            "pet is now sleeping"
        );
        assert_eq!(
            Event::Fed {
                stats: PetStats::new(20.0, 90.0)
            }
            .to_string(),
            "fed (hunger 20%, happiness 90%)"
        );
        assert_eq!(
            Event::message_appended(Message::pet("Purr...")).to_string(),
            "pet: Purr..."
        );
        assert_eq!(
            Event::ReplyDiscarded { generation: 3 }.to_string(),
            "stale reply dropped (send #3)"
        );
    }
}
