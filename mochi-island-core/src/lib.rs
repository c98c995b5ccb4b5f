//! Mochi Island core library
//!
//! This crate provides the core of a dynamic-island virtual pet: the pet
//! state store, the decay/idle loop, the interaction controller that turns
//! gestures into state changes, and the response provider that writes the
//! pet's chat replies.

pub mod config;
pub mod decay;
pub mod error;
pub mod event;
pub mod island;
pub mod pet;
pub mod provider;

pub use config::{IslandConfig, ProviderConfig};
pub use decay::IdleTable;
pub use error::{Error, Result};
pub use event::{Event, EventReceiver, EventSender};
pub use island::{Island, PendingReply, ReplyOutcome};
pub use pet::{IslandState, Message, Mood, PetAction, PetState, PetStats, Speaker};
pub use provider::{GeminiProvider, ResponseProvider};
