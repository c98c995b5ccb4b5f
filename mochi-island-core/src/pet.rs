//! Pet state types.
//!
//! This module holds the data the island renders: the pet's stats, what it
//! is currently doing, whether the island is expanded, and the chat
//! transcript. Mutations here are plain clamp-and-set operations; timing and
//! sequencing live in the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lower bound for both stats.
pub const STAT_MIN: f64 = 0.0;

/// Upper bound for both stats.
pub const STAT_MAX: f64 = 100.0;

/// Happiness below this value is shown as an unhappy pet in the compact view.
const UNHAPPY_BELOW: f64 = 30.0;

/// Hunger and happiness, each kept within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStats")]
pub struct PetStats {
    hunger: f64,
    happiness: f64,
}

/// Stats as they appear on the wire, before clamping.
#[derive(Deserialize)]
struct RawStats {
    hunger: f64,
    happiness: f64,
}

impl From<RawStats> for PetStats {
    fn from(raw: RawStats) -> Self {
        Self::new(raw.hunger, raw.happiness)
    }
}

impl PetStats {
    /// Create stats, clamping both values into range.
    pub fn new(hunger: f64, happiness: f64) -> Self {
        Self {
            hunger: clamp_stat(hunger),
            happiness: clamp_stat(happiness),
        }
    }

    /// Current hunger.
    pub fn hunger(&self) -> f64 {
        self.hunger
    }

    /// Current happiness.
    pub fn happiness(&self) -> f64 {
        self.happiness
    }

    /// Add `delta` to hunger, clamping the result.
    pub fn adjust_hunger(&mut self, delta: f64) {
        self.hunger = clamp_stat(self.hunger + delta);
    }

    /// Add `delta` to happiness, clamping the result.
    pub fn adjust_happiness(&mut self, delta: f64) {
        self.happiness = clamp_stat(self.happiness + delta);
    }

    /// The mood label passed to the response provider.
    ///
    /// The pet is happy only when happiness is strictly above `threshold`.
    pub fn mood(&self, threshold: f64) -> Mood {
        if self.happiness > threshold {
            Mood::Happy
        } else {
            Mood::Grumpy
        }
    }

    /// Whether the compact view should show the pet as unhappy.
    pub fn is_unhappy(&self) -> bool {
        self.happiness < UNHAPPY_BELOW
    }

    /// Hunger rounded to a whole percentage.
    pub fn hunger_percent(&self) -> u8 {
        self.hunger.round() as u8
    }

    /// Happiness rounded to a whole percentage.
    pub fn happiness_percent(&self) -> u8 {
        self.happiness.round() as u8
    }
}

fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        return STAT_MIN;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

/// What the pet is currently doing. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetAction {
    Idle,
    Walking,
    Sleeping,
    Eating,
    /// Waiting on a chat reply.
    Thinking,
}

/// Whether the island is the compact pill or the expanded panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IslandState {
    Compact,
    Expanded,
}

/// Mood label derived from happiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Grumpy,
}

/// Who wrote a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Pet,
}

/// A single chat message. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent the message.
    pub sender: Speaker,
    /// The message text, exactly as sent or received.
    pub text: String,
    /// When the message was appended.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message stamped with the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Speaker::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a pet message stamped with the current time.
    pub fn pet(text: impl Into<String>) -> Self {
        Self {
            sender: Speaker::Pet,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether the user wrote this message.
    pub fn is_from_user(&self) -> bool {
        self.sender == Speaker::User
    }
}

/// Everything the presentation needs to render the island.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetState {
    /// Hunger and happiness.
    pub stats: PetStats,
    /// Current pet action.
    pub action: PetAction,
    /// Compact or expanded.
    pub island: IslandState,
    /// Whether a chat reply is pending.
    pub typing: bool,
    /// Chat transcript, oldest first.
    transcript: Vec<Message>,
}

impl PetState {
    /// Create a collapsed, idle pet with the given stats and an empty transcript.
    pub fn new(stats: PetStats) -> Self {
        Self {
            stats,
            action: PetAction::Idle,
            island: IslandState::Compact,
            typing: false,
            transcript: Vec::new(),
        }
    }

    /// Append a message to the transcript.
    pub fn push_message(&mut self, message: Message) {
        self.transcript.push(message);
    }

    /// The transcript in display order.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Whether the island is expanded.
    pub fn is_expanded(&self) -> bool {
        self.island == IslandState::Expanded
    }
}

impl std::fmt::Display for PetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PetAction::Idle => write!(f, "idle"),
            PetAction::Walking => write!(f, "walking"),
            PetAction::Sleeping => write!(f, "sleeping"),
            PetAction::Eating => write!(f, "eating"),
            PetAction::Thinking => write!(f, "thinking"),
        }
    }
}

impl std::fmt::Display for IslandState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IslandState::Compact => write!(f, "compact"),
            IslandState::Expanded => write!(f, "expanded"),
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mood::Happy => write!(f, "Happy"),
            Mood::Grumpy => write!(f, "Grumpy"),
        }
    }
}
