//! Plain-text rendering of the lock screen and the island.

use chrono::{DateTime, TimeZone};
use mochi_island_core::{Message, PetAction, PetState};

/// Width of the expanded panel, border included.
const PANEL_WIDTH: usize = 44;

/// Lock-screen header: long date over a 24-hour clock.
pub fn lock_screen<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}\n{}",
        now.format("%A, %B %-d"),
        now.format("%H:%M")
    )
}

/// The pixel cat, as text.
pub fn pet_glyph(action: PetAction) -> &'static str {
    match action {
        PetAction::Idle => "=^.^=",
        PetAction::Walking => "=^.^= ~~",
        PetAction::Sleeping => "=-.-= zZ",
        PetAction::Eating => "=^o^= <><",
        PetAction::Thinking => "=^.^= ...",
    }
}

/// Render the island in its current shape.
pub fn island(state: &PetState, pet_name: &str) -> String {
    if state.is_expanded() {
        expanded(state, pet_name)
    } else {
        compact(state)
    }
}

fn compact(state: &PetState) -> String {
    let dot = if state.stats.is_unhappy() { "(-)" } else { "(+)" };
    format!("( {:<10} {} )", pet_glyph(state.action), dot)
}

fn expanded(state: &PetState, pet_name: &str) -> String {
    let rule = format!("+{}+", "-".repeat(PANEL_WIDTH - 2));
    let mut lines = vec![rule.clone()];

    lines.push(format!("  {}  {}", pet_glyph(state.action), pet_name));
    lines.push(format!(
        "  H: {}%   Hunger: {}%",
        state.stats.happiness_percent(),
        state.stats.hunger_percent()
    ));
    lines.push(rule.clone());

    for message in state.transcript() {
        lines.push(format!("  {}", transcript_line(message, pet_name)));
    }
    if state.typing {
        lines.push(format!("  {} is typing...", pet_name));
    }

    lines.push(rule.clone());
    lines.push("  feed | play | say <text> | tap to close".to_string());
    lines.push(rule);
    lines.join("\n")
}

/// One transcript line, user messages right-marked.
pub fn transcript_line(message: &Message, pet_name: &str) -> String {
    if message.is_from_user() {
        format!("you > {}", message.text)
    } else {
        format!("{} < {}", pet_name, message.text)
    }
}
