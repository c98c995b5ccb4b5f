//! Decay/idle loop.
//!
//! Every tick the pet gets a little hungrier and a little less happy, and a
//! collapsed, non-chatting pet picks a random idle animation from a weighted
//! table. Each pick is independent of the previous action.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::IslandConfig;
use crate::event::{emit, Event, EventSender};
use crate::pet::{IslandState, PetAction, PetState};

/// Weighted choice of idle actions.
///
/// Entries are checked in order against a uniform roll in `[0, 1)`; the roll
/// selects the first entry whose cumulative weight it does not exceed.
#[derive(Debug, Clone)]
pub struct IdleTable {
    entries: Vec<(PetAction, f64)>,
}

impl Default for IdleTable {
    fn default() -> Self {
        Self {
            entries: vec![
                (PetAction::Idle, 0.70),
                (PetAction::Walking, 0.25),
                (PetAction::Sleeping, 0.05),
            ],
        }
    }
}

impl IdleTable {
    /// Map a uniform roll in `[0, 1)` to an action.
    pub fn pick(&self, roll: f64) -> PetAction {
        let mut cumulative = 0.0;
        for (action, weight) in &self.entries {
            cumulative += weight;
            if roll <= cumulative {
                return *action;
            }
        }
        self.entries
            .last()
            .map(|(action, _)| *action)
            .unwrap_or(PetAction::Idle)
    }

    /// Draw an action using `rng`.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> PetAction {
        self.pick(rng.gen::<f64>())
    }

    /// The table entries and their weights.
    pub fn entries(&self) -> &[(PetAction, f64)] {
        &self.entries
    }
}

/// Per-tick drift applied to the stats.
#[derive(Debug, Clone, Copy)]
pub struct DecayRates {
    /// Hunger added per tick.
    pub hunger: f64,
    /// Happiness removed per tick.
    pub happiness: f64,
}

impl From<&IslandConfig> for DecayRates {
    fn from(config: &IslandConfig) -> Self {
        Self {
            hunger: config.hunger_per_tick,
            happiness: config.happiness_loss_per_tick,
        }
    }
}

/// Apply one tick to `state`.
///
/// `idle_action` is only consulted when the island is compact and no reply is
/// pending. Returns the new action if it changed.
pub fn apply_tick(
    state: &mut PetState,
    rates: DecayRates,
    idle_action: impl FnOnce() -> PetAction,
) -> Option<PetAction> {
    let mut changed = None;

    if state.island == IslandState::Compact && !state.typing {
        let next = idle_action();
        if next != state.action {
            state.action = next;
            changed = Some(next);
        }
    }

    state.stats.adjust_hunger(rates.hunger);
    state.stats.adjust_happiness(-rates.happiness);

    changed
}

/// Run the decay loop until the task is aborted.
///
/// The first tick fires one full period after start. Late ticks are not
/// caught up.
pub(crate) async fn run(
    store: Arc<watch::Sender<PetState>>,
    period: Duration,
    rates: DecayRates,
    seed: Option<u64>,
    events: EventSender,
) {
    let table = IdleTable::default();
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tick: u64 = 0;
    loop {
        ticker.tick().await;
        tick += 1;

        let mut changed = None;
        let mut stats = None;
        store.send_modify(|state| {
            changed = apply_tick(state, rates, || table.choose(&mut rng));
            stats = Some(state.stats);
        });

        if let Some(action) = changed {
            tracing::debug!(tick, %action, "idle action picked");
            emit(&events, Event::action_changed(action));
        }
        if let Some(stats) = stats {
            emit(&events, Event::Ticked { tick, stats });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::PetStats;

    const RATES: DecayRates = DecayRates {
        hunger: 0.2,
        happiness: 0.1,
    };

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = IdleTable::default().entries().iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pick_boundaries() {
        let table = IdleTable::default();
        assert_eq!(table.pick(0.0), PetAction::Idle);
        assert_eq!(table.pick(0.5), PetAction::Idle);
        assert_eq!(table.pick(0.70), PetAction::Idle);
        assert_eq!(table.pick(0.71), PetAction::Walking);
        assert_eq!(table.pick(0.94), PetAction::Walking);
        assert_eq!(table.pick(0.96), PetAction::Sleeping);
        assert_eq!(table.pick(0.999), PetAction::Sleeping);
    }

    #[test]
    fn test_choose_only_returns_idle_actions() {
        let table = IdleTable::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let action = table.choose(&mut rng);
            assert!(matches!(
                action,
                PetAction::Idle | PetAction::Walking | PetAction::Sleeping
            ));
        }
    }

    #[test]
    fn test_tick_drifts_stats() {
        let mut state = PetState::new(PetStats::new(50.0, 80.0));
        apply_tick(&mut state, RATES, || PetAction::Idle);
        assert!((state.stats.hunger() - 50.2).abs() < 1e-9);
        assert!((state.stats.happiness() - 79.9).abs() < 1e-9);
    }

    #[test]
    fn test_tick_clamps_stats() {
        let mut state = PetState::new(PetStats::new(99.9, 0.05));
        apply_tick(&mut state, RATES, || PetAction::Idle);
        assert_eq!(state.stats.hunger(), 100.0);
        assert_eq!(state.stats.happiness(), 0.0);
    }

    #[test]
    fn test_tick_picks_idle_action_when_compact() {
        let mut state = PetState::new(PetStats::new(50.0, 80.0));
        let changed = apply_tick(&mut state, RATES, || PetAction::Sleeping);
        assert_eq!(changed, Some(PetAction::Sleeping));
        assert_eq!(state.action, PetAction::Sleeping);

        let changed = apply_tick(&mut state, RATES, || PetAction::Sleeping);
        assert_eq!(changed, None);
    }

    #[test]
    fn test_tick_skips_idle_pick_when_expanded() {
        let mut state = PetState::new(PetStats::new(50.0, 80.0));
        state.island = IslandState::Expanded;
        state.action = PetAction::Eating;

        let changed = apply_tick(&mut state, RATES, || panic!("should not roll"));
        assert_eq!(changed, None);
        assert_eq!(state.action, PetAction::Eating);
        assert!((state.stats.hunger() - 50.2).abs() < 1e-9);
    }

    #[test]
    fn test_tick_skips_idle_pick_while_typing() {
        let mut state = PetState::new(PetStats::new(50.0, 80.0));
        state.typing = true;
        state.action = PetAction::Thinking;

        let changed = apply_tick(&mut state, RATES, || panic!("should not roll"));
        assert_eq!(changed, None);
        assert_eq!(state.action, PetAction::Thinking);
    }
}
