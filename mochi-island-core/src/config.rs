//! Configuration for the island and its response provider.
//!
//! Both configs follow the same builder pattern: start from `new()` (the
//! defaults below) and override individual values. Nothing here reads the
//! process environment; callers inject the API key explicitly.

use crate::error::{Error, Result};
use crate::pet::{PetStats, STAT_MAX, STAT_MIN};
use std::time::Duration;

/// Default decay/idle tick period in milliseconds.
const DEFAULT_TICK_MS: u64 = 2000;

/// Default delay before a feed/play action reverts to idle, in milliseconds.
const DEFAULT_REVERT_MS: u64 = 2000;

/// Hunger added per tick.
const DEFAULT_HUNGER_PER_TICK: f64 = 0.2;

/// Happiness removed per tick.
const DEFAULT_HAPPINESS_LOSS_PER_TICK: f64 = 0.1;

/// Hunger removed by one feeding.
const DEFAULT_FEED_HUNGER: f64 = 30.0;

/// Happiness added by one feeding.
const DEFAULT_FEED_HAPPINESS: f64 = 10.0;

/// Happiness added by one play session.
const DEFAULT_PLAY_HAPPINESS: f64 = 20.0;

/// Starting hunger.
const DEFAULT_INITIAL_HUNGER: f64 = 50.0;

/// Starting happiness.
const DEFAULT_INITIAL_HAPPINESS: f64 = 80.0;

/// Happiness strictly above this reads as "Happy".
const DEFAULT_MOOD_THRESHOLD: f64 = 50.0;

/// First message in the transcript.
const DEFAULT_GREETING: &str = "Meow! Welcome to my island.";

/// Default Gemini REST endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default pet name used in the persona prompt.
const DEFAULT_PET_NAME: &str = "Mochi";

/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f64 = 0.8;

/// Default reply length limit in tokens.
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 60;

/// Configuration for an [`Island`](crate::island::Island).
#[derive(Debug, Clone)]
pub struct IslandConfig {
    /// Period of the decay/idle loop.
    pub tick_period: Duration,

    /// Delay before a temporary action (eating, walking) reverts to idle.
    pub revert_delay: Duration,

    /// Hunger added on every tick.
    pub hunger_per_tick: f64,

    /// Happiness removed on every tick.
    pub happiness_loss_per_tick: f64,

    /// Hunger removed by `feed`.
    pub feed_hunger: f64,

    /// Happiness added by `feed`.
    pub feed_happiness: f64,

    /// Happiness added by `play`.
    pub play_happiness: f64,

    /// Hunger on startup.
    pub initial_hunger: f64,

    /// Happiness on startup.
    pub initial_happiness: f64,

    /// Happiness strictly above this is passed to the provider as "Happy".
    pub mood_threshold: f64,

    /// Greeting placed in the transcript on startup, if any.
    pub greeting: Option<String>,

    /// Seed for the idle-action RNG. `None` seeds from entropy.
    pub idle_seed: Option<u64>,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(DEFAULT_TICK_MS),
            revert_delay: Duration::from_millis(DEFAULT_REVERT_MS),
            hunger_per_tick: DEFAULT_HUNGER_PER_TICK,
            happiness_loss_per_tick: DEFAULT_HAPPINESS_LOSS_PER_TICK,
            feed_hunger: DEFAULT_FEED_HUNGER,
            feed_happiness: DEFAULT_FEED_HAPPINESS,
            play_happiness: DEFAULT_PLAY_HAPPINESS,
            initial_hunger: DEFAULT_INITIAL_HUNGER,
            initial_happiness: DEFAULT_INITIAL_HAPPINESS,
            mood_threshold: DEFAULT_MOOD_THRESHOLD,
            greeting: Some(DEFAULT_GREETING.to_string()),
            idle_seed: None,
        }
    }
}

impl IslandConfig {
    /// Create a new IslandConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decay/idle tick period.
    pub fn tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Set the decay/idle tick period in milliseconds.
    pub fn tick_ms(mut self, ms: u64) -> Self {
        self.tick_period = Duration::from_millis(ms);
        self
    }

    /// Set the auto-revert delay.
    pub fn revert_delay(mut self, delay: Duration) -> Self {
        self.revert_delay = delay;
        self
    }

    /// Set the auto-revert delay in milliseconds.
    pub fn revert_ms(mut self, ms: u64) -> Self {
        self.revert_delay = Duration::from_millis(ms);
        self
    }

    /// Set the per-tick drift: hunger gained and happiness lost.
    pub fn decay_rates(mut self, hunger_per_tick: f64, happiness_loss_per_tick: f64) -> Self {
        self.hunger_per_tick = hunger_per_tick;
        self.happiness_loss_per_tick = happiness_loss_per_tick;
        self
    }

    /// Set the starting stats.
    pub fn initial_stats(mut self, hunger: f64, happiness: f64) -> Self {
        self.initial_hunger = hunger;
        self.initial_happiness = happiness;
        self
    }

    /// Set the mood threshold.
    pub fn mood_threshold(mut self, threshold: f64) -> Self {
        self.mood_threshold = threshold;
        self
    }

    /// Set the startup greeting.
    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Start with an empty transcript.
    pub fn no_greeting(mut self) -> Self {
        self.greeting = None;
        self
    }

    /// Seed the idle-action RNG for reproducible runs.
    pub fn idle_seed(mut self, seed: u64) -> Self {
        self.idle_seed = Some(seed);
        self
    }

    /// The stats the pet starts with.
    pub fn starting_stats(&self) -> PetStats {
        PetStats::new(self.initial_hunger, self.initial_happiness)
    }

    /// Check that the configuration can drive an island.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` for zero durations, negative or
    /// non-finite amounts, and starting stats outside `[0, 100]`.
    pub fn validate(&self) -> Result<()> {
        if self.tick_period.is_zero() {
            return Err(Error::config_error("tick period must be non-zero"));
        }
        if self.revert_delay.is_zero() {
            return Err(Error::config_error("revert delay must be non-zero"));
        }

        let amounts = [
            ("hunger_per_tick", self.hunger_per_tick),
            ("happiness_loss_per_tick", self.happiness_loss_per_tick),
            ("feed_hunger", self.feed_hunger),
            ("feed_happiness", self.feed_happiness),
            ("play_happiness", self.play_happiness),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config_error(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let stats = [
            ("initial_hunger", self.initial_hunger),
            ("initial_happiness", self.initial_happiness),
            ("mood_threshold", self.mood_threshold),
        ];
        for (name, value) in stats {
            if !(STAT_MIN..=STAT_MAX).contains(&value) {
                return Err(Error::config_error(format!(
                    "{} must be within [{}, {}], got {}",
                    name, STAT_MIN, STAT_MAX, value
                )));
            }
        }

        Ok(())
    }
}

/// Configuration for the Gemini-backed response provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key. Without one the provider answers with a placeholder.
    pub api_key: Option<String>,

    /// Base URL of the REST API.
    pub base_url: String,

    /// Model name.
    pub model: String,

    /// Name the pet uses for itself in the persona prompt.
    pub pet_name: String,

    /// Sampling temperature.
    pub temperature: f64,

    /// Reply length limit in tokens.
    pub max_output_tokens: u32,

    /// Optional HTTP client timeout. The controller never times out on its own.
    pub request_timeout: Option<Duration>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            pet_name: DEFAULT_PET_NAME.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout: None,
        }
    }
}

impl ProviderConfig {
    /// Create a new ProviderConfig with default values and no API key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key. Blank keys count as missing.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the pet name used in the persona prompt.
    pub fn pet_name(mut self, name: impl Into<String>) -> Self {
        self.pet_name = name.into();
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the reply length limit.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Set an HTTP client timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// The API key, if one is set and not blank.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.usable_api_key().is_some()
    }

    /// The `generateContent` endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = IslandConfig::default();
        assert_eq!(config.tick_period, Duration::from_millis(2000));
        assert_eq!(config.revert_delay, Duration::from_millis(2000));
        assert!((config.hunger_per_tick - 0.2).abs() < f64::EPSILON);
        assert!((config.happiness_loss_per_tick - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.feed_hunger, 30.0);
        assert_eq!(config.feed_happiness, 10.0);
        assert_eq!(config.play_happiness, 20.0);
        assert_eq!(config.starting_stats(), PetStats::new(50.0, 80.0));
        assert_eq!(config.mood_threshold, 50.0);
        assert_eq!(config.greeting.as_deref(), Some("Meow! Welcome to my island."));
        assert!(config.idle_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = IslandConfig::new()
            .tick_ms(500)
            .revert_ms(750)
            .decay_rates(1.0, 2.0)
            .initial_stats(10.0, 90.0)
            .mood_threshold(60.0)
            .no_greeting()
            .idle_seed(7);

        assert_eq!(config.tick_period, Duration::from_millis(500));
        assert_eq!(config.revert_delay, Duration::from_millis(750));
        assert_eq!(config.hunger_per_tick, 1.0);
        assert_eq!(config.happiness_loss_per_tick, 2.0);
        assert_eq!(config.starting_stats(), PetStats::new(10.0, 90.0));
        assert_eq!(config.mood_threshold, 60.0);
        assert!(config.greeting.is_none());
        assert_eq!(config.idle_seed, Some(7));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let result = IslandConfig::new().tick_ms(0).validate();
        assert!(matches!(result, Err(Error::ConfigError { .. })));

        let result = IslandConfig::new().revert_ms(0).validate();
        assert!(matches!(result, Err(Error::ConfigError { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_amounts() {
        let result = IslandConfig::new().decay_rates(-0.2, 0.1).validate();
        assert!(result.unwrap_err().to_string().contains("hunger_per_tick"));

        let result = IslandConfig::new().decay_rates(0.2, f64::NAN).validate();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("happiness_loss_per_tick"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_stats() {
        let result = IslandConfig::new().initial_stats(120.0, 50.0).validate();
        assert!(result.unwrap_err().to_string().contains("initial_hunger"));

        let result = IslandConfig::new().mood_threshold(-1.0).validate();
        assert!(result.unwrap_err().to_string().contains("mood_threshold"));
    }

    #[test]
    fn test_provider_defaults() {
        let config = ProviderConfig::default();
        assert!(!config.has_api_key());
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.pet_name, "Mochi");
        assert!((config.temperature - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.max_output_tokens, 60);
        assert!(config.request_timeout.is_none());
        assert_eq!(
            config.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_provider_builder() {
        let config = ProviderConfig::new()
            .api_key("secret")
            .base_url("http://localhost:8080/")
            .model("gemini-custom")
            .pet_name("Tofu")
            .temperature(0.2)
            .max_output_tokens(30)
            .request_timeout(Duration::from_secs(5));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.endpoint(),
            "http://localhost:8080/models/gemini-custom:generateContent"
        );
        assert_eq!(config.pet_name, "Tofu");
        assert_eq!(config.max_output_tokens, 30);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = ProviderConfig::new().api_key("   ");
        assert!(!config.has_api_key());

        let config = ProviderConfig {
            api_key: Some(" \t".to_string()),
            ..ProviderConfig::new()
        };
        assert!(!config.has_api_key());
        assert_eq!(config.usable_api_key(), None);
    }
}
