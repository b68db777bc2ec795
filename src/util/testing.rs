use std::collections::VecDeque;
use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::dice::DiceRoller;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Die source returning a fixed sequence of results, for deterministic combat tests.
///
/// Panics when asked for more rolls than were scripted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    consumed: usize,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            consumed: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.rolls.is_empty()
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self, sides: u32) -> u32 {
        let value = self.rolls.pop_front().unwrap_or_else(|| {
            panic!(
                "scripted dice exhausted after {} roll(s) (asked for a D{sides})",
                self.consumed
            )
        });
        self.consumed += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn test_scripted_dice_in_order() {
        let mut dice = ScriptedDice::new([3, 6]);
        assert_eq!(dice.d6(), 3);
        assert_eq!(dice.roll(3), 6);
        assert!(dice.is_exhausted());
        assert_eq!(dice.consumed(), 2);
    }

    #[test]
    #[should_panic(expected = "scripted dice exhausted")]
    fn test_scripted_dice_panics_when_exhausted() {
        ScriptedDice::new([]).d6();
    }
}
