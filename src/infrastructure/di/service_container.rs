//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{BattleService, RosterService};
use crate::config::Settings;
use crate::domain::{DiceRoller, RngDice};
use crate::infrastructure::traits::{FileSystem, Prompt, RealFileSystem, StdinPrompt};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Console abstraction for interactive play
    pub prompt: Arc<dyn Prompt>,

    pub roster_service: RosterService,
    pub battle_service: BattleService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(StdinPrompt))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>, prompt: Arc<dyn Prompt>) -> Self {
        let settings = Arc::new(settings);
        let roster_service = RosterService::new(Arc::clone(&fs));
        let battle_service = BattleService::new(settings.max_rounds);

        Self {
            settings,
            fs,
            prompt,
            roster_service,
            battle_service,
        }
    }

    /// Die source honouring the configured seed, unless `seed` overrides it.
    pub fn dice(&self, seed: Option<u64>) -> Box<dyn DiceRoller> {
        Box::new(RngDice::from_seed(seed.or(self.settings.seed)))
    }
}
