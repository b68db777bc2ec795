//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Prompt)
//! but are themselves concrete structs, not traits.

mod battle;
mod roster;

pub use battle::{counter_kind, BattleOutcome, BattleReport, BattleService};
pub use roster::{LoadReport, RosterService};
