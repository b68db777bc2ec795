//! Domain layer: roster index, unit records and combat rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod combat;
pub mod dice;
pub mod error;
pub mod roster_file;
pub mod unit;
pub mod weapon;

pub use arena::{InOrderIter, NameOrder, Roster, RosterNode};
pub use combat::{resolve_attack, CombatKind, CombatReport, Combatant, RollEvent};
pub use dice::{parse_dice, DiceExpr, DiceRoller, RngDice};
pub use error::{DomainError, DuplicateUnit};
pub use roster_file::RosterFile;
pub use unit::{Stats, Unit, UnitBuilder};
pub use weapon::{MeleeWeapon, RangedWeapon, Strength};
