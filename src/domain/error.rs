//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::unit::Unit;

/// Domain errors represent roster and combat rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate unit name: {0}")]
    DuplicateKey(String),

    #[error("malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("invalid dice notation: {0}")]
    InvalidDice(String),

    #[error("roster invariant violated at {name}: {message}")]
    InvariantViolation { name: String, message: String },

    #[error("unknown combat kind: {0} (expected ranged, melee or psychic)")]
    UnknownCombatKind(String),

    #[error("{0} is not a psyker")]
    NotPsyker(String),

    #[error("{0} has no ranged weapons")]
    NoWeapons(String),

    #[error("{0} has been slain and cannot fight")]
    Slain(String),

    #[error("a unit cannot fight itself: {0}")]
    SameUnit(String),
}

impl DomainError {
    /// Malformed record without a known source line (e.g. built in code).
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line: 0,
            message: message.into(),
        }
    }

    /// Attach a 1-based source line to a malformed record error.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::MalformedRecord { message, .. } => Self::MalformedRecord { line, message },
            other => other,
        }
    }
}

/// Rejected insert: the unit is handed back to the caller untouched.
#[derive(Error, Debug)]
#[error("duplicate unit name: {}", .unit.name())]
pub struct DuplicateUnit {
    unit: Unit,
}

impl DuplicateUnit {
    pub(crate) fn new(unit: Unit) -> Self {
        Self { unit }
    }

    /// Borrow the rejected unit.
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Take back ownership of the rejected unit.
    pub fn into_inner(self) -> Unit {
        self.unit
    }
}

impl From<DuplicateUnit> for DomainError {
    fn from(e: DuplicateUnit) -> Self {
        DomainError::DuplicateKey(e.unit.name().to_string())
    }
}
