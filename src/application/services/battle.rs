//! Battle orchestration
//!
//! Runs attacks between two roster units, alternating until one is slain or
//! the round limit is reached.

use std::fmt;

use tracing::{debug, info, instrument};

use crate::application::services::RosterService;
use crate::application::ApplicationResult;
use crate::domain::{resolve_attack, CombatKind, CombatReport, Combatant, DiceRoller, Roster, Unit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleOutcome {
    Victory { winner: String, loser: String },
    /// Both units still stand after the last round
    Undecided,
}

impl fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleOutcome::Victory { winner, loser } => write!(f, "{winner} defeats {loser}"),
            BattleOutcome::Undecided => write!(f, "both units still stand"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BattleReport {
    pub attacks: Vec<CombatReport>,
    /// Completed exchanges (attack plus counter-attack)
    pub rounds: u32,
    pub outcome: BattleOutcome,
}

/// Service running single attacks and multi-round battles.
pub struct BattleService {
    max_rounds: u32,
}

impl BattleService {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Resolve one attack between two named units.
    #[instrument(level = "debug", skip(self, roster, dice))]
    pub fn attack(
        &self,
        roster: &Roster,
        attacker: &str,
        defender: &str,
        kind: CombatKind,
        dice: &mut dyn DiceRoller,
    ) -> ApplicationResult<CombatReport> {
        let attacker = RosterService::find(roster, attacker)?;
        let defender = RosterService::find(roster, defender)?;
        let mut target = Combatant::new(defender);
        Ok(resolve_attack(kind, &Combatant::new(attacker), &mut target, dice)?)
    }

    /// Alternate attacks between two units.
    ///
    /// The attacker always uses `kind`; the defender answers with the same kind
    /// when it can, otherwise in melee.
    #[instrument(level = "debug", skip(self, roster, dice))]
    pub fn battle(
        &self,
        roster: &Roster,
        attacker: &str,
        defender: &str,
        kind: CombatKind,
        dice: &mut dyn DiceRoller,
    ) -> ApplicationResult<BattleReport> {
        let first = RosterService::find(roster, attacker)?;
        let second = RosterService::find(roster, defender)?;
        let counter = counter_kind(kind, second);

        let mut a = Combatant::new(first);
        let mut b = Combatant::new(second);
        let mut attacks = Vec::new();
        let mut rounds = 0;

        while rounds < self.max_rounds {
            rounds += 1;
            debug!(round = rounds, "exchange");

            attacks.push(resolve_attack(kind, &a, &mut b, dice)?);
            if b.is_slain() {
                break;
            }
            attacks.push(resolve_attack(counter, &b, &mut a, dice)?);
            if a.is_slain() {
                break;
            }
        }

        let outcome = if b.is_slain() {
            BattleOutcome::Victory {
                winner: a.name().to_string(),
                loser: b.name().to_string(),
            }
        } else if a.is_slain() {
            BattleOutcome::Victory {
                winner: b.name().to_string(),
                loser: a.name().to_string(),
            }
        } else {
            BattleOutcome::Undecided
        };
        info!(%outcome, rounds, "battle finished");

        Ok(BattleReport {
            attacks,
            rounds,
            outcome,
        })
    }
}

/// Kind of attack `unit` answers with when attacked with `kind`.
pub fn counter_kind(kind: CombatKind, unit: &Unit) -> CombatKind {
    match kind {
        CombatKind::Ranged if !unit.ranged_weapons().is_empty() => CombatKind::Ranged,
        CombatKind::Psychic if unit.is_psyker() => CombatKind::Psychic,
        _ => CombatKind::Melee,
    }
}
