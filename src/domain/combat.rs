//! Combat resolution between two units.
//!
//! Attacks never touch the stored [`Unit`] records: remaining wounds live in a
//! per-combat [`Combatant`], so the roster stays immutable while fights run.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::domain::dice::DiceExpr;
use crate::domain::dice::DiceRoller;
use crate::domain::error::DomainError;
use crate::domain::unit::Unit;
use crate::domain::weapon::{MeleeWeapon, Strength};

/// Psychic test result needed to manifest Smite.
pub const SMITE_THRESHOLD: u32 = 5;
/// Psychic test results above this deal D6 mortal wounds instead of D3.
pub const SMITE_EMPOWERED: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatKind {
    Ranged,
    Melee,
    Psychic,
}

impl FromStr for CombatKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ranged" => Ok(CombatKind::Ranged),
            "melee" => Ok(CombatKind::Melee),
            "psychic" => Ok(CombatKind::Psychic),
            _ => Err(DomainError::UnknownCombatKind(s.to_string())),
        }
    }
}

impl fmt::Display for CombatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CombatKind::Ranged => "ranged",
            CombatKind::Melee => "melee",
            CombatKind::Psychic => "psychic",
        };
        write!(f, "{s}")
    }
}

/// A unit taking part in a fight, with its remaining wounds.
#[derive(Debug, Clone)]
pub struct Combatant<'a> {
    unit: &'a Unit,
    wounds: u32,
}

impl<'a> Combatant<'a> {
    pub fn new(unit: &'a Unit) -> Self {
        Self {
            unit,
            wounds: unit.stats().wounds,
        }
    }

    pub fn unit(&self) -> &'a Unit {
        self.unit
    }

    pub fn name(&self) -> &'a str {
        self.unit.name()
    }

    pub fn wounds(&self) -> u32 {
        self.wounds
    }

    pub fn is_slain(&self) -> bool {
        self.wounds == 0
    }

    /// Apply damage, returning the wounds actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.wounds);
        self.wounds -= lost;
        lost
    }
}

/// One logged step of an attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollEvent {
    Volley { weapon: String, count: u32 },
    Hit { roll: u32, target: u32, success: bool },
    Wound { roll: u32, target: u32, success: bool },
    /// `target` is `None` when the defender has no applicable save.
    Save { roll: Option<u32>, target: Option<u32>, success: bool },
    Damage { amount: u32, remaining: u32 },
    PsychicTest { roll: u32, success: bool },
    MortalWounds { amount: u32, remaining: u32 },
    Morale { roll: u32, lost: u32, leadership: u32, broke: bool },
    Slain { name: String },
}

impl fmt::Display for RollEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = |ok: bool| if ok { "success" } else { "fail" };
        match self {
            RollEvent::Volley { weapon, count } => write!(f, "{weapon}: {count} attack(s)"),
            RollEvent::Hit { roll, target, success } => {
                write!(f, "  hit {roll} vs {target}+ .. {}", verdict(*success))
            }
            RollEvent::Wound { roll, target, success } => {
                write!(f, "  wound {roll} vs {target}+ .. {}", verdict(*success))
            }
            RollEvent::Save { roll: Some(roll), target: Some(target), success } => {
                write!(f, "  save {roll} vs {target}+ .. {}", if *success { "saved" } else { "failed" })
            }
            RollEvent::Save { .. } => write!(f, "  no save"),
            RollEvent::Damage { amount, remaining } => {
                write!(f, "  {amount} damage, {remaining} wound(s) left")
            }
            RollEvent::PsychicTest { roll, success } => {
                write!(f, "psychic test {roll} vs {SMITE_THRESHOLD}+ .. {}", verdict(*success))
            }
            RollEvent::MortalWounds { amount, remaining } => {
                write!(f, "  {amount} mortal wound(s), {remaining} wound(s) left")
            }
            RollEvent::Morale { roll, lost, leadership, broke } => write!(
                f,
                "morale {roll} + {lost} lost vs Ld {leadership} .. {}",
                if *broke { "breaks" } else { "holds" }
            ),
            RollEvent::Slain { name } => write!(f, "{name} is slain"),
        }
    }
}

/// Outcome of a single attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatReport {
    pub attacker: String,
    pub defender: String,
    pub kind: CombatKind,
    pub events: Vec<RollEvent>,
    /// Wounds the defender lost during this attack.
    pub wounds_inflicted: u32,
    pub defender_remaining: u32,
    pub defender_slain: bool,
    pub defender_broke: bool,
}

impl CombatReport {
    fn new(kind: CombatKind, attacker: &Combatant, defender: &Combatant) -> Self {
        Self {
            attacker: attacker.name().to_string(),
            defender: defender.name().to_string(),
            kind,
            events: Vec::new(),
            wounds_inflicted: 0,
            defender_remaining: defender.wounds(),
            defender_slain: false,
            defender_broke: false,
        }
    }
}

impl fmt::Display for CombatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {} ({})", self.attacker, self.defender, self.kind)?;
        for event in &self.events {
            writeln!(f, "{event}")?;
        }
        write!(
            f,
            "{} lost {} wound(s), {} left",
            self.defender, self.wounds_inflicted, self.defender_remaining
        )
    }
}

/// D6 target needed to wound, from strength against toughness.
pub fn wound_target(strength: u32, toughness: u32) -> u32 {
    let (strength, toughness) = (u64::from(strength), u64::from(toughness));
    if strength >= toughness * 2 {
        2
    } else if strength > toughness {
        3
    } else if strength == toughness {
        4
    } else if strength * 2 <= toughness {
        6
    } else {
        5
    }
}

/// Best D6 save against a weapon with armour penetration `ap`.
///
/// Saves of 0 are ignored; `None` when nothing can be rolled on a D6.
pub fn save_target(armor: u32, invulnerable: u32, ap: i32) -> Option<u32> {
    let modified = (armor != 0).then(|| (i64::from(armor) - i64::from(ap)).max(2) as u32);
    let invulnerable = (invulnerable != 0).then_some(invulnerable);
    let best = match (modified, invulnerable) {
        (Some(a), Some(i)) => Some(a.min(i)),
        (a, i) => a.or(i),
    };
    best.filter(|t| *t <= 6)
}

/// A natural 1 always fails; a target of 0 can never be met.
fn passes(roll: u32, target: u32) -> bool {
    target != 0 && roll != 1 && roll >= target
}

struct Profile<'w> {
    name: &'w str,
    strength: Strength,
    ap: i32,
    damage: DiceExpr,
}

/// Resolve one attack, mutating only the defender's per-combat state.
#[instrument(
    level = "debug",
    skip_all,
    fields(attacker = attacker.name(), defender = defender.name(), %kind)
)]
pub fn resolve_attack(
    kind: CombatKind,
    attacker: &Combatant,
    defender: &mut Combatant,
    dice: &mut dyn DiceRoller,
) -> Result<CombatReport, DomainError> {
    if attacker.name() == defender.name() {
        return Err(DomainError::SameUnit(attacker.name().to_string()));
    }
    if attacker.is_slain() {
        return Err(DomainError::Slain(attacker.name().to_string()));
    }
    if defender.is_slain() {
        return Err(DomainError::Slain(defender.name().to_string()));
    }

    let mut report = CombatReport::new(kind, attacker, defender);
    let unit = attacker.unit();

    match kind {
        CombatKind::Ranged => {
            if unit.ranged_weapons().is_empty() {
                return Err(DomainError::NoWeapons(unit.name().to_string()));
            }
            for weapon in unit.ranged_weapons() {
                if defender.is_slain() {
                    break;
                }
                let shots = weapon.attacks.roll(dice);
                let profile = Profile {
                    name: &weapon.name,
                    strength: weapon.strength,
                    ap: weapon.ap,
                    damage: weapon.damage,
                };
                resolve_volley(&profile, shots, unit.stats().ballistic_skill, unit, defender, dice, &mut report);
            }
        }
        CombatKind::Melee => {
            let bare_hands = MeleeWeapon::bare_hands();
            let weapon = unit.melee_weapons().first().unwrap_or(&bare_hands);
            let profile = Profile {
                name: &weapon.name,
                strength: weapon.strength,
                ap: weapon.ap,
                damage: weapon.damage,
            };
            let swings = unit.stats().attacks;
            resolve_volley(&profile, swings, unit.stats().weapon_skill, unit, defender, dice, &mut report);
        }
        CombatKind::Psychic => {
            if !unit.is_psyker() {
                return Err(DomainError::NotPsyker(unit.name().to_string()));
            }
            resolve_smite(defender, dice, &mut report);
        }
    }

    report.defender_remaining = defender.wounds();
    report.defender_slain = defender.is_slain();
    if report.defender_slain {
        report.events.push(RollEvent::Slain {
            name: defender.name().to_string(),
        });
    } else if report.wounds_inflicted > 0 {
        report.defender_broke = morale_test(defender, report.wounds_inflicted, dice, &mut report.events);
    }

    debug!(
        inflicted = report.wounds_inflicted,
        remaining = report.defender_remaining,
        "attack resolved"
    );
    Ok(report)
}

fn resolve_volley(
    profile: &Profile,
    count: u32,
    skill: u32,
    attacker: &Unit,
    defender: &mut Combatant,
    dice: &mut dyn DiceRoller,
    report: &mut CombatReport,
) {
    report.events.push(RollEvent::Volley {
        weapon: profile.name.to_string(),
        count,
    });

    let strength = profile.strength.resolve(attacker.stats().strength);
    let defence = *defender.unit().stats();
    let to_wound = wound_target(strength, defence.toughness);
    let to_save = save_target(defence.armor_save, defence.invulnerable_save, profile.ap);

    for _ in 0..count {
        if defender.is_slain() {
            break;
        }

        let roll = dice.d6();
        let hit = passes(roll, skill);
        report.events.push(RollEvent::Hit { roll, target: skill, success: hit });
        if !hit {
            continue;
        }

        let roll = dice.d6();
        let wounded = passes(roll, to_wound);
        report.events.push(RollEvent::Wound { roll, target: to_wound, success: wounded });
        if !wounded {
            continue;
        }

        let (save_roll, saved) = match to_save {
            Some(target) => {
                let roll = dice.d6();
                (Some(roll), passes(roll, target))
            }
            None => (None, false),
        };
        report.events.push(RollEvent::Save {
            roll: save_roll,
            target: to_save,
            success: saved,
        });
        if saved {
            continue;
        }

        let amount = profile.damage.roll(dice);
        report.wounds_inflicted += defender.take_damage(amount);
        report.events.push(RollEvent::Damage {
            amount,
            remaining: defender.wounds(),
        });
    }
}

fn resolve_smite(defender: &mut Combatant, dice: &mut dyn DiceRoller, report: &mut CombatReport) {
    let test = dice.d6() + dice.d6();
    let success = test >= SMITE_THRESHOLD;
    report.events.push(RollEvent::PsychicTest { roll: test, success });
    if !success {
        return;
    }

    let sides = if test > SMITE_EMPOWERED { 6 } else { 3 };
    let amount = dice.roll(sides);
    report.wounds_inflicted += defender.take_damage(amount);
    report.events.push(RollEvent::MortalWounds {
        amount,
        remaining: defender.wounds(),
    });
}

/// D6 plus wounds lost this attack against leadership; returns true when the unit breaks.
pub fn morale_test(
    defender: &Combatant,
    lost: u32,
    dice: &mut dyn DiceRoller,
    events: &mut Vec<RollEvent>,
) -> bool {
    let roll = dice.d6();
    let leadership = defender.unit().stats().leadership;
    let broke = roll.saturating_add(lost) > leadership;
    events.push(RollEvent::Morale {
        roll,
        lost,
        leadership,
        broke,
    });
    broke
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unit::UnitBuilder;
    use crate::util::testing::ScriptedDice;
    use rstest::rstest;

    fn marine() -> Unit {
        UnitBuilder::new("Marine", "6 3 3 4 4 2 2 6 3 0")
            .unwrap()
            .abilities("None")
            .ranged_line("Bolter 24 RapidFire 1 4 0 1 None")
            .unwrap()
            .melee_line("Knife User 0 1 None")
            .unwrap()
            .build()
    }

    fn librarian() -> Unit {
        UnitBuilder::new("Librarian", "6 3 3 4 4 4 3 9 3 5")
            .unwrap()
            .abilities("Smite")
            .build()
    }

    #[rstest]
    #[case(8, 4, 2)]
    #[case(5, 4, 3)]
    #[case(4, 4, 4)]
    #[case(3, 4, 5)]
    #[case(2, 4, 6)]
    #[case(3, 7, 6)]
    #[case(4, 7, 5)]
    #[case(3, 6, 6)]
    #[case(4, 3_000_000_000, 6)]
    #[case(u32::MAX, u32::MAX / 2, 2)]
    fn test_wound_table(#[case] s: u32, #[case] t: u32, #[case] expected: u32) {
        assert_eq!(wound_target(s, t), expected);
    }

    #[rstest]
    #[case(3, 0, 0, Some(3))]
    #[case(3, 0, -1, Some(4))]
    #[case(3, 5, -3, Some(5))]
    #[case(5, 0, -2, None)]
    #[case(0, 0, 0, None)]
    #[case(0, 4, -4, Some(4))]
    fn test_save_table(
        #[case] sv: u32,
        #[case] inv: u32,
        #[case] ap: i32,
        #[case] expected: Option<u32>,
    ) {
        assert_eq!(save_target(sv, inv, ap), expected);
    }

    #[test]
    fn test_combat_kind_parse() {
        assert_eq!("Ranged".parse::<CombatKind>().unwrap(), CombatKind::Ranged);
        assert_eq!(" melee ".parse::<CombatKind>().unwrap(), CombatKind::Melee);
        assert!(matches!(
            "artillery".parse::<CombatKind>(),
            Err(DomainError::UnknownCombatKind(_))
        ));
    }

    #[test]
    fn test_ranged_hit_wound_unsaved_damage() {
        let (a, d) = (marine(), librarian());
        let attacker = Combatant::new(&a);
        let mut defender = Combatant::new(&d);
        // hit 4, wound 5, save 2, morale 3
        let mut dice = ScriptedDice::new([4, 5, 2, 3]);

        let report = resolve_attack(CombatKind::Ranged, &attacker, &mut defender, &mut dice).unwrap();

        assert_eq!(report.wounds_inflicted, 1);
        assert_eq!(defender.wounds(), 3);
        assert!(!report.defender_slain);
        assert!(!report.defender_broke);
        assert!(dice.is_exhausted());
    }

    #[test]
    fn test_natural_one_misses() {
        let (a, d) = (marine(), librarian());
        let attacker = Combatant::new(&a);
        let mut defender = Combatant::new(&d);
        let mut dice = ScriptedDice::new([1]);

        let report = resolve_attack(CombatKind::Ranged, &attacker, &mut defender, &mut dice).unwrap();

        assert_eq!(report.wounds_inflicted, 0);
        assert_eq!(
            report.events[1],
            RollEvent::Hit { roll: 1, target: 3, success: false }
        );
    }

    #[test]
    fn test_melee_falls_back_to_bare_hands() {
        let (a, d) = (librarian(), marine());
        let attacker = Combatant::new(&a);
        let mut defender = Combatant::new(&d);
        // three swings: miss, miss, miss
        let mut dice = ScriptedDice::new([2, 2, 1]);

        let report = resolve_attack(CombatKind::Melee, &attacker, &mut defender, &mut dice).unwrap();

        assert_eq!(
            report.events[0],
            RollEvent::Volley { weapon: "Close combat".into(), count: 3 }
        );
        assert_eq!(report.wounds_inflicted, 0);
    }

    #[test]
    fn test_smite_kills_and_stops() {
        let (a, d) = (librarian(), marine());
        let attacker = Combatant::new(&a);
        let mut defender = Combatant::new(&d);
        // psychic test 6+6 = 12 -> D6 mortal wounds, rolls 5
        let mut dice = ScriptedDice::new([6, 6, 5]);

        let report = resolve_attack(CombatKind::Psychic, &attacker, &mut defender, &mut dice).unwrap();

        assert!(report.defender_slain);
        assert_eq!(report.wounds_inflicted, 2);
        assert_eq!(defender.wounds(), 0);
        assert_eq!(report.events.last(), Some(&RollEvent::Slain { name: "Marine".into() }));
    }

    #[test]
    fn test_failed_psychic_test() {
        let (a, d) = (librarian(), marine());
        let attacker = Combatant::new(&a);
        let mut defender = Combatant::new(&d);
        let mut dice = ScriptedDice::new([1, 3]);

        let report = resolve_attack(CombatKind::Psychic, &attacker, &mut defender, &mut dice).unwrap();
        assert_eq!(report.wounds_inflicted, 0);
        assert_eq!(report.events, vec![RollEvent::PsychicTest { roll: 4, success: false }]);
    }

    #[test]
    fn test_morale_break() {
        let (a, d) = (librarian(), marine());
        let attacker = Combatant::new(&a);
        let mut defender = Combatant::new(&d);
        // psychic 3+3, D3 -> 1, morale 6 + 1 > 6 breaks
        let mut dice = ScriptedDice::new([3, 3, 1, 6]);

        let report = resolve_attack(CombatKind::Psychic, &attacker, &mut defender, &mut dice).unwrap();
        assert!(report.defender_broke);
        assert_eq!(defender.wounds(), 1);
    }

    #[test]
    fn test_rule_errors() {
        let (m, l) = (marine(), librarian());
        let mut dice = ScriptedDice::new([]);

        let mut defender = Combatant::new(&l);
        let err = resolve_attack(CombatKind::Psychic, &Combatant::new(&m), &mut defender, &mut dice);
        assert_eq!(err.unwrap_err(), DomainError::NotPsyker("Marine".into()));

        let mut defender = Combatant::new(&m);
        let err = resolve_attack(CombatKind::Ranged, &Combatant::new(&l), &mut defender, &mut dice);
        assert_eq!(err.unwrap_err(), DomainError::NoWeapons("Librarian".into()));

        let mut same = Combatant::new(&m);
        let err = resolve_attack(CombatKind::Melee, &Combatant::new(&m), &mut same, &mut dice);
        assert_eq!(err.unwrap_err(), DomainError::SameUnit("Marine".into()));

        let mut slain = Combatant::new(&l);
        slain.take_damage(100);
        let err = resolve_attack(CombatKind::Melee, &Combatant::new(&m), &mut slain, &mut dice);
        assert_eq!(err.unwrap_err(), DomainError::Slain("Librarian".into()));
    }

    #[test]
    fn test_extreme_stats_do_not_overflow() {
        let brute = UnitBuilder::new("Brute", "6 3 3 4294967295 4 2 1 4294967295 0 0")
            .unwrap()
            .melee_line("Maul +4294967295 0 1 None")
            .unwrap()
            .build();
        let wall = UnitBuilder::new("Wall", "6 3 3 4 3000000000 2 1 6 0 0").unwrap().build();

        // strength saturates above the wall's toughness: hit 6, wound 6 on 3+, no save, 1 damage, morale 6
        let attacker = Combatant::new(&brute);
        let mut defender = Combatant::new(&wall);
        let mut dice = ScriptedDice::new([6, 6, 6]);
        let report = resolve_attack(CombatKind::Melee, &attacker, &mut defender, &mut dice).unwrap();
        assert_eq!(report.wounds_inflicted, 1);
        assert!(report.defender_broke);
        assert_eq!(
            report.events[2],
            RollEvent::Wound { roll: 6, target: 3, success: true }
        );

        // bare hands against the brute: morale 6 + 1 stays below its leadership
        let attacker = Combatant::new(&wall);
        let mut defender = Combatant::new(&brute);
        let mut dice = ScriptedDice::new([6, 6, 6]);
        let report = resolve_attack(CombatKind::Melee, &attacker, &mut defender, &mut dice).unwrap();
        assert_eq!(report.wounds_inflicted, 1);
        assert!(!report.defender_broke);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let l = librarian();
        let mut c = Combatant::new(&l);
        assert_eq!(c.take_damage(10), 4);
        assert_eq!(c.take_damage(1), 0);
        assert!(c.is_slain());
    }
}
