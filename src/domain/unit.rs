//! Unit records: the values indexed by the roster.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use crate::domain::error::DomainError;
use crate::domain::weapon::{MeleeWeapon, RangedWeapon};

/// Number of fields on a stats line: `M WS BS S T W A Ld Sv Inv`.
pub const NUM_STATS: usize = 10;

/// Inherent characteristics of a unit.
///
/// Skills and saves are "roll this or higher" targets on a D6; a save of 0 means none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub movement: u32,
    pub weapon_skill: u32,
    pub ballistic_skill: u32,
    pub strength: u32,
    pub toughness: u32,
    pub wounds: u32,
    pub attacks: u32,
    pub leadership: u32,
    pub armor_save: u32,
    pub invulnerable_save: u32,
}

impl Stats {
    /// Parse a whitespace-separated stats line.
    pub fn parse(line: &str) -> Result<Self, DomainError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != NUM_STATS {
            return Err(DomainError::malformed(format!(
                "expected {NUM_STATS} stats (M WS BS S T W A Ld Sv Inv), got {}",
                fields.len()
            )));
        }
        let values = fields
            .iter()
            .map(|f| {
                f.parse::<u32>()
                    .map_err(|_| DomainError::malformed(format!("stat is not a number: {f}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            movement: values[0],
            weapon_skill: values[1],
            ballistic_skill: values[2],
            strength: values[3],
            toughness: values[4],
            wounds: values[5],
            attacks: values[6],
            leadership: values[7],
            armor_save: values[8],
            invulnerable_save: values[9],
        })
    }

    pub fn as_array(&self) -> [u32; NUM_STATS] {
        [
            self.movement,
            self.weapon_skill,
            self.ballistic_skill,
            self.strength,
            self.toughness,
            self.wounds,
            self.attacks,
            self.leadership,
            self.armor_save,
            self.invulnerable_save,
        ]
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M:{}\" WS:{}+ BS:{}+ S:{} T:{} W:{} A:{} Ld:{} Sv:{}+ Inv:{}",
            self.movement,
            self.weapon_skill,
            self.ballistic_skill,
            self.strength,
            self.toughness,
            self.wounds,
            self.attacks,
            self.leadership,
            self.armor_save,
            if self.invulnerable_save == 0 {
                "-".to_string()
            } else {
                format!("{}+", self.invulnerable_save)
            }
        )
    }
}

/// A roster entry. Immutable once built; ordered and compared by name only.
#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    stats: Stats,
    abilities: BTreeSet<String>,
    ranged: Vec<RangedWeapon>,
    melee: Vec<MeleeWeapon>,
}

impl Unit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// A unit with at least one psychic ability can manifest powers.
    pub fn is_psyker(&self) -> bool {
        !self.abilities.is_empty()
    }

    pub fn abilities(&self) -> &BTreeSet<String> {
        &self.abilities
    }

    pub fn has_ability(&self, ability: &str) -> bool {
        self.abilities
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ability))
    }

    pub fn ranged_weapons(&self) -> &[RangedWeapon] {
        &self.ranged
    }

    pub fn melee_weapons(&self) -> &[MeleeWeapon] {
        &self.melee
    }

    /// Lexicographic comparison on name only.
    pub fn compare(&self, other: &Unit) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Unit {}

impl PartialOrd for Unit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Unit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        write!(f, "  {}", self.stats)?;
        if self.is_psyker() {
            write!(f, "\n  Psychic: {}", self.abilities.iter().join(", "))?;
        }
        for w in &self.ranged {
            write!(f, "\n  Ranged: {w}")?;
        }
        for w in &self.melee {
            write!(f, "\n  Melee: {w}")?;
        }
        Ok(())
    }
}

/// Build phase of a [`Unit`]: weapons and abilities may be appended until `build`.
#[derive(Debug, Clone)]
pub struct UnitBuilder {
    unit: Unit,
}

impl UnitBuilder {
    /// Start a unit from its name and raw stats line.
    pub fn new(name: &str, stats_line: &str) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::malformed("unit name is empty"));
        }
        Ok(Self {
            unit: Unit {
                name: name.to_string(),
                stats: Stats::parse(stats_line)?,
                abilities: BTreeSet::new(),
                ranged: Vec::new(),
                melee: Vec::new(),
            },
        })
    }

    /// Add abilities from a space-separated line; `None` adds nothing.
    pub fn abilities(mut self, line: &str) -> Self {
        let line = line.trim();
        if !line.eq_ignore_ascii_case("none") {
            self.unit
                .abilities
                .extend(line.split_whitespace().map(str::to_string));
        }
        self
    }

    pub fn ability(mut self, ability: impl Into<String>) -> Self {
        self.unit.abilities.insert(ability.into());
        self
    }

    pub fn ranged(mut self, weapon: RangedWeapon) -> Self {
        self.unit.ranged.push(weapon);
        self
    }

    pub fn melee(mut self, weapon: MeleeWeapon) -> Self {
        self.unit.melee.push(weapon);
        self
    }

    /// Parse and append a ranged weapon profile line.
    pub fn ranged_line(self, line: &str) -> Result<Self, DomainError> {
        Ok(self.ranged(line.parse()?))
    }

    /// Parse and append a melee weapon profile line.
    pub fn melee_line(self, line: &str) -> Result<Self, DomainError> {
        Ok(self.melee(line.parse()?))
    }

    pub fn build(self) -> Unit {
        self.unit
    }
}
