//! Dice notation and die sources
//!
//! Parses and rolls weapon profile values like "D6", "2D3", "D3+1" or a flat "2".

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::domain::error::DomainError;

static DICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i)(\d*)d(\d+)([+-]\d+)?$").unwrap());

/// Source of die results.
///
/// Combat code only ever asks for single dice, so tests can script exact outcomes.
pub trait DiceRoller {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll(&mut self, sides: u32) -> u32;

    fn d6(&mut self) -> u32 {
        self.roll(6)
    }
}

/// Die source backed by a `rand` generator.
#[derive(Debug)]
pub struct RngDice<R: Rng> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<StdRng> {
    /// Deterministic when a seed is given, OS-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(StdRng::seed_from_u64(seed)),
            None => Self::new(StdRng::from_os_rng()),
        }
    }
}

impl<R: Rng> DiceRoller for RngDice<R> {
    fn roll(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.rng.random_range(1..=sides)
    }
}

/// A parsed dice expression. `count == 0` denotes a flat value held in `modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpr {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// A flat value that needs no roll; values above `i32::MAX` saturate.
    pub fn flat(value: u32) -> Self {
        Self::new(0, 0, i32::try_from(value).unwrap_or(i32::MAX))
    }

    pub fn is_flat(&self) -> bool {
        self.count == 0
    }

    /// Roll the expression; the result never drops below zero.
    pub fn roll(&self, dice: &mut dyn DiceRoller) -> u32 {
        let sum: i64 = (0..self.count).map(|_| i64::from(dice.roll(self.sides))).sum();
        clamp_u32(sum + i64::from(self.modifier))
    }

    pub fn min(&self) -> u32 {
        clamp_u32(i64::from(self.count) + i64::from(self.modifier))
    }

    pub fn max(&self) -> u32 {
        clamp_u32(i64::from(self.count) * i64::from(self.sides) + i64::from(self.modifier))
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl FromStr for DiceExpr {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_flat() {
            return write!(f, "{}", self.modifier);
        }
        if self.count > 1 {
            write!(f, "{}", self.count)?;
        }
        write!(f, "D{}", self.sides)?;
        if self.modifier > 0 {
            write!(f, "+{}", self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}", self.modifier)
        } else {
            Ok(())
        }
    }
}

/// Parse dice notation: `[count]D<sides>[+/-modifier]` or a flat non-negative integer.
pub fn parse_dice(notation: &str) -> Result<DiceExpr, DomainError> {
    let notation = notation.trim();

    if let Ok(value) = notation.parse::<u32>() {
        return i32::try_from(value)
            .map(|v| DiceExpr::new(0, 0, v))
            .map_err(|_| DomainError::InvalidDice(notation.to_string()));
    }

    let caps = DICE_RE
        .captures(notation)
        .ok_or_else(|| DomainError::InvalidDice(notation.to_string()))?;

    let count = match caps.get(1).map(|m| m.as_str()) {
        Some("") | None => 1,
        Some(c) => c
            .parse()
            .map_err(|_| DomainError::InvalidDice(notation.to_string()))?,
    };
    let sides: u32 = caps[2]
        .parse()
        .map_err(|_| DomainError::InvalidDice(notation.to_string()))?;
    let modifier: i32 = match caps.get(3) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| DomainError::InvalidDice(notation.to_string()))?,
        None => 0,
    };

    if count == 0 || sides == 0 {
        return Err(DomainError::InvalidDice(notation.to_string()));
    }

    Ok(DiceExpr::new(count, sides, modifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::ScriptedDice;

    #[test]
    fn test_parse_single_die() {
        let d = parse_dice("D6").unwrap();
        assert_eq!(d, DiceExpr::new(1, 6, 0));
    }

    #[test]
    fn test_parse_count_and_modifier() {
        assert_eq!(parse_dice("2d3+1").unwrap(), DiceExpr::new(2, 3, 1));
        assert_eq!(parse_dice("D6-1").unwrap(), DiceExpr::new(1, 6, -1));
    }

    #[test]
    fn test_parse_flat() {
        let d = parse_dice(" 3 ").unwrap();
        assert!(d.is_flat());
        assert_eq!(d.min(), 3);
        assert_eq!(d.max(), 3);
    }

    #[test]
    fn test_parse_flat_beyond_i32_rejected() {
        assert_eq!(
            parse_dice("3000000000"),
            Err(DomainError::InvalidDice("3000000000".to_string()))
        );
        let d = parse_dice("2147483647").unwrap();
        assert_eq!(d.roll(&mut ScriptedDice::new([])), 2_147_483_647);
    }

    #[test]
    fn test_max_saturates() {
        assert_eq!(DiceExpr::new(u32::MAX, u32::MAX, i32::MAX).max(), u32::MAX);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "abc", "D", "0D6", "D0", "-2", "2D6*2"] {
            assert!(parse_dice(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(DiceExpr::new(1, 6, 0).to_string(), "D6");
        assert_eq!(DiceExpr::new(2, 3, 1).to_string(), "2D3+1");
        assert_eq!(DiceExpr::new(1, 6, -2).to_string(), "D6-2");
        assert_eq!(DiceExpr::flat(2).to_string(), "2");
    }

    #[test]
    fn test_roll_uses_every_die_and_clamps() {
        let mut dice = ScriptedDice::new([2, 5]);
        assert_eq!(DiceExpr::new(2, 6, 1).roll(&mut dice), 8);

        let mut dice = ScriptedDice::new([1]);
        assert_eq!(DiceExpr::new(1, 3, -4).roll(&mut dice), 0);
    }

    #[test]
    fn test_flat_roll_consumes_nothing() {
        let mut dice = ScriptedDice::new([]);
        assert_eq!(DiceExpr::flat(4).roll(&mut dice), 4);
        assert!(dice.is_exhausted());
    }

    #[test]
    fn test_seeded_rolls_are_bounded_and_repeatable() {
        let mut a = RngDice::from_seed(Some(7));
        let mut b = RngDice::from_seed(Some(7));
        for _ in 0..100 {
            let x = a.d6();
            assert!((1..=6).contains(&x));
            assert_eq!(x, b.d6());
        }
    }
}
