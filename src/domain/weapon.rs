//! Ranged and melee weapon profiles.
//!
//! Profiles are read from single whitespace-separated lines:
//!
//! ```text
//! Ranged: <Name> <Range> <Type> <Attacks> <S> <AP> <D> [Abilities...]
//! Melee:  <Name> <S> <AP> <D> [Abilities...]
//! ```
//!
//! `Attacks` and `D` are dice expressions, `S` is a [`Strength`] profile and an
//! abilities list of `None` means no abilities.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::domain::dice::DiceExpr;
use crate::domain::error::DomainError;

/// Weapon strength, possibly derived from the wielder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    /// Uses the wielder's strength.
    User,
    /// Wielder's strength plus a bonus.
    Plus(u32),
    /// Wielder's strength multiplied.
    Times(u32),
    Fixed(u32),
}

impl Strength {
    /// Effective strength for a wielder with strength `user`.
    pub fn resolve(&self, user: u32) -> u32 {
        match *self {
            Strength::User => user,
            Strength::Plus(n) => user.saturating_add(n),
            Strength::Times(n) => user.saturating_mul(n),
            Strength::Fixed(n) => n,
        }
    }
}

impl FromStr for Strength {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || DomainError::malformed(format!("invalid strength: {s}"));
        if s.eq_ignore_ascii_case("user") {
            return Ok(Strength::User);
        }
        if let Some(n) = s.strip_prefix('+') {
            return n.parse().map(Strength::Plus).map_err(|_| bad());
        }
        if let Some(n) = s.strip_prefix('x').or_else(|| s.strip_prefix('X')) {
            return n.parse().map(Strength::Times).map_err(|_| bad());
        }
        s.parse().map(Strength::Fixed).map_err(|_| bad())
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::User => write!(f, "User"),
            Strength::Plus(n) => write!(f, "+{n}"),
            Strength::Times(n) => write!(f, "x{n}"),
            Strength::Fixed(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangedWeapon {
    pub name: String,
    /// Range in inches
    pub range: u32,
    /// Weapon type keyword, e.g. Assault, Heavy, Pistol
    pub kind: String,
    pub attacks: DiceExpr,
    pub strength: Strength,
    /// Armour piercing, zero or negative
    pub ap: i32,
    pub damage: DiceExpr,
    pub abilities: Vec<String>,
}

impl FromStr for RangedWeapon {
    type Err = DomainError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 {
            return Err(DomainError::malformed(format!(
                "ranged weapon needs at least 7 fields (Name Range Type A S AP D), got {}: {line}",
                fields.len()
            )));
        }
        Ok(Self {
            name: fields[0].to_string(),
            range: parse_number(fields[1], "range")?,
            kind: fields[2].to_string(),
            attacks: parse_dice_field(fields[3], "attacks")?,
            strength: fields[4].parse()?,
            ap: parse_number(fields[5], "AP")?,
            damage: parse_dice_field(fields[6], "damage")?,
            abilities: parse_abilities(&fields[7..]),
        })
    }
}

impl fmt::Display for RangedWeapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}\" {} A:{} S:{} AP:{} D:{}",
            self.name, self.range, self.kind, self.attacks, self.strength, self.ap, self.damage
        )?;
        write_abilities(f, &self.abilities)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeleeWeapon {
    pub name: String,
    pub strength: Strength,
    pub ap: i32,
    pub damage: DiceExpr,
    pub abilities: Vec<String>,
}

impl MeleeWeapon {
    /// Profile used by units without a listed melee weapon.
    pub fn bare_hands() -> Self {
        Self {
            name: "Close combat".to_string(),
            strength: Strength::User,
            ap: 0,
            damage: DiceExpr::flat(1),
            abilities: Vec::new(),
        }
    }
}

impl FromStr for MeleeWeapon {
    type Err = DomainError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(DomainError::malformed(format!(
                "melee weapon needs at least 4 fields (Name S AP D), got {}: {line}",
                fields.len()
            )));
        }
        Ok(Self {
            name: fields[0].to_string(),
            strength: fields[1].parse()?,
            ap: parse_number(fields[2], "AP")?,
            damage: parse_dice_field(fields[3], "damage")?,
            abilities: parse_abilities(&fields[4..]),
        })
    }
}

impl fmt::Display for MeleeWeapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} S:{} AP:{} D:{}",
            self.name, self.strength, self.ap, self.damage
        )?;
        write_abilities(f, &self.abilities)
    }
}

fn parse_number<T: FromStr>(field: &str, what: &str) -> Result<T, DomainError> {
    field
        .parse()
        .map_err(|_| DomainError::malformed(format!("invalid {what}: {field}")))
}

fn parse_dice_field(field: &str, what: &str) -> Result<DiceExpr, DomainError> {
    field
        .parse()
        .map_err(|_| DomainError::malformed(format!("invalid {what} dice: {field}")))
}

fn parse_abilities(fields: &[&str]) -> Vec<String> {
    match fields {
        [] => Vec::new(),
        [only] if only.eq_ignore_ascii_case("none") => Vec::new(),
        rest => rest.iter().map(|s| s.to_string()).collect(),
    }
}

fn write_abilities(f: &mut fmt::Formatter<'_>, abilities: &[String]) -> fmt::Result {
    if abilities.is_empty() {
        Ok(())
    } else {
        write!(f, " [{}]", abilities.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("User", Strength::User, 4)]
    #[case("+2", Strength::Plus(2), 6)]
    #[case("x2", Strength::Times(2), 8)]
    #[case("7", Strength::Fixed(7), 7)]
    #[case("+4294967295", Strength::Plus(u32::MAX), u32::MAX)]
    #[case("x4294967295", Strength::Times(u32::MAX), u32::MAX)]
    fn test_strength_profiles(#[case] input: &str, #[case] expected: Strength, #[case] resolved: u32) {
        let s: Strength = input.parse().unwrap();
        assert_eq!(s, expected);
        assert_eq!(s.resolve(4), resolved);
    }

    #[test]
    fn test_parse_ranged_weapon() {
        let w: RangedWeapon = "Bolter 24 RapidFire 2 4 -1 1 None".parse().unwrap();
        assert_eq!(w.name, "Bolter");
        assert_eq!(w.range, 24);
        assert_eq!(w.kind, "RapidFire");
        assert_eq!(w.attacks, DiceExpr::flat(2));
        assert_eq!(w.strength, Strength::Fixed(4));
        assert_eq!(w.ap, -1);
        assert_eq!(w.damage, DiceExpr::flat(1));
        assert!(w.abilities.is_empty());
    }

    #[test]
    fn test_parse_ranged_weapon_with_abilities() {
        let w: RangedWeapon = "Flamer 8 Assault D6 4 0 1 AutoHit Torrent".parse().unwrap();
        assert_eq!(w.attacks, DiceExpr::new(1, 6, 0));
        assert_eq!(w.abilities, vec!["AutoHit", "Torrent"]);
    }

    #[test]
    fn test_parse_ranged_weapon_too_short() {
        let err = "Bolter 18 Assault D6 4 -1".parse::<RangedWeapon>().unwrap_err();
        assert!(matches!(err, DomainError::MalformedRecord { .. }));
    }

    #[test]
    fn test_parse_melee_weapon() {
        let w: MeleeWeapon = "Hooves 20 -10 D40 None".parse().unwrap();
        assert_eq!(w.strength, Strength::Fixed(20));
        assert_eq!(w.ap, -10);
        assert_eq!(w.damage, DiceExpr::new(1, 40, 0));
    }

    #[test]
    fn test_parse_melee_weapon_bad_ap() {
        let err = "Claws User sharp 2".parse::<MeleeWeapon>().unwrap_err();
        assert!(err.to_string().contains("invalid AP"));
    }

    #[test]
    fn test_display_round_trips_key_fields() {
        let w: MeleeWeapon = "Claws User 0 2 Shred".parse().unwrap();
        assert_eq!(w.to_string(), "Claws S:User AP:0 D:2 [Shred]");
    }
}
