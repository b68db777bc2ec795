//! Roster text format.
//!
//! ```text
//! Captain Titus           <- name
//! 6 2 2 4 4 5 4 9 3 4     <- M WS BS S T W A Ld Sv Inv
//! None                    <- psychic abilities, or "None"
//! Ranged BoltPistol 12 Pistol 1 4 0 1 None
//! Melee ChainSword User -1 1 None
//!                         <- blank line ends the unit
//! ```

use std::path::PathBuf;

use crate::domain::error::DomainError;
use crate::domain::unit::{Unit, UnitBuilder};

/// Parsed roster file: units in file order.
#[derive(Debug, Clone)]
pub struct RosterFile {
    pub path: PathBuf,
    pub units: Vec<Unit>,
}

impl RosterFile {
    /// Parse roster file content.
    ///
    /// Lines starting with `#` are comments. The first malformed block aborts
    /// parsing with a [`DomainError::MalformedRecord`] carrying its line number.
    pub fn parse(content: &str, path: PathBuf) -> Result<Self, DomainError> {
        let units = split_blocks(content)
            .iter()
            .map(|block| parse_block(block))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { path, units })
    }
}

/// Numbered, trimmed lines of one unit block.
type Block<'a> = Vec<(usize, &'a str)>;

fn split_blocks(content: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut current: Block = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push((i + 1, line));
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_block(block: &[(usize, &str)]) -> Result<Unit, DomainError> {
    let (name_line, name) = block[0];
    let (stats_no, stats) = block.get(1).copied().ok_or_else(|| {
        DomainError::malformed(format!("unit {name} has no stats line")).at_line(name_line)
    })?;
    let (abilities_no, abilities) = block.get(2).copied().ok_or_else(|| {
        DomainError::malformed(format!("unit {name} has no abilities line")).at_line(stats_no)
    })?;

    if is_weapon_line(abilities) {
        return Err(DomainError::malformed(format!(
            "unit {name} is missing its abilities line before weapons"
        ))
        .at_line(abilities_no));
    }

    let mut builder = UnitBuilder::new(name, stats)
        .map_err(|e| e.at_line(stats_no))?
        .abilities(abilities);

    for &(line_no, line) in &block[3..] {
        builder = parse_weapon_line(builder, line).map_err(|e| e.at_line(line_no))?;
    }

    Ok(builder.build())
}

fn is_weapon_line(line: &str) -> bool {
    line.starts_with("Ranged ") || line.starts_with("Melee ")
}

fn parse_weapon_line(builder: UnitBuilder, line: &str) -> Result<UnitBuilder, DomainError> {
    if let Some(profile) = line.strip_prefix("Ranged ") {
        if is_none(profile) {
            return Ok(builder);
        }
        return builder.ranged_line(profile);
    }
    if let Some(profile) = line.strip_prefix("Melee ") {
        if is_none(profile) {
            return Ok(builder);
        }
        return builder.melee_line(profile);
    }
    if is_none(line) {
        return Ok(builder);
    }
    Err(DomainError::malformed(format!(
        "expected a 'Ranged' or 'Melee' line, got: {line}"
    )))
}

fn is_none(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("none")
}
