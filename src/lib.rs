//! muster: an army roster indexed by a height-balanced tree, with dice-driven
//! combat between its units.
//!
//! Layers, innermost first: [`domain`] (roster index, units, dice, combat rules),
//! [`application`] (loading and battle services), [`infrastructure`] (I/O traits,
//! service wiring) and [`cli`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
