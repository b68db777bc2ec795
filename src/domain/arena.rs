//! Arena-backed AVL tree indexing units by name.
//!
//! Nodes live in a generational arena and refer to their children by [`Index`].
//! Every node is reachable from exactly one parent slot, so the structure is
//! acyclic by construction and dropping the [`Roster`] releases every unit.

use std::cmp::Ordering;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DuplicateUnit};
use crate::domain::unit::Unit;

/// Name comparison policy shared by insertion and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameOrder {
    /// Plain lexicographic comparison
    #[default]
    CaseSensitive,
    /// Comparison on lowercased names; names differing only in case collide
    CaseInsensitive,
}

impl NameOrder {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            NameOrder::CaseSensitive => a.cmp(b),
            NameOrder::CaseInsensitive => a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase)),
        }
    }
}

/// Tree node in the arena. Only the roster creates nodes.
#[derive(Debug)]
pub struct RosterNode {
    unit: Unit,
    left: Option<Index>,
    right: Option<Index>,
    /// 1 for leaves, 1 + max(child heights) otherwise
    height: u32,
}

impl RosterNode {
    fn leaf(unit: Unit) -> Self {
        Self {
            unit,
            left: None,
            right: None,
            height: 1,
        }
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn left(&self) -> Option<Index> {
        self.left
    }

    pub fn right(&self) -> Option<Index> {
        self.right
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Height-balanced search tree of units keyed by name.
#[derive(Debug)]
pub struct Roster {
    arena: Arena<RosterNode>,
    root: Option<Index>,
    len: usize,
    order: NameOrder,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::with_order(NameOrder::default())
    }

    pub fn with_order(order: NameOrder) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            len: 0,
            order,
        }
    }

    pub fn order(&self) -> NameOrder {
        self.order
    }

    /// Insert a unit, taking ownership of it.
    ///
    /// A unit whose name already exists is rejected without touching the tree,
    /// and handed back inside the error.
    #[instrument(level = "trace", skip(self, unit), fields(name = %unit.name()))]
    pub fn insert(&mut self, unit: Unit) -> Result<(), DuplicateUnit> {
        let key = unit.name().to_string();
        let root = self.insert_at(self.root, unit, &key)?;
        self.root = Some(root);
        self.len += 1;
        Ok(())
    }

    /// Insert below `slot` and return the index now occupying that slot.
    fn insert_at(
        &mut self,
        slot: Option<Index>,
        unit: Unit,
        key: &str,
    ) -> Result<Index, DuplicateUnit> {
        let Some(idx) = slot else {
            return Ok(self.arena.insert(RosterNode::leaf(unit)));
        };

        match self.order.compare(key, self.arena[idx].unit.name()) {
            Ordering::Less => {
                let left = self.arena[idx].left;
                let child = self.insert_at(left, unit, key)?;
                self.arena[idx].left = Some(child);
            }
            Ordering::Greater => {
                let right = self.arena[idx].right;
                let child = self.insert_at(right, unit, key)?;
                self.arena[idx].right = Some(child);
            }
            Ordering::Equal => return Err(DuplicateUnit::new(unit)),
        }

        Ok(self.rebalance(idx, key))
    }

    /// Refresh the height of `idx` and rotate if the insertion of `key` unbalanced it.
    ///
    /// The rotation case is picked by comparing `key` with the heavy child's name
    /// before anything moves.
    fn rebalance(&mut self, idx: Index, key: &str) -> Index {
        self.update_height(idx);
        let balance = self.balance_factor(idx);

        if balance > 1 {
            if let Some(left) = self.arena[idx].left {
                if self.order.compare(key, self.arena[left].unit.name()) == Ordering::Greater {
                    trace!("left-right case at {}", self.arena[idx].unit.name());
                    let new_left = self.rotate_left(left);
                    self.arena[idx].left = Some(new_left);
                } else {
                    trace!("left-left case at {}", self.arena[idx].unit.name());
                }
                return self.rotate_right(idx);
            }
        } else if balance < -1 {
            if let Some(right) = self.arena[idx].right {
                if self.order.compare(key, self.arena[right].unit.name()) == Ordering::Less {
                    trace!("right-left case at {}", self.arena[idx].unit.name());
                    let new_right = self.rotate_right(right);
                    self.arena[idx].right = Some(new_right);
                } else {
                    trace!("right-right case at {}", self.arena[idx].unit.name());
                }
                return self.rotate_left(idx);
            }
        }

        idx
    }

    /// Promote the left child of `parent`. Returns the new subtree root.
    fn rotate_right(&mut self, parent: Index) -> Index {
        let Some(child) = self.arena[parent].left else {
            return parent;
        };
        let inner = self.arena[child].right;

        self.arena[parent].left = inner;
        self.arena[child].right = Some(parent);

        self.update_height(parent);
        self.update_height(child);
        child
    }

    /// Promote the right child of `parent`. Returns the new subtree root.
    fn rotate_left(&mut self, parent: Index) -> Index {
        let Some(child) = self.arena[parent].right else {
            return parent;
        };
        let inner = self.arena[child].left;

        self.arena[parent].right = inner;
        self.arena[child].left = Some(parent);

        self.update_height(parent);
        self.update_height(child);
        child
    }

    fn height_of(&self, idx: Option<Index>) -> u32 {
        idx.and_then(|i| self.arena.get(i)).map_or(0, |n| n.height)
    }

    fn update_height(&mut self, idx: Index) {
        let node = &self.arena[idx];
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.arena[idx].height = height;
    }

    /// height(left) - height(right)
    fn balance_factor(&self, idx: Index) -> i64 {
        let node = &self.arena[idx];
        self.height_of(node.left) as i64 - self.height_of(node.right) as i64
    }

    /// Find a unit by name under the roster's name order.
    #[instrument(level = "trace", skip(self))]
    pub fn lookup(&self, name: &str) -> Option<&Unit> {
        let mut current = self.root;
        while let Some(idx) = current {
            let node = &self.arena[idx];
            current = match self.order.compare(name, node.unit.name()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(&node.unit),
            };
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Units in ascending name order.
    pub fn iter(&self) -> InOrderIter<'_> {
        InOrderIter::new(self)
    }

    /// Number of units held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the whole tree, 0 when empty.
    pub fn height(&self) -> u32 {
        self.height_of(self.root)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn node(&self, idx: Index) -> Option<&RosterNode> {
        self.arena.get(idx)
    }

    /// Check ordering, height and balance invariants plus the element count.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(root) = self.root {
            self.validate_node(root)?;
        }

        let mut previous: Option<&str> = None;
        let mut count = 0;
        for unit in self.iter() {
            if let Some(prev) = previous {
                if self.order.compare(prev, unit.name()) != Ordering::Less {
                    return Err(DomainError::InvariantViolation {
                        name: unit.name().to_string(),
                        message: format!("not strictly after {prev}"),
                    });
                }
            }
            previous = Some(unit.name());
            count += 1;
        }

        if count != self.len {
            return Err(DomainError::InvariantViolation {
                name: "<roster>".to_string(),
                message: format!("count is {} but {} units are reachable", self.len, count),
            });
        }
        Ok(())
    }

    fn validate_node(&self, idx: Index) -> Result<u32, DomainError> {
        let node = &self.arena[idx];
        let left = match node.left {
            Some(l) => self.validate_node(l)?,
            None => 0,
        };
        let right = match node.right {
            Some(r) => self.validate_node(r)?,
            None => 0,
        };

        let violation = |message: String| DomainError::InvariantViolation {
            name: node.unit.name().to_string(),
            message,
        };
        if node.height != 1 + left.max(right) {
            return Err(violation(format!(
                "cached height {} but children have heights {left} and {right}",
                node.height
            )));
        }
        if left.abs_diff(right) > 1 {
            return Err(violation(format!(
                "unbalanced: left height {left}, right height {right}"
            )));
        }
        Ok(node.height)
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Unit;
    type IntoIter = InOrderIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Stack-based in-order walk; restartable by calling [`Roster::iter`] again.
pub struct InOrderIter<'a> {
    roster: &'a Roster,
    stack: Vec<Index>,
}

impl<'a> InOrderIter<'a> {
    fn new(roster: &'a Roster) -> Self {
        let mut iter = Self {
            roster,
            stack: Vec::new(),
        };
        iter.push_left_spine(roster.root);
        iter
    }

    fn push_left_spine(&mut self, mut current: Option<Index>) {
        while let Some(idx) = current {
            self.stack.push(idx);
            current = self.roster.arena[idx].left;
        }
    }
}

impl<'a> Iterator for InOrderIter<'a> {
    type Item = &'a Unit;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let roster = self.roster;
        let node = &roster.arena[idx];
        self.push_left_spine(node.right);
        Some(&node.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unit::UnitBuilder;

    fn unit(name: &str) -> Unit {
        UnitBuilder::new(name, "6 3 3 4 4 3 2 8 3 0").unwrap().build()
    }

    fn roster_of(names: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for name in names {
            roster.insert(unit(name)).unwrap();
        }
        roster
    }

    /// (root, left, right) names of the tree top
    fn top(roster: &Roster) -> (String, Option<String>, Option<String>) {
        let root = roster.node(roster.root().unwrap()).unwrap();
        let name_of = |i: Option<Index>| {
            i.and_then(|i| roster.node(i))
                .map(|n| n.unit().name().to_string())
        };
        (
            root.unit().name().to_string(),
            name_of(root.left()),
            name_of(root.right()),
        )
    }

    #[test]
    fn test_empty_roster() {
        let roster = Roster::new();
        assert!(roster.is_empty());
        assert_eq!(roster.height(), 0);
        assert!(roster.lookup("anyone").is_none());
        assert_eq!(roster.iter().count(), 0);
        roster.validate().unwrap();
    }

    #[test]
    fn test_single_insert_is_leaf_root() {
        let roster = roster_of(&["Solo"]);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.height(), 1);
        assert_eq!(top(&roster), ("Solo".into(), None, None));
    }

    #[test]
    fn test_left_left_rotation() {
        let roster = roster_of(&["C", "B", "A"]);
        assert_eq!(
            top(&roster),
            ("B".into(), Some("A".into()), Some("C".into()))
        );
        assert_eq!(roster.height(), 2);
        roster.validate().unwrap();
    }

    #[test]
    fn test_left_right_rotation() {
        let roster = roster_of(&["C", "A", "B"]);
        assert_eq!(
            top(&roster),
            ("B".into(), Some("A".into()), Some("C".into()))
        );
        roster.validate().unwrap();
    }

    #[test]
    fn test_right_right_rotation() {
        let roster = roster_of(&["A", "B", "C"]);
        assert_eq!(
            top(&roster),
            ("B".into(), Some("A".into()), Some("C".into()))
        );
    }

    #[test]
    fn test_right_left_rotation() {
        let roster = roster_of(&["A", "C", "B"]);
        assert_eq!(
            top(&roster),
            ("B".into(), Some("A".into()), Some("C".into()))
        );
    }

    #[test]
    fn test_duplicate_returns_unit_and_leaves_tree_alone() {
        let mut roster = roster_of(&["M", "D", "Z"]);
        let before = top(&roster);

        let err = roster.insert(unit("D")).unwrap_err();
        assert_eq!(err.unit().name(), "D");
        assert_eq!(err.into_inner().name(), "D");

        assert_eq!(roster.len(), 3);
        assert_eq!(top(&roster), before);
        roster.validate().unwrap();
    }

    #[test]
    fn test_case_insensitive_order() {
        let mut roster = Roster::with_order(NameOrder::CaseInsensitive);
        roster.insert(unit("Captain")).unwrap();
        assert!(roster.insert(unit("CAPTAIN")).is_err());
        assert_eq!(roster.lookup("captain").unwrap().name(), "Captain");

        let sensitive = roster_of(&["Captain"]);
        assert!(sensitive.lookup("captain").is_none());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let roster = roster_of(&["b", "a", "c"]);
        let first: Vec<_> = roster.iter().map(Unit::name).collect();
        let second: Vec<_> = (&roster).into_iter().map(Unit::name).collect();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }
}
