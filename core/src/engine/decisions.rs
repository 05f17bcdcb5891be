//! Decision map and conflict reconciliation.
//!
//! A pass collects one [`Decision`] per source→target relationship, then
//! [`DecisionMap::reconcile`] collapses decisions that target the same
//! effect name on the same token:
//!
//! 1. Among grants, drop any grant with a strictly greater numeric sibling
//!    at some change position (entries are visited in map order, so of two
//!    mutually dominating grants the later one survives).
//! 2. If any revoke remains in the group, drop every grant in it.

use indexmap::IndexMap;

use crate::definitions::EffectDefinition;
use crate::ids::EntityId;

/// Identity of one source→target effect relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReconciliationKey {
    pub origin: String,
    pub target: EntityId,
    pub source: EntityId,
    /// Effective (possibly overridden) effect name
    pub effect_name: String,
}

impl ReconciliationKey {
    pub fn new(origin: &str, target: &EntityId, source: &EntityId, effect_name: &str) -> Self {
        Self {
            origin: origin.to_string(),
            target: target.clone(),
            source: source.clone(),
            effect_name: effect_name.to_string(),
        }
    }
}

/// Whether a token should currently carry an effect from one source
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub should_apply: bool,
    pub target: EntityId,
    /// Snapshot of the effect taken when the decision was recorded
    pub effect: EffectDefinition,
}

/// Decisions for one pass, in the order they were first recorded
#[derive(Debug, Clone, Default)]
pub struct DecisionMap {
    entries: IndexMap<ReconciliationKey, Decision>,
}

impl DecisionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ReconciliationKey) -> Option<&Decision> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReconciliationKey, &Decision)> {
        self.entries.iter()
    }

    pub fn is_granted(&self, key: &ReconciliationKey) -> bool {
        self.entries.get(key).is_some_and(|d| d.should_apply)
    }

    /// Record that the target should carry the effect; flips an existing revoke
    pub fn grant(&mut self, key: ReconciliationKey, effect: &EffectDefinition) {
        match self.entries.get_mut(&key) {
            Some(decision) => decision.should_apply = true,
            None => {
                let target = key.target.clone();
                self.entries.insert(
                    key,
                    Decision {
                        should_apply: true,
                        target,
                        effect: effect.clone(),
                    },
                );
            }
        }
    }

    /// Record that the target should lose the effect, unless already granted at this key
    pub fn revoke(&mut self, key: ReconciliationKey, effect: &EffectDefinition) {
        if self.entries.contains_key(&key) {
            return;
        }
        let target = key.target.clone();
        self.entries.insert(
            key,
            Decision {
                should_apply: false,
                target,
                effect: effect.clone(),
            },
        );
    }

    /// Collapse conflicting decisions sharing (effect name, target)
    pub fn reconcile(&mut self) {
        let mut groups: IndexMap<(&str, &EntityId), Vec<usize>> = IndexMap::new();
        for (index, key) in self.entries.keys().enumerate() {
            groups
                .entry((key.effect_name.as_str(), &key.target))
                .or_default()
                .push(index);
        }

        let mut dropped = vec![false; self.entries.len()];
        for members in groups.values().filter(|m| m.len() > 1) {
            for &i in members {
                let candidate = &self.entries[i];
                if !candidate.should_apply {
                    continue;
                }
                let dominated = members.iter().any(|&j| {
                    let sibling = &self.entries[j];
                    j != i && !dropped[j] && sibling.should_apply && stronger(sibling, candidate)
                });
                if dominated {
                    dropped[i] = true;
                }
            }

            let has_revoke = members.iter().any(|&i| !self.entries[i].should_apply);
            if has_revoke {
                for &i in members {
                    if self.entries[i].should_apply {
                        dropped[i] = true;
                    }
                }
            }
        }

        let mut index = 0;
        self.entries.retain(|key, _| {
            let keep = !dropped[index];
            if !keep {
                tracing::debug!(origin = %key.origin, target = %key.target, effect = %key.effect_name, "Dropped conflicting aura decision");
            }
            index += 1;
            keep
        });
    }
}

impl IntoIterator for DecisionMap {
    type Item = (ReconciliationKey, Decision);
    type IntoIter = indexmap::map::IntoIter<ReconciliationKey, Decision>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// `a` has a numeric change strictly greater than `b` at the same position.
/// A position missing from `b` counts as 0; non-numeric values never compare.
fn stronger(a: &Decision, b: &Decision) -> bool {
    a.effect.changes.iter().enumerate().any(|(position, change)| {
        let Some(theirs) = change.numeric_value() else {
            return false;
        };
        let ours = match b.effect.changes.get(position) {
            Some(c) => c.numeric_value(),
            None => Some(0),
        };
        ours.is_some_and(|ours| ours < theirs)
    })
}
