//! Layout instructions returned by tree mutations.

use crate::key::KeyId;
use serde::{Deserialize, Serialize};

/// New grid coordinates of a key that already had a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub key: KeyId,
    pub row: u32,
    pub rowspan: u32,
    pub label_row: Option<u32>,
}

/// What the renderer must do after a mutation. Every list refers to keys
/// by identifier; `drop` lists keys that no longer exist in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    /// Created keys, the main new key first, then its twin and
    /// descendants in tree order.
    pub new_keys: Vec<KeyId>,
    pub drop: Vec<KeyId>,
    pub show: Vec<KeyId>,
    pub hide: Vec<KeyId>,
    pub show_minus: Vec<KeyId>,
    pub hide_minus: Vec<KeyId>,
    pub moves: Vec<Move>,
    pub language_menus: Vec<KeyId>,
    pub source_menus: Vec<KeyId>,
    pub unit_menus: Vec<KeyId>,
    pub concept_lists: Vec<KeyId>,
    /// Widgets whose displayed value changed.
    pub values: Vec<KeyId>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        *self == Diff::default()
    }

    /// Appends `other`, skipping instructions about keys `other` drops.
    pub fn merge(&mut self, mut other: Diff) {
        // created then dropped: the renderer never sees it
        let transient: Vec<KeyId> = self
            .new_keys
            .iter()
            .filter(|k| other.drop.contains(k))
            .copied()
            .collect();
        let dropped = other.drop.clone();
        other.drop.retain(|k| !transient.contains(k));
        let keep = |k: &KeyId| !dropped.contains(k);
        self.new_keys.retain(keep);
        self.show.retain(keep);
        self.hide.retain(keep);
        self.show_minus.retain(keep);
        self.hide_minus.retain(keep);
        self.moves.retain(|m| keep(&m.key));
        self.language_menus.retain(keep);
        self.source_menus.retain(keep);
        self.unit_menus.retain(keep);
        self.concept_lists.retain(keep);
        self.values.retain(keep);

        fn extend(into: &mut Vec<KeyId>, from: Vec<KeyId>) {
            for k in from {
                if !into.contains(&k) {
                    into.push(k);
                }
            }
        }
        extend(&mut self.new_keys, other.new_keys);
        extend(&mut self.drop, other.drop);
        extend(&mut self.show, other.show);
        extend(&mut self.hide, other.hide);
        extend(&mut self.show_minus, other.show_minus);
        extend(&mut self.hide_minus, other.hide_minus);
        extend(&mut self.language_menus, other.language_menus);
        extend(&mut self.source_menus, other.source_menus);
        extend(&mut self.unit_menus, other.unit_menus);
        extend(&mut self.concept_lists, other.concept_lists);
        extend(&mut self.values, other.values);
        for m in other.moves {
            self.moves.retain(|old| old.key != m.key);
            self.moves.push(m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_forgets_dropped_keys() {
        let mut first = Diff {
            new_keys: vec![KeyId(4), KeyId(5)],
            moves: vec![Move { key: KeyId(3), row: 2, rowspan: 1, label_row: None }],
            ..Diff::default()
        };
        let second = Diff {
            drop: vec![KeyId(5)],
            moves: vec![Move { key: KeyId(3), row: 1, rowspan: 1, label_row: None }],
            ..Diff::default()
        };
        first.merge(second);
        assert_eq!(first.new_keys, vec![KeyId(4)]);
        assert!(first.drop.is_empty());
        assert_eq!(first.moves.len(), 1);
        assert_eq!(first.moves[0].row, 1);
        assert!(!first.is_empty());
    }

    #[test]
    fn transient_keys_vanish() {
        let mut first = Diff {
            new_keys: vec![KeyId(7)],
            ..Diff::default()
        };
        first.merge(Diff {
            drop: vec![KeyId(7)],
            ..Diff::default()
        });
        assert!(first.is_empty());
    }
}
