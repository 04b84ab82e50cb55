//! The key tree arena: storage, navigation and grid layout.

use crate::diff::Move;
use crate::error::{Result, TreeError};
use crate::key::{DescriptorId, Key, KeyId, KeyKind};
use crate::options::TreeOptions;
use plume_rdf::{DatasetId, PropertyPath};
use plume_shape::{PropertyDescriptor, VocabularyRegistry};

/// Editable tree of keys for one dataset.
///
/// Keys live in an arena and refer to each other by `KeyId` (parent,
/// children, twin). Dropped keys leave a hole so identifiers stay stable.
#[derive(Debug, Clone)]
pub struct KeyTree {
    pub(crate) keys: Vec<Option<Key>>,
    pub(crate) descriptors: Vec<PropertyDescriptor>,
    pub(crate) root: KeyId,
    pub(crate) datasetid: DatasetId,
    pub(crate) options: TreeOptions,
    pub(crate) vocabularies: &'static VocabularyRegistry,
}

impl KeyTree {
    pub(crate) fn empty(
        datasetid: DatasetId,
        options: TreeOptions,
        vocabularies: &'static VocabularyRegistry,
    ) -> Self {
        let mut tree = Self {
            keys: Vec::new(),
            descriptors: Vec::new(),
            root: KeyId(0),
            datasetid,
            options,
            vocabularies,
        };
        tree.root = tree.push(KeyKind::Root, None);
        tree
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn root(&self) -> KeyId {
        self.root
    }

    pub fn datasetid(&self) -> &DatasetId {
        &self.datasetid
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn vocabularies(&self) -> &'static VocabularyRegistry {
        self.vocabularies
    }

    pub fn get(&self, id: KeyId) -> Option<&Key> {
        self.keys.get(id.index()).and_then(Option::as_ref)
    }

    pub fn key(&self, id: KeyId) -> Result<&Key> {
        self.get(id).ok_or(TreeError::UnknownKey(id))
    }

    pub(crate) fn key_mut(&mut self, id: KeyId) -> Result<&mut Key> {
        self.keys
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownKey(id))
    }

    /// Live keys, in arena order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.keys().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn descriptor(&self, id: KeyId) -> Option<&PropertyDescriptor> {
        let d = self.get(id)?.descriptor?;
        self.descriptors.get(d.0 as usize)
    }

    pub(crate) fn add_descriptor(&mut self, descriptor: PropertyDescriptor) -> DescriptorId {
        self.descriptors.push(descriptor);
        DescriptorId((self.descriptors.len() - 1) as u32)
    }

    pub fn children(&self, id: KeyId) -> &[KeyId] {
        self.get(id).map(|k| k.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: KeyId) -> Option<KeyId> {
        self.get(id)?.parent
    }

    pub fn tabs(&self) -> &[KeyId] {
        self.children(self.root)
    }

    /// Tab with `label`, else the first tab.
    pub fn search_tab(&self, label: Option<&str>) -> KeyId {
        let tabs = self.tabs();
        label
            .and_then(|label| {
                tabs.iter().copied().find(|t| {
                    self.get(*t)
                        .is_some_and(|k| matches!(&k.kind, KeyKind::Tab { label: l } if l == label))
                })
            })
            .or_else(|| tabs.first().copied())
            .unwrap_or(self.root)
    }

    /// `id` and its descendants, depth first.
    pub fn descendants(&self, id: KeyId) -> Vec<KeyId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(key) = self.get(next) {
                out.push(next);
                stack.extend(key.children.iter().rev().copied());
            }
        }
        out
    }

    /// Non-button keys of a category, in tree order.
    pub fn find(&self, path: &PropertyPath) -> Vec<KeyId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| {
                self.get(*id)
                    .is_some_and(|k| !k.is_button() && k.path.as_ref() == Some(path))
            })
            .collect()
    }

    /// Value keys and property groups of a category, excluding value
    /// groups and buttons.
    pub fn find_values(&self, path: &PropertyPath) -> Vec<KeyId> {
        self.find(path)
            .into_iter()
            .filter(|id| {
                self.get(*id)
                    .is_some_and(|k| matches!(k.kind, KeyKind::Value(_) | KeyKind::GroupOfProperties { .. }))
            })
            .collect()
    }

    fn any_ancestor(&self, id: KeyId, pred: impl Fn(&Key) -> bool) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.get(cur) {
                Some(key) if pred(key) => return true,
                Some(key) => current = key.parent,
                None => return false,
            }
        }
        false
    }

    /// Hidden itself or below a hidden twin.
    pub fn is_hidden(&self, id: KeyId) -> bool {
        self.any_ancestor(id, |k| k.is_hidden)
    }

    pub fn is_ghost(&self, id: KeyId) -> bool {
        self.any_ancestor(id, |k| k.is_ghost)
    }

    /// Value keys carrying the second half of a twin pair are laid out
    /// and counted with their property group.
    pub(crate) fn is_secondary_twin(&self, id: KeyId) -> bool {
        self.get(id)
            .is_some_and(|k| k.twin.is_some() && matches!(k.kind, KeyKind::Value(_)))
    }

    /// Non-ghost, non-button children, one per twin pair.
    pub fn real_children(&self, id: KeyId) -> Vec<KeyId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| {
                self.get(*c).is_some_and(|k| !k.is_ghost && !k.is_button())
                    && !self.is_secondary_twin(*c)
            })
            .collect()
    }

    /// The only real child of a value group. Its minus button is hidden.
    pub fn is_single_child(&self, id: KeyId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let Some(parent_key) = self.get(parent) else {
            return false;
        };
        parent_key.kind.is_value_group() && self.real_children(parent).len() <= 1
    }

    /// The button of a value group.
    pub fn button(&self, group: KeyId) -> Option<KeyId> {
        self.children(group)
            .iter()
            .copied()
            .find(|c| self.get(*c).is_some_and(Key::is_button))
    }

    /// Twin pair member of a property group, visible one first.
    pub(crate) fn pair(&self, id: KeyId) -> Vec<KeyId> {
        let Some(key) = self.get(id) else {
            return Vec::new();
        };
        match key.twin {
            Some(twin) if key.is_hidden => vec![twin, id],
            Some(twin) => vec![id, twin],
            None => vec![id],
        }
    }

    // ========================================================================
    // Arena mutation
    // ========================================================================

    pub(crate) fn push(&mut self, kind: KeyKind, parent: Option<KeyId>) -> KeyId {
        let id = KeyId(self.keys.len() as u32);
        self.keys.push(Some(Key::new(id, kind, parent)));
        if let Some(parent) = parent.and_then(|p| self.keys.get_mut(p.index())).and_then(Option::as_mut) {
            parent.children.push(id);
        }
        id
    }

    /// Creates a key under `parent` right before `before`.
    pub(crate) fn insert_before(&mut self, kind: KeyKind, parent: KeyId, before: KeyId) -> Result<KeyId> {
        let id = KeyId(self.keys.len() as u32);
        let parent_key = self.key_mut(parent)?;
        let at = parent_key
            .children
            .iter()
            .position(|c| *c == before)
            .unwrap_or(parent_key.children.len());
        parent_key.children.insert(at, id);
        self.keys.push(Some(Key::new(id, kind, Some(parent))));
        Ok(id)
    }

    /// Removes `id` and its subtree. Returns the removed identifiers.
    pub(crate) fn remove_subtree(&mut self, id: KeyId) -> Vec<KeyId> {
        let removed = self.descendants(id);
        if let Some(parent) = self.parent(id) {
            if let Ok(parent_key) = self.key_mut(parent) {
                parent_key.children.retain(|c| *c != id);
            }
        }
        for k in &removed {
            if let Some(slot) = self.keys.get_mut(k.index()) {
                *slot = None;
            }
        }
        removed
    }

    pub(crate) fn link_twins(&mut self, a: KeyId, b: KeyId) -> Result<()> {
        self.key_mut(a)?.twin = Some(b);
        self.key_mut(b)?.twin = Some(a);
        Ok(())
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Assigns rows to the children of `container`.
    pub(crate) fn layout(&mut self, container: KeyId) {
        let children = self.children(container).to_vec();
        let mut row = 0u32;
        for child in children {
            if self.is_secondary_twin(child) {
                continue;
            }
            let Some(key) = self.get(child) else { continue };
            if key.is_ghost {
                if let Ok(key) = self.key_mut(child) {
                    key.row = None;
                    key.label_row = None;
                }
                continue;
            }
            let twin = key.twin;
            let twin_key = twin.and_then(|t| self.get(t));
            let independent_label =
                key.independent_label || twin_key.is_some_and(|t| t.independent_label);
            let rowspan = key.rowspan.max(twin_key.map(|t| t.rowspan).unwrap_or(1));

            let label_row = independent_label.then(|| {
                let r = row;
                row += 1;
                r
            });
            for member in std::iter::once(child).chain(twin) {
                if let Ok(key) = self.key_mut(member) {
                    key.row = Some(row);
                    key.label_row = label_row;
                }
            }
            row += rowspan;
        }
    }

    /// Lays out every container of the tree.
    pub(crate) fn layout_all(&mut self) {
        for id in self.descendants(self.root) {
            if self.get(id).is_some_and(|k| !k.children.is_empty()) {
                self.layout(id);
            }
        }
    }

    /// Lays out `container` again and reports the keys whose coordinates
    /// changed, ignoring keys in `fresh`.
    pub(crate) fn relayout(&mut self, container: KeyId, fresh: &[KeyId]) -> Vec<Move> {
        let before: Vec<(KeyId, Option<u32>, Option<u32>)> = self
            .children(container)
            .iter()
            .filter_map(|c| self.get(*c).map(|k| (*c, k.row, k.label_row)))
            .collect();
        self.layout(container);
        before
            .into_iter()
            .filter(|(id, _, _)| !fresh.contains(id))
            .filter_map(|(id, row, label_row)| {
                let key = self.get(id)?;
                let moved = key.row.is_some() && (key.row != row || key.label_row != label_row);
                moved.then(|| Move {
                    key: id,
                    row: key.row.unwrap_or(0),
                    rowspan: key.rowspan,
                    label_row: key.label_row,
                })
            })
            .collect()
    }
}
