//! Tree mutations. Each operation validates first and mutates after, so a
//! failed call leaves the tree as it was.

use crate::diff::Diff;
use crate::error::{Result, TreeError};
use crate::key::{KeyId, KeyKind, ValueSource, ValueState};
use crate::tree::KeyTree;
use crate::value::{expects_iri, prepare_value};
use plume_rdf::literal::DurationUnit;
use plume_rdf::{Literal, Term};
use plume_shape::VocabularyError;

impl KeyTree {
    // ========================================================================
    // Sources
    // ========================================================================

    /// Source currently governing `key`: `Manual` for the property group of
    /// a twin pair, the value key's source otherwise.
    pub fn current_source(&self, key: KeyId) -> Option<ValueSource> {
        let k = self.get(key)?;
        match &k.kind {
            KeyKind::GroupOfProperties { .. } if k.twin.is_some() => Some(ValueSource::Manual),
            KeyKind::Value(state) => state.source.clone(),
            _ => None,
        }
    }

    /// Sources `key` may switch to.
    pub fn authorized_sources(&self, key: KeyId) -> Vec<ValueSource> {
        let Some(d) = self.descriptor(key) else {
            return Vec::new();
        };
        if !expects_iri(d) {
            return Vec::new();
        }
        let mut sources: Vec<ValueSource> = d
            .sources
            .iter()
            .map(|s| ValueSource::Vocabulary(s.clone()))
            .collect();
        if !d.sources.is_empty() {
            sources.push(ValueSource::Unreferenced);
        }
        if d.has_twin() {
            if d.sources.is_empty() {
                sources.push(ValueSource::Uri);
            }
            sources.push(ValueSource::Manual);
        }
        sources
    }

    pub fn change_source(&mut self, key: KeyId, source: ValueSource) -> Result<Diff> {
        let k = self.key(key)?;
        if self.is_hidden(key) {
            return Err(TreeError::forbidden(key, "source of a hidden key"));
        }
        if k.is_read_only {
            return Err(TreeError::forbidden(key, "read-only key"));
        }
        let current = self
            .current_source(key)
            .ok_or_else(|| TreeError::forbidden(key, "key has no source"))?;
        if current == source {
            return Ok(Diff::default());
        }
        if matches!(
            (&current, &source),
            (ValueSource::Manual, ValueSource::Unreferenced) | (ValueSource::Unreferenced, ValueSource::Manual)
        ) {
            return Err(TreeError::forbidden(
                key,
                "no direct switch between manual and unreferenced",
            ));
        }
        if !self.authorized_sources(key).contains(&source) {
            return Err(TreeError::forbidden(key, format!("source {source:?} not authorized")));
        }
        if let Some(vocabulary) = source.vocabulary() {
            if !self.vocabularies.contains(vocabulary) {
                return Err(VocabularyError::UnknownSource(vocabulary.to_string()).into());
            }
        }
        let twin = k.twin;
        let mut diff = Diff::default();

        match (current == ValueSource::Manual, source == ValueSource::Manual) {
            (false, true) => {
                let group = twin.ok_or_else(|| TreeError::breach(key, "manual source without twin"))?;
                self.key_mut(key)?.is_hidden = true;
                self.key_mut(group)?.is_hidden = false;
                diff.values = self.clear_values(group)?;
                diff.hide.push(key);
                diff.show.push(group);
                diff.source_menus = vec![group, key];
            }
            (true, false) => {
                let value = twin.ok_or_else(|| TreeError::breach(key, "manual source without twin"))?;
                let state = self.value_state_mut(value)?;
                state.source = Some(source);
                state.value = None;
                self.key_mut(value)?.is_hidden = false;
                self.key_mut(key)?.is_hidden = true;
                diff.hide.push(key);
                diff.show.push(value);
                diff.source_menus = vec![value, key];
                diff.concept_lists.push(value);
                diff.values.push(value);
            }
            _ => {
                let state = self.value_state_mut(key)?;
                state.source = Some(source);
                state.value = None;
                diff.source_menus.push(key);
                if let Some(twin) = twin {
                    diff.source_menus.push(twin);
                }
                diff.concept_lists.push(key);
                diff.values.push(key);
            }
        }
        tracing::debug!(key = %key, from = ?current, "source changed");
        Ok(diff)
    }

    /// Empties every value below `id`. Returns the keys that held one.
    fn clear_values(&mut self, id: KeyId) -> Result<Vec<KeyId>> {
        let mut cleared = Vec::new();
        for k in self.descendants(id) {
            if let Some(state) = self.key_mut(k)?.kind.as_value_mut() {
                if state.value.take().is_some() {
                    cleared.push(k);
                }
            }
        }
        Ok(cleared)
    }

    pub(crate) fn value_state_mut(&mut self, key: KeyId) -> Result<&mut ValueState> {
        self.key_mut(key)?
            .kind
            .as_value_mut()
            .ok_or_else(|| TreeError::forbidden(key, "not a value key"))
    }

    // ========================================================================
    // Languages and units
    // ========================================================================

    pub fn change_language(&mut self, key: KeyId, language: &str) -> Result<Diff> {
        let language = language.trim().to_lowercase();
        let k = self.key(key)?;
        let state = k
            .value_state()
            .ok_or_else(|| TreeError::forbidden(key, "not a value key"))?;
        let current = state
            .language
            .clone()
            .ok_or_else(|| TreeError::forbidden(key, "value has no language"))?;
        if k.is_read_only {
            return Err(TreeError::forbidden(key, "read-only key"));
        }
        if current == language {
            return Ok(Diff::default());
        }
        let parent = k.parent;
        let mut diff = Diff::default();

        let group_pool = parent.and_then(|p| match &self.get(p)?.kind {
            KeyKind::TranslationGroup { available } => Some((p, available.clone())),
            _ => None,
        });
        match group_pool {
            Some((group, mut available)) => {
                let holder = self.children(group).iter().copied().find(|c| {
                    *c != key
                        && self.get(*c).is_some_and(|s| {
                            !s.is_ghost
                                && s.value_state().and_then(|v| v.language.as_deref())
                                    == Some(language.as_str())
                        })
                });
                match holder {
                    Some(holder) => self.retag(holder, &current)?,
                    None if available.contains(&language) => {
                        available.retain(|l| *l != language);
                        available.push(current.clone());
                        let langlist = &self.options.langlist;
                        available.sort_by_key(|l| langlist.iter().position(|x| x == l).unwrap_or(usize::MAX));
                        if let KeyKind::TranslationGroup { available: slot } = &mut self.key_mut(group)?.kind {
                            *slot = available;
                        }
                    }
                    None => {
                        return Err(TreeError::forbidden(
                            key,
                            format!("language {language} is not available in this group"),
                        ))
                    }
                }
                diff.language_menus = self
                    .children(group)
                    .iter()
                    .copied()
                    .filter(|c| self.get(*c).is_some_and(|s| !s.is_ghost && s.value_state().is_some()))
                    .collect();
            }
            None => {
                if !self.options.langlist.contains(&language) {
                    return Err(TreeError::forbidden(
                        key,
                        format!("language {language} is not authorized"),
                    ));
                }
                diff.language_menus.push(key);
            }
        }
        self.retag(key, &language)?;
        Ok(diff)
    }

    fn retag(&mut self, key: KeyId, language: &str) -> Result<()> {
        let state = self.value_state_mut(key)?;
        state.language = Some(language.to_string());
        if let Some(Term::Literal(lit)) = &state.value {
            if lit.language.is_some() {
                state.value = Some(Term::Literal(Literal::lang(lit.lexical.clone(), language)));
            }
        }
        Ok(())
    }

    /// Switches the unit of a duration. The stored literal only follows on
    /// the next `update_value`.
    pub fn change_unit(&mut self, key: KeyId, unit: DurationUnit) -> Result<Diff> {
        let k = self.key(key)?;
        let current = k
            .value_state()
            .and_then(|s| s.unit)
            .ok_or_else(|| TreeError::forbidden(key, "value has no unit"))?;
        if k.is_read_only {
            return Err(TreeError::forbidden(key, "read-only key"));
        }
        if current == unit {
            return Ok(Diff::default());
        }
        self.value_state_mut(key)?.unit = Some(unit);
        Ok(Diff {
            unit_menus: vec![key],
            ..Diff::default()
        })
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Stores the form input `raw`. Malformed input clears the value.
    pub fn update_value(&mut self, key: KeyId, raw: Option<&str>) -> Result<()> {
        let k = self.key(key)?;
        let state = k
            .value_state()
            .ok_or_else(|| TreeError::forbidden(key, "not a value key"))?;
        if k.is_read_only {
            return Err(TreeError::forbidden(key, "read-only key"));
        }
        let descriptor = self
            .descriptor(key)
            .ok_or_else(|| TreeError::breach(key, "value key without descriptor"))?;
        let term = prepare_value(raw, state, descriptor, self.vocabularies, &self.options.langlist)?;
        if term.is_none() && raw.is_some_and(|r| !r.trim().is_empty()) {
            tracing::debug!(key = %key, path = %descriptor.path, "malformed input, value cleared");
        }
        self.value_state_mut(key)?.value = term;
        Ok(())
    }

    // ========================================================================
    // Add / drop
    // ========================================================================

    /// Adds an empty sibling before `button`.
    pub fn add(&mut self, button: KeyId) -> Result<Diff> {
        let b = self.key(button)?;
        if !b.is_button() {
            return Err(TreeError::forbidden(button, "not a button"));
        }
        if self.is_hidden(button) || self.is_ghost(button) {
            return Err(TreeError::forbidden(button, "button is not displayed"));
        }
        let group = b
            .parent
            .ok_or_else(|| TreeError::breach(button, "button without group"))?;
        let reference = self
            .real_children(group)
            .first()
            .copied()
            .or_else(|| {
                self.children(group)
                    .iter()
                    .copied()
                    .find(|c| self.get(*c).is_some_and(|k| !k.is_button()) && !self.is_secondary_twin(*c))
            })
            .ok_or_else(|| TreeError::breach(group, "value group without values"))?;
        let language = match &self.key(group)?.kind {
            KeyKind::TranslationGroup { available } => Some(
                available
                    .first()
                    .cloned()
                    .ok_or_else(|| TreeError::forbidden(button, "every language is already used"))?,
            ),
            _ => None,
        };
        let was_single = self.real_children(group).len() == 1;

        let mut created = Vec::new();
        let copies = self.copy_members(reference, group, Some(button), &mut created)?;
        let mut diff = Diff::default();

        if let Some(language) = language {
            for copy in &copies {
                if self.get(*copy).is_some_and(|k| k.value_state().is_some()) {
                    self.value_state_mut(*copy)?.language = Some(language.clone());
                }
            }
            let mut exhausted = false;
            if let KeyKind::TranslationGroup { available } = &mut self.key_mut(group)?.kind {
                available.retain(|l| *l != language);
                exhausted = available.is_empty();
            }
            if exhausted {
                self.key_mut(button)?.is_hidden = true;
                diff.hide.push(button);
            }
        }

        if was_single {
            diff.show_minus = self
                .pair(reference)
                .into_iter()
                .filter(|m| self.get(*m).is_some_and(|k| k.has_minus_button))
                .collect();
        }

        for id in &created {
            if self.get(*id).is_some_and(|k| !k.children.is_empty()) {
                self.layout(*id);
            }
        }
        diff.moves = self.relayout(group, &created);

        let visible = copies
            .iter()
            .copied()
            .find(|c| self.get(*c).is_some_and(|k| !k.is_hidden))
            .unwrap_or(copies[0]);
        diff.new_keys.push(visible);
        diff.new_keys
            .extend(created.into_iter().filter(|id| *id != visible));
        tracing::debug!(button = %button, new = %visible, "value added");
        Ok(diff)
    }

    /// Copies `source` (and its twin) as empty keys under `parent`.
    /// Returns the copies, copy of `source` first.
    fn copy_members(
        &mut self,
        source: KeyId,
        parent: KeyId,
        before: Option<KeyId>,
        created: &mut Vec<KeyId>,
    ) -> Result<Vec<KeyId>> {
        let twin = self.key(source)?.twin;
        let main = self.copy_empty(source, parent, before, created)?;
        let Some(twin) = twin else {
            return Ok(vec![main]);
        };
        let other = self.copy_empty(twin, parent, before, created)?;
        self.link_twins(main, other)?;
        Ok(vec![main, other])
    }

    fn copy_empty(
        &mut self,
        source: KeyId,
        parent: KeyId,
        before: Option<KeyId>,
        created: &mut Vec<KeyId>,
    ) -> Result<KeyId> {
        let src = self.key(source)?.clone();
        let long_text = self.descriptor(source).is_some_and(|d| d.is_long_text);
        let rowspan = if long_text {
            self.descriptor(source)
                .and_then(|d| d.rowspan)
                .unwrap_or(self.options.text_edit_row_span)
        } else {
            1
        };
        let first_source = self
            .descriptor(source)
            .and_then(|d| d.sources.first().cloned())
            .map(ValueSource::Vocabulary);
        let kind = match &src.kind {
            KeyKind::Value(state) => KeyKind::Value(ValueState {
                value: None,
                language: state.language.as_ref().map(|_| self.options.language.clone()),
                source: match &state.source {
                    Some(ValueSource::Unreferenced) => first_source,
                    other => other.clone(),
                },
                unit: state.unit.map(|_| DurationUnit::default()),
                is_long_text: long_text,
            }),
            KeyKind::TranslationGroup { .. } => KeyKind::TranslationGroup {
                available: self.options.langlist.clone(),
            },
            other => other.clone(),
        };
        let is_value = matches!(src.kind, KeyKind::Value(_));
        let in_group = self.get(parent).is_some_and(|p| p.kind.is_value_group());
        let long_label = self
            .descriptor(source)
            .is_some_and(|d| d.label_or_predicate().chars().count() > self.options.label_length_limit);
        let id = match before {
            Some(before) => self.insert_before(kind, parent, before)?,
            None => self.push(kind, Some(parent)),
        };
        {
            let key = self.key_mut(id)?;
            key.path = src.path.clone();
            key.descriptor = src.descriptor;
            key.is_hidden = src.is_hidden && !src.kind.is_button();
            key.is_ghost = src.is_ghost;
            key.has_minus_button = src.has_minus_button;
            key.is_read_only = src.is_read_only;
            if is_value {
                key.independent_label = !in_group && (long_text || long_label);
                key.rowspan = rowspan;
            } else {
                key.independent_label = src.independent_label;
                key.rowspan = src.rowspan;
            }
        }
        created.push(id);

        match &src.kind {
            KeyKind::GroupOfProperties { .. } => {
                for child in src.children.iter().copied() {
                    if self.is_secondary_twin(child) {
                        continue;
                    }
                    self.copy_members(child, id, None, created)?;
                }
            }
            kind if kind.is_value_group() => {
                let first = self.real_children(source).first().copied().or_else(|| {
                    src.children
                        .iter()
                        .copied()
                        .find(|c| self.get(*c).is_some_and(|k| !k.is_button()) && !self.is_secondary_twin(*c))
                });
                if let Some(first) = first {
                    let copies = self.copy_members(first, id, None, created)?;
                    for copy in copies {
                        if let Ok(key) = self.key_mut(copy) {
                            key.is_ghost = false;
                        }
                    }
                }
                if let Some(button) = self.button(source) {
                    self.copy_empty(button, id, None, created)?;
                }
                self.reset_translation_pool(id)?;
            }
            _ => {}
        }
        Ok(id)
    }

    /// Recomputes a copied translation group's pool from its only child.
    fn reset_translation_pool(&mut self, group: KeyId) -> Result<()> {
        if !matches!(self.key(group)?.kind, KeyKind::TranslationGroup { .. }) {
            return Ok(());
        }
        let used: Vec<String> = self
            .children(group)
            .iter()
            .filter_map(|c| self.get(*c)?.value_state()?.language.clone())
            .collect();
        let available: Vec<String> = self
            .options
            .langlist
            .iter()
            .filter(|l| !used.contains(l))
            .cloned()
            .collect();
        let exhausted = available.is_empty();
        if let KeyKind::TranslationGroup { available: slot } = &mut self.key_mut(group)?.kind {
            *slot = available;
        }
        if let Some(button) = self.button(group) {
            self.key_mut(button)?.is_hidden = exhausted;
        }
        Ok(())
    }

    /// Removes a value (and its twin) from its group.
    pub fn drop(&mut self, key: KeyId) -> Result<Diff> {
        let k = self.key(key)?;
        if !matches!(k.kind, KeyKind::Value(_) | KeyKind::GroupOfProperties { .. }) {
            return Err(TreeError::forbidden(key, "only values and property groups can be dropped"));
        }
        let group = k
            .parent
            .filter(|p| self.get(*p).is_some_and(|g| g.kind.is_value_group()))
            .ok_or_else(|| TreeError::forbidden(key, "not in a group of values"))?;
        if !k.has_minus_button {
            return Err(TreeError::forbidden(key, "key has no minus button"));
        }
        if self.is_hidden(key) || self.is_ghost(key) {
            return Err(TreeError::forbidden(key, "key is not displayed"));
        }
        if self.is_single_child(key) {
            return Err(TreeError::forbidden(key, "last value of the group"));
        }

        let members = self.pair(key);
        let language = members
            .iter()
            .find_map(|m| self.get(*m)?.value_state()?.language.clone());
        let mut diff = Diff::default();
        for member in members {
            diff.drop.extend(self.remove_subtree(member));
        }

        if let Some(language) = language {
            let still_used = self.children(group).iter().any(|c| {
                self.get(*c)
                    .and_then(|k| k.value_state())
                    .and_then(|s| s.language.as_deref())
                    == Some(language.as_str())
            });
            let langlist = self.options.langlist.clone();
            let mut restored = false;
            if let KeyKind::TranslationGroup { available } = &mut self.key_mut(group)?.kind {
                if !still_used && langlist.contains(&language) && !available.contains(&language) {
                    available.push(language);
                    available.sort_by_key(|l| langlist.iter().position(|x| x == l).unwrap_or(usize::MAX));
                    restored = true;
                }
            }
            if restored {
                if let Some(button) = self.button(group) {
                    if self.key(button)?.is_hidden {
                        self.key_mut(button)?.is_hidden = false;
                        diff.show.push(button);
                    }
                }
            }
        }

        let remaining = self.real_children(group);
        if remaining.len() == 1 {
            diff.hide_minus = self
                .pair(remaining[0])
                .into_iter()
                .filter(|m| self.get(*m).is_some_and(|k| k.has_minus_button))
                .collect();
        }
        diff.moves = self.relayout(group, &[]);
        tracing::debug!(key = %key, "value dropped");
        Ok(diff)
    }
}
