use std::collections::HashMap;
use std::sync::Arc;

use super::entry::{ActionCallback, ActionEntry};
use super::presets::ActionPreset;
use super::schema::{self, SchemaFragment};
use super::CatalogError;

/// Ordered set of actions the agent may take, unique by name.
///
/// Immutable once built; safe to share across tasks.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    entries: Vec<ActionEntry>,
    index: HashMap<String, usize>,
}

impl ActionCatalog {
    pub fn new(entries: Vec<ActionEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.name().to_string(), position).is_some() {
                return Err(CatalogError::DuplicateAction(entry.name().to_string()));
            }
        }
        Ok(Self { entries, index })
    }

    /// Build a catalog from presets, asking `callback_for` for each one's callback.
    pub fn from_presets<F>(presets: &[ActionPreset], mut callback_for: F) -> Result<Self, CatalogError>
    where
        F: FnMut(ActionPreset) -> Arc<dyn ActionCallback>,
    {
        let entries = presets
            .iter()
            .map(|preset| preset.entry(callback_for(*preset)))
            .collect();
        Self::new(entries)
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&ActionEntry> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(ActionEntry::name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn schema(&self) -> Vec<SchemaFragment> {
        schema::compile(self.iter())
    }
}

impl<'a> IntoIterator for &'a ActionCatalog {
    type Item = &'a ActionEntry;
    type IntoIter = std::slice::Iter<'a, ActionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::entry::tests::SpyCallback;

    #[test]
    fn duplicate_names_are_rejected() {
        let spy: Arc<dyn ActionCallback> = Arc::new(SpyCallback::default());
        let err = ActionCatalog::new(vec![
            ActionPreset::AskUser.entry(spy.clone()),
            ActionPreset::NavigateToUrl.entry(spy.clone()),
            ActionPreset::AskUser.entry(spy),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateAction("ask_user".into()));
    }

    #[test]
    fn lookup_is_exact() {
        let spy = Arc::new(SpyCallback::default());
        let catalog = ActionCatalog::from_presets(ActionPreset::BROWSING, |_| spy.clone()).unwrap();

        assert_eq!(catalog.len(), 7);
        assert!(catalog.get("submit_form").is_some());
        assert!(catalog.get("Submit_Form").is_none());
        assert!(catalog.get("submit_form ").is_none());
    }
}
