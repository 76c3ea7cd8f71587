use serde::Serialize;
use std::collections::BTreeSet;

/// Image-file identifiers picked for a bulk action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` when `checked`, removes it otherwise.
    pub fn toggle(&mut self, id: &str, checked: bool) -> SelectionSummary {
        if checked {
            self.ids.insert(id.to_string());
        } else {
            self.ids.remove(id);
        }
        self.summary()
    }

    pub fn select_all<'a, I>(&mut self, ids: I) -> SelectionSummary
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.ids.extend(ids.into_iter().map(str::to_string));
        self.summary()
    }

    pub fn deselect_all(&mut self) -> SelectionSummary {
        self.ids.clear();
        self.summary()
    }

    /// Drops every member not accepted by `keep`.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.ids.len();
        self.ids.retain(|id| keep(id));
        before - self.ids.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn summary(&self) -> SelectionSummary {
        SelectionSummary::from_count(self.ids.len())
    }
}

/// What a selection counter and its bulk-action button need to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub count: usize,
    pub label: String,
    pub bulk_enabled: bool,
}

impl SelectionSummary {
    pub fn from_count(count: usize) -> Self {
        Self {
            count,
            label: format!("{count} selected"),
            bulk_enabled: count > 0,
        }
    }
}
