use indexmap::IndexSet;

use super::entry::CatalogEntry;

/// Search term and type selection applied to a loaded collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    search_term: String,
    types: IndexSet<String>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.set_search(term);
        self
    }

    pub fn with_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types
            .extend(types.into_iter().map(|ty| ty.into().to_lowercase()));
        self
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into().trim().to_string();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Selected types in the order they were selected.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    /// Select `ty` if it is not selected, deselect it otherwise.
    pub fn toggle_type(&mut self, ty: &str) {
        let ty = ty.to_lowercase();
        if !self.types.shift_remove(&ty) {
            self.types.insert(ty);
        }
    }

    pub fn clear(&mut self) {
        self.search_term.clear();
        self.types.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.types.is_empty()
    }

    /// Name or id matches the search term, and the entry has at least one of
    /// the selected types. An empty term or selection matches everything.
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        self.matches_search(entry.name(), entry.id()) && self.matches_types(entry.type_names())
    }

    fn matches_search(&self, name: &str, id: u32) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        name.to_lowercase()
            .contains(&self.search_term.to_lowercase())
            || id.to_string().contains(&self.search_term)
    }

    fn matches_types<'a>(&self, mut type_names: impl Iterator<Item = &'a str>) -> bool {
        self.types.is_empty() || type_names.any(|name| self.types.contains(name))
    }

    /// The entries of `entries` that match, in order.
    pub fn apply<'a, E>(
        &'a self,
        entries: impl IntoIterator<Item = &'a E> + 'a,
    ) -> impl Iterator<Item = &'a E> + 'a
    where
        E: AsRef<CatalogEntry> + 'a,
    {
        entries
            .into_iter()
            .filter(move |entry| self.matches(AsRef::<CatalogEntry>::as_ref(*entry)))
    }
}

impl AsRef<CatalogEntry> for CatalogEntry {
    fn as_ref(&self) -> &CatalogEntry {
        self
    }
}
