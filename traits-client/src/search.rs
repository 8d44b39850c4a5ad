//! Search dispatch and the single active search result.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{info, warn};
use traits_core::{SearchKind, SearchRequest, TraitRecord};

use crate::backend::TraitsBackend;
use crate::loading::LoadingFlag;

/// A normalized lookup: trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub kind: SearchKind,
    pub is_scientific: bool,
}

impl SearchQuery {
    /// Returns `None` when nothing is left after trimming.
    ///
    /// Phylogenetic searches never use the scientific-name flag.
    pub fn new(raw: &str, kind: SearchKind, is_scientific: bool) -> Option<Self> {
        let term = raw.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }
        let is_scientific = kind == SearchKind::Species && is_scientific;
        Some(Self { term, kind, is_scientific })
    }

    pub fn to_request(&self) -> SearchRequest {
        SearchRequest::new(&self.term, self.kind, self.is_scientific)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Species { query: String, data: TraitRecord },
    Phylo { query: String, data: TraitRecord },
    NotFound(String),
    Error(String),
    Info(String),
}

impl SearchResult {
    pub fn not_found(query: &str) -> Self {
        SearchResult::NotFound(format!("No results found for \"{query}\"."))
    }

    pub fn fuzzy_unavailable(query: &str) -> Self {
        SearchResult::Info(format!("Fuzzy search for \"{query}\" is not yet implemented."))
    }
}

/// Returned when a search is submitted while another is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a search is already in progress")]
pub struct Busy;

/// Options of a species search form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeciesOptions {
    pub scientific: bool,
    pub fuzzy: bool,
}

/// Owns the currently displayed [`SearchResult`] and the loading flag.
pub struct SearchSession {
    backend: Arc<dyn TraitsBackend>,
    result: Mutex<Option<SearchResult>>,
    loading: LoadingFlag,
}

impl SearchSession {
    pub fn new(backend: Arc<dyn TraitsBackend>) -> Self {
        Self { backend, result: Mutex::new(None), loading: LoadingFlag::default() }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    pub fn current(&self) -> Option<SearchResult> {
        self.result.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub async fn search_species(
        &self,
        raw: &str,
        options: SpeciesOptions,
    ) -> Result<Option<SearchResult>, Busy> {
        self.search(raw, SearchKind::Species, options.scientific, options.fuzzy).await
    }

    pub async fn search_phylo(&self, raw: &str) -> Result<Option<SearchResult>, Busy> {
        self.search(raw, SearchKind::Phylo, false, false).await
    }

    /// Runs one search and makes its outcome the active result.
    ///
    /// An empty query clears the result without contacting the backend, and
    /// fuzzy species searches answer locally with an informational message.
    pub async fn search(
        &self,
        raw: &str,
        kind: SearchKind,
        is_scientific: bool,
        fuzzy: bool,
    ) -> Result<Option<SearchResult>, Busy> {
        let Some(_loading) = self.loading.try_begin() else {
            return Err(Busy);
        };

        let outcome = match SearchQuery::new(raw, kind, is_scientific) {
            None => None,
            Some(_) if fuzzy && kind == SearchKind::Species => {
                Some(SearchResult::fuzzy_unavailable(raw))
            }
            Some(query) => Some(self.dispatch(raw, &query).await),
        };

        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = outcome.clone();
        Ok(outcome)
    }

    async fn dispatch(&self, raw: &str, query: &SearchQuery) -> SearchResult {
        match self.backend.search(&query.to_request()).await {
            Ok(data) => match query.kind {
                SearchKind::Species => SearchResult::Species { query: raw.to_string(), data },
                SearchKind::Phylo => SearchResult::Phylo { query: raw.to_string(), data },
            },
            Err(err) if err.is_not_found() => {
                info!(term = %query.term, "no matching record");
                SearchResult::not_found(raw)
            }
            Err(err) => {
                warn!(term = %query.term, error = %err, "search failed");
                SearchResult::not_found(raw)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_term() {
        let query = SearchQuery::new("  Panthera LEO ", SearchKind::Species, true).unwrap();
        assert_eq!(query.term, "panthera leo");
        assert!(query.is_scientific);

        let phylo = SearchQuery::new("Felidae", SearchKind::Phylo, true).unwrap();
        assert!(!phylo.is_scientific);

        assert!(SearchQuery::new(" \t\n", SearchKind::Species, false).is_none());
    }

    #[test]
    fn request_uses_normalized_term() {
        let request = SearchQuery::new(" Lion", SearchKind::Species, false).unwrap().to_request();
        assert_eq!(request, SearchRequest::new("lion", SearchKind::Species, false));
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(
            SearchResult::not_found("Lion"),
            SearchResult::NotFound("No results found for \"Lion\".".into())
        );
        assert_eq!(
            SearchResult::fuzzy_unavailable("lion"),
            SearchResult::Info("Fuzzy search for \"lion\" is not yet implemented.".into())
        );
    }

    proptest! {
        #[test]
        fn normalized_terms_are_trimmed_lowercase_and_non_empty(raw in "[ \\ta-zA-Z0-9À-ÖØ-öø-ÿ]{0,24}") {
            match SearchQuery::new(&raw, SearchKind::Species, false) {
                Some(query) => {
                    prop_assert!(!query.term.is_empty());
                    prop_assert_eq!(query.term.trim(), query.term.as_str());
                    prop_assert_eq!(query.term.to_lowercase(), query.term.clone());
                }
                None => prop_assert!(raw.trim().is_empty()),
            }
        }

        #[test]
        fn normalization_is_idempotent(raw in "[ a-zA-Z]{0,16}") {
            if let Some(query) = SearchQuery::new(&raw, SearchKind::Phylo, false) {
                let again = SearchQuery::new(&query.term, SearchKind::Phylo, false).unwrap();
                prop_assert_eq!(again, query);
            }
        }
    }
}
