//! InterestCatalog: the predefined and custom interest pools plus the
//! user's ordered selection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::store::{self, KeyValueStore, keys};

use super::normalizer::normalize;
use super::vocabulary::{PREDEFINED_INTERESTS, SynonymTable};

/// A canonical interest name from the controlled vocabulary.
pub type Interest = String;

/// Persisted interest state, stored as one unit under `"interests"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestState {
    /// Selected interests in the order the user picked them.
    #[serde(default)]
    pub selected: Vec<Interest>,
    /// User-added interests, append-only.
    #[serde(default)]
    pub custom: Vec<Interest>,
}

/// Owns the interest vocabulary and selection for one session.
pub struct InterestCatalog {
    store: Arc<dyn KeyValueStore>,
    predefined: Vec<Interest>,
    synonyms: SynonymTable,
    state: RwLock<InterestState>,
    persist_lock: Mutex<()>,
}

impl InterestCatalog {
    /// Catalog with the built-in vocabulary and an empty selection.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_vocabulary(
            store,
            PREDEFINED_INTERESTS.iter().map(|s| s.to_string()).collect(),
            SynonymTable::builtin(),
        )
    }

    /// Catalog with a caller-supplied vocabulary.
    pub fn with_vocabulary(
        store: Arc<dyn KeyValueStore>,
        predefined: Vec<Interest>,
        synonyms: SynonymTable,
    ) -> Self {
        Self {
            store,
            predefined,
            synonyms,
            state: RwLock::new(InterestState::default()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Restore the saved selection. Returns whether anything was stored.
    pub async fn load(&self) -> bool {
        match store::load_json::<InterestState>(self.store.as_ref(), keys::INTERESTS).await {
            Some(saved) => {
                info!(
                    selected = saved.selected.len(),
                    custom = saved.custom.len(),
                    "Loaded saved interests"
                );
                *self.state.write().await = saved;
                true
            }
            None => false,
        }
    }

    /// Canonicalize a raw interest string.
    pub fn normalize(&self, raw: &str) -> Interest {
        normalize(raw, &self.synonyms)
    }

    /// Predefined interests followed by custom ones.
    pub async fn all(&self) -> Vec<Interest> {
        let state = self.state.read().await;
        self.predefined
            .iter()
            .chain(state.custom.iter())
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over predefined then custom
    /// interests. A blank query returns everything.
    pub async fn search(&self, query: &str) -> Vec<Interest> {
        let needle = query.trim().to_lowercase();
        let all = self.all().await;
        if needle.is_empty() {
            return all;
        }
        all.into_iter()
            .filter(|interest| interest.to_lowercase().contains(&needle))
            .collect()
    }

    pub async fn selected(&self) -> Vec<Interest> {
        self.state.read().await.selected.clone()
    }

    pub async fn custom(&self) -> Vec<Interest> {
        self.state.read().await.custom.clone()
    }

    pub async fn is_selected(&self, interest: &str) -> bool {
        self.state.read().await.selected.iter().any(|s| s == interest)
    }

    pub async fn is_custom(&self, interest: &str) -> bool {
        self.state.read().await.custom.iter().any(|s| s == interest)
    }

    pub async fn has_selection(&self) -> bool {
        !self.state.read().await.selected.is_empty()
    }

    /// Select `interest` if unselected, otherwise deselect it. Returns the
    /// selection after the change.
    ///
    /// Names outside the vocabulary are first resolved through `normalize`.
    /// If that still names no known interest, nothing changes.
    pub async fn toggle(&self, interest: &str) -> Vec<Interest> {
        let selected = {
            let mut state = self.state.write().await;
            let resolved = if self.is_known(&state, interest) {
                interest.to_string()
            } else {
                self.normalize(interest)
            };

            match state.selected.iter().position(|s| *s == resolved) {
                Some(index) => {
                    state.selected.remove(index);
                    debug!(interest = %resolved, "Deselected interest");
                }
                None if self.is_known(&state, &resolved) => {
                    debug!(interest = %resolved, "Selected interest");
                    state.selected.push(resolved);
                }
                None => {
                    debug!(interest = interest, "Ignoring unknown interest");
                    return state.selected.clone();
                }
            }
            state.selected.clone()
        };
        self.persist().await;
        selected
    }

    /// Add a user-typed interest.
    ///
    /// Returns `None` for blank input. If the normalized name is already in
    /// the vocabulary it is returned and nothing changes. Otherwise the
    /// interest is appended to the custom pool and selected.
    pub async fn add_custom(&self, raw: &str) -> Option<Interest> {
        let normalized = self.normalize(raw);
        if normalized.is_empty() {
            debug!("Ignoring blank custom interest");
            return None;
        }

        {
            let mut state = self.state.write().await;
            if self.is_known(&state, &normalized) {
                debug!(interest = %normalized, "Interest already exists");
                return Some(normalized);
            }

            state.custom.push(normalized.clone());
            state.selected.push(normalized.clone());
        }

        info!(interest = %normalized, "Added custom interest");
        self.persist().await;
        Some(normalized)
    }

    /// Drop every selection. Custom interests stay in the pool.
    pub async fn clear_selections(&self) {
        self.state.write().await.selected.clear();
        self.persist().await;
    }

    fn is_known(&self, state: &InterestState, interest: &str) -> bool {
        self.predefined
            .iter()
            .chain(state.custom.iter())
            .any(|known| known == interest)
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.state.read().await.clone();
        store::persist_json(self.store.as_ref(), keys::INTERESTS, &snapshot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn catalog() -> (Arc<MemoryStore>, InterestCatalog) {
        let store = Arc::new(MemoryStore::new());
        let catalog = InterestCatalog::new(store.clone());
        (store, catalog)
    }

    #[tokio::test]
    async fn toggle_is_its_own_inverse() {
        let (_, catalog) = catalog();
        catalog.toggle("Yoga").await;
        let before = catalog.selected().await;

        catalog.toggle("Hiking").await;
        assert!(catalog.is_selected("Hiking").await);
        let after = catalog.toggle("Hiking").await;

        assert_eq!(after, before);
        assert!(!catalog.is_selected("Hiking").await);
    }

    #[tokio::test]
    async fn toggle_preserves_insertion_order() {
        let (_, catalog) = catalog();
        catalog.toggle("Yoga").await;
        catalog.toggle("Chess").await;
        catalog.toggle("Art").await;
        catalog.toggle("Chess").await;
        catalog.toggle("Chess").await;
        assert_eq!(catalog.selected().await, vec!["Yoga", "Art", "Chess"]);
    }

    #[tokio::test]
    async fn add_custom_normalizes_and_selects() {
        let (_, catalog) = catalog();
        let added = catalog.add_custom("  rock   climbing").await.unwrap();
        assert_eq!(added, "Rock   Climbing");

        let added = catalog.add_custom("pottery").await.unwrap();
        assert_eq!(added, "Pottery");
        assert!(catalog.is_custom("Pottery").await);
        assert!(catalog.is_selected("Pottery").await);
    }

    #[tokio::test]
    async fn add_custom_never_duplicates() {
        let (_, catalog) = catalog();
        let first = catalog.add_custom("pottery").await.unwrap();
        let second = catalog.add_custom("  POTTERY ").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(catalog.custom().await, vec!["Pottery"]);
        assert_eq!(catalog.selected().await, vec!["Pottery"]);
    }

    #[tokio::test]
    async fn add_custom_returns_predefined_without_inserting() {
        let (_, catalog) = catalog();
        assert_eq!(catalog.add_custom("jogging").await.unwrap(), "Running");
        assert_eq!(catalog.add_custom("board games").await.unwrap(), "Board Games");
        assert!(catalog.custom().await.is_empty());
        // Existing interests are not auto-selected.
        assert!(catalog.selected().await.is_empty());
    }

    #[tokio::test]
    async fn add_custom_compares_normalized_names_exactly() {
        let (_, catalog) = catalog();
        // "dj" title-cases to "Dj", which is not the predefined "DJ".
        assert_eq!(catalog.add_custom("dj").await.unwrap(), "Dj");
        assert_eq!(catalog.custom().await, vec!["Dj"]);
        assert_eq!(catalog.selected().await, vec!["Dj"]);
    }

    #[tokio::test]
    async fn toggle_ignores_names_outside_vocabulary() {
        let (store, catalog) = catalog();
        assert!(catalog.toggle("Underwater Basket Weaving").await.is_empty());
        assert!(catalog.toggle("").await.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn toggle_resolves_through_normalization() {
        let (_, catalog) = catalog();
        assert_eq!(catalog.toggle("yoga").await, vec!["Yoga"]);
        assert_eq!(catalog.toggle("jogging").await, vec!["Yoga", "Running"]);
        assert_eq!(catalog.toggle("  YOGA ").await, vec!["Running"]);
    }

    #[tokio::test]
    async fn selection_stays_within_vocabulary() {
        let (_, catalog) = catalog();
        catalog.add_custom("board  games").await;
        for name in ["yoga", "Board Games", "nope", "Board  Games", "dj", "DJ", "chess "] {
            catalog.toggle(name).await;
            let all = catalog.all().await;
            for selected in catalog.selected().await {
                assert!(all.contains(&selected), "{selected} is not a known interest");
            }
        }
    }

    #[tokio::test]
    async fn blank_custom_interest_is_ignored() {
        let (store, catalog) = catalog();
        assert!(catalog.add_custom("   ").await.is_none());
        assert!(catalog.custom().await.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_ordered() {
        let (_, catalog) = catalog();
        catalog.add_custom("Game Design").await;

        let hits = catalog.search("GAME").await;
        assert_eq!(hits, vec!["Board Games", "Video Games", "Game Design"]);
    }

    #[tokio::test]
    async fn blank_search_returns_everything() {
        let (_, catalog) = catalog();
        catalog.add_custom("Pottery").await;
        let all = catalog.search("   ").await;
        assert_eq!(all.len(), PREDEFINED_INTERESTS.len() + 1);
        assert_eq!(all.last().map(String::as_str), Some("Pottery"));
        assert_eq!(all.first().map(String::as_str), Some("Hiking"));
    }

    #[tokio::test]
    async fn mutations_persist_and_reload() {
        let (store, catalog) = catalog();
        catalog.toggle("Yoga").await;
        catalog.add_custom("Pottery").await;

        let reloaded = InterestCatalog::new(store.clone());
        assert!(reloaded.load().await);
        assert_eq!(reloaded.selected().await, vec!["Yoga", "Pottery"]);
        assert_eq!(reloaded.custom().await, vec!["Pottery"]);
    }

    #[tokio::test]
    async fn clear_selections_keeps_custom_pool() {
        let (_, catalog) = catalog();
        catalog.add_custom("Pottery").await;
        catalog.toggle("Yoga").await;
        catalog.clear_selections().await;
        assert!(!catalog.has_selection().await);
        assert_eq!(catalog.custom().await, vec!["Pottery"]);
    }

    #[tokio::test]
    async fn load_without_saved_state() {
        let (_, catalog) = catalog();
        assert!(!catalog.load().await);
        assert!(catalog.selected().await.is_empty());
    }
}
