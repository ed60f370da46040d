//! GroupMatcher: builds and maintains the user's group collection.
//!
//! Matching is local: one synthetic group per selected interest. A backend
//! would instead look up existing groups sharing the interest within the
//! radius of the location and join or create one. Until then every match
//! run replaces the whole collection rather than merging into it.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::location::Location;
use crate::store::{self, KeyValueStore, keys};

use super::model::{Group, GroupLocation, MessageSummary};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex is valid"));

/// Synthetic member counts are drawn from this range.
const MEMBER_COUNT_RANGE: std::ops::Range<u32> = 5..55;

/// Owns the user's group collection for one session.
pub struct GroupMatcher {
    store: Arc<dyn KeyValueStore>,
    groups: RwLock<Vec<Group>>,
    /// Serializes writes so the last write always carries the newest state.
    persist_lock: Mutex<()>,
}

impl GroupMatcher {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            groups: RwLock::new(Vec::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Restore the saved groups. Returns whether anything was stored.
    pub async fn load(&self) -> bool {
        match store::load_json::<Vec<Group>>(self.store.as_ref(), keys::GROUPS).await {
            Some(saved) => {
                info!(count = saved.len(), "Loaded saved groups");
                *self.groups.write().await = saved;
                true
            }
            None => false,
        }
    }

    /// Join one group per distinct interest near `location`.
    ///
    /// Replaces the existing collection wholesale and persists it once.
    /// Without a location or interests nothing is produced and the existing
    /// collection is left alone.
    pub async fn find_and_join(
        &self,
        interests: &[String],
        location: Option<&Location>,
        radius: u32,
    ) -> Vec<Group> {
        let Some(location) = location else {
            debug!("No location, skipping group match");
            return Vec::new();
        };
        if interests.is_empty() {
            debug!("No interests, skipping group match");
            return Vec::new();
        }

        info!(
            interests = interests.len(),
            location = %location.name,
            radius,
            "Finding groups"
        );

        let now = Utc::now().timestamp_millis();
        let matched: Vec<Group> = {
            let mut rng = rand::thread_rng();
            let mut seen = HashSet::new();
            interests
                .iter()
                .filter(|interest| seen.insert(interest.as_str()))
                .enumerate()
                .map(|(index, interest)| Group {
                    // Distinct interests can share a slug.
                    id: format!("group_{}_{}_{}", slug(interest), now, index),
                    name: format!("{} - {}", interest, location.name),
                    interest: interest.clone(),
                    location: GroupLocation::from(location),
                    radius,
                    member_count: rng.gen_range(MEMBER_COUNT_RANGE),
                    unread_count: 0,
                    last_message: None,
                    joined_at: now,
                    has_assistant: true,
                })
                .collect()
        };

        *self.groups.write().await = matched.clone();
        self.persist().await;

        info!(count = matched.len(), "Joined groups");
        matched
    }

    pub async fn groups(&self) -> Vec<Group> {
        self.groups.read().await.clone()
    }

    pub async fn get(&self, group_id: &str) -> Option<Group> {
        self.groups
            .read()
            .await
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
    }

    pub async fn contains(&self, group_id: &str) -> bool {
        self.groups.read().await.iter().any(|g| g.id == group_id)
    }

    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }

    /// Remove a group from the collection. Returns whether it was present.
    pub async fn leave(&self, group_id: &str) -> bool {
        {
            let mut groups = self.groups.write().await;
            let Some(index) = groups.iter().position(|g| g.id == group_id) else {
                return false;
            };
            groups.remove(index);
        }
        info!(group_id = group_id, "Left group");
        self.persist().await;
        true
    }

    pub async fn update_last_message(&self, group_id: &str, summary: MessageSummary) {
        self.update(group_id, |group| group.last_message = Some(summary))
            .await;
    }

    pub async fn increment_unread(&self, group_id: &str) {
        self.update(group_id, |group| {
            group.unread_count = group.unread_count.saturating_add(1)
        })
        .await;
    }

    pub async fn clear_unread(&self, group_id: &str) {
        self.update(group_id, |group| group.unread_count = 0).await;
    }

    /// Apply `f` to one group and persist. Unknown ids are ignored.
    async fn update<F>(&self, group_id: &str, f: F)
    where
        F: FnOnce(&mut Group),
    {
        {
            let mut groups = self.groups.write().await;
            let Some(group) = groups.iter_mut().find(|g| g.id == group_id) else {
                debug!(group_id = group_id, "Update for unknown group ignored");
                return;
            };
            f(group);
        }
        self.persist().await;
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.groups.read().await.clone();
        store::persist_json(self.store.as_ref(), keys::GROUPS, &snapshot).await;
    }
}

/// Lowercase the interest and collapse whitespace runs into underscores.
fn slug(interest: &str) -> String {
    WHITESPACE
        .replace_all(&interest.to_lowercase(), "_")
        .into_owned()
}
