//! ConversationEngine: per-group message logs and scripted replies.
//!
//! Every append happens under the log's write lock before anything awaits,
//! so sends to one group are stored in the order they were issued. Assistant
//! replies run as spawned tasks after a random delay and are tracked per
//! group so leaving a group can abort them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::groups::GroupMatcher;
use crate::store::{self, KeyValueStore, keys};

use super::model::Message;
use super::responder::ScriptedResponder;

/// Broadcast channel capacity for new-message events.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Timing and randomness for assistant replies.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub reply_delay_min: Duration,
    pub reply_delay_max: Duration,
    pub seed: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ChatConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            reply_delay_min: config.reply_delay_min,
            reply_delay_max: config.reply_delay_max,
            seed: config.reply_seed,
        }
    }
}

/// Message logs for every group plus the scripted assistant.
pub struct ConversationEngine {
    store: Arc<dyn KeyValueStore>,
    groups: Arc<GroupMatcher>,
    responder: ScriptedResponder,
    rng: std::sync::Mutex<StdRng>,
    delay_min: Duration,
    delay_max: Duration,
    logs: RwLock<HashMap<String, Vec<Message>>>,
    persist_lock: Mutex<()>,
    pending: std::sync::Mutex<HashMap<String, Vec<JoinHandle<()>>>>,
    tx: broadcast::Sender<Message>,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        groups: Arc<GroupMatcher>,
        responder: ScriptedResponder,
        config: ChatConfig,
    ) -> Arc<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            store,
            groups,
            responder,
            rng: std::sync::Mutex::new(rng),
            delay_min: config.reply_delay_min,
            delay_max: config.reply_delay_max.max(config.reply_delay_min),
            logs: RwLock::new(HashMap::new()),
            persist_lock: Mutex::new(()),
            pending: std::sync::Mutex::new(HashMap::new()),
            tx,
        })
    }

    /// Restore saved logs. Returns whether anything was stored.
    pub async fn load(&self) -> bool {
        match store::load_json::<HashMap<String, Vec<Message>>>(self.store.as_ref(), keys::MESSAGES)
            .await
        {
            Some(saved) => {
                info!(groups = saved.len(), "Loaded saved messages");
                *self.logs.write().await = saved;
                true
            }
            None => false,
        }
    }

    /// Subscribe to every message appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }

    /// The group's log. A group with no messages yet gets the welcome message.
    pub async fn messages(&self, group_id: &str) -> Vec<Message> {
        let (log, seeded) = {
            let mut logs = self.logs.write().await;
            let log = logs.entry(group_id.to_string()).or_default();
            let seeded = log.is_empty();
            if seeded {
                log.push(Message::welcome(group_id));
            }
            (log.clone(), seeded)
        };
        if seeded {
            debug!(group_id = group_id, "Seeded welcome message");
            self.persist().await;
        }
        log
    }

    /// Append a user message and schedule the assistant's reply.
    pub async fn send(self: &Arc<Self>, group_id: &str, sender: &str, text: &str) -> Message {
        let message = Message::user(group_id, sender, text);
        self.append(message.clone()).await;
        info!(group_id = group_id, message_id = %message.id, "Message sent");
        self.schedule_reply(group_id, text);
        message
    }

    /// Produce and append the assistant's reply to `text`.
    ///
    /// Returns `None` without touching the log if the group has been left.
    pub async fn assistant_reply(&self, group_id: &str, text: &str) -> Option<Message> {
        if !self.groups.contains(group_id).await {
            debug!(group_id = group_id, "Group gone, dropping assistant reply");
            return None;
        }
        let reply = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.responder.reply(text, &mut *rng)
        };
        let message = Message::assistant(group_id, reply);
        self.append(message.clone()).await;
        Some(message)
    }

    /// Append a message delivered from outside this session.
    pub async fn receive(&self, message: Message) {
        debug!(group_id = %message.group_id, message_id = %message.id, "Message received");
        self.append(message).await;
    }

    /// Abort replies still waiting for `group_id`. Returns how many were aborted.
    pub fn cancel_pending(&self, group_id: &str) -> usize {
        let handles = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(group_id)
            .unwrap_or_default();
        let mut aborted = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            info!(group_id = group_id, aborted, "Cancelled pending replies");
        }
        aborted
    }

    /// Abort every pending reply.
    pub fn cancel_all(&self) -> usize {
        let group_ids: Vec<String> = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        group_ids.iter().map(|id| self.cancel_pending(id)).sum()
    }

    /// Number of replies for `group_id` that have not run yet.
    pub fn pending_replies(&self, group_id: &str) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        prune_finished(&mut pending);
        pending.get(group_id).map(Vec::len).unwrap_or(0)
    }

    async fn append(&self, message: Message) {
        let group_id = message.group_id.clone();
        let summary = message.summary();
        self.logs
            .write()
            .await
            .entry(group_id.clone())
            .or_default()
            .push(message.clone());
        let _ = self.tx.send(message);
        self.persist().await;
        self.groups.update_last_message(&group_id, summary).await;
    }

    fn schedule_reply(self: &Arc<Self>, group_id: &str, text: &str) {
        let delay = self.reply_delay();
        let engine = Arc::clone(self);
        let group = group_id.to_string();
        let text = text.to_string();
        debug!(group_id = group_id, delay_ms = delay.as_millis() as u64, "Scheduling reply");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.assistant_reply(&group, &text).await;
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        prune_finished(&mut pending);
        pending.entry(group_id.to_string()).or_default().push(handle);
    }

    fn reply_delay(&self) -> Duration {
        let min = self.delay_min.as_millis() as u64;
        let max = self.delay_max.as_millis() as u64;
        if max <= min {
            return self.delay_min;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Duration::from_millis(rng.gen_range(min..=max))
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.logs.read().await.clone();
        store::persist_json(self.store.as_ref(), keys::MESSAGES, &snapshot).await;
    }
}

/// Drop finished reply tasks, and any group left with none.
fn prune_finished(pending: &mut HashMap<String, Vec<JoinHandle<()>>>) {
    pending.retain(|_, handles| {
        handles.retain(|h| !h.is_finished());
        !handles.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::model::{ASSISTANT_NAME, WELCOME_TEXT};
    use crate::location::Location;
    use crate::store::MemoryStore;

    fn quick() -> ChatConfig {
        ChatConfig {
            reply_delay_min: Duration::from_millis(10),
            reply_delay_max: Duration::from_millis(20),
            seed: Some(3),
        }
    }

    async fn setup(config: ChatConfig) -> (Arc<ConversationEngine>, Arc<GroupMatcher>, String) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let groups = Arc::new(GroupMatcher::new(Arc::clone(&store)));
        let location = Location {
            latitude: 30.27,
            longitude: -97.74,
            timestamp: 0,
            name: "Austin, Texas".to_string(),
        };
        let joined = groups
            .find_and_join(&["Hiking".to_string()], Some(&location), 10)
            .await;
        let id = joined[0].id.clone();
        let engine = ConversationEngine::new(
            store,
            Arc::clone(&groups),
            ScriptedResponder::default_rules(),
            config,
        );
        (engine, groups, id)
    }

    async fn wait_for_len(engine: &ConversationEngine, group_id: &str, len: usize) -> Vec<Message> {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let log = engine.messages(group_id).await;
                if log.len() >= len {
                    return log;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("reply arrived in time")
    }

    #[tokio::test]
    async fn first_read_seeds_welcome() {
        let (engine, _, id) = setup(quick()).await;
        let log = engine.messages(&id).await;
        assert_eq!(log.len(), 1);
        assert!(log[0].is_assistant);
        assert_eq!(log[0].text, WELCOME_TEXT);
        // Second read does not seed again.
        assert_eq!(engine.messages(&id).await.len(), 1);
    }

    #[tokio::test]
    async fn send_appends_then_assistant_replies() {
        let (engine, groups, id) = setup(quick()).await;
        engine.messages(&id).await;

        let sent = engine.send(&id, "You", "Anyone want to meet Saturday?").await;
        let log = engine.messages(&id).await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[1], sent);
        assert_eq!(
            groups.get(&id).await.unwrap().last_message.unwrap().text,
            "Anyone want to meet Saturday?"
        );

        let log = wait_for_len(&engine, &id, 3).await;
        assert_eq!(log.len(), 3);
        assert!(log[2].is_assistant);
        assert_eq!(log[2].sender, ASSISTANT_NAME);
        assert!(log[2].text.starts_with("Great idea!"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            groups.get(&id).await.unwrap().last_message.unwrap().sender,
            ASSISTANT_NAME
        );
    }

    #[tokio::test]
    async fn sends_are_stored_in_issue_order() {
        let (engine, _, id) = setup(ChatConfig {
            reply_delay_min: Duration::from_secs(30),
            reply_delay_max: Duration::from_secs(30),
            seed: Some(1),
        })
        .await;
        for text in ["one", "two", "three"] {
            engine.send(&id, "You", text).await;
        }
        let texts: Vec<String> = engine.messages(&id).await.into_iter().map(|m| m.text).collect();
        assert_eq!(texts[1..], ["one", "two", "three"]);
        assert_eq!(engine.cancel_pending(&id), 3);
    }

    #[tokio::test]
    async fn reply_dropped_after_leaving_group() {
        let (engine, groups, id) = setup(quick()).await;
        groups.leave(&id).await;
        assert!(engine.assistant_reply(&id, "hello").await.is_none());
    }

    #[tokio::test]
    async fn cancel_pending_aborts_reply() {
        let (engine, _, id) = setup(ChatConfig {
            reply_delay_min: Duration::from_millis(200),
            reply_delay_max: Duration::from_millis(200),
            seed: None,
        })
        .await;
        engine.send(&id, "You", "hi").await;
        assert_eq!(engine.pending_replies(&id), 1);
        assert_eq!(engine.cancel_pending(&id), 1);
        tokio::time::sleep(Duration::from_millis(300)).await;
        let log = engine.messages(&id).await;
        assert!(log.iter().all(|m| !m.is_assistant || m.text == WELCOME_TEXT));
    }

    #[tokio::test]
    async fn finished_replies_are_forgotten() {
        let (engine, _, id) = setup(quick()).await;
        engine.send(&id, "You", "hi").await;
        wait_for_len(&engine, &id, 3).await;

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let done = engine
                    .pending
                    .lock()
                    .unwrap()
                    .get(&id)
                    .is_none_or(|handles| handles.iter().all(|h| h.is_finished()));
                if done {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("reply task finished in time");

        // Scheduling for another group sweeps the finished entry.
        engine.send("group_elsewhere", "You", "hi").await;
        {
            let pending = engine.pending.lock().unwrap();
            assert!(!pending.contains_key(&id));
            assert!(pending.contains_key("group_elsewhere"));
        }
        assert_eq!(engine.pending_replies(&id), 0);
        engine.cancel_all();
    }

    #[tokio::test]
    async fn subscribers_see_new_messages() {
        let (engine, _, id) = setup(quick()).await;
        let mut rx = engine.subscribe();
        engine.receive(Message::user(&id, "Riley", "on my way")).await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.sender, "Riley");
        assert_eq!(msg.text, "on my way");
    }

    #[tokio::test]
    async fn logs_survive_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let groups = Arc::new(GroupMatcher::new(Arc::clone(&store)));
        let engine = ConversationEngine::new(
            Arc::clone(&store),
            Arc::clone(&groups),
            ScriptedResponder::default_rules(),
            quick(),
        );
        engine.receive(Message::user("g1", "You", "saved")).await;

        let reloaded = ConversationEngine::new(store, groups, ScriptedResponder::default_rules(), quick());
        assert!(reloaded.load().await);
        let log = reloaded.messages("g1").await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].text, "saved");
    }

    #[test]
    fn equal_delay_bounds_use_minimum() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let groups = Arc::new(GroupMatcher::new(Arc::clone(&store)));
        let engine = ConversationEngine::new(
            store,
            groups,
            ScriptedResponder::default_rules(),
            ChatConfig {
                reply_delay_min: Duration::from_millis(50),
                reply_delay_max: Duration::from_millis(50),
                seed: Some(9),
            },
        );
        assert_eq!(engine.reply_delay(), Duration::from_millis(50));
    }

    #[test]
    fn delay_within_bounds() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let groups = Arc::new(GroupMatcher::new(Arc::clone(&store)));
        let engine = ConversationEngine::new(
            store,
            groups,
            ScriptedResponder::default_rules(),
            ChatConfig::default(),
        );
        for _ in 0..50 {
            let delay = engine.reply_delay();
            assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(3));
        }
    }
}
