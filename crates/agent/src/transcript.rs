//! Per-thread conversation transcripts.
//!
//! Bounded LRU keyed by thread ID, with an idle TTL. The mutex guards map
//! operations only and is never held across an `.await`.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use docbot_config::TranscriptConfig;
use docbot_core::message::{Conversation, ConversationId, Message};
use lru::LruCache;
use tracing::debug;

struct Slot {
    conversation: Conversation,
    touched: Instant,
}

pub struct TranscriptCache {
    threads: Mutex<LruCache<String, Slot>>,
    ttl: Duration,
}

impl TranscriptCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            threads: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn from_config(config: &TranscriptConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self::new(capacity, Duration::from_secs(config.ttl_secs))
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Slot>> {
        self.threads.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn expired(&self, slot: &Slot) -> bool {
        slot.touched.elapsed() >= self.ttl
    }

    /// A copy of the thread's conversation, if cached and not expired.
    pub fn get(&self, thread_id: &str) -> Option<Conversation> {
        let mut threads = self.lock();
        let expired = self.expired(threads.get(thread_id)?);
        if expired {
            debug!(thread_id, "Transcript expired");
            threads.pop(thread_id);
            return None;
        }
        threads.peek(thread_id).map(|slot| slot.conversation.clone())
    }

    /// Replace the thread's conversation.
    pub fn put(&self, conversation: Conversation) {
        let key = conversation.id.0.clone();
        let evicted = self.lock().push(
            key.clone(),
            Slot {
                conversation,
                touched: Instant::now(),
            },
        );
        if let Some((old, _)) = evicted.filter(|(old, _)| *old != key) {
            debug!(thread_id = %old, "Transcript evicted");
        }
    }

    /// Append messages to the thread, starting it if needed. Returns the
    /// updated conversation.
    pub fn append<I>(&self, thread_id: &str, messages: I) -> Conversation
    where
        I: IntoIterator<Item = Message>,
    {
        let mut threads = self.lock();
        let mut conversation = match threads.pop(thread_id) {
            Some(slot) if !self.expired(&slot) => slot.conversation,
            _ => Conversation::with_id(ConversationId::from(thread_id)),
        };
        for message in messages {
            conversation.push(message);
        }
        threads.push(
            thread_id.to_string(),
            Slot {
                conversation: conversation.clone(),
                touched: Instant::now(),
            },
        );
        conversation
    }

    pub fn remove(&self, thread_id: &str) -> Option<Conversation> {
        self.lock().pop(thread_id).map(|slot| slot.conversation)
    }

    /// Drop every expired thread. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut threads = self.lock();
        let stale: Vec<String> = threads
            .iter()
            .filter(|(_, slot)| self.expired(slot))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            threads.pop(id);
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
