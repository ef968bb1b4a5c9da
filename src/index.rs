use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::session::Session;

/// One subject subscription. The owning session is held weakly so the index
/// never keeps a dead session alive; fan-out skips a subscription whose
/// session has already gone away.
#[derive(Debug)]
pub struct Subscription {
    pub subject: String,
    pub sid: String,
    pub session: Weak<Session>,
}

/// Broker-global map from subject to its current subscribers, in insertion
/// order (delivery order).
#[derive(Default)]
pub struct SubscriptionIndex {
    buckets: Mutex<HashMap<String, Vec<Arc<Subscription>>>>,
}

impl SubscriptionIndex {
    pub fn new() -> Self {
        SubscriptionIndex {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn add(&self, subscription: Arc<Subscription>) {
        self.buckets
            .lock()
            .entry(subscription.subject.clone())
            .or_insert_with(Vec::new)
            .push(subscription);
    }

    /// Removes the subscription matching `sid` and `session` from every
    /// bucket it appears in, pruning any bucket left empty. Returns whether
    /// anything was removed.
    pub fn remove_by_sid_and_session(&self, sid: &str, session: &Arc<Session>) -> bool {
        let mut removed = false;
        let mut buckets = self.buckets.lock();
        buckets.retain(|_subject, subs| {
            subs.retain(|sub| {
                let keep = !(sub.sid == sid && sub.session.upgrade().map_or(false, |s| Arc::ptr_eq(&s, session)));
                if !keep {
                    removed = true;
                }
                keep
            });
            !subs.is_empty()
        });
        removed
    }

    /// Sweeps every bucket of subscriptions owned by `session` (including
    /// ones whose weak reference has already expired for this session),
    /// pruning emptied buckets. Returns the number removed.
    pub fn remove_session(&self, session: &Arc<Session>) -> usize {
        let mut removed = 0usize;
        let mut buckets = self.buckets.lock();
        buckets.retain(|_subject, subs| {
            subs.retain(|sub| {
                let belongs_to_session = match sub.session.upgrade() {
                    Some(s) => Arc::ptr_eq(&s, session),
                    None => false,
                };
                if belongs_to_session {
                    removed += 1;
                }
                !belongs_to_session
            });
            !subs.is_empty()
        });
        removed
    }

    /// Point-in-time copy of a subject's subscribers, for fan-out. Released
    /// before any network I/O is attempted.
    pub fn snapshot(&self, subject: &str) -> Vec<Arc<Subscription>> {
        self.buckets.lock().get(subject).cloned().unwrap_or_default()
    }

    pub fn clear(&self) {
        self.buckets.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn dangling_subscription(subject: &str, sid: &str) -> Arc<Subscription> {
        // Weak::new() has no allocation and always fails to upgrade, which is
        // enough to exercise add/snapshot without building a real Session.
        Arc::new(Subscription {
            subject: subject.to_string(),
            sid: sid.to_string(),
            session: Weak::new(),
        })
    }

    #[test]
    fn snapshot_is_empty_for_unknown_subject() {
        let index = SubscriptionIndex::new();
        assert!(index.snapshot("FOO").is_empty());
    }

    #[test]
    fn add_and_snapshot_round_trips() {
        let index = SubscriptionIndex::new();
        let sub = dangling_subscription("FOO", "1");
        index.add(sub.clone());
        let snap = index.snapshot("FOO");
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].sid, "1");
        assert!(index.snapshot("BAR").is_empty());
    }
}
