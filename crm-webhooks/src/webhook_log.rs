//! In-memory log of received webhook payloads.
//!
//! Used only as a display fallback when the store cannot be read. Bounded:
//! once full, the oldest payload is dropped for each new one.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

pub struct WebhookLog {
    entries: Mutex<VecDeque<Value>>,
    capacity: usize,
}

impl WebhookLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Append a payload and return how many are now held
    pub fn push(&self, entry: Value) -> usize {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        entries.len()
    }

    /// All held payloads, oldest first
    pub fn snapshot(&self) -> Vec<Value> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_push_and_snapshot() {
        let log = WebhookLog::new(10);
        assert_eq!(log.len(), 0);

        assert_eq!(log.push(json!({"n": 1})), 1);
        assert_eq!(log.push(json!({"n": 2})), 2);

        assert_eq!(log.snapshot(), vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let log = WebhookLog::new(3);
        for n in 0..5 {
            log.push(json!({ "n": n }));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.snapshot(), vec![json!({"n": 2}), json!({"n": 3}), json!({"n": 4})]);
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let log = WebhookLog::new(0);
        assert_eq!(log.capacity(), 1);
        log.push(json!(1));
        log.push(json!(2));
        assert_eq!(log.snapshot(), vec![json!(2)]);
    }

    #[test]
    fn test_concurrent_pushes() {
        let log = Arc::new(WebhookLog::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        log.push(json!({ "thread": t, "n": n }));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), 400);
    }
}
