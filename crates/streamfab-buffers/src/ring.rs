use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tokio::sync::Notify;
use uuid::Uuid;

use crate::token::EventToken;

type Batch = HashMap<String, Vec<f64>>;

struct State {
    columns: HashMap<String, VecDeque<f64>>,
    capacity: usize,
    generation: u64,
    last_batch: Option<Batch>,
    readers: HashMap<Uuid, u64>,
}

/// Fixed-capacity ring buffer keyed by column name (spec "Graph ring
/// buffer"). `write` appends point-by-point and overwrites the oldest point
/// once full; `read` is coalescing like [`crate::LatestSlotBuffer`]; `read_all`
/// returns the whole ring in chronological order.
pub struct GraphRingBuffer {
    state: Mutex<State>,
    notify: Notify,
}

impl GraphRingBuffer {
    pub fn new(capacity: usize) -> Self {
        GraphRingBuffer {
            state: Mutex::new(State {
                columns: HashMap::new(),
                capacity,
                generation: 0,
                last_batch: None,
                readers: HashMap::new(),
            }),
            notify: Notify::new(),
        }
    }

    pub fn subscribe(&self) -> EventToken {
        let token = EventToken::new();
        let mut state = self.state.lock().unwrap();
        let cur_gen = state.generation;
        state.readers.insert(token.0, cur_gen);
        token
    }

    pub fn unsubscribe(&self, token: EventToken) {
        self.state.lock().unwrap().readers.remove(&token.0);
    }

    /// Append one batch of points. Every list in `batch` must be the same
    /// length; each point index becomes one row appended to every column's
    /// ring, including columns not present in this batch (padded with zero).
    pub fn write(&self, batch: Batch) {
        let mut state = self.state.lock().unwrap();
        let Some(&n_points) = batch.values().map(|v| v.len()).collect::<Vec<_>>().first() else {
            return;
        };
        debug_assert!(batch.values().all(|v| v.len() == n_points));

        for name in batch.keys() {
            state.columns.entry(name.clone()).or_default();
        }
        let capacity = state.capacity;
        for (name, ring) in state.columns.iter_mut() {
            let points = batch
                .get(name)
                .cloned()
                .unwrap_or_else(|| vec![0.0; n_points]);
            for p in points {
                if ring.len() >= capacity {
                    ring.pop_front();
                }
                ring.push_back(p);
            }
        }
        state.last_batch = Some(batch);
        state.generation += 1;
        drop(state);
        self.notify.notify_waiters();
    }

    /// Most recent batch written, if newer than what `token` last saw.
    /// `blocking == true` waits for the next write instead of returning `None`.
    pub async fn read(&self, token: &EventToken, blocking: bool) -> Option<Batch> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            {
                let mut state = self.state.lock().unwrap();
                let last_seen = state.readers.get(&token.0).copied().unwrap_or(0);
                if state.generation > last_seen {
                    let cur_gen = state.generation;
                    state.readers.insert(token.0, cur_gen);
                    return state.last_batch.clone();
                }
                if !blocking {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// The entire ring, oldest point first, regardless of what `token` saw.
    pub fn read_all(&self, token: &EventToken) -> Batch {
        let mut state = self.state.lock().unwrap();
        let out = state
            .columns
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().copied().collect()))
            .collect();
        let cur_gen = state.generation;
        state.readers.insert(token.0, cur_gen);
        out
    }

    /// Preserve the newest `min(n, length)` points per column; growing pads
    /// the front (oldest) with zeros.
    pub fn set_size(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        state.capacity = n;
        for ring in state.columns.values_mut() {
            while ring.len() > n {
                ring.pop_front();
            }
            while ring.len() < n {
                ring.push_front(0.0);
            }
        }
    }
}
