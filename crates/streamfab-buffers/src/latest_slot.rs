use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::Notify;
use uuid::Uuid;

use crate::token::EventToken;

struct State<T> {
    value: Option<T>,
    generation: u64,
    readers: HashMap<Uuid, u64>,
}

/// One writer, N readers, one slot. `write` replaces the stored value and
/// fires every outstanding token; a reader that never reads only ever sees
/// the most recent value (spec "Latest-slot broadcast buffer").
pub struct LatestSlotBuffer<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

impl<T: Clone> Default for LatestSlotBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> LatestSlotBuffer<T> {
    pub fn new() -> Self {
        LatestSlotBuffer {
            state: Mutex::new(State {
                value: None,
                generation: 0,
                readers: HashMap::new(),
            }),
            notify: Notify::new(),
        }
    }

    /// Register a new reader. The token starts caught up to the current
    /// value: the next `read` blocks until a write strictly after this call.
    pub fn subscribe(&self) -> EventToken {
        let token = EventToken::new();
        let mut state = self.state.lock().unwrap();
        let cur_gen = state.generation;
        state.readers.insert(token.0, cur_gen);
        token
    }

    /// Remove a reader so it stops being tracked (spec Design Notes §9:
    /// readers that disappear must be removable to avoid leaks).
    pub fn unsubscribe(&self, token: EventToken) {
        self.state.lock().unwrap().readers.remove(&token.0);
    }

    /// Replace the stored value and wake every waiting reader.
    pub fn write(&self, value: T) {
        let mut state = self.state.lock().unwrap();
        state.value = Some(value);
        state.generation += 1;
        drop(state);
        self.notify.notify_waiters();
    }

    /// Read the current value if it's newer than what `token` last saw.
    ///
    /// `blocking == true` waits for the next write; `false` returns `None`
    /// immediately when there is nothing new.
    pub async fn read(&self, token: &EventToken, blocking: bool) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            {
                let mut state = self.state.lock().unwrap();
                let last_seen = state.readers.get(&token.0).copied().unwrap_or(0);
                if state.generation > last_seen {
                    let cur_gen = state.generation;
                    state.readers.insert(token.0, cur_gen);
                    return state.value.clone();
                }
                if !blocking {
                    return None;
                }
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_blocking_read_returns_none_until_a_write_happens() {
        let buf: LatestSlotBuffer<Vec<u8>> = LatestSlotBuffer::new();
        let token = buf.subscribe();
        assert_eq!(buf.read(&token, false).await, None);
        buf.write(vec![1, 2, 3]);
        assert_eq!(buf.read(&token, false).await, Some(vec![1, 2, 3]));
        assert_eq!(buf.read(&token, false).await, None);
    }

    #[tokio::test]
    async fn a_slow_reader_only_sees_the_latest_value() {
        let buf: LatestSlotBuffer<u32> = LatestSlotBuffer::new();
        let token = buf.subscribe();
        buf.write(1);
        buf.write(2);
        buf.write(3);
        assert_eq!(buf.read(&token, false).await, Some(3));
        assert_eq!(buf.read(&token, false).await, None);
    }

    #[tokio::test]
    async fn blocking_read_wakes_on_write() {
        let buf = std::sync::Arc::new(LatestSlotBuffer::<u32>::new());
        let token = buf.subscribe();
        let reader = {
            let buf = buf.clone();
            tokio::spawn(async move { buf.read(&token, true).await })
        };
        tokio::task::yield_now().await;
        buf.write(42);
        assert_eq!(reader.await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn unsubscribed_token_is_no_longer_tracked() {
        let buf: LatestSlotBuffer<u32> = LatestSlotBuffer::new();
        let token = buf.subscribe();
        buf.unsubscribe(token);
        assert_eq!(buf.state.lock().unwrap().readers.len(), 0);
    }
}
