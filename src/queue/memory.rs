use crate::error::{QueueError, QueueResult};
use crate::queue::{Message, Queue};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct StoredMessage {
    id: String,
    payload: Vec<u8>,
}

struct PendingEntry {
    index: usize,
    consumer: String,
    delivery_count: u32,
}

struct GroupState {
    next_index: usize,
    pending: HashMap<String, PendingEntry>,
}

#[derive(Default)]
struct StreamState {
    messages: Vec<StoredMessage>,
    groups: HashMap<String, GroupState>,
}

/// In-process queue with the same consumer-group / pending-message
/// semantics as `RedisStreamQueue`, backing unit tests and single-process
/// local runs without a live Redis instance.
#[derive(Default)]
pub struct MemoryQueue {
    streams: Mutex<HashMap<String, StreamState>>,
    counters: Mutex<HashMap<String, i64>>,
    next_id: Mutex<u64>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_message_id(&self) -> String {
        let mut guard = self.next_id.lock();
        *guard += 1;
        format!("{}-0", *guard)
    }
}

impl Queue for MemoryQueue {
    fn ensure_group(&self, stream: &str, group: &str) -> QueueResult<()> {
        let mut streams = self.streams.lock();
        let state = streams.entry(stream.to_string()).or_default();
        state.groups.entry(group.to_string()).or_insert_with(|| GroupState {
            next_index: 0,
            pending: HashMap::new(),
        });
        Ok(())
    }

    fn enqueue(&self, stream: &str, payload: &[u8]) -> QueueResult<String> {
        let id = self.next_message_id();
        let mut streams = self.streams.lock();
        let state = streams.entry(stream.to_string()).or_default();
        state.messages.push(StoredMessage {
            id: id.clone(),
            payload: payload.to_vec(),
        });
        Ok(id)
    }

    fn consume(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<Message>> {
        let deadline = Instant::now() + Duration::from_millis(block_ms);
        loop {
            {
                let mut streams = self.streams.lock();
                let state = streams
                    .get_mut(stream)
                    .ok_or_else(|| QueueError::Unavailable(format!("stream '{stream}' has no messages yet")))?;
                let group_state = state
                    .groups
                    .get_mut(group)
                    .ok_or_else(|| QueueError::UnknownGroup(group.to_string()))?;

                let available = state.messages.len().saturating_sub(group_state.next_index);
                if available > 0 {
                    let take = available.min(count.max(1));
                    let mut out = Vec::with_capacity(take);
                    for _ in 0..take {
                        let idx = group_state.next_index;
                        let msg = &state.messages[idx];
                        group_state.pending.insert(
                            msg.id.clone(),
                            PendingEntry {
                                index: idx,
                                consumer: consumer.to_string(),
                                delivery_count: 1,
                            },
                        );
                        out.push(Message {
                            id: msg.id.clone(),
                            payload: msg.payload.clone(),
                            delivery_count: 1,
                        });
                        group_state.next_index += 1;
                    }
                    return Ok(out);
                }
            }

            if Instant::now() >= deadline {
                return Ok(Vec::new());
            }
            std::thread::sleep(Duration::from_millis(5.min(block_ms.max(1))));
        }
    }

    fn pending(&self, stream: &str, group: &str, consumer: &str, count: usize) -> QueueResult<Vec<Message>> {
        let mut streams = self.streams.lock();
        let state = match streams.get_mut(stream) {
            Some(s) => s,
            None => return Ok(Vec::new()),
        };
        let group_state = state
            .groups
            .get_mut(group)
            .ok_or_else(|| QueueError::UnknownGroup(group.to_string()))?;

        let mut out = Vec::new();
        for entry in group_state.pending.values_mut() {
            if entry.consumer != consumer {
                continue;
            }
            entry.delivery_count += 1;
            let msg = &state.messages[entry.index];
            out.push(Message {
                id: msg.id.clone(),
                payload: msg.payload.clone(),
                delivery_count: entry.delivery_count,
            });
            if out.len() >= count {
                break;
            }
        }
        Ok(out)
    }

    fn ack(&self, stream: &str, group: &str, id: &str) -> QueueResult<()> {
        let mut streams = self.streams.lock();
        if let Some(state) = streams.get_mut(stream) {
            if let Some(group_state) = state.groups.get_mut(group) {
                group_state.pending.remove(id);
            }
        }
        Ok(())
    }

    fn incr(&self, counter: &str) -> QueueResult<i64> {
        let mut counters = self.counters.lock();
        let value = counters.entry(counter.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    fn del(&self, counter: &str) -> QueueResult<()> {
        self.counters.lock().remove(counter);
        Ok(())
    }
}
