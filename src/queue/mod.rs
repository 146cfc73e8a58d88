//! Durable, at-least-once work queue.
//!
//! Two independent append-only streams — `ingest` and `parse_tasks` — each
//! support consumer groups, ACK, and pending-message recovery. The `Queue`
//! trait is the contract; `RedisStreamQueue` maps it onto Redis Streams
//! (`XADD`/`XREADGROUP`/`XACK`/`XPENDING`), the natural transport for this
//! shape, and `MemoryQueue` is a behaviorally-identical in-process
//! implementation used by tests and local single-process runs.

mod memory;
mod redis_stream;

pub use memory::MemoryQueue;
pub use redis_stream::RedisStreamQueue;

use crate::error::QueueResult;

/// One undelivered or pending message read back from a stream.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub payload: Vec<u8>,
    /// Number of times this message has been delivered (including this
    /// delivery). Used to bound dead-letter retries.
    pub delivery_count: u32,
}

/// Contract every queue transport implements.
pub trait Queue: Send + Sync {
    /// Idempotent: a second call for the same (stream, group) is a no-op.
    fn ensure_group(&self, stream: &str, group: &str) -> QueueResult<()>;

    /// Atomic append; returns the assigned message id.
    fn enqueue(&self, stream: &str, payload: &[u8]) -> QueueResult<String>;

    /// Returns the next undelivered messages for `consumer` in `group`,
    /// blocking up to `block_ms` if none are immediately available.
    fn consume(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<Message>>;

    /// Returns messages delivered to `consumer` but not yet ACKed —
    /// recovery after a crash. Every consumer MUST drain this before
    /// reading new messages on startup.
    fn pending(&self, stream: &str, group: &str, consumer: &str, count: usize) -> QueueResult<Vec<Message>>;

    /// Marks a message fully processed; a later `pending` call will not
    /// return it.
    fn ack(&self, stream: &str, group: &str, id: &str) -> QueueResult<()>;

    /// Atomic increment of a monotonic integer counter, returns the new value.
    fn incr(&self, counter: &str) -> QueueResult<i64>;

    /// Deletes a counter (used once a chunk-completion tally is consumed).
    fn del(&self, counter: &str) -> QueueResult<()>;
}

/// Recovery protocol every consumer runs at startup: drain
/// `pending` before reading new messages, so at-least-once delivery holds
/// across crashes.
pub fn drain_pending<Q: Queue + ?Sized>(
    queue: &Q,
    stream: &str,
    group: &str,
    consumer: &str,
    mut handler: impl FnMut(&Message) -> QueueResult<()>,
) -> QueueResult<usize> {
    let mut drained = 0;
    loop {
        let batch = queue.pending(stream, group, consumer, 64)?;
        if batch.is_empty() {
            break;
        }
        for message in &batch {
            handler(message)?;
            queue.ack(stream, group, &message.id)?;
            drained += 1;
        }
    }
    Ok(drained)
}
