use crate::error::{QueueError, QueueResult};
use crate::queue::{Message, Queue};
use redis::streams::{StreamPendingCountReply, StreamRangeReply, StreamReadOptions, StreamReadReply};
use redis::{Client, Commands, Connection, FromRedisValue};
use std::sync::Mutex;

/// Maps the `Queue` contract onto Redis Streams: `XADD` for `enqueue`,
/// `XREADGROUP ... >` for `consume`, `XREADGROUP ... 0` for `pending`
/// (redelivers a consumer's own un-ACKed history, matching the queue's
/// recovery semantics), `XACK` for `ack`, and plain `INCR`/`DEL` keys for
/// the chunk-completion counters.
pub struct RedisStreamQueue {
    #[allow(dead_code)]
    client: Client,
    conn: Mutex<Connection>,
}

impl RedisStreamQueue {
    pub fn connect(url: &str) -> QueueResult<Self> {
        let client = Client::open(url).map_err(|e| QueueError::Unavailable(e.to_string()))?;
        let conn = client
            .get_connection()
            .map_err(|e| QueueError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> redis::RedisResult<T>) -> QueueResult<T> {
        let mut conn = self.conn.lock().expect("redis connection mutex poisoned");
        f(&mut conn).map_err(|e| QueueError::Unavailable(e.to_string()))
    }

    fn payload_field(map: &std::collections::HashMap<String, redis::Value>) -> QueueResult<Vec<u8>> {
        let value = map
            .get("payload")
            .ok_or_else(|| QueueError::Unavailable("stream entry missing 'payload' field".to_string()))?;
        Vec::<u8>::from_redis_value(value).map_err(|e| QueueError::Unavailable(e.to_string()))
    }
}

impl Queue for RedisStreamQueue {
    fn ensure_group(&self, stream: &str, group: &str) -> QueueResult<()> {
        self.with_conn(|conn| {
            let result: redis::RedisResult<()> = conn.xgroup_create_mkstream(stream, group, "0");
            match result {
                Ok(()) => Ok(()),
                // BUSYGROUP: group already exists - ensure_group is idempotent.
                Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
                Err(e) => Err(e),
            }
        })
    }

    fn enqueue(&self, stream: &str, payload: &[u8]) -> QueueResult<String> {
        self.with_conn(|conn| conn.xadd(stream, "*", &[("payload", payload)]))
    }

    fn consume(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<Message>> {
        let opts = StreamReadOptions::default()
            .group(group, consumer)
            .count(count)
            .block(block_ms as usize);
        let reply: StreamReadReply = self.with_conn(|conn| conn.xread_options(&[stream], &[">"], &opts))?;

        let mut out = Vec::new();
        for key in reply.keys {
            for id in key.ids {
                out.push(Message {
                    id: id.id.clone(),
                    payload: Self::payload_field(&id.map)?,
                    delivery_count: 1,
                });
            }
        }
        Ok(out)
    }

    fn pending(&self, stream: &str, group: &str, consumer: &str, count: usize) -> QueueResult<Vec<Message>> {
        let summary: StreamPendingCountReply =
            self.with_conn(|conn| conn.xpending_count(stream, group, "-", "+", count as isize))?;

        let mut out = Vec::with_capacity(summary.ids.len());
        for entry in summary.ids {
            if entry.consumer != consumer {
                continue;
            }
            let range: StreamRangeReply = self.with_conn(|conn| conn.xrange(stream, &entry.id, &entry.id))?;
            let Some(stream_id) = range.ids.into_iter().next() else {
                continue;
            };
            out.push(Message {
                id: stream_id.id,
                payload: Self::payload_field(&stream_id.map)?,
                delivery_count: entry.times_delivered as u32,
            });
        }
        Ok(out)
    }

    fn ack(&self, stream: &str, group: &str, id: &str) -> QueueResult<()> {
        self.with_conn(|conn| conn.xack(stream, group, &[id]))
    }

    fn incr(&self, counter: &str) -> QueueResult<i64> {
        self.with_conn(|conn| conn.incr(counter, 1))
    }

    fn del(&self, counter: &str) -> QueueResult<()> {
        self.with_conn(|conn| conn.del(counter))
    }
}
