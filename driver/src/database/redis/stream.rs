use std::future::Future;
use std::time::Duration;

use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{redis, Connection};
use error_stack::{Report, ResultExt};
use redis::streams::{
    StreamClaimReply, StreamId, StreamPendingCountReply, StreamReadOptions, StreamReadReply,
};
use redis::{RedisResult, Value};
use tokio::time::sleep;
use tracing::{debug, error};
use uuid::Uuid;

use kernel::interface::database::DatabaseConnection;
use kernel::interface::event::{RentEvent, RENT_EVENT_STREAM};
use kernel::interface::mq::RentEventStream;
use kernel::KernelError;

use crate::database::redis::RedisDatabase;
use crate::error::ConvertError;

static PAYLOAD_FIELD: &str = "payload";
const READ_BLOCK_MS: usize = 1000;
const READ_COUNT: usize = 10;
// Entries delivered to a consumer that died before acking are reclaimed
// after this idle time, so they are applied at least once.
const CLAIM_MIN_IDLE_MS: usize = 60_000;

/// Event log on a Redis stream. A single stream keeps a total order, which
/// subsumes the per-rent ordering the counters rely on; consumer groups give
/// each group at-least-once delivery.
#[derive(Clone)]
pub struct RedisEventStream {
    db: RedisDatabase,
}

impl RedisEventStream {
    pub fn new(db: RedisDatabase) -> Self {
        Self { db }
    }

    fn parse(entry: &StreamId) -> error_stack::Result<RentEvent, KernelError> {
        let payload: String = entry.get(PAYLOAD_FIELD).ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("stream entry {} has no payload field", entry.id))
        })?;
        serde_json::from_str(&payload).change_context_lazy(|| KernelError::Internal)
    }
}

#[async_trait::async_trait]
impl RentEventStream for RedisEventStream {
    async fn publish(&self, event: &RentEvent) -> error_stack::Result<(), KernelError> {
        let mut con = self.db.transact().await?;
        RedisStreamInternal::append(&mut con, event).await?;
        debug!(rent_id = %event.rent_id(), "appended rent event");
        Ok(())
    }

    #[tracing::instrument(skip(self, handler))]
    async fn subscribe<F, Fut>(&self, group: &str, handler: F)
    where
        F: Fn(RentEvent) -> Fut + Sync + Send,
        Fut: Future<Output = error_stack::Result<(), KernelError>> + Send,
    {
        let consumer = format!("consumer:{}", Uuid::new_v4());
        loop {
            let mut con = match self.db.transact().await {
                Ok(con) => con,
                Err(report) => {
                    error!("{report:?}");
                    sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };
            // BUSYGROUP on re-creation is expected.
            let _ = RedisStreamInternal::ensure_group(&mut con, group).await;

            let mut entries =
                match RedisStreamInternal::claim_stale(&mut con, group, &consumer).await {
                    Ok(entries) => entries,
                    Err(report) => {
                        error!("{report:?}");
                        Vec::new()
                    }
                };
            if entries.is_empty() {
                entries = match RedisStreamInternal::read_next(&mut con, group, &consumer).await {
                    Ok(entries) => entries,
                    Err(report) => {
                        error!("{report:?}");
                        sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };
            }

            for entry in entries {
                match Self::parse(&entry) {
                    Ok(event) => {
                        if let Err(report) = handler(event).await {
                            error!("failed to process rent event {}: {report:?}", entry.id);
                        }
                    }
                    Err(report) => {
                        error!("dropping malformed rent event {}: {report:?}", entry.id);
                    }
                }
                // Acked either way; an entry is redelivered only when the
                // process dies between handling and acking.
                if let Err(report) = RedisStreamInternal::ack(&mut con, group, &entry.id).await {
                    error!("{report:?}");
                }
            }
        }
    }
}

struct RedisStreamInternal;

impl RedisStreamInternal {
    async fn ensure_group(con: &mut Connection, group: &str) -> RedisResult<Value> {
        con.xgroup_create_mkstream(RENT_EVENT_STREAM, group, 0)
            .await
    }

    async fn append(
        con: &mut Connection,
        event: &RentEvent,
    ) -> error_stack::Result<(), KernelError> {
        let payload =
            serde_json::to_string(event).change_context_lazy(|| KernelError::Internal)?;
        let _: String = con
            .xadd(RENT_EVENT_STREAM, "*", &[(PAYLOAD_FIELD, &payload)])
            .await
            .convert_error()?;
        Ok(())
    }

    async fn claim_stale(
        con: &mut Connection,
        group: &str,
        consumer: &str,
    ) -> error_stack::Result<Vec<StreamId>, KernelError> {
        let pending: StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(RENT_EVENT_STREAM)
            .arg(group)
            .arg("IDLE")
            .arg(CLAIM_MIN_IDLE_MS)
            .arg("-")
            .arg("+")
            .arg(READ_COUNT)
            .query_async(con)
            .await
            .convert_error()?;
        if pending.ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = pending.ids.into_iter().map(|entry| entry.id).collect();
        let claimed: StreamClaimReply = con
            .xclaim(RENT_EVENT_STREAM, group, consumer, CLAIM_MIN_IDLE_MS, &ids)
            .await
            .convert_error()?;
        Ok(claimed.ids)
    }

    async fn read_next(
        con: &mut Connection,
        group: &str,
        consumer: &str,
    ) -> error_stack::Result<Vec<StreamId>, KernelError> {
        let options = StreamReadOptions::default()
            .group(group, consumer)
            .block(READ_BLOCK_MS)
            .count(READ_COUNT);
        // A blocking read that times out yields Nil.
        let reply: Option<StreamReadReply> = con
            .xread_options(&[RENT_EVENT_STREAM], &[">"], &options)
            .await
            .convert_error()?;
        Ok(reply
            .map(|reply| {
                reply
                    .keys
                    .into_iter()
                    .flat_map(|key| key.ids)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn ack(
        con: &mut Connection,
        group: &str,
        id: &str,
    ) -> error_stack::Result<(), KernelError> {
        let _: i64 = con
            .xack(RENT_EVENT_STREAM, group, &[id])
            .await
            .convert_error()?;
        let _: i64 = con.xdel(RENT_EVENT_STREAM, &[id]).await.convert_error()?;
        Ok(())
    }
}
