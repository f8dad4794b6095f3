use std::collections::HashMap;

use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::Connection;
use time::Date;

use kernel::interface::query::StatsQuery;
use kernel::interface::update::StatsModifier;
use kernel::KernelError;

use crate::database::redis::RedisTransaction;
use crate::error::ConvertError;

/// Flat counter keyspace:
/// `stats:daily:<date>` and `stats:active_rents` hold plain integers,
/// `stats:locations:<date>` is a location -> count hash.
pub struct RedisStatsRepository;

static ACTIVE_RENTS_KEY: &str = "stats:active_rents";

fn daily_key(date: Date) -> String {
    format!("stats:daily:{date}")
}

fn locations_key(date: Date) -> String {
    format!("stats:locations:{date}")
}

#[async_trait::async_trait]
impl StatsQuery<RedisTransaction> for RedisStatsRepository {
    async fn daily_total(
        &self,
        con: &mut RedisTransaction,
        date: Date,
    ) -> error_stack::Result<i64, KernelError> {
        RedisStatsInternal::read_counter(con, &daily_key(date)).await
    }

    async fn active_rents(
        &self,
        con: &mut RedisTransaction,
    ) -> error_stack::Result<i64, KernelError> {
        RedisStatsInternal::read_counter(con, ACTIVE_RENTS_KEY).await
    }

    async fn location_totals(
        &self,
        con: &mut RedisTransaction,
        date: Date,
    ) -> error_stack::Result<HashMap<String, i64>, KernelError> {
        let totals: HashMap<String, i64> = con
            .hgetall(locations_key(date))
            .await
            .convert_error()?;
        Ok(totals)
    }
}

#[async_trait::async_trait]
impl StatsModifier<RedisTransaction> for RedisStatsRepository {
    async fn increment_daily(
        &self,
        con: &mut RedisTransaction,
        date: Date,
    ) -> error_stack::Result<(), KernelError> {
        RedisStatsInternal::adjust_counter(con, &daily_key(date), 1).await
    }

    async fn increment_active(
        &self,
        con: &mut RedisTransaction,
    ) -> error_stack::Result<(), KernelError> {
        RedisStatsInternal::adjust_counter(con, ACTIVE_RENTS_KEY, 1).await
    }

    async fn decrement_active(
        &self,
        con: &mut RedisTransaction,
    ) -> error_stack::Result<(), KernelError> {
        RedisStatsInternal::adjust_counter(con, ACTIVE_RENTS_KEY, -1).await
    }

    async fn increment_location(
        &self,
        con: &mut RedisTransaction,
        date: Date,
        location: &str,
    ) -> error_stack::Result<(), KernelError> {
        let _: i64 = con
            .hincr(locations_key(date), location, 1i64)
            .await
            .convert_error()?;
        Ok(())
    }
}

struct RedisStatsInternal;

impl RedisStatsInternal {
    async fn read_counter(
        con: &mut Connection,
        key: &str,
    ) -> error_stack::Result<i64, KernelError> {
        // Absent key reads as zero, not as an error.
        let value: Option<i64> = con.get(key).await.convert_error()?;
        Ok(value.unwrap_or(0))
    }

    async fn adjust_counter(
        con: &mut Connection,
        key: &str,
        delta: i64,
    ) -> error_stack::Result<(), KernelError> {
        let _: i64 = con.incr(key, delta).await.convert_error()?;
        Ok(())
    }
}
