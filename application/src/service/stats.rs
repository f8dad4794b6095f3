use time::OffsetDateTime;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::event::{RentEvent, RentEventType};
use kernel::interface::query::{DependOnStatsQuery, StatsQuery};
use kernel::interface::update::{DependOnStatsModifier, StatsModifier};
use kernel::KernelError;

use crate::transfer::{DailyStatsDto, GetDailyStatsDto, GetLocationStatsDto, LocationStatsDto};

/// Consumer-group name shared by all stats worker instances.
pub static STATS_CONSUMER_GROUP: &str = "stats-consumer";

#[async_trait::async_trait]
pub trait StatsQueryService<Connection: Transaction>:
    'static + Sync + Send + DependOnDatabaseConnection<Connection> + DependOnStatsQuery<Connection>
{
    async fn get_daily_stats(
        &self,
        dto: GetDailyStatsDto,
    ) -> error_stack::Result<DailyStatsDto, KernelError> {
        let date = dto.date.unwrap_or_else(|| OffsetDateTime::now_utc().date());
        let mut con = self.database_connection().transact().await?;
        let total = self.stats_query().daily_total(&mut con, date).await?;
        Ok(DailyStatsDto { date, total })
    }

    async fn get_active_rents(&self) -> error_stack::Result<i64, KernelError> {
        let mut con = self.database_connection().transact().await?;
        self.stats_query().active_rents(&mut con).await
    }

    async fn get_location_stats(
        &self,
        dto: GetLocationStatsDto,
    ) -> error_stack::Result<LocationStatsDto, KernelError> {
        let date = dto.date.unwrap_or_else(|| OffsetDateTime::now_utc().date());
        let mut con = self.database_connection().transact().await?;
        let totals = self.stats_query().location_totals(&mut con, date).await?;
        Ok(LocationStatsDto { date, totals })
    }
}

impl<Connection: Transaction, T> StatsQueryService<Connection> for T where
    T: DependOnDatabaseConnection<Connection> + DependOnStatsQuery<Connection>
{
}

#[async_trait::async_trait]
pub trait StatsProjectionService<Connection: Transaction>:
    'static + Sync + Send + DependOnDatabaseConnection<Connection> + DependOnStatsModifier<Connection>
{
    /// Applies one lifecycle event to the counters. Deliberately not
    /// idempotent: a redelivered event moves the counters again, and the two
    /// mutations on a start event are not atomic with each other.
    async fn apply(&self, event: RentEvent) -> error_stack::Result<(), KernelError> {
        let mut con = self.database_connection().transact().await?;
        match event.event_type() {
            RentEventType::Start => {
                let date = event.timestamp().date();
                self.stats_modifier().increment_daily(&mut con, date).await?;
                self.stats_modifier().increment_active(&mut con).await?;
            }
            RentEventType::End => {
                self.stats_modifier().decrement_active(&mut con).await?;
            }
        }
        con.commit().await
    }
}

impl<Connection: Transaction, T> StatsProjectionService<Connection> for T where
    T: DependOnDatabaseConnection<Connection> + DependOnStatsModifier<Connection>
{
}
