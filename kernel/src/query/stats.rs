use std::collections::HashMap;

use time::Date;

use crate::database::Transaction;
use crate::KernelError;

/// Read side of the counter store. Absent keys are zero, never an error.
#[async_trait::async_trait]
pub trait StatsQuery<Connection: Transaction>: Sync + Send + 'static {
    async fn daily_total(
        &self,
        con: &mut Connection,
        date: Date,
    ) -> error_stack::Result<i64, KernelError>;

    async fn active_rents(&self, con: &mut Connection) -> error_stack::Result<i64, KernelError>;

    async fn location_totals(
        &self,
        con: &mut Connection,
        date: Date,
    ) -> error_stack::Result<HashMap<String, i64>, KernelError>;
}

pub trait DependOnStatsQuery<Connection: Transaction>: Sync + Send + 'static {
    type StatsQuery: StatsQuery<Connection>;
    fn stats_query(&self) -> &Self::StatsQuery;
}
