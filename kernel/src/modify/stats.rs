use time::Date;

use crate::database::Transaction;
use crate::KernelError;

/// Write side of the counter store. Each operation is atomic for its own key;
/// nothing ties the gauge and the daily counter together.
#[async_trait::async_trait]
pub trait StatsModifier<Connection: Transaction>: Sync + Send + 'static {
    async fn increment_daily(
        &self,
        con: &mut Connection,
        date: Date,
    ) -> error_stack::Result<(), KernelError>;

    async fn increment_active(&self, con: &mut Connection)
        -> error_stack::Result<(), KernelError>;

    async fn decrement_active(&self, con: &mut Connection)
        -> error_stack::Result<(), KernelError>;

    async fn increment_location(
        &self,
        con: &mut Connection,
        date: Date,
        location: &str,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnStatsModifier<Connection: Transaction>: Sync + Send + 'static {
    type StatsModifier: StatsModifier<Connection>;
    fn stats_modifier(&self) -> &Self::StatsModifier;
}
