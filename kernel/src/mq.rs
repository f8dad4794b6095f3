use std::future::Future;

use crate::event::RentEvent;
use crate::KernelError;

/// Append-only lifecycle event log.
///
/// Delivery to a consumer group is at-least-once; publication is best-effort
/// and callers on the write side must not couple their outcome to it.
/// `Clone` keeps the publish side cheap to hand into a detached task.
#[async_trait::async_trait]
pub trait RentEventStream: 'static + Sync + Send + Clone {
    async fn publish(&self, event: &RentEvent) -> error_stack::Result<(), KernelError>;

    /// Sequentially feed events to `handler` as a member of `group`. Handler
    /// failures are logged and skipped; this only returns on shutdown.
    async fn subscribe<F, Fut>(&self, group: &str, handler: F)
    where
        F: Fn(RentEvent) -> Fut + Sync + Send,
        Fut: Future<Output = error_stack::Result<(), KernelError>> + Send;
}

pub trait DependOnRentEventStream: 'static + Sync + Send {
    type RentEventStream: RentEventStream;
    fn rent_event_stream(&self) -> &Self::RentEventStream;
}
