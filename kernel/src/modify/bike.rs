use crate::database::Transaction;
use crate::entity::{Bike, BikeId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BikeModifier<Connection: Transaction>: Sync + Send + 'static {
    async fn create(
        &self,
        con: &mut Connection,
        bike: &Bike,
    ) -> error_stack::Result<(), KernelError>;

    /// Conditional available -> rented flip. Returns false when the bike was
    /// not available, which is how concurrent renters lose the race.
    async fn mark_rented(
        &self,
        con: &mut Connection,
        id: &BikeId,
    ) -> error_stack::Result<bool, KernelError>;

    async fn mark_available(
        &self,
        con: &mut Connection,
        id: &BikeId,
    ) -> error_stack::Result<(), KernelError>;

    /// Returns the number of deleted rows; zero means the bike was absent.
    async fn delete(
        &self,
        con: &mut Connection,
        id: &BikeId,
    ) -> error_stack::Result<u64, KernelError>;
}

pub trait DependOnBikeModifier<Connection: Transaction>: Sync + Send + 'static {
    type BikeModifier: BikeModifier<Connection>;
    fn bike_modifier(&self) -> &Self::BikeModifier;
}
