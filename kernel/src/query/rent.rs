use crate::database::Transaction;
use crate::entity::{BikeId, Rent, RentId, UserId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait RentQuery<Connection: Transaction>: Sync + Send + 'static {
    /// Lookup filtered by id AND owner. A missing rent and a rent owned by
    /// someone else are indistinguishable by design.
    async fn find_for_user(
        &self,
        con: &mut Connection,
        id: &RentId,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Rent>, KernelError>;

    async fn has_active_for_bike(
        &self,
        con: &mut Connection,
        bike_id: &BikeId,
    ) -> error_stack::Result<bool, KernelError>;
}

pub trait DependOnRentQuery<Connection: Transaction>: Sync + Send + 'static {
    type RentQuery: RentQuery<Connection>;
    fn rent_query(&self) -> &Self::RentQuery;
}
