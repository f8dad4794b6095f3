use time::OffsetDateTime;

use crate::database::Transaction;
use crate::entity::{BikeId, Rent, RentId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait RentModifier<Connection: Transaction>: Sync + Send + 'static {
    async fn create(
        &self,
        con: &mut Connection,
        rent: &Rent,
    ) -> error_stack::Result<(), KernelError>;

    async fn complete(
        &self,
        con: &mut Connection,
        id: &RentId,
        end_time: OffsetDateTime,
    ) -> error_stack::Result<(), KernelError>;

    async fn delete_by_bike(
        &self,
        con: &mut Connection,
        bike_id: &BikeId,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnRentModifier<Connection: Transaction>: Sync + Send + 'static {
    type RentModifier: RentModifier<Connection>;
    fn rent_modifier(&self) -> &Self::RentModifier;
}
