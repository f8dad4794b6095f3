use crate::database::Transaction;
use crate::entity::{Bike, BikeId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BikeQuery<Connection: Transaction>: Sync + Send + 'static {
    async fn find_by_id(
        &self,
        con: &mut Connection,
        id: &BikeId,
    ) -> error_stack::Result<Option<Bike>, KernelError>;

    async fn find_available(
        &self,
        con: &mut Connection,
        location: Option<&str>,
    ) -> error_stack::Result<Vec<Bike>, KernelError>;
}

pub trait DependOnBikeQuery<Connection: Transaction>: Sync + Send + 'static {
    type BikeQuery: BikeQuery<Connection>;
    fn bike_query(&self) -> &Self::BikeQuery;
}
