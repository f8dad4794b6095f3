use error_stack::Report;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{BikeQuery, DependOnBikeQuery, DependOnRentQuery, RentQuery};
use kernel::interface::update::{
    BikeModifier, DependOnBikeModifier, DependOnRentModifier, RentModifier,
};
use kernel::prelude::entity::{Bike, BikeId, BikeLocation, BikeName, BikeStatus};
use kernel::KernelError;

use crate::transfer::{AddBikeDto, BikeDto, DeleteBikeDto, GetAvailableBikesDto};

#[async_trait::async_trait]
pub trait BikeService<Connection: Transaction>:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection<Connection>
    + DependOnBikeQuery<Connection>
    + DependOnBikeModifier<Connection>
    + DependOnRentQuery<Connection>
    + DependOnRentModifier<Connection>
{
    async fn add_bike(&self, dto: AddBikeDto) -> error_stack::Result<BikeDto, KernelError> {
        let name = dto.name.trim();
        if name.is_empty() {
            return Err(Report::new(KernelError::InvalidArgument)
                .attach_printable("bike name is required"));
        }
        let location = dto.location.trim();
        if location.is_empty() {
            return Err(Report::new(KernelError::InvalidArgument)
                .attach_printable("bike location is required"));
        }

        let mut con = self.database_connection().transact().await?;
        let bike = Bike::new(
            BikeId::new(Uuid::new_v4()),
            BikeName::new(name),
            BikeStatus::Available,
            BikeLocation::new(location),
            OffsetDateTime::now_utc(),
        );
        self.bike_modifier().create(&mut con, &bike).await?;
        con.commit().await?;

        info!(id = %bike.id(), name, location, "added bike");
        Ok(BikeDto::from(bike))
    }

    async fn get_available_bikes(
        &self,
        dto: GetAvailableBikesDto,
    ) -> error_stack::Result<Vec<BikeDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let bikes = self
            .bike_query()
            .find_available(&mut con, dto.location.as_deref())
            .await?;
        Ok(bikes.into_iter().map(BikeDto::from).collect())
    }

    async fn delete_bike(&self, dto: DeleteBikeDto) -> error_stack::Result<(), KernelError> {
        let mut con = self.database_connection().transact().await?;
        let bike_id = BikeId::new(dto.bike_id);

        if self
            .rent_query()
            .has_active_for_bike(&mut con, &bike_id)
            .await?
        {
            return Err(
                Report::new(KernelError::Conflict).attach_printable("bike has an active rent")
            );
        }

        // Rent history goes with the bike; both deletes commit together.
        self.rent_modifier().delete_by_bike(&mut con, &bike_id).await?;
        let deleted = self.bike_modifier().delete(&mut con, &bike_id).await?;
        if deleted == 0 {
            return Err(Report::new(KernelError::NotFound).attach_printable("bike not found"));
        }
        con.commit().await?;

        info!(id = %bike_id, "deleted bike");
        Ok(())
    }
}

impl<Connection: Transaction, T> BikeService<Connection> for T where
    T: DependOnDatabaseConnection<Connection>
        + DependOnBikeQuery<Connection>
        + DependOnBikeModifier<Connection>
        + DependOnRentQuery<Connection>
        + DependOnRentModifier<Connection>
{
}
