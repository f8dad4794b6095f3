use error_stack::Report;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::event::RentEvent;
use kernel::interface::mq::{DependOnRentEventStream, RentEventStream};
use kernel::interface::query::{BikeQuery, DependOnBikeQuery, DependOnRentQuery, RentQuery};
use kernel::interface::update::{
    BikeModifier, DependOnBikeModifier, DependOnRentModifier, RentModifier,
};
use kernel::prelude::entity::{BikeId, Rent, RentId, RentStatus, UserId};
use kernel::KernelError;

use crate::transfer::{EndRentDto, RentDto, StartRentDto};

#[async_trait::async_trait]
pub trait RentService<Connection: Transaction>:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection<Connection>
    + DependOnBikeQuery<Connection>
    + DependOnBikeModifier<Connection>
    + DependOnRentQuery<Connection>
    + DependOnRentModifier<Connection>
    + DependOnRentEventStream
{
    async fn start_rent(&self, dto: StartRentDto) -> error_stack::Result<RentDto, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let bike_id = BikeId::new(dto.bike_id);
        let user_id = UserId::new(dto.user_id);

        self.bike_query()
            .find_by_id(&mut con, &bike_id)
            .await?
            .ok_or_else(|| Report::new(KernelError::NotFound).attach_printable("bike not found"))?;

        // Conditional update inside the same transaction; of two concurrent
        // renters only one sees a row flip here.
        let rented = self.bike_modifier().mark_rented(&mut con, &bike_id).await?;
        if !rented {
            return Err(Report::new(KernelError::InvalidState)
                .attach_printable("bike is not available"));
        }

        let now = OffsetDateTime::now_utc();
        let rent = Rent::new(
            RentId::new(Uuid::new_v4()),
            user_id.clone(),
            bike_id.clone(),
            now,
            None,
            RentStatus::Active,
        );
        self.rent_modifier().create(&mut con, &rent).await?;
        con.commit().await?;

        self.publish_event(RentEvent::started(rent.id().clone(), user_id, bike_id, now));
        Ok(RentDto::from(rent))
    }

    async fn end_rent(&self, dto: EndRentDto) -> error_stack::Result<RentDto, KernelError> {
        let mut con = self.database_connection().transact().await?;
        let rent_id = RentId::new(dto.rent_id);
        let user_id = UserId::new(dto.user_id);

        let rent = self
            .rent_query()
            .find_for_user(&mut con, &rent_id, &user_id)
            .await?
            .ok_or_else(|| Report::new(KernelError::NotFound).attach_printable("rent not found"))?;
        if rent.status() != RentStatus::Active {
            return Err(
                Report::new(KernelError::InvalidState).attach_printable("rent is not active")
            );
        }

        let now = OffsetDateTime::now_utc();
        self.rent_modifier().complete(&mut con, &rent_id, now).await?;
        self.bike_modifier()
            .mark_available(&mut con, rent.bike_id())
            .await?;
        con.commit().await?;

        let rent = rent.into_completed(now);
        self.publish_event(RentEvent::ended(
            rent.id().clone(),
            user_id,
            rent.bike_id().clone(),
            now,
        ));
        Ok(RentDto::from(rent))
    }

    /// Best-effort notification after commit. The business operation has
    /// already succeeded, so a publish failure is logged and nothing else.
    fn publish_event(&self, event: RentEvent) {
        let stream = self.rent_event_stream().clone();
        tokio::spawn(async move {
            match stream.publish(&event).await {
                Ok(()) => debug!(rent_id = %event.rent_id(), "published rent event"),
                Err(report) => warn!("failed to publish rent event: {report:?}"),
            }
        });
    }
}

impl<Connection: Transaction, T> RentService<Connection> for T where
    T: DependOnDatabaseConnection<Connection>
        + DependOnBikeQuery<Connection>
        + DependOnBikeModifier<Connection>
        + DependOnRentQuery<Connection>
        + DependOnRentModifier<Connection>
        + DependOnRentEventStream
{
}
