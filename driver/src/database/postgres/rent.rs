use std::str::FromStr;

use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::interface::query::RentQuery;
use kernel::interface::update::RentModifier;
use kernel::prelude::entity::{BikeId, Rent, RentId, RentStatus, UserId};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PgRentRepository;

#[async_trait::async_trait]
impl RentQuery<PostgresTransaction> for PgRentRepository {
    async fn find_for_user(
        &self,
        con: &mut PostgresTransaction,
        id: &RentId,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Rent>, KernelError> {
        PgRentInternal::find_for_user(con, id, user_id).await
    }

    async fn has_active_for_bike(
        &self,
        con: &mut PostgresTransaction,
        bike_id: &BikeId,
    ) -> error_stack::Result<bool, KernelError> {
        PgRentInternal::has_active_for_bike(con, bike_id).await
    }
}

#[async_trait::async_trait]
impl RentModifier<PostgresTransaction> for PgRentRepository {
    async fn create(
        &self,
        con: &mut PostgresTransaction,
        rent: &Rent,
    ) -> error_stack::Result<(), KernelError> {
        PgRentInternal::create(con, rent).await
    }

    async fn complete(
        &self,
        con: &mut PostgresTransaction,
        id: &RentId,
        end_time: OffsetDateTime,
    ) -> error_stack::Result<(), KernelError> {
        PgRentInternal::complete(con, id, end_time).await
    }

    async fn delete_by_bike(
        &self,
        con: &mut PostgresTransaction,
        bike_id: &BikeId,
    ) -> error_stack::Result<(), KernelError> {
        PgRentInternal::delete_by_bike(con, bike_id).await
    }
}

#[derive(sqlx::FromRow)]
struct RentRow {
    id: Uuid,
    user_id: String,
    bike_id: Uuid,
    start_time: OffsetDateTime,
    end_time: Option<OffsetDateTime>,
    status: String,
}

impl TryFrom<RentRow> for Rent {
    type Error = Report<KernelError>;

    fn try_from(row: RentRow) -> Result<Self, Self::Error> {
        let status = RentStatus::from_str(&row.status)
            .map_err(|message| Report::new(KernelError::Internal).attach_printable(message))?;
        Ok(Rent::new(
            RentId::new(row.id),
            UserId::new(row.user_id),
            BikeId::new(row.bike_id),
            row.start_time,
            row.end_time,
            status,
        ))
    }
}

pub(in crate::database) struct PgRentInternal;

impl PgRentInternal {
    async fn find_for_user(
        con: &mut PgConnection,
        id: &RentId,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Rent>, KernelError> {
        let row = sqlx::query_as::<_, RentRow>(
            // language=postgresql
            r#"
            SELECT
                id,
                user_id,
                bike_id,
                start_time,
                end_time,
                status
            FROM
                rents
            WHERE
                id = $1 AND user_id = $2
            "#,
        )
        .bind(id.as_ref())
        .bind(user_id.as_str())
        .fetch_optional(con)
        .await
        .convert_error()?;
        row.map(Rent::try_from).transpose()
    }

    async fn has_active_for_bike(
        con: &mut PgConnection,
        bike_id: &BikeId,
    ) -> error_stack::Result<bool, KernelError> {
        let (exists,): (bool,) = sqlx::query_as(
            // language=postgresql
            r#"
            SELECT EXISTS(
                SELECT 1 FROM rents
                WHERE bike_id = $1 AND status = 'active'
            )
            "#,
        )
        .bind(bike_id.as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(exists)
    }

    async fn create(con: &mut PgConnection, rent: &Rent) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO rents (id, user_id, bike_id, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rent.id().as_ref())
        .bind(rent.user_id().as_str())
        .bind(rent.bike_id().as_ref())
        .bind(rent.start_time())
        .bind(rent.end_time())
        .bind(rent.status().as_str())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn complete(
        con: &mut PgConnection,
        id: &RentId,
        end_time: OffsetDateTime,
    ) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            UPDATE rents
            SET end_time = $2, status = 'completed'
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .bind(end_time)
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn delete_by_bike(
        con: &mut PgConnection,
        bike_id: &BikeId,
    ) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            DELETE FROM rents
            WHERE bike_id = $1
            "#,
        )
        .bind(bike_id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use kernel::interface::database::DatabaseConnection;
    use kernel::interface::query::{BikeQuery, RentQuery};
    use kernel::interface::update::{BikeModifier, RentModifier};
    use kernel::prelude::entity::{
        Bike, BikeId, BikeLocation, BikeName, BikeStatus, Rent, RentId, RentStatus, UserId,
    };
    use kernel::KernelError;

    use crate::database::postgres::{PgBikeRepository, PgRentRepository, PostgresDatabase};

    // Runs against a live database; the transaction is dropped at the end so
    // nothing is committed.
    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn rent_lifecycle() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        let mut con = db.transact().await?;

        let bike_id = BikeId::new(Uuid::new_v4());
        let bike = Bike::new(
            bike_id.clone(),
            BikeName::new("Trek"),
            BikeStatus::Available,
            BikeLocation::new("Park A"),
            OffsetDateTime::now_utc(),
        );
        PgBikeRepository.create(&mut con, &bike).await?;

        let found = PgBikeRepository.find_by_id(&mut con, &bike_id).await?;
        assert_eq!(found.as_ref().map(Bike::status), Some(BikeStatus::Available));

        assert!(PgBikeRepository.mark_rented(&mut con, &bike_id).await?);
        // Second attempt loses the conditional update.
        assert!(!PgBikeRepository.mark_rented(&mut con, &bike_id).await?);

        let user_id = UserId::new("test-user");
        let rent = Rent::new(
            RentId::new(Uuid::new_v4()),
            user_id.clone(),
            bike_id.clone(),
            OffsetDateTime::now_utc(),
            None,
            RentStatus::Active,
        );
        PgRentRepository.create(&mut con, &rent).await?;

        assert!(PgRentRepository.has_active_for_bike(&mut con, &bike_id).await?);

        let found = PgRentRepository
            .find_for_user(&mut con, rent.id(), &user_id)
            .await?;
        assert_eq!(found, Some(rent.clone()));
        let missing = PgRentRepository
            .find_for_user(&mut con, rent.id(), &UserId::new("someone-else"))
            .await?;
        assert!(missing.is_none());

        PgRentRepository
            .complete(&mut con, rent.id(), OffsetDateTime::now_utc())
            .await?;
        PgBikeRepository.mark_available(&mut con, &bike_id).await?;

        let completed = PgRentRepository
            .find_for_user(&mut con, rent.id(), &user_id)
            .await?
            .unwrap();
        assert_eq!(completed.status(), RentStatus::Completed);
        assert!(completed.end_time().is_some());
        assert!(!PgRentRepository.has_active_for_bike(&mut con, &bike_id).await?);

        PgRentRepository.delete_by_bike(&mut con, &bike_id).await?;
        let deleted = PgBikeRepository.delete(&mut con, &bike_id).await?;
        assert_eq!(deleted, 1);
        Ok(())
    }
}
