use std::str::FromStr;

use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::interface::query::BikeQuery;
use kernel::interface::update::BikeModifier;
use kernel::prelude::entity::{Bike, BikeId, BikeLocation, BikeName, BikeStatus};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PgBikeRepository;

#[async_trait::async_trait]
impl BikeQuery<PostgresTransaction> for PgBikeRepository {
    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &BikeId,
    ) -> error_stack::Result<Option<Bike>, KernelError> {
        PgBikeInternal::find_by_id(con, id).await
    }

    async fn find_available(
        &self,
        con: &mut PostgresTransaction,
        location: Option<&str>,
    ) -> error_stack::Result<Vec<Bike>, KernelError> {
        PgBikeInternal::find_available(con, location).await
    }
}

#[async_trait::async_trait]
impl BikeModifier<PostgresTransaction> for PgBikeRepository {
    async fn create(
        &self,
        con: &mut PostgresTransaction,
        bike: &Bike,
    ) -> error_stack::Result<(), KernelError> {
        PgBikeInternal::create(con, bike).await
    }

    async fn mark_rented(
        &self,
        con: &mut PostgresTransaction,
        id: &BikeId,
    ) -> error_stack::Result<bool, KernelError> {
        PgBikeInternal::mark_rented(con, id).await
    }

    async fn mark_available(
        &self,
        con: &mut PostgresTransaction,
        id: &BikeId,
    ) -> error_stack::Result<(), KernelError> {
        PgBikeInternal::mark_available(con, id).await
    }

    async fn delete(
        &self,
        con: &mut PostgresTransaction,
        id: &BikeId,
    ) -> error_stack::Result<u64, KernelError> {
        PgBikeInternal::delete(con, id).await
    }
}

#[derive(sqlx::FromRow)]
struct BikeRow {
    id: Uuid,
    name: String,
    status: String,
    location: String,
    created_at: OffsetDateTime,
}

impl TryFrom<BikeRow> for Bike {
    type Error = Report<KernelError>;

    fn try_from(row: BikeRow) -> Result<Self, Self::Error> {
        let status = BikeStatus::from_str(&row.status)
            .map_err(|message| Report::new(KernelError::Internal).attach_printable(message))?;
        Ok(Bike::new(
            BikeId::new(row.id),
            BikeName::new(row.name),
            status,
            BikeLocation::new(row.location),
            row.created_at,
        ))
    }
}

pub(in crate::database) struct PgBikeInternal;

impl PgBikeInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BikeId,
    ) -> error_stack::Result<Option<Bike>, KernelError> {
        let row = sqlx::query_as::<_, BikeRow>(
            // language=postgresql
            r#"
            SELECT
                id,
                name,
                status,
                location,
                created_at
            FROM
                bikes
            WHERE
                id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        row.map(Bike::try_from).transpose()
    }

    async fn find_available(
        con: &mut PgConnection,
        location: Option<&str>,
    ) -> error_stack::Result<Vec<Bike>, KernelError> {
        let rows = match location {
            Some(location) => {
                sqlx::query_as::<_, BikeRow>(
                    // language=postgresql
                    r#"
                    SELECT
                        id,
                        name,
                        status,
                        location,
                        created_at
                    FROM
                        bikes
                    WHERE
                        status = 'available' AND location = $1
                    ORDER BY created_at
                    "#,
                )
                .bind(location)
                .fetch_all(con)
                .await
            }
            None => {
                sqlx::query_as::<_, BikeRow>(
                    // language=postgresql
                    r#"
                    SELECT
                        id,
                        name,
                        status,
                        location,
                        created_at
                    FROM
                        bikes
                    WHERE
                        status = 'available'
                    ORDER BY created_at
                    "#,
                )
                .fetch_all(con)
                .await
            }
        }
        .convert_error()?;
        rows.into_iter().map(Bike::try_from).collect()
    }

    async fn create(con: &mut PgConnection, bike: &Bike) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO bikes (id, name, status, location, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(bike.id().as_ref())
        .bind(bike.name().as_str())
        .bind(bike.status().as_str())
        .bind(bike.location().as_str())
        .bind(bike.created_at())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    // The conditional WHERE clause is what serializes concurrent renters: the
    // second transaction's update matches zero rows once the first commits.
    async fn mark_rented(
        con: &mut PgConnection,
        id: &BikeId,
    ) -> error_stack::Result<bool, KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            UPDATE bikes
            SET status = 'rented'
            WHERE id = $1 AND status = 'available'
            "#,
        )
        .bind(id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_available(
        con: &mut PgConnection,
        id: &BikeId,
    ) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            UPDATE bikes
            SET status = 'available'
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn delete(con: &mut PgConnection, id: &BikeId) -> error_stack::Result<u64, KernelError> {
        let result = sqlx::query(
            // language=postgresql
            r#"
            DELETE FROM bikes
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected())
    }
}
