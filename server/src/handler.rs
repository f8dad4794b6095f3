use std::ops::Deref;
use std::sync::Arc;

use driver::database::postgres::{
    PgBikeRepository, PgRentRepository, PostgresDatabase, PostgresTransaction,
};
use driver::database::redis::{
    RedisDatabase, RedisEventStream, RedisStatsRepository, RedisTransaction,
};
use kernel::interface::database::DependOnDatabaseConnection;
use kernel::interface::mq::DependOnRentEventStream;
use kernel::interface::query::{DependOnBikeQuery, DependOnRentQuery, DependOnStatsQuery};
use kernel::interface::update::{
    DependOnBikeModifier, DependOnRentModifier, DependOnStatsModifier,
};
use kernel::KernelError;

#[derive(Clone)]
pub struct AppModule(Arc<Handler>);

impl AppModule {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        Ok(Self(Arc::new(Handler::init().await?)))
    }
}

impl Deref for AppModule {
    type Target = Handler;
    fn deref(&self) -> &Self::Target {
        Deref::deref(&self.0)
    }
}

pub struct Handler {
    postgres: PostgresDatabase,
    redis: RedisDatabase,
    event_stream: RedisEventStream,
    bike_repository: PgBikeRepository,
    rent_repository: PgRentRepository,
    stats_repository: RedisStatsRepository,
}

impl Handler {
    pub async fn init() -> error_stack::Result<Self, KernelError> {
        let postgres = PostgresDatabase::new().await?;
        let redis = RedisDatabase::new()?;
        let event_stream = RedisEventStream::new(redis.clone());

        Ok(Self {
            postgres,
            redis,
            event_stream,
            bike_repository: PgBikeRepository,
            rent_repository: PgRentRepository,
            stats_repository: RedisStatsRepository,
        })
    }
}

impl DependOnDatabaseConnection<PostgresTransaction> for AppModule {
    type DatabaseConnection = PostgresDatabase;
    fn database_connection(&self) -> &Self::DatabaseConnection {
        &self.0.postgres
    }
}

impl DependOnDatabaseConnection<RedisTransaction> for AppModule {
    type DatabaseConnection = RedisDatabase;
    fn database_connection(&self) -> &Self::DatabaseConnection {
        &self.0.redis
    }
}

impl DependOnBikeQuery<PostgresTransaction> for AppModule {
    type BikeQuery = PgBikeRepository;
    fn bike_query(&self) -> &Self::BikeQuery {
        &self.0.bike_repository
    }
}

impl DependOnBikeModifier<PostgresTransaction> for AppModule {
    type BikeModifier = PgBikeRepository;
    fn bike_modifier(&self) -> &Self::BikeModifier {
        &self.0.bike_repository
    }
}

impl DependOnRentQuery<PostgresTransaction> for AppModule {
    type RentQuery = PgRentRepository;
    fn rent_query(&self) -> &Self::RentQuery {
        &self.0.rent_repository
    }
}

impl DependOnRentModifier<PostgresTransaction> for AppModule {
    type RentModifier = PgRentRepository;
    fn rent_modifier(&self) -> &Self::RentModifier {
        &self.0.rent_repository
    }
}

impl DependOnStatsQuery<RedisTransaction> for AppModule {
    type StatsQuery = RedisStatsRepository;
    fn stats_query(&self) -> &Self::StatsQuery {
        &self.0.stats_repository
    }
}

impl DependOnStatsModifier<RedisTransaction> for AppModule {
    type StatsModifier = RedisStatsRepository;
    fn stats_modifier(&self) -> &Self::StatsModifier {
        &self.0.stats_repository
    }
}

impl DependOnRentEventStream for AppModule {
    type RentEventStream = RedisEventStream;
    fn rent_event_stream(&self) -> &Self::RentEventStream {
        &self.0.event_stream
    }
}
