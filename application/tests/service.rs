use time::macros::datetime;
use uuid::Uuid;

use application::service::{
    BikeService, RentService, StatsProjectionService, StatsQueryService,
};
use application::transfer::{
    AddBikeDto, DeleteBikeDto, EndRentDto, GetAvailableBikesDto, GetDailyStatsDto,
    GetLocationStatsDto, StartRentDto,
};
use kernel::interface::event::RentEvent;
use kernel::prelude::entity::{BikeId, RentId, UserId};
use kernel::KernelError;

use crate::mock::{MockModule, Shared};

mod mock {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use time::{Date, OffsetDateTime};
    use uuid::Uuid;

    use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
    use kernel::interface::event::RentEvent;
    use kernel::interface::mq::{DependOnRentEventStream, RentEventStream};
    use kernel::interface::query::{
        BikeQuery, DependOnBikeQuery, DependOnRentQuery, DependOnStatsQuery, RentQuery, StatsQuery,
    };
    use kernel::interface::update::{
        BikeModifier, DependOnBikeModifier, DependOnRentModifier, DependOnStatsModifier,
        RentModifier, StatsModifier,
    };
    use kernel::prelude::entity::{
        Bike, BikeId, BikeStatus, Rent, RentId, RentStatus, UserId,
    };
    use kernel::KernelError;

    #[derive(Default)]
    pub struct State {
        pub bikes: HashMap<Uuid, Bike>,
        pub rents: HashMap<Uuid, Rent>,
        pub daily: HashMap<Date, i64>,
        pub active: i64,
        pub locations: HashMap<Date, HashMap<String, i64>>,
        pub published: Vec<RentEvent>,
        pub fail_publish: bool,
    }

    pub type Shared = Arc<Mutex<State>>;

    pub struct MockConnection;

    #[async_trait::async_trait]
    impl Transaction for MockConnection {
        async fn commit(self) -> error_stack::Result<(), KernelError> {
            Ok(())
        }

        async fn roll_back(self) -> error_stack::Result<(), KernelError> {
            Ok(())
        }
    }

    pub struct MockDatabase;

    #[async_trait::async_trait]
    impl DatabaseConnection<MockConnection> for MockDatabase {
        async fn transact(&self) -> error_stack::Result<MockConnection, KernelError> {
            Ok(MockConnection)
        }
    }

    fn with_status(bike: &Bike, status: BikeStatus) -> Bike {
        Bike::new(
            bike.id().clone(),
            bike.name().clone(),
            status,
            bike.location().clone(),
            *bike.created_at(),
        )
    }

    pub struct MockBikeRepository(Shared);

    #[async_trait::async_trait]
    impl BikeQuery<MockConnection> for MockBikeRepository {
        async fn find_by_id(
            &self,
            _con: &mut MockConnection,
            id: &BikeId,
        ) -> error_stack::Result<Option<Bike>, KernelError> {
            Ok(self.0.lock().unwrap().bikes.get(id.as_ref()).cloned())
        }

        async fn find_available(
            &self,
            _con: &mut MockConnection,
            location: Option<&str>,
        ) -> error_stack::Result<Vec<Bike>, KernelError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .bikes
                .values()
                .filter(|bike| bike.status() == BikeStatus::Available)
                .filter(|bike| location.map_or(true, |l| bike.location().as_str() == l))
                .cloned()
                .collect())
        }
    }

    #[async_trait::async_trait]
    impl BikeModifier<MockConnection> for MockBikeRepository {
        async fn create(
            &self,
            _con: &mut MockConnection,
            bike: &Bike,
        ) -> error_stack::Result<(), KernelError> {
            self.0
                .lock()
                .unwrap()
                .bikes
                .insert(*bike.id().as_ref(), bike.clone());
            Ok(())
        }

        // Mirrors the conditional update: flips only when still available.
        async fn mark_rented(
            &self,
            _con: &mut MockConnection,
            id: &BikeId,
        ) -> error_stack::Result<bool, KernelError> {
            let mut state = self.0.lock().unwrap();
            match state.bikes.get(id.as_ref()) {
                Some(bike) if bike.status() == BikeStatus::Available => {
                    let rented = with_status(bike, BikeStatus::Rented);
                    state.bikes.insert(*id.as_ref(), rented);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn mark_available(
            &self,
            _con: &mut MockConnection,
            id: &BikeId,
        ) -> error_stack::Result<(), KernelError> {
            let mut state = self.0.lock().unwrap();
            if let Some(bike) = state.bikes.get(id.as_ref()) {
                let available = with_status(bike, BikeStatus::Available);
                state.bikes.insert(*id.as_ref(), available);
            }
            Ok(())
        }

        async fn delete(
            &self,
            _con: &mut MockConnection,
            id: &BikeId,
        ) -> error_stack::Result<u64, KernelError> {
            let removed = self.0.lock().unwrap().bikes.remove(id.as_ref());
            Ok(u64::from(removed.is_some()))
        }
    }

    pub struct MockRentRepository(Shared);

    #[async_trait::async_trait]
    impl RentQuery<MockConnection> for MockRentRepository {
        async fn find_for_user(
            &self,
            _con: &mut MockConnection,
            id: &RentId,
            user_id: &UserId,
        ) -> error_stack::Result<Option<Rent>, KernelError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .rents
                .get(id.as_ref())
                .filter(|rent| rent.user_id() == user_id)
                .cloned())
        }

        async fn has_active_for_bike(
            &self,
            _con: &mut MockConnection,
            bike_id: &BikeId,
        ) -> error_stack::Result<bool, KernelError> {
            Ok(self.0.lock().unwrap().rents.values().any(|rent| {
                rent.bike_id() == bike_id && rent.status() == RentStatus::Active
            }))
        }
    }

    #[async_trait::async_trait]
    impl RentModifier<MockConnection> for MockRentRepository {
        async fn create(
            &self,
            _con: &mut MockConnection,
            rent: &Rent,
        ) -> error_stack::Result<(), KernelError> {
            self.0
                .lock()
                .unwrap()
                .rents
                .insert(*rent.id().as_ref(), rent.clone());
            Ok(())
        }

        async fn complete(
            &self,
            _con: &mut MockConnection,
            id: &RentId,
            end_time: OffsetDateTime,
        ) -> error_stack::Result<(), KernelError> {
            let mut state = self.0.lock().unwrap();
            if let Some(rent) = state.rents.get(id.as_ref()).cloned() {
                state
                    .rents
                    .insert(*id.as_ref(), rent.into_completed(end_time));
            }
            Ok(())
        }

        async fn delete_by_bike(
            &self,
            _con: &mut MockConnection,
            bike_id: &BikeId,
        ) -> error_stack::Result<(), KernelError> {
            self.0
                .lock()
                .unwrap()
                .rents
                .retain(|_, rent| rent.bike_id() != bike_id);
            Ok(())
        }
    }

    pub struct MockStatsRepository(Shared);

    #[async_trait::async_trait]
    impl StatsQuery<MockConnection> for MockStatsRepository {
        async fn daily_total(
            &self,
            _con: &mut MockConnection,
            date: Date,
        ) -> error_stack::Result<i64, KernelError> {
            Ok(self.0.lock().unwrap().daily.get(&date).copied().unwrap_or(0))
        }

        async fn active_rents(
            &self,
            _con: &mut MockConnection,
        ) -> error_stack::Result<i64, KernelError> {
            Ok(self.0.lock().unwrap().active)
        }

        async fn location_totals(
            &self,
            _con: &mut MockConnection,
            date: Date,
        ) -> error_stack::Result<HashMap<String, i64>, KernelError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .locations
                .get(&date)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[async_trait::async_trait]
    impl StatsModifier<MockConnection> for MockStatsRepository {
        async fn increment_daily(
            &self,
            _con: &mut MockConnection,
            date: Date,
        ) -> error_stack::Result<(), KernelError> {
            *self.0.lock().unwrap().daily.entry(date).or_insert(0) += 1;
            Ok(())
        }

        async fn increment_active(
            &self,
            _con: &mut MockConnection,
        ) -> error_stack::Result<(), KernelError> {
            self.0.lock().unwrap().active += 1;
            Ok(())
        }

        async fn decrement_active(
            &self,
            _con: &mut MockConnection,
        ) -> error_stack::Result<(), KernelError> {
            self.0.lock().unwrap().active -= 1;
            Ok(())
        }

        async fn increment_location(
            &self,
            _con: &mut MockConnection,
            date: Date,
            location: &str,
        ) -> error_stack::Result<(), KernelError> {
            *self
                .0
                .lock()
                .unwrap()
                .locations
                .entry(date)
                .or_default()
                .entry(location.to_string())
                .or_insert(0) += 1;
            Ok(())
        }
    }

    #[derive(Clone)]
    pub struct MockEventStream(Shared);

    #[async_trait::async_trait]
    impl RentEventStream for MockEventStream {
        async fn publish(&self, event: &RentEvent) -> error_stack::Result<(), KernelError> {
            let mut state = self.0.lock().unwrap();
            if state.fail_publish {
                return Err(error_stack::Report::new(KernelError::Unavailable)
                    .attach_printable("event log is down"));
            }
            state.published.push(event.clone());
            Ok(())
        }

        async fn subscribe<F, Fut>(&self, _group: &str, _handler: F)
        where
            F: Fn(RentEvent) -> Fut + Sync + Send,
            Fut: std::future::Future<Output = error_stack::Result<(), KernelError>> + Send,
        {
        }
    }

    pub struct MockModule {
        pub state: Shared,
        database: MockDatabase,
        bikes: MockBikeRepository,
        rents: MockRentRepository,
        stats: MockStatsRepository,
        stream: MockEventStream,
    }

    impl MockModule {
        pub fn new() -> Self {
            let state = Shared::default();
            Self {
                database: MockDatabase,
                bikes: MockBikeRepository(Arc::clone(&state)),
                rents: MockRentRepository(Arc::clone(&state)),
                stats: MockStatsRepository(Arc::clone(&state)),
                stream: MockEventStream(Arc::clone(&state)),
                state,
            }
        }
    }

    impl DependOnDatabaseConnection<MockConnection> for MockModule {
        type DatabaseConnection = MockDatabase;
        fn database_connection(&self) -> &Self::DatabaseConnection {
            &self.database
        }
    }

    impl DependOnBikeQuery<MockConnection> for MockModule {
        type BikeQuery = MockBikeRepository;
        fn bike_query(&self) -> &Self::BikeQuery {
            &self.bikes
        }
    }

    impl DependOnBikeModifier<MockConnection> for MockModule {
        type BikeModifier = MockBikeRepository;
        fn bike_modifier(&self) -> &Self::BikeModifier {
            &self.bikes
        }
    }

    impl DependOnRentQuery<MockConnection> for MockModule {
        type RentQuery = MockRentRepository;
        fn rent_query(&self) -> &Self::RentQuery {
            &self.rents
        }
    }

    impl DependOnRentModifier<MockConnection> for MockModule {
        type RentModifier = MockRentRepository;
        fn rent_modifier(&self) -> &Self::RentModifier {
            &self.rents
        }
    }

    impl DependOnStatsQuery<MockConnection> for MockModule {
        type StatsQuery = MockStatsRepository;
        fn stats_query(&self) -> &Self::StatsQuery {
            &self.stats
        }
    }

    impl DependOnStatsModifier<MockConnection> for MockModule {
        type StatsModifier = MockStatsRepository;
        fn stats_modifier(&self) -> &Self::StatsModifier {
            &self.stats
        }
    }

    impl DependOnRentEventStream for MockModule {
        type RentEventStream = MockEventStream;
        fn rent_event_stream(&self) -> &Self::RentEventStream {
            &self.stream
        }
    }
}

async fn wait_for_published(state: &Shared, count: usize) {
    for _ in 0..100 {
        if state.lock().unwrap().published.len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {count} published events");
}

async fn add_bike(module: &MockModule, name: &str, location: &str) -> Uuid {
    module
        .add_bike(AddBikeDto {
            name: name.to_string(),
            location: location.to_string(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn added_bike_is_listed_as_available() {
    let module = MockModule::new();
    let id = add_bike(&module, "Trek", "Park A").await;
    add_bike(&module, "Giant", "Park B").await;

    let bikes = module
        .get_available_bikes(GetAvailableBikesDto {
            location: Some("Park A".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(bikes.len(), 1);
    assert_eq!(bikes[0].id, id);
    assert_eq!(bikes[0].status, "available");
}

#[tokio::test]
async fn add_bike_rejects_blank_fields() {
    let module = MockModule::new();
    for (name, location) in [("", "Park A"), ("  ", "Park A"), ("Trek", ""), ("Trek", " ")] {
        let result = module
            .add_bike(AddBikeDto {
                name: name.to_string(),
                location: location.to_string(),
            })
            .await;
        let report = result.expect_err("blank field must be rejected");
        assert!(matches!(
            report.current_context(),
            KernelError::InvalidArgument
        ));
    }
}

#[tokio::test]
async fn start_rent_takes_the_bike_and_publishes_a_start_event() {
    let module = MockModule::new();
    let bike_id = add_bike(&module, "Trek", "Park A").await;

    let rent = module
        .start_rent(StartRentDto {
            user_id: "u1".to_string(),
            bike_id,
        })
        .await
        .unwrap();
    assert_eq!(rent.status, "active");
    assert_eq!(rent.bike_id, bike_id);
    assert!(rent.end_time.is_none());

    let available = module
        .get_available_bikes(GetAvailableBikesDto { location: None })
        .await
        .unwrap();
    assert!(available.is_empty());

    wait_for_published(&module.state, 1).await;
    let state = module.state.lock().unwrap();
    assert_eq!(state.published.len(), 1);
    assert_eq!(state.published[0].rent_id(), &RentId::new(rent.id));
    assert_eq!(state.published[0].bike_id(), &BikeId::new(bike_id));
}

#[tokio::test]
async fn start_rent_on_unknown_bike_is_not_found() {
    let module = MockModule::new();
    let result = module
        .start_rent(StartRentDto {
            user_id: "u1".to_string(),
            bike_id: Uuid::new_v4(),
        })
        .await;
    let report = result.expect_err("unknown bike must fail");
    assert!(matches!(report.current_context(), KernelError::NotFound));
}

#[tokio::test]
async fn only_one_renter_wins_the_same_bike() {
    let module = MockModule::new();
    let bike_id = add_bike(&module, "Trek", "Park A").await;

    let first = module
        .start_rent(StartRentDto {
            user_id: "u1".to_string(),
            bike_id,
        })
        .await;
    assert!(first.is_ok());

    let second = module
        .start_rent(StartRentDto {
            user_id: "u2".to_string(),
            bike_id,
        })
        .await;
    let report = second.expect_err("second renter must lose");
    assert!(matches!(
        report.current_context(),
        KernelError::InvalidState
    ));
}

#[tokio::test]
async fn end_rent_completes_rent_and_frees_bike() {
    let module = MockModule::new();
    let bike_id = add_bike(&module, "Trek", "Park A").await;
    let rent = module
        .start_rent(StartRentDto {
            user_id: "u1".to_string(),
            bike_id,
        })
        .await
        .unwrap();

    let ended = module
        .end_rent(EndRentDto {
            rent_id: rent.id,
            user_id: "u1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(ended.status, "completed");
    assert!(ended.end_time.is_some());

    // The bike is rentable again in the same observable step.
    let available = module
        .get_available_bikes(GetAvailableBikesDto { location: None })
        .await
        .unwrap();
    assert_eq!(available.len(), 1);

    wait_for_published(&module.state, 2).await;
}

#[tokio::test]
async fn end_rent_conflates_missing_and_foreign_rents() {
    let module = MockModule::new();
    let bike_id = add_bike(&module, "Trek", "Park A").await;
    let rent = module
        .start_rent(StartRentDto {
            user_id: "u1".to_string(),
            bike_id,
        })
        .await
        .unwrap();

    for (rent_id, user_id) in [(Uuid::new_v4(), "u1"), (rent.id, "intruder")] {
        let result = module
            .end_rent(EndRentDto {
                rent_id,
                user_id: user_id.to_string(),
            })
            .await;
        let report = result.expect_err("must be rejected");
        assert!(matches!(report.current_context(), KernelError::NotFound));
    }
}

#[tokio::test]
async fn end_rent_twice_is_invalid_state() {
    let module = MockModule::new();
    let bike_id = add_bike(&module, "Trek", "Park A").await;
    let rent = module
        .start_rent(StartRentDto {
            user_id: "u1".to_string(),
            bike_id,
        })
        .await
        .unwrap();

    let dto = || EndRentDto {
        rent_id: rent.id,
        user_id: "u1".to_string(),
    };
    module.end_rent(dto()).await.unwrap();
    let report = module.end_rent(dto()).await.expect_err("already completed");
    assert!(matches!(
        report.current_context(),
        KernelError::InvalidState
    ));
}

#[tokio::test]
async fn delete_bike_is_blocked_by_active_rent() {
    let module = MockModule::new();
    let bike_id = add_bike(&module, "Trek", "Park A").await;
    let rent = module
        .start_rent(StartRentDto {
            user_id: "u1".to_string(),
            bike_id,
        })
        .await
        .unwrap();

    let blocked = module.delete_bike(DeleteBikeDto { bike_id }).await;
    let report = blocked.expect_err("active rent must block deletion");
    assert!(matches!(report.current_context(), KernelError::Conflict));

    module
        .end_rent(EndRentDto {
            rent_id: rent.id,
            user_id: "u1".to_string(),
        })
        .await
        .unwrap();
    module.delete_bike(DeleteBikeDto { bike_id }).await.unwrap();

    // Bike and its rent history are both gone.
    let state = module.state.lock().unwrap();
    assert!(state.bikes.is_empty());
    assert!(state.rents.is_empty());
}

#[tokio::test]
async fn delete_unknown_bike_is_not_found() {
    let module = MockModule::new();
    let result = module
        .delete_bike(DeleteBikeDto {
            bike_id: Uuid::new_v4(),
        })
        .await;
    let report = result.expect_err("unknown bike must fail");
    assert!(matches!(report.current_context(), KernelError::NotFound));
}

#[tokio::test]
async fn publish_failure_does_not_fail_the_rent() {
    let module = MockModule::new();
    let bike_id = add_bike(&module, "Trek", "Park A").await;
    module.state.lock().unwrap().fail_publish = true;

    let rent = module
        .start_rent(StartRentDto {
            user_id: "u1".to_string(),
            bike_id,
        })
        .await
        .unwrap();
    assert_eq!(rent.status, "active");

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(module.state.lock().unwrap().published.is_empty());
}

fn start_event() -> RentEvent {
    RentEvent::started(
        RentId::new(Uuid::new_v4()),
        UserId::new("u1"),
        BikeId::new(Uuid::new_v4()),
        datetime!(2024-03-01 09:00:00 UTC),
    )
}

#[tokio::test]
async fn start_event_moves_gauge_and_daily_counter() {
    let module = MockModule::new();
    let event = start_event();
    module.apply(event.clone()).await.unwrap();

    assert_eq!(module.get_active_rents().await.unwrap(), 1);
    let daily = module
        .get_daily_stats(GetDailyStatsDto {
            date: Some(event.timestamp().date()),
        })
        .await
        .unwrap();
    assert_eq!(daily.total, 1);
}

#[tokio::test]
async fn replayed_event_is_counted_twice() {
    // At-least-once delivery without dedup: replay moves the gauge by 2.
    let module = MockModule::new();
    let event = start_event();
    module.apply(event.clone()).await.unwrap();
    module.apply(event.clone()).await.unwrap();

    assert_eq!(module.get_active_rents().await.unwrap(), 2);
    let daily = module
        .get_daily_stats(GetDailyStatsDto {
            date: Some(event.timestamp().date()),
        })
        .await
        .unwrap();
    assert_eq!(daily.total, 2);
}

#[tokio::test]
async fn end_event_decrements_gauge_only() {
    let module = MockModule::new();
    let start = start_event();
    module.apply(start.clone()).await.unwrap();
    let end = RentEvent::ended(
        start.rent_id().clone(),
        start.user_id().clone(),
        start.bike_id().clone(),
        datetime!(2024-03-01 10:00:00 UTC),
    );
    module.apply(end).await.unwrap();

    assert_eq!(module.get_active_rents().await.unwrap(), 0);
    let daily = module
        .get_daily_stats(GetDailyStatsDto {
            date: Some(start.timestamp().date()),
        })
        .await
        .unwrap();
    assert_eq!(daily.total, 1);
}

#[tokio::test]
async fn absent_counters_read_as_zero() {
    let module = MockModule::new();
    assert_eq!(module.get_active_rents().await.unwrap(), 0);

    let daily = module
        .get_daily_stats(GetDailyStatsDto { date: None })
        .await
        .unwrap();
    assert_eq!(daily.total, 0);

    let locations = module
        .get_location_stats(GetLocationStatsDto { date: None })
        .await
        .unwrap();
    assert!(locations.totals.is_empty());
}
