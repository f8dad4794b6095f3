use time::OffsetDateTime;
use uuid::Uuid;

use kernel::prelude::entity::Rent;

#[derive(Debug, Clone)]
pub struct RentDto {
    pub id: Uuid,
    pub user_id: String,
    pub bike_id: Uuid,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub status: String,
}

impl From<Rent> for RentDto {
    fn from(rent: Rent) -> Self {
        Self {
            id: *rent.id().as_ref(),
            user_id: rent.user_id().as_str().to_string(),
            bike_id: *rent.bike_id().as_ref(),
            start_time: *rent.start_time(),
            end_time: rent.end_time().copied(),
            status: rent.status().as_str().to_string(),
        }
    }
}

pub struct StartRentDto {
    pub user_id: String,
    pub bike_id: Uuid,
}

pub struct EndRentDto {
    pub rent_id: Uuid,
    pub user_id: String,
}
