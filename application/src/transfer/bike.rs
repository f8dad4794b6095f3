use time::OffsetDateTime;
use uuid::Uuid;

use kernel::prelude::entity::Bike;

#[derive(Debug, Clone)]
pub struct BikeDto {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub location: String,
    pub created_at: OffsetDateTime,
}

impl From<Bike> for BikeDto {
    fn from(bike: Bike) -> Self {
        Self {
            id: *bike.id().as_ref(),
            name: bike.name().as_str().to_string(),
            status: bike.status().as_str().to_string(),
            location: bike.location().as_str().to_string(),
            created_at: *bike.created_at(),
        }
    }
}

pub struct AddBikeDto {
    pub name: String,
    pub location: String,
}

pub struct DeleteBikeDto {
    pub bike_id: Uuid,
}

pub struct GetAvailableBikesDto {
    pub location: Option<String>,
}
