mod id;
mod status;

pub use self::{id::*, status::*};

use time::OffsetDateTime;

use crate::entity::{BikeId, UserId};

/// A bounded-time assignment of one bike to one user. At most one active rent
/// may reference a bike; active transitions to completed exactly once.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Rent {
    id: RentId,
    user_id: UserId,
    bike_id: BikeId,
    start_time: OffsetDateTime,
    end_time: Option<OffsetDateTime>,
    status: RentStatus,
}

impl Rent {
    pub fn new(
        id: RentId,
        user_id: UserId,
        bike_id: BikeId,
        start_time: OffsetDateTime,
        end_time: Option<OffsetDateTime>,
        status: RentStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            bike_id,
            start_time,
            end_time,
            status,
        }
    }

    pub fn id(&self) -> &RentId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn bike_id(&self) -> &BikeId {
        &self.bike_id
    }

    pub fn start_time(&self) -> &OffsetDateTime {
        &self.start_time
    }

    pub fn end_time(&self) -> Option<&OffsetDateTime> {
        self.end_time.as_ref()
    }

    pub fn status(&self) -> RentStatus {
        self.status
    }

    /// The active -> completed transition. Never reverses.
    pub fn into_completed(self, end_time: OffsetDateTime) -> Self {
        Self {
            end_time: Some(end_time),
            status: RentStatus::Completed,
            ..self
        }
    }
}
