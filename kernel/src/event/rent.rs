use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entity::{BikeId, RentId, UserId};

/// Stream the rental lifecycle events are appended to.
pub static RENT_EVENT_STREAM: &str = "rent-events";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentEventType {
    Start,
    End,
}

/// Immutable record of a rent state transition. Serialized as a flat JSON
/// object; the RFC 3339 timestamp drives the day-bucketed counters downstream.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RentEvent {
    rent_id: RentId,
    user_id: UserId,
    bike_id: BikeId,
    event_type: RentEventType,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

impl RentEvent {
    pub fn started(
        rent_id: RentId,
        user_id: UserId,
        bike_id: BikeId,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            rent_id,
            user_id,
            bike_id,
            event_type: RentEventType::Start,
            timestamp,
        }
    }

    pub fn ended(
        rent_id: RentId,
        user_id: UserId,
        bike_id: BikeId,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            rent_id,
            user_id,
            bike_id,
            event_type: RentEventType::End,
            timestamp,
        }
    }

    pub fn rent_id(&self) -> &RentId {
        &self.rent_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn bike_id(&self) -> &BikeId {
        &self.bike_id
    }

    pub fn event_type(&self) -> RentEventType {
        self.event_type
    }

    pub fn timestamp(&self) -> &OffsetDateTime {
        &self.timestamp
    }
}
