mod id;
mod location;
mod name;
mod status;

pub use self::{id::*, location::*, name::*, status::*};

use time::OffsetDateTime;

/// A rentable bike. Mutated only inside a rental transaction; the status
/// column is the single availability flag concurrent renters race on.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Bike {
    id: BikeId,
    name: BikeName,
    status: BikeStatus,
    location: BikeLocation,
    created_at: OffsetDateTime,
}

impl Bike {
    pub fn new(
        id: BikeId,
        name: BikeName,
        status: BikeStatus,
        location: BikeLocation,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            name,
            status,
            location,
            created_at,
        }
    }

    pub fn id(&self) -> &BikeId {
        &self.id
    }

    pub fn name(&self) -> &BikeName {
        &self.name
    }

    pub fn status(&self) -> BikeStatus {
        self.status
    }

    pub fn location(&self) -> &BikeLocation {
        &self.location
    }

    pub fn created_at(&self) -> &OffsetDateTime {
        &self.created_at
    }
}
