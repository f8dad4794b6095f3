use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BikeId(Uuid);

impl BikeId {
    pub fn new(id: impl Into<Uuid>) -> Self {
        Self(id.into())
    }
}

impl AsRef<Uuid> for BikeId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl From<BikeId> for Uuid {
    fn from(id: BikeId) -> Self {
        id.0
    }
}

impl Display for BikeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
