use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RentId(Uuid);

impl RentId {
    pub fn new(id: impl Into<Uuid>) -> Self {
        Self(id.into())
    }
}

impl AsRef<Uuid> for RentId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl From<RentId> for Uuid {
    fn from(id: RentId) -> Self {
        id.0
    }
}

impl Display for RentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
