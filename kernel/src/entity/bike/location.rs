#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BikeLocation(String);

impl BikeLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BikeLocation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<BikeLocation> for String {
    fn from(location: BikeLocation) -> Self {
        location.0
    }
}
