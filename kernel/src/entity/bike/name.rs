#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BikeName(String);

impl BikeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BikeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<BikeName> for String {
    fn from(name: BikeName) -> Self {
        name.0
    }
}
