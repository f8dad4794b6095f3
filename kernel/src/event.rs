mod rent;

pub use self::rent::*;
