mod bike;
mod rent;
mod stats;

pub use self::{bike::*, rent::*, stats::*};
