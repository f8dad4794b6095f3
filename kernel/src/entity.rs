mod bike;
mod rent;
mod user;

pub use self::{bike::*, rent::*, user::*};
