//! All the database models live here.

pub use account::*;
pub use relationship::*;

mod account;
mod relationship;
