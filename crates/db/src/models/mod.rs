//! Row models and domain entities.

pub mod ticket;
pub mod user;
