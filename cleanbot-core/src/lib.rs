//! Core of cleanbot: map parsing, the cleaning simulation and the session
//! history store. Nothing in here knows about HTTP.

pub mod map;
pub mod models;
pub mod simulation;
pub mod store;
