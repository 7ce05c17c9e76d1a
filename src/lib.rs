pub mod api;
pub mod config;

pub use cleanbot_core::{map, models, simulation, store};
