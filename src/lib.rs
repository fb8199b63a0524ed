// Impact Lab - Asteroid & Comet Impact Effects Estimator
// Library root; the HTTP entry point lives in `server`

pub mod api_client;
pub mod asteroid_catalog;
pub mod casualty_model;
pub mod config;
pub mod error;
pub mod footprint_builder;
pub mod formatting;
pub mod orbit_mechanics;
pub mod physics_engine;
pub mod server;
pub mod state_manager;
pub mod summary_narrator;
pub mod tsunami_model;

pub use error::{ImpactLabError, Result};
pub use server::run;
