//! Data models for the daily collection run
//!
//! Everything here is created fresh per run and handed from stage to stage.

pub mod asset;
pub mod observation;
pub mod collection;

pub use asset::Asset;
pub use observation::{Observation, ObservationDate};
pub use collection::{CollectionResult, RunReport};
