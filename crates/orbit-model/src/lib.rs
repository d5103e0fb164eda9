//! Shared data model, error types, configuration, and input loading for the
//! LEO orbit processing pipeline. Every other crate in this workspace
//! depends on this one and none of its types carry behavior tied to a
//! particular stage.

pub mod config;
pub mod decision;
pub mod error;
pub mod event;
pub mod input;
pub mod snapshot;
pub mod stats;
pub mod timeseries;
pub mod tle;
pub mod window;

pub use config::PipelineConfig;
pub use error::{ErrorReport, PipelineError, Result};
pub use event::{EventRecord, EventType};
pub use snapshot::{GeodeticPosition, LookAngles, SatelliteSnapshot, Vec3, VisibilityFlags};
pub use timeseries::SatelliteTimeSeries;
pub use tle::{Constellation, TleRecord};
pub use window::{ServiceQualityGrade, ServiceWindow, VisibilityStatistics, VisibilityWindow};
