pub mod advisor;
pub mod coach;
pub mod config;
pub mod error;
pub mod failure;
pub mod goal;
pub mod io;
pub mod paths;
pub mod reflection;
pub mod responses;
pub mod stats;
pub mod store;
pub mod tracker;
pub mod types;

pub use coach::CoachError;
pub use error::{Result, RoutineError};
