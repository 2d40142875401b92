pub mod common;
pub mod domain;

pub use common::error::{RadarError, Result};
pub use domain::*;
