//! Spiral galaxy rotation-curve simulation.
//!
//! Generates a bulge and a spiral disk of stars, spins them under either the
//! observed (flat) or the Keplerian rotation curve, and draws a chart that
//! compares the two curves. Rendering the point cloud is left to the host;
//! see the `galaxy` and `galaxy-web` binaries.

pub mod chart;
pub mod config;
pub mod error;
pub mod mode;
pub mod physics;
pub mod simulation;
pub mod starfield;

pub use config::GalaxyConfig;
pub use error::{GalaxyError, Result};
pub use mode::RotationMode;
pub use simulation::Simulation;
