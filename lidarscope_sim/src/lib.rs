//! LidarScope Deterministic Simulation Harness
//!
//! Runs the viewer against a virtual clock and a seeded RNG so that every
//! frame of a run can be replayed from its seed, and checks each frame
//! against the visualizer's invariants.
//!
//! # What a run checks
//!
//! - **Range**: every drawn point lies within `min(w, h) / 2.2` of the center
//! - **Replacement**: drawn markers always belong to the current point set
//! - **Sweep**: the rotation angle matches the elapsed time of the live pass,
//!   restarts at 0 on every rebuild and never stops
//! - **Fade**: once a pass has settled, every marker is at its target opacity
//!
//! # Usage
//!
//! ```ignore
//! use lidarscope_sim::{RunConfig, SceneRunner};
//! use lidarscope_core::Scene;
//!
//! let runner = SceneRunner::new(RunConfig {
//!     seed: 42,
//!     scene: Scene::Forest,
//!     ..Default::default()
//! });
//! let result = runner.run()?;
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod runner;

pub use context::SimContext;
pub use error::SimError;
pub use exporter::{PointSample, ScopeExport, ScopeFrame};
pub use runner::{RunConfig, RunResult, SceneRunner, ScriptEvent};
