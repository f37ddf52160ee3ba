//! LidarScope Environment Abstraction Layer
//!
//! This crate isolates everything the visualizer needs from "the outside":
//! - Time (`now()`) so animation is a pure function of elapsed time
//! - Randomness (`rng()`) so scene generation can be replayed from a seed
//! - A drawing `Surface` so the renderer never touches a concrete backend
//!
//! # Implementations
//!
//! - **Production**: `SystemContext` - monotonic wall clock, OS entropy
//! - **Simulation**: `lidarscope_sim::SimContext` - virtual clock, seeded RNG
//!
//! # Example
//!
//! ```ignore
//! use lidarscope_env::{ScopeContext, Surface};
//!
//! fn frame<Ctx: ScopeContext, S: Surface>(ctx: &Ctx, surface: &mut S) {
//!     let elapsed = ctx.now();
//!     surface.clear(background);
//!     // ... draw primitives for `elapsed`
//!     surface.present()?;
//! }
//! ```

mod context;
mod surface;
mod types;
mod error;
mod system_impl;

pub use context::ScopeContext;
pub use surface::Surface;
pub use types::{Color, Dimensions, Point, Rect};
pub use error::EnvError;
pub use system_impl::SystemContext;
