//! LidarScope Core - Simulated LiDAR Point Clouds with an Animated Sweep
//!
//! This library provides the three pieces of the visualizer:
//! 1. **Scene generation**: synthetic 2-D returns for urban, forest and open scenes,
//!    clipped to a circular sensor range, driven by an injected RNG
//! 2. **Animated rendering**: fade-in point markers, a sensor glyph and an endlessly
//!    rotating sweep line, modelled as an explicit `Idle`/`Animating` state machine
//! 3. **Explanations**: prompt catalog for the LiDAR data-science pipeline, with a
//!    fixed fallback policy around any text-generation backend

pub mod scene;
pub mod transition;
pub mod renderer;
pub mod draw_list;
pub mod viewer;
pub mod explain;

#[cfg(feature = "dashboard")]
pub mod dashboard;

// Re-export key types for convenience
pub use scene::{generate, Scene, SceneLayout};
pub use renderer::{FrameSnapshot, FrameStats, RenderStyle, Renderer, RendererState};
pub use draw_list::{DrawCommand, DrawList};
pub use viewer::{LidarViewer, ViewerConfig};
pub use explain::{
    ApplicationCard, ApplicationTopic, ExplainConfig, ExplainError, Explainer, OfflineGenerator, PipelineStep,
    TextGenerator,
};
