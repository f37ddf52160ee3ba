//! The interactive LiDAR viewer.
//!
//! Ties scene selection and canvas size to generation and rendering. Every
//! accepted event regenerates the whole point set and replaces the render
//! pass; events that change nothing are ignored.

use crate::renderer::{FrameSnapshot, FrameStats, RenderStyle, Renderer};
use crate::scene::{self, Scene};
use lidarscope_env::{Dimensions, EnvError, Point, Surface};
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Configuration for a viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Scene selected at mount time
    pub scene: Scene,

    /// Canvas size before the first resize notification
    pub dimensions: Dimensions,

    pub style: RenderStyle,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scene: Scene::Urban,
            dimensions: Dimensions::default(),
            style: RenderStyle::default(),
        }
    }
}

/// Scene selector, canvas and renderer in one component.
pub struct LidarViewer<S: Surface, R: Rng> {
    scene: Scene,
    dimensions: Dimensions,
    rng: R,
    points: Vec<Point>,
    renderer: Renderer<S>,
    generations: u64,
}

impl<S: Surface, R: Rng> LidarViewer<S, R> {
    /// Creates an unmounted viewer.
    pub fn new(config: ViewerConfig, rng: R) -> Self {
        Self {
            scene: config.scene,
            dimensions: config.dimensions,
            rng,
            points: Vec::new(),
            renderer: Renderer::new(config.style),
            generations: 0,
        }
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The current point set.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// How many point sets have been generated so far.
    pub fn generations(&self) -> u64 {
        self.generations
    }

    pub fn renderer(&self) -> &Renderer<S> {
        &self.renderer
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.renderer.surface_mut()
    }

    /// Mounts the drawing surface and renders the selected scene.
    pub fn mount(&mut self, surface: S, now: Duration) {
        self.regenerate();
        self.renderer.mount(surface, &self.points, self.dimensions, now);
    }

    /// Releases the surface; the animation stops.
    pub fn unmount(&mut self) -> Option<S> {
        self.renderer.unmount()
    }

    /// Selects a scene. Returns `true` if the point set was replaced.
    pub fn select_scene(&mut self, scene: Scene, now: Duration) -> bool {
        if scene == self.scene {
            return false;
        }
        debug!(from = %self.scene, to = %scene, "Scene selected");
        self.scene = scene;
        self.refresh(now);
        true
    }

    /// Applies new canvas dimensions. Returns `true` if they differed.
    pub fn resize(&mut self, dimensions: Dimensions, now: Duration) -> bool {
        if dimensions == self.dimensions {
            return false;
        }
        debug!(from = %self.dimensions, to = %dimensions, "Canvas resized");
        self.dimensions = dimensions;
        self.refresh(now);
        true
    }

    /// Handles an observed container width; the canvas is kept square.
    pub fn observe_width(&mut self, width: f64, now: Duration) -> Result<bool, EnvError> {
        let dimensions = Dimensions::square(width)?;
        Ok(self.resize(dimensions, now))
    }

    pub fn snapshot(&self, now: Duration) -> Option<FrameSnapshot> {
        self.renderer.snapshot(now)
    }

    /// Draws the current frame. `Ok(None)` while unmounted.
    pub fn draw(&mut self, now: Duration) -> Result<Option<FrameStats>, EnvError> {
        self.renderer.draw(now)
    }

    fn refresh(&mut self, now: Duration) {
        if !self.renderer.is_animating() {
            return;
        }
        self.regenerate();
        self.renderer.render(&self.points, self.dimensions, now);
    }

    fn regenerate(&mut self) {
        self.points = scene::generate(self.scene, self.dimensions, &mut self.rng);
        self.generations += 1;
        debug!(
            scene = %self.scene,
            dimensions = %self.dimensions,
            points = self.points.len(),
            "Point set generated"
        );
    }
}
