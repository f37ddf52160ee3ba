//! Headless surface that records drawing primitives.
//!
//! Used by tests, the simulation harness and the terminal dashboard, which
//! paints the recorded primitives onto a ratatui canvas.

use lidarscope_env::{Color, Dimensions, EnvError, Point, Rect, Surface};
use serde::Serialize;

/// A recorded drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear(Color),
    Circle { center: Point, radius: f64, color: Color },
    Rect { rect: Rect, color: Color },
    Line { from: Point, to: Point, width: f64, color: Color },
}

/// Records primitives between `clear()` and `present()`.
#[derive(Debug, Clone)]
pub struct DrawList {
    dimensions: Dimensions,
    pending: Vec<DrawCommand>,
    presented: Vec<DrawCommand>,
    frames_presented: u64,
}

impl DrawList {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            pending: Vec::new(),
            presented: Vec::new(),
            frames_presented: 0,
        }
    }

    /// Changes the reported surface size.
    pub fn resize(&mut self, dimensions: Dimensions) {
        self.dimensions = dimensions;
    }

    /// Primitives of the last presented frame.
    pub fn presented(&self) -> &[DrawCommand] {
        &self.presented
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Circle centers and colors of the last presented frame.
    pub fn circles(&self) -> Vec<(Point, Color)> {
        self.presented
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { center, color, .. } => Some((*center, *color)),
                _ => None,
            })
            .collect()
    }

    /// Line endpoints of the last presented frame.
    pub fn lines(&self) -> Vec<(Point, Point)> {
        self.presented
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl Surface for DrawList {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn clear(&mut self, background: Color) {
        self.pending.clear();
        self.pending.push(DrawCommand::Clear(background));
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        self.pending.push(DrawCommand::Circle { center, radius, color });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.pending.push(DrawCommand::Rect { rect, color });
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color) {
        self.pending.push(DrawCommand::Line { from, to, width, color });
    }

    fn present(&mut self) -> Result<(), EnvError> {
        if !matches!(self.pending.first(), Some(DrawCommand::Clear(_))) {
            return Err(EnvError::surface("present() called before clear()"));
        }
        self.presented = std::mem::take(&mut self.pending);
        self.frames_presented += 1;
        Ok(())
    }
}
