//! Drawing surface abstraction for the LidarScope renderer.

use crate::error::EnvError;
use crate::types::{Color, Dimensions, Point, Rect};

/// A drawable surface the renderer paints frames onto.
///
/// # Implementations
///
/// - **Terminal**: ratatui canvas (`lidarscope_core::dashboard`, feature `dashboard`)
/// - **Headless**: `lidarscope_core::DrawList`, records primitives for tests and export
///
/// # Frame Flow
///
/// ```text
/// Renderer                   Surface
///   |-- clear(background) ---->|   previous frame discarded
///   |-- fill_circle(..) ------>|
///   |-- fill_rect(..) -------->|
///   |-- stroke_line(..) ------>|
///   |-- present() ------------>|   frame becomes visible
/// ```
pub trait Surface {
    /// Returns the current size of the surface.
    fn dimensions(&self) -> Dimensions;

    /// Discards everything drawn since the last `present()` and fills the
    /// surface with `background`.
    fn clear(&mut self, background: Color);

    /// Draws a filled circle.
    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);

    /// Draws a filled (optionally rounded) rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draws a line segment.
    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color);

    /// Makes the frame drawn since the last `clear()` visible.
    ///
    /// # Returns
    /// * `Err(EnvError::SurfaceError)` - No frame was started with `clear()`,
    ///   or the backend could not present it
    fn present(&mut self) -> Result<(), EnvError>;
}
