//! Animated point-cloud renderer.
//!
//! The renderer owns a drawing surface and at most one live render pass.
//! A pass is built from a point set in one go and never patched: a new scene
//! or a new canvas size tears the pass down and builds a fresh one, which
//! also restarts the sweep rotation from angle 0.
//!
//! ```text
//!            mount(surface)
//!   ┌──────┐ ─────────────────► ┌────────────┐
//!   │ Idle │                    │ Animating  │ ◄─┐ render(points)
//!   └──────┘ ◄───────────────── └────────────┘ ──┘ (teardown + rebuild)
//!            unmount()
//! ```

use crate::transition::{Loop, Tween};
use lidarscope_env::{Color, Dimensions, EnvError, Point, Rect, Surface};
use nalgebra::{Rotation2, Vector2};
use std::time::Duration;
use tracing::debug;

/// Visual constants for a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub background: Color,

    pub point_color: Color,
    pub point_radius: f64,
    pub point_opacity: f32,
    pub fade_duration: Duration,
    /// Extra fade delay per point index
    pub fade_stagger: Duration,

    pub glyph_width: f64,
    pub glyph_height: f64,
    pub glyph_corner_radius: f64,
    pub glyph_color: Color,

    pub sweep_color: Color,
    pub sweep_width: f64,
    /// Time for one full 360° rotation
    pub sweep_period: Duration,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: Color::rgba(17, 24, 39, 0.8),
            point_color: Color::rgb(0x22, 0xd3, 0xee),
            point_radius: 1.5,
            point_opacity: 0.8,
            fade_duration: Duration::from_millis(500),
            fade_stagger: Duration::from_millis(2),
            glyph_width: 16.0,
            glyph_height: 30.0,
            glyph_corner_radius: 4.0,
            glyph_color: Color::rgb(0xf0, 0xf9, 0xff),
            sweep_color: Color::rgba(34, 211, 238, 0.5),
            sweep_width: 2.0,
            sweep_period: Duration::from_millis(3000),
        }
    }
}

/// A single point marker with its fade-in.
#[derive(Debug, Clone, Copy)]
pub struct PointMarker {
    pub position: Point,
    pub fade: Tween,
}

/// The sensor sweep: a segment from the canvas center to the top edge,
/// rotating clockwise forever.
#[derive(Debug, Clone, Copy)]
pub struct SweepLine {
    pub pivot: Point,
    pub length: f64,
    pub rotation: Loop,
}

impl SweepLine {
    /// Rotation in degrees, `[0, 360)`.
    pub fn angle_at(&self, elapsed: Duration) -> f64 {
        self.rotation.value_at(elapsed)
    }

    /// Completed rotations.
    pub fn cycle_at(&self, elapsed: Duration) -> u64 {
        self.rotation.cycle(elapsed)
    }

    /// Free end of the segment.
    pub fn tip_at(&self, elapsed: Duration) -> Point {
        // Canvas y grows downward, so a positive angle turns clockwise on screen
        let rotation = Rotation2::new(self.angle_at(elapsed).to_radians());
        let offset = rotation * Vector2::new(0.0, -self.length);
        Point::new(self.pivot.x + offset.x, self.pivot.y + offset.y)
    }
}

/// Everything drawn for one (scene, dimensions) combination.
#[derive(Debug, Clone)]
pub struct RenderPass {
    /// Monotonic pass number, bumped on every rebuild
    pub id: u64,
    pub dimensions: Dimensions,
    /// Context time at which the pass was built
    pub started_at: Duration,
    pub markers: Vec<PointMarker>,
    pub glyph: Rect,
    pub sweep: SweepLine,
}

impl RenderPass {
    fn build(id: u64, points: &[Point], dimensions: Dimensions, style: &RenderStyle, now: Duration) -> Self {
        let center = dimensions.center();

        let markers = points
            .iter()
            .enumerate()
            .map(|(i, &position)| PointMarker {
                position,
                fade: Tween::new(0.0, style.point_opacity as f64, style.fade_duration)
                    .with_delay(style.fade_stagger * i as u32),
            })
            .collect();

        let glyph = Rect::centered(center, style.glyph_width, style.glyph_height)
            .with_corner_radius(style.glyph_corner_radius);

        let sweep = SweepLine {
            pivot: center,
            length: center.y,
            rotation: Loop::new(0.0, 360.0, style.sweep_period),
        };

        Self {
            id,
            dimensions,
            started_at: now,
            markers,
            glyph,
            sweep,
        }
    }

    fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
    }

    fn snapshot(&self, now: Duration) -> FrameSnapshot {
        let elapsed = self.elapsed(now);
        FrameSnapshot {
            pass_id: self.id,
            elapsed,
            dimensions: self.dimensions,
            markers: self
                .markers
                .iter()
                .map(|m| (m.position, m.fade.value_at(elapsed) as f32))
                .collect(),
            settled: self.markers.iter().all(|m| m.fade.is_finished(elapsed)),
            glyph: self.glyph,
            sweep_pivot: self.sweep.pivot,
            sweep_tip: self.sweep.tip_at(elapsed),
            sweep_angle_deg: self.sweep.angle_at(elapsed),
            sweep_cycle: self.sweep.cycle_at(elapsed),
        }
    }
}

/// The evaluated state of a render pass at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub pass_id: u64,
    pub elapsed: Duration,
    pub dimensions: Dimensions,
    /// Marker positions with their current opacity, in point order
    pub markers: Vec<(Point, f32)>,
    /// True once every fade-in has completed
    pub settled: bool,
    pub glyph: Rect,
    pub sweep_pivot: Point,
    pub sweep_tip: Point,
    pub sweep_angle_deg: f64,
    pub sweep_cycle: u64,
}

/// Summary of a drawn frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub pass_id: u64,
    pub markers: usize,
    /// Markers drawn with non-zero opacity
    pub visible_markers: usize,
    pub sweep_angle_deg: f64,
    pub sweep_cycle: u64,
}

/// Renderer lifecycle.
///
/// The surface lives inside the `Animating` variant, so "no surface
/// mounted" and "idle" are the same thing.
pub enum RendererState<S> {
    /// No surface mounted
    Idle,

    /// Surface mounted, sweep rotating indefinitely
    Animating { surface: S, pass: RenderPass },
}

/// Renders point sets onto a mounted surface.
pub struct Renderer<S: Surface> {
    state: RendererState<S>,
    style: RenderStyle,
    passes_built: u64,
}

impl<S: Surface> Renderer<S> {
    /// Creates an idle renderer.
    pub fn new(style: RenderStyle) -> Self {
        Self {
            state: RendererState::Idle,
            style,
            passes_built: 0,
        }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn state(&self) -> &RendererState<S> {
        &self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, RendererState::Animating { .. })
    }

    /// The live render pass, if any.
    pub fn pass(&self) -> Option<&RenderPass> {
        match &self.state {
            RendererState::Animating { pass, .. } => Some(pass),
            RendererState::Idle => None,
        }
    }

    pub fn surface(&self) -> Option<&S> {
        match &self.state {
            RendererState::Animating { surface, .. } => Some(surface),
            RendererState::Idle => None,
        }
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        match &mut self.state {
            RendererState::Animating { surface, .. } => Some(surface),
            RendererState::Idle => None,
        }
    }

    /// Mounts a surface and starts animating `points`.
    ///
    /// Mounting over an existing surface replaces it; the old one is returned.
    pub fn mount(&mut self, surface: S, points: &[Point], dimensions: Dimensions, now: Duration) -> Option<S> {
        let previous = self.unmount();
        let pass = self.next_pass(points, dimensions, now);
        debug!(pass = pass.id, markers = pass.markers.len(), "Renderer mounted");
        self.state = RendererState::Animating { surface, pass };
        previous
    }

    /// Tears down the render pass and releases the surface.
    ///
    /// Any in-flight rotation is simply dropped.
    pub fn unmount(&mut self) -> Option<S> {
        match std::mem::replace(&mut self.state, RendererState::Idle) {
            RendererState::Animating { surface, pass } => {
                debug!(pass = pass.id, "Renderer unmounted");
                Some(surface)
            }
            RendererState::Idle => None,
        }
    }

    /// Replaces the visual content with a fresh pass for `points`.
    ///
    /// Returns `false` without doing anything when no surface is mounted.
    pub fn render(&mut self, points: &[Point], dimensions: Dimensions, now: Duration) -> bool {
        if !self.is_animating() {
            debug!("Render skipped: no surface mounted");
            return false;
        }

        let next = self.next_pass(points, dimensions, now);
        if let RendererState::Animating { pass, .. } = &mut self.state {
            debug!(old = pass.id, new = next.id, markers = next.markers.len(), "Render pass replaced");
            *pass = next;
        }
        true
    }

    /// Evaluates the live pass at `now` without drawing.
    pub fn snapshot(&self, now: Duration) -> Option<FrameSnapshot> {
        self.pass().map(|pass| pass.snapshot(now))
    }

    /// Paints the frame for `now` onto the surface.
    ///
    /// Returns `Ok(None)` while idle.
    pub fn draw(&mut self, now: Duration) -> Result<Option<FrameStats>, EnvError> {
        let RendererState::Animating { surface, pass } = &mut self.state else {
            return Ok(None);
        };
        let frame = pass.snapshot(now);
        let style = &self.style;

        surface.clear(style.background);

        let mut visible_markers = 0;
        for &(position, opacity) in &frame.markers {
            if opacity > 0.0 {
                surface.fill_circle(position, style.point_radius, style.point_color.with_opacity(opacity));
                visible_markers += 1;
            }
        }

        surface.fill_rect(frame.glyph, style.glyph_color);
        surface.stroke_line(frame.sweep_pivot, frame.sweep_tip, style.sweep_width, style.sweep_color);
        surface.present()?;

        Ok(Some(FrameStats {
            pass_id: frame.pass_id,
            markers: frame.markers.len(),
            visible_markers,
            sweep_angle_deg: frame.sweep_angle_deg,
            sweep_cycle: frame.sweep_cycle,
        }))
    }

    fn next_pass(&mut self, points: &[Point], dimensions: Dimensions, now: Duration) -> RenderPass {
        self.passes_built += 1;
        RenderPass::build(self.passes_built, points, dimensions, &self.style, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw_list::{DrawCommand, DrawList};
    use approx::assert_relative_eq;

    fn dims() -> Dimensions {
        Dimensions::new(500.0, 500.0).unwrap()
    }

    fn points() -> Vec<Point> {
        vec![Point::new(200.0, 200.0), Point::new(260.0, 240.0), Point::new(300.0, 310.0)]
    }

    fn mounted() -> Renderer<DrawList> {
        let mut renderer = Renderer::new(RenderStyle::default());
        renderer.mount(DrawList::new(dims()), &points(), dims(), Duration::ZERO);
        renderer
    }

    #[test]
    fn test_render_without_surface_is_noop() {
        let mut renderer: Renderer<DrawList> = Renderer::new(RenderStyle::default());

        assert!(!renderer.render(&points(), dims(), Duration::ZERO));
        assert!(renderer.draw(Duration::from_secs(1)).unwrap().is_none());
        assert!(renderer.snapshot(Duration::ZERO).is_none());
    }

    #[test]
    fn test_mount_and_unmount_transitions() {
        let mut renderer = mounted();
        assert!(renderer.is_animating());

        let surface = renderer.unmount();
        assert!(surface.is_some());
        assert!(!renderer.is_animating());
        assert!(renderer.unmount().is_none());
    }

    #[test]
    fn test_points_fade_in_to_target_opacity() {
        let mut renderer = mounted();

        let first = renderer.snapshot(Duration::ZERO).unwrap();
        assert!(first.markers.iter().all(|(_, o)| *o == 0.0));
        assert!(!first.settled);

        let settled = renderer.snapshot(Duration::from_millis(600)).unwrap();
        assert!(settled.settled);
        for (_, opacity) in &settled.markers {
            assert_relative_eq!(*opacity, 0.8);
        }

        let stats = renderer.draw(Duration::from_millis(600)).unwrap().unwrap();
        assert_eq!(stats.markers, 3);
        assert_eq!(stats.visible_markers, 3);
    }

    #[test]
    fn test_fade_is_staggered_by_index() {
        let renderer = mounted();
        let frame = renderer.snapshot(Duration::from_millis(3)).unwrap();

        // Marker 0 started 3ms ago, marker 1 1ms ago, marker 2 not yet
        assert!(frame.markers[0].1 > frame.markers[1].1);
        assert!(frame.markers[1].1 > 0.0);
        assert_eq!(frame.markers[2].1, 0.0);
    }

    #[test]
    fn test_draw_paints_glyph_and_sweep() {
        let mut renderer = mounted();
        renderer.draw(Duration::from_millis(750)).unwrap();

        let surface = renderer.surface().unwrap();
        let commands = surface.presented();
        assert!(matches!(commands[0], DrawCommand::Clear(_)));

        let rects: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].center(), Point::new(250.0, 250.0));
        assert_eq!(rects[0].corner_radius, 4.0);

        // A quarter turn points the sweep at the right edge
        let lines = surface.lines();
        assert_eq!(lines.len(), 1);
        assert_relative_eq!(lines[0].1.x, 500.0, epsilon = 1e-9);
        assert_relative_eq!(lines[0].1.y, 250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sweep_starts_at_top_edge() {
        let renderer = mounted();
        let frame = renderer.snapshot(Duration::ZERO).unwrap();

        assert_eq!(frame.sweep_angle_deg, 0.0);
        assert_relative_eq!(frame.sweep_tip.x, 250.0, epsilon = 1e-9);
        assert_relative_eq!(frame.sweep_tip.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sweep_keeps_rotating() {
        let renderer = mounted();
        let n = 500u64;

        for cycle in 0..=n {
            let t = Duration::from_millis(cycle * 3000 + 1500);
            let frame = renderer.snapshot(t).unwrap();
            assert_eq!(frame.sweep_cycle, cycle);
            assert_relative_eq!(frame.sweep_angle_deg, 180.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_render_restarts_rotation() {
        let mut renderer = mounted();
        let first_id = renderer.pass().unwrap().id;

        let later = Duration::from_millis(4_200);
        assert!(renderer.snapshot(later).unwrap().sweep_angle_deg > 0.0);

        assert!(renderer.render(&points()[..1], dims(), later));
        let frame = renderer.snapshot(later).unwrap();
        assert_ne!(frame.pass_id, first_id);
        assert_eq!(frame.sweep_angle_deg, 0.0);
        assert_eq!(frame.sweep_cycle, 0);
        assert_eq!(frame.markers.len(), 1);
    }

    #[test]
    fn test_remount_restarts_rotation() {
        let mut renderer = mounted();
        let surface = renderer.unmount().unwrap();

        let later = Duration::from_millis(10_000);
        renderer.mount(surface, &points(), dims(), later);
        let frame = renderer.snapshot(later).unwrap();
        assert_eq!(frame.sweep_angle_deg, 0.0);
        assert_eq!(frame.sweep_cycle, 0);
    }
}
