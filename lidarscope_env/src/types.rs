//! Common types for the LidarScope environment abstraction.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};

/// A point in canvas space.
///
/// Canvas space has its origin at the top-left corner, x grows right and
/// y grows down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Size of a drawing surface.
///
/// Both sides are guaranteed positive and finite, including when
/// deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDimensions")]
pub struct Dimensions {
    width: f64,
    height: f64,
}

impl Dimensions {
    /// Creates validated dimensions.
    pub fn new(width: f64, height: f64) -> Result<Self, EnvError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(width) && valid(height) {
            Ok(Self { width, height })
        } else {
            Err(EnvError::InvalidDimensions { width, height })
        }
    }

    /// Creates square dimensions (height follows width).
    pub fn square(side: f64) -> Result<Self, EnvError> {
        Self::new(side, side)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the canvas midpoint.
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Length of the shorter side.
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
        }
    }
}

#[derive(Deserialize)]
struct RawDimensions {
    width: f64,
    height: f64,
}

impl TryFrom<RawDimensions> for Dimensions {
    type Error = EnvError;

    fn try_from(raw: RawDimensions) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// RGBA color with a fractional alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color from RGB channels and alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the same color with its alpha scaled by `opacity`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Axis-aligned rectangle, optionally with rounded corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
}

impl Rect {
    /// Creates a rectangle of the given size centered on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
            corner_radius: 0.0,
        }
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_validation() {
        assert!(Dimensions::new(500.0, 300.0).is_ok());
        assert!(Dimensions::new(0.0, 300.0).is_err());
        assert!(Dimensions::new(500.0, -1.0).is_err());
        assert!(Dimensions::new(f64::NAN, 300.0).is_err());
        assert!(Dimensions::new(f64::INFINITY, 300.0).is_err());
    }

    #[test]
    fn test_dimensions_deserialize_is_validated() {
        let dims: Dimensions = serde_json::from_str(r#"{"width":400.0,"height":200.0}"#).unwrap();
        assert_eq!(dims, Dimensions::new(400.0, 200.0).unwrap());

        assert!(serde_json::from_str::<Dimensions>(r#"{"width":0.0,"height":200.0}"#).is_err());
        assert!(serde_json::from_str::<Dimensions>(r#"{"width":400.0,"height":-3.0}"#).is_err());
    }

    #[test]
    fn test_dimensions_center() {
        let dims = Dimensions::new(400.0, 200.0).unwrap();
        assert_eq!(dims.center(), Point::new(200.0, 100.0));
        assert_eq!(dims.min_side(), 200.0);
    }

    #[test]
    fn test_square_dimensions() {
        let dims = Dimensions::square(320.0).unwrap();
        assert_eq!(dims.width(), dims.height());
    }

    #[test]
    fn test_rect_centered() {
        let rect = Rect::centered(Point::new(250.0, 250.0), 16.0, 30.0);
        assert_eq!(rect.x, 242.0);
        assert_eq!(rect.y, 235.0);
        assert_eq!(rect.center(), Point::new(250.0, 250.0));
    }

    #[test]
    fn test_color_opacity_is_clamped() {
        let c = Color::rgba(34, 211, 238, 0.5);
        assert_eq!(c.with_opacity(2.0).a, 0.5);
        assert_eq!(c.with_opacity(0.0).a, 0.0);
    }

    #[test]
    fn test_point_roundtrips_through_json() {
        let p = Point::new(1.5, -2.0);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"x":1.5,"y":-2.0}"#);
    }
}
