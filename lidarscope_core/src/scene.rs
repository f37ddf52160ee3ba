//! Synthetic LiDAR scene generation.
//!
//! Each scene scatters candidate returns over the canvas in a pattern that
//! loosely resembles the environment, then discards everything outside a
//! circular sensor range centered on the canvas:
//!
//! - **Urban**: building silhouettes, sampled along the top and left edge of
//!   four random footprints
//! - **Forest**: twenty canopy clusters with polar scatter
//! - **Open**: a sparse uniform scatter
//!
//! All randomness comes from the caller's RNG, so a seeded generator
//! reproduces a scene exactly.

use lidarscope_env::{Dimensions, Point};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Sensor range is `min(width, height) / SENSOR_RANGE_DIVISOR`.
pub const SENSOR_RANGE_DIVISOR: f64 = 2.2;

const URBAN_FOOTPRINTS: usize = 4;
const URBAN_POINTS_PER_FOOTPRINT: usize = 100;
const URBAN_BAND_START: f64 = 0.1;
const URBAN_BAND_SPAN: f64 = 0.4;
const URBAN_MIN_SIDE: f64 = 50.0;
const URBAN_SIDE_SPAN: f64 = 80.0;

const FOREST_CLUSTERS: usize = 20;
const FOREST_POINTS_PER_CLUSTER: usize = 30;
const FOREST_MIN_RADIUS: f64 = 10.0;
const FOREST_RADIUS_SPAN: f64 = 30.0;

const OPEN_POINTS: usize = 50;

/// Scene identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    /// Rectilinear building edges
    Urban,

    /// Scattered canopy clusters
    Forest,

    /// Sparse open-field returns
    Open,
}

impl Scene {
    /// Returns all scenes in selector order.
    pub fn all() -> Vec<Scene> {
        vec![Scene::Urban, Scene::Forest, Scene::Open]
    }

    /// Returns the scene name.
    pub fn name(&self) -> &'static str {
        match self {
            Scene::Urban => "urban",
            Scene::Forest => "forest",
            Scene::Open => "open",
        }
    }

    /// Returns the selector label.
    pub fn label(&self) -> &'static str {
        match self {
            Scene::Urban => "Urban Street",
            Scene::Forest => "Forest Trail",
            Scene::Open => "Open Field",
        }
    }

    /// Number of points generated before the range clip.
    pub fn candidate_count(&self) -> usize {
        match self {
            Scene::Urban => URBAN_FOOTPRINTS * URBAN_POINTS_PER_FOOTPRINT,
            Scene::Forest => FOREST_CLUSTERS * FOREST_POINTS_PER_CLUSTER,
            Scene::Open => OPEN_POINTS,
        }
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Scene {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "urban" | "urban street" | "urban_street" => Ok(Scene::Urban),
            "forest" | "forest trail" | "forest_trail" => Ok(Scene::Forest),
            "open" | "open field" | "open_field" => Ok(Scene::Open),
            _ => Err(format!("Unknown scene: {}", s)),
        }
    }
}

/// A building footprint in the urban scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Top-left corner
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl Footprint {
    /// True if `p` lies on the top edge.
    pub fn on_top_edge(&self, p: Point) -> bool {
        p.y == self.origin.y && p.x >= self.origin.x && p.x <= self.origin.x + self.width
    }

    /// True if `p` lies on the left edge.
    pub fn on_left_edge(&self, p: Point) -> bool {
        p.x == self.origin.x && p.y >= self.origin.y && p.y <= self.origin.y + self.height
    }
}

/// A tree canopy cluster in the forest scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub center: Point,
    pub max_radius: f64,
}

/// Everything a scene generation produced, before the range clip.
#[derive(Debug, Clone)]
pub struct SceneLayout {
    pub scene: Scene,
    pub dimensions: Dimensions,

    /// Urban footprints (empty for other scenes)
    pub footprints: Vec<Footprint>,

    /// Forest clusters (empty for other scenes)
    pub clusters: Vec<Cluster>,

    /// Unclipped points in generation order
    pub candidates: Vec<Point>,
}

impl SceneLayout {
    /// Generates the unclipped layout for a scene.
    pub fn generate<R: Rng + ?Sized>(scene: Scene, dimensions: Dimensions, rng: &mut R) -> Self {
        let mut layout = Self {
            scene,
            dimensions,
            footprints: Vec::new(),
            clusters: Vec::new(),
            candidates: Vec::with_capacity(scene.candidate_count()),
        };

        match scene {
            Scene::Urban => layout.scatter_urban(rng),
            Scene::Forest => layout.scatter_forest(rng),
            Scene::Open => layout.scatter_open(rng),
        }

        layout
    }

    fn scatter_urban<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (w, h) = (self.dimensions.width(), self.dimensions.height());

        for _ in 0..URBAN_FOOTPRINTS {
            let footprint = Footprint {
                origin: Point::new(
                    rng.gen::<f64>() * w * URBAN_BAND_SPAN + w * URBAN_BAND_START,
                    rng.gen::<f64>() * h * URBAN_BAND_SPAN + h * URBAN_BAND_START,
                ),
                width: rng.gen::<f64>() * URBAN_SIDE_SPAN + URBAN_MIN_SIDE,
                height: rng.gen::<f64>() * URBAN_SIDE_SPAN + URBAN_MIN_SIDE,
            };

            // Only the top and left edges are sampled
            for _ in 0..URBAN_POINTS_PER_FOOTPRINT {
                let origin = footprint.origin;
                let p = if rng.gen_bool(0.5) {
                    Point::new(origin.x + rng.gen::<f64>() * footprint.width, origin.y)
                } else {
                    Point::new(origin.x, origin.y + rng.gen::<f64>() * footprint.height)
                };
                self.candidates.push(p);
            }

            self.footprints.push(footprint);
        }
    }

    fn scatter_forest<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (w, h) = (self.dimensions.width(), self.dimensions.height());

        for _ in 0..FOREST_CLUSTERS {
            let cluster = Cluster {
                center: Point::new(rng.gen::<f64>() * w, rng.gen::<f64>() * h),
                max_radius: rng.gen::<f64>() * FOREST_RADIUS_SPAN + FOREST_MIN_RADIUS,
            };

            for _ in 0..FOREST_POINTS_PER_CLUSTER {
                let angle = rng.gen::<f64>() * TAU;
                let radius = rng.gen::<f64>() * cluster.max_radius;
                self.candidates.push(Point::new(
                    cluster.center.x + angle.cos() * radius,
                    cluster.center.y + angle.sin() * radius,
                ));
            }

            self.clusters.push(cluster);
        }
    }

    fn scatter_open<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (w, h) = (self.dimensions.width(), self.dimensions.height());

        for _ in 0..OPEN_POINTS {
            self.candidates
                .push(Point::new(rng.gen::<f64>() * w, rng.gen::<f64>() * h));
        }
    }

    /// Returns the candidates inside the sensor range, in generation order.
    pub fn clipped(&self) -> Vec<Point> {
        clip_to_range(&self.candidates, self.dimensions)
    }

    /// Consumes the layout and returns the clipped point set.
    pub fn into_points(self) -> Vec<Point> {
        let dimensions = self.dimensions;
        let mut points = self.candidates;
        points.retain(|p| within_sensor_range(*p, dimensions));
        points
    }
}

/// Generates the point set for a scene.
///
/// # Arguments
/// * `scene` - Which synthetic environment to scatter
/// * `dimensions` - Canvas size the coordinates are scaled to
/// * `rng` - Source of randomness; seed it for reproducible output
pub fn generate<R: Rng + ?Sized>(scene: Scene, dimensions: Dimensions, rng: &mut R) -> Vec<Point> {
    SceneLayout::generate(scene, dimensions, rng).into_points()
}

/// Radius of the simulated sensor range for a canvas.
pub fn sensor_range(dimensions: Dimensions) -> f64 {
    dimensions.min_side() / SENSOR_RANGE_DIVISOR
}

/// True if `p` is within the sensor range of the canvas center.
pub fn within_sensor_range(p: Point, dimensions: Dimensions) -> bool {
    p.distance_to(dimensions.center()) <= sensor_range(dimensions)
}

/// Filters `points` down to the sensor range, preserving order.
pub fn clip_to_range(points: &[Point], dimensions: Dimensions) -> Vec<Point> {
    points
        .iter()
        .copied()
        .filter(|p| within_sensor_range(*p, dimensions))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dims(w: f64, h: f64) -> Dimensions {
        Dimensions::new(w, h).unwrap()
    }

    #[test]
    fn test_every_scene_respects_sensor_range() {
        for seed in 0..20 {
            for scene in Scene::all() {
                for d in [dims(500.0, 500.0), dims(800.0, 300.0), dims(120.0, 640.0)] {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    let points = generate(scene, d, &mut rng);
                    let limit = d.min_side() / 2.2;
                    for p in &points {
                        let dist = ((p.x - d.width() / 2.0).powi(2) + (p.y - d.height() / 2.0).powi(2)).sqrt();
                        assert!(dist <= limit, "{} point {:?} outside range {}", scene, p, limit);
                    }
                }
            }
        }
    }

    #[test]
    fn test_open_scene_candidate_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let layout = SceneLayout::generate(Scene::Open, dims(500.0, 500.0), &mut rng);

        assert_eq!(layout.candidates.len(), 50);
        assert!(layout.clipped().len() <= 50);
        assert!(layout.footprints.is_empty());
        assert!(layout.clusters.is_empty());
    }

    #[test]
    fn test_forest_points_stay_in_their_cluster() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let layout = SceneLayout::generate(Scene::Forest, dims(500.0, 500.0), &mut rng);

        assert_eq!(layout.clusters.len(), 20);
        assert_eq!(layout.candidates.len(), 600);

        for (i, cluster) in layout.clusters.iter().enumerate() {
            assert!(cluster.max_radius >= 10.0 && cluster.max_radius <= 40.0);
            for p in &layout.candidates[i * 30..(i + 1) * 30] {
                assert!(p.distance_to(cluster.center) <= cluster.max_radius + 1e-9);
            }
        }
    }

    #[test]
    fn test_urban_points_lie_on_top_or_left_edge() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let d = dims(500.0, 500.0);
        let layout = SceneLayout::generate(Scene::Urban, d, &mut rng);

        assert_eq!(layout.footprints.len(), 4);
        assert_eq!(layout.candidates.len(), 400);

        for (i, footprint) in layout.footprints.iter().enumerate() {
            assert!(footprint.origin.x >= 50.0 && footprint.origin.x < 250.0);
            assert!(footprint.origin.y >= 50.0 && footprint.origin.y < 250.0);
            assert!(footprint.width >= 50.0 && footprint.width < 130.0);
            assert!(footprint.height >= 50.0 && footprint.height < 130.0);

            for p in &layout.candidates[i * 100..(i + 1) * 100] {
                assert!(footprint.on_top_edge(*p) || footprint.on_left_edge(*p));
            }
        }
    }

    #[test]
    fn test_urban_samples_both_edges() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let layout = SceneLayout::generate(Scene::Urban, dims(500.0, 500.0), &mut rng);
        let footprint = layout.footprints[0];
        let first = &layout.candidates[..100];

        let top = first.iter().filter(|p| footprint.on_top_edge(**p)).count();
        let left = first.iter().filter(|p| footprint.on_left_edge(**p)).count();
        assert!(top > 20 && left > 20, "top={} left={}", top, left);
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        for scene in Scene::all() {
            let mut rng1 = ChaCha8Rng::seed_from_u64(42);
            let mut rng2 = ChaCha8Rng::seed_from_u64(42);

            let a = generate(scene, dims(500.0, 500.0), &mut rng1);
            let b = generate(scene, dims(500.0, 500.0), &mut rng2);
            assert_eq!(a, b);

            let mut rng3 = ChaCha8Rng::seed_from_u64(43);
            let c = generate(scene, dims(500.0, 500.0), &mut rng3);
            assert_ne!(a, c);
        }
    }

    #[test]
    fn test_clip_preserves_generation_order() {
        let d = dims(100.0, 100.0);
        let points = vec![
            Point::new(50.0, 50.0),
            Point::new(0.0, 0.0),
            Point::new(60.0, 40.0),
            Point::new(98.0, 50.0),
            Point::new(40.0, 55.0),
        ];

        let kept = clip_to_range(&points, d);
        assert_eq!(kept, vec![points[0], points[2], points[4]]);
    }

    #[test]
    fn test_point_on_range_boundary_is_kept() {
        let d = dims(220.0, 220.0);
        let center = d.center();
        let r = sensor_range(d);

        let on_boundary = Point::new(center.x, center.y - r);
        let just_beyond = Point::new(center.x, center.y - (r + 1e-9));
        assert_eq!(on_boundary.distance_to(center), r);

        assert!(within_sensor_range(on_boundary, d));
        assert!(!within_sensor_range(just_beyond, d));
        assert_eq!(clip_to_range(&[on_boundary, just_beyond], d), vec![on_boundary]);
    }

    #[test]
    fn test_scene_parsing() {
        assert_eq!("urban".parse::<Scene>().unwrap(), Scene::Urban);
        assert_eq!("Forest Trail".parse::<Scene>().unwrap(), Scene::Forest);
        assert_eq!("OPEN".parse::<Scene>().unwrap(), Scene::Open);
        assert!("desert".parse::<Scene>().is_err());
    }

    #[test]
    fn test_candidate_counts() {
        assert_eq!(Scene::Urban.candidate_count(), 400);
        assert_eq!(Scene::Forest.candidate_count(), 600);
        assert_eq!(Scene::Open.candidate_count(), 50);
    }
}
