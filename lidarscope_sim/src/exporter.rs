//! JSON exporter for rendered frames.
//!
//! Exports the evaluated frames of a run so they can be replayed or plotted
//! outside the terminal.

use lidarscope_core::{FrameSnapshot, Scene};
use lidarscope_env::Dimensions;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single exported frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeFrame {
    /// Virtual time in milliseconds
    pub time_ms: u64,

    /// Scene shown in this frame
    pub scene: Scene,

    pub width: f64,
    pub height: f64,

    /// Render pass the frame belongs to
    pub pass_id: u64,

    pub sweep_angle_deg: f64,
    pub sweep_cycle: u64,

    /// Point markers with their opacity
    pub points: Vec<PointSample>,
}

impl ScopeFrame {
    pub fn from_snapshot(time_ms: u64, scene: Scene, snapshot: &FrameSnapshot) -> Self {
        Self {
            time_ms,
            scene,
            width: snapshot.dimensions.width(),
            height: snapshot.dimensions.height(),
            pass_id: snapshot.pass_id,
            sweep_angle_deg: snapshot.sweep_angle_deg,
            sweep_cycle: snapshot.sweep_cycle,
            points: snapshot
                .markers
                .iter()
                .map(|(p, opacity)| PointSample {
                    x: p.x,
                    y: p.y,
                    opacity: *opacity,
                })
                .collect(),
        }
    }
}

/// Point marker sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointSample {
    pub x: f64,
    pub y: f64,
    pub opacity: f32,
}

/// Complete run export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeExport {
    /// Scene the run started with
    pub scene: Scene,

    /// Seed used
    pub seed: u64,

    pub width: f64,
    pub height: f64,

    /// Time of the last exported frame, in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<ScopeFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ScopeExport {
    /// Creates a new export container.
    pub fn new(scene: Scene, seed: u64, dimensions: Dimensions) -> Self {
        Self {
            scene,
            seed,
            width: dimensions.width(),
            height: dimensions.height(),
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: ScopeFrame) {
        self.duration_sec = frame.time_ms as f64 / 1000.0;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time_ms: u64) -> ScopeFrame {
        ScopeFrame {
            time_ms,
            scene: Scene::Open,
            width: 500.0,
            height: 500.0,
            pass_id: 1,
            sweep_angle_deg: 12.0,
            sweep_cycle: 0,
            points: vec![PointSample { x: 1.0, y: 2.0, opacity: 0.8 }],
        }
    }

    #[test]
    fn test_add_frame_tracks_duration() {
        let mut export = ScopeExport::new(Scene::Open, 7, Dimensions::default());
        export.add_frame(frame(0));
        export.add_frame(frame(1500));

        assert_eq!(export.frames.len(), 2);
        assert_eq!(export.duration_sec, 1.5);
    }

    #[test]
    fn test_export_json_shape() {
        let mut export = ScopeExport::new(Scene::Open, 7, Dimensions::default());
        export.add_frame(frame(100));
        export.finalize(true, None);

        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["scene"], "open");
        assert_eq!(value["frames"][0]["points"][0]["x"], 1.0);
        assert!(value.get("failure_reason").is_none());
    }
}
