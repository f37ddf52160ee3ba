//! Scene runner - drives the viewer over virtual time and checks every frame.

use crate::context::SimContext;
use crate::exporter::{ScopeExport, ScopeFrame};
use crate::error::SimError;

use lidarscope_core::scene::within_sensor_range;
use lidarscope_core::{DrawList, FrameSnapshot, LidarViewer, RenderStyle, Scene, ViewerConfig};
use lidarscope_env::{Dimensions, Point, ScopeContext};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// RNG stream used for scene generation.
const SCENE_STREAM: u64 = 1;

/// Tolerance when comparing sweep angles.
const ANGLE_EPSILON_DEG: f64 = 1e-6;

/// An interaction injected at a point in virtual time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptEvent {
    /// Press a scene selector
    SelectScene { at: Duration, scene: Scene },

    /// Container width changed (canvas stays square)
    ObserveWidth { at: Duration, width: f64 },

    /// Unmount the surface and mount it again
    Remount { at: Duration },
}

impl ScriptEvent {
    pub fn at(&self) -> Duration {
        match self {
            ScriptEvent::SelectScene { at, .. }
            | ScriptEvent::ObserveWidth { at, .. }
            | ScriptEvent::Remount { at } => *at,
        }
    }
}

/// Configuration for a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Scene selected at mount
    pub scene: Scene,

    /// Initial canvas size
    pub dimensions: Dimensions,

    /// Virtual time to simulate
    pub duration: Duration,

    /// Frames per virtual second
    pub frame_rate_hz: u32,

    /// Export every Nth frame
    pub export_interval: u64,

    /// Interactions, applied in time order
    pub script: Vec<ScriptEvent>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scene: Scene::Urban,
            dimensions: Dimensions::default(),
            duration: Duration::from_secs(10),
            frame_rate_hz: 30,
            export_interval: 10,
            script: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Adds a scene switch, a resize and a remount spread over the run.
    pub fn with_interactions(mut self) -> Self {
        let next_scene = Scene::all()
            .into_iter()
            .cycle()
            .skip_while(|s| *s != self.scene)
            .nth(1)
            .unwrap_or(self.scene);
        let width = self.dimensions.width() * 0.8;

        self.script.extend([
            ScriptEvent::SelectScene { at: self.duration / 4, scene: next_scene },
            ScriptEvent::ObserveWidth { at: self.duration / 2, width },
            ScriptEvent::Remount { at: self.duration * 3 / 4 },
        ]);
        self
    }
}

/// Results from a run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Scene the run started with
    pub scene: Scene,

    /// Seed used
    pub seed: u64,

    /// Whether every frame passed every check
    pub passed: bool,

    /// Frames drawn
    pub total_frames: u64,

    /// Final virtual time in seconds
    pub final_time_secs: f64,

    /// Points in the final point set
    pub final_point_count: usize,

    /// Render passes built (mount + every accepted event)
    pub render_passes: u64,

    /// Highest sweep cycle observed in any pass
    pub max_sweep_cycle: u64,

    /// First failed check, if any
    pub failure_reason: Option<String>,
}

/// Runs scenes deterministically.
pub struct SceneRunner {
    config: RunConfig,
}

impl SceneRunner {
    /// Creates a new runner.
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the configured scene and returns the result.
    pub fn run(&self) -> Result<RunResult, SimError> {
        self.execute(None)
    }

    /// Runs the configured scene, collecting frames for export.
    pub fn run_with_export(&self) -> Result<(RunResult, ScopeExport), SimError> {
        let mut export = ScopeExport::new(self.config.scene, self.config.seed, self.config.dimensions);
        let result = self.execute(Some(&mut export))?;
        export.finalize(result.passed, result.failure_reason.clone());
        Ok((result, export))
    }

    fn execute(&self, mut export: Option<&mut ScopeExport>) -> Result<RunResult, SimError> {
        let config = &self.config;
        info!("Starting run: {} (seed={})", config.scene, config.seed);

        let ctx = SimContext::new(config.seed);
        let style = RenderStyle::default();
        let mut viewer: LidarViewer<DrawList, ChaCha8Rng> = LidarViewer::new(
            ViewerConfig {
                scene: config.scene,
                dimensions: config.dimensions,
                style: style.clone(),
            },
            ctx.rng(SCENE_STREAM),
        );
        viewer.mount(DrawList::new(config.dimensions), ctx.now());

        let mut script = config.script.clone();
        script.sort_by_key(|e| e.at());
        let mut script = script.into_iter().peekable();

        let frame_dt = Duration::from_secs(1) / config.frame_rate_hz.max(1);
        let total_frames = (config.duration.as_nanos() / frame_dt.as_nanos()) as u64;
        let mut checker = FrameChecker::new(style);
        let mut failure_reason = None;

        for frame in 0..=total_frames {
            let now = ctx.now();

            while let Some(event) = script.next_if(|e| e.at() <= now) {
                apply(&mut viewer, event, now)?;
            }

            viewer.draw(now)?;
            let Some(snapshot) = viewer.snapshot(now) else {
                continue;
            };

            if failure_reason.is_none() {
                let surface = viewer.renderer().surface();
                if let Err(reason) = checker.check(viewer.points(), &snapshot, surface) {
                    warn!("Frame {} failed: {}", frame, reason);
                    failure_reason = Some(format!("t={:.3}s: {}", now.as_secs_f64(), reason));
                }
            }

            if let Some(export) = export.as_deref_mut() {
                if frame % config.export_interval.max(1) == 0 {
                    let time_ms = now.as_millis() as u64;
                    export.add_frame(ScopeFrame::from_snapshot(time_ms, viewer.scene(), &snapshot));
                }
            }

            if frame % config.frame_rate_hz.max(1) as u64 == 0 {
                debug!(
                    "  t={:.1}s | scene={} | points={} | sweep={:.0}°",
                    now.as_secs_f64(),
                    viewer.scene(),
                    viewer.points().len(),
                    snapshot.sweep_angle_deg
                );
            }

            ctx.advance_time(frame_dt);
        }

        // The sweep must still be turning after the last frame
        let end = ctx.now() + config.duration.max(Duration::from_secs(60));
        if failure_reason.is_none() && !viewer.renderer().is_animating() {
            failure_reason = Some("renderer stopped animating".to_string());
        }
        if let (None, Some(last), Some(later)) = (&failure_reason, viewer.snapshot(ctx.now()), viewer.snapshot(end)) {
            if later.sweep_cycle <= last.sweep_cycle {
                failure_reason = Some("sweep rotation stopped".to_string());
            }
        }

        Ok(RunResult {
            scene: config.scene,
            seed: config.seed,
            passed: failure_reason.is_none(),
            total_frames: total_frames + 1,
            final_time_secs: ctx.now().as_secs_f64(),
            final_point_count: viewer.points().len(),
            render_passes: viewer.renderer().pass().map(|p| p.id).unwrap_or(0),
            max_sweep_cycle: checker.max_cycle,
            failure_reason,
        })
    }
}

fn apply(viewer: &mut LidarViewer<DrawList, ChaCha8Rng>, event: ScriptEvent, now: Duration) -> Result<(), SimError> {
    match event {
        ScriptEvent::SelectScene { scene, .. } => {
            let changed = viewer.select_scene(scene, now);
            debug!("Scene -> {} (changed={})", scene, changed);
        }
        ScriptEvent::ObserveWidth { width, .. } => {
            let changed = viewer.observe_width(width, now)?;
            if changed {
                let dimensions = viewer.dimensions();
                if let Some(surface) = viewer.surface_mut() {
                    surface.resize(dimensions);
                }
            }
            debug!("Width -> {} (changed={})", width, changed);
        }
        ScriptEvent::Remount { .. } => {
            if let Some(surface) = viewer.unmount() {
                viewer.mount(surface, now);
            }
            debug!("Remounted");
        }
    }
    Ok(())
}

/// Per-frame invariant checks.
struct FrameChecker {
    style: RenderStyle,
    pass_id: u64,
    last_cycle: u64,
    max_cycle: u64,
}

impl FrameChecker {
    fn new(style: RenderStyle) -> Self {
        Self {
            style,
            pass_id: 0,
            last_cycle: 0,
            max_cycle: 0,
        }
    }

    fn check(&mut self, points: &[Point], frame: &FrameSnapshot, surface: Option<&DrawList>) -> Result<(), String> {
        // Range
        if let Some((p, _)) = frame.markers.iter().find(|(p, _)| !within_sensor_range(*p, frame.dimensions)) {
            return Err(format!("point ({:.2}, {:.2}) outside sensor range", p.x, p.y));
        }

        // Replacement: markers are exactly the current point set
        if frame.markers.len() != points.len()
            || frame.markers.iter().zip(points).any(|((m, _), p)| m != p)
        {
            return Err(format!(
                "pass {} shows {} markers for {} current points",
                frame.pass_id,
                frame.markers.len(),
                points.len()
            ));
        }

        // Drawn circles are an ordered subset of the markers
        if let Some(surface) = surface {
            let mut markers = frame.markers.iter();
            for (center, _) in surface.circles() {
                if !markers.any(|(m, _)| *m == center) {
                    return Err(format!("leftover point ({:.2}, {:.2}) on surface", center.x, center.y));
                }
            }
        }

        // Sweep
        let period = self.style.sweep_period.as_nanos().max(1);
        let expected = (frame.elapsed.as_nanos() % period) as f64 / period as f64 * 360.0;
        let diff = (frame.sweep_angle_deg - expected).abs();
        if diff > ANGLE_EPSILON_DEG && (360.0 - diff) > ANGLE_EPSILON_DEG {
            return Err(format!(
                "sweep at {:.3}° but {:.3}° expected",
                frame.sweep_angle_deg, expected
            ));
        }
        if frame.pass_id != self.pass_id {
            if frame.elapsed.is_zero() && frame.sweep_angle_deg != 0.0 {
                return Err(format!("pass {} did not restart the sweep", frame.pass_id));
            }
            self.pass_id = frame.pass_id;
            self.last_cycle = frame.sweep_cycle;
        } else if frame.sweep_cycle < self.last_cycle {
            return Err("sweep cycle went backwards".to_string());
        }
        self.last_cycle = frame.sweep_cycle;
        self.max_cycle = self.max_cycle.max(frame.sweep_cycle);

        // Fade
        if frame.settled {
            if let Some((p, opacity)) = frame.markers.iter().find(|(_, o)| *o != self.style.point_opacity) {
                return Err(format!(
                    "settled marker ({:.2}, {:.2}) at opacity {}",
                    p.x, p.y, opacity
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(scene: Scene, seed: u64) -> RunConfig {
        RunConfig {
            seed,
            scene,
            duration: Duration::from_secs(4),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_scene_passes() {
        for scene in Scene::all() {
            let result = SceneRunner::new(config(scene, 42)).run().unwrap();
            assert!(result.passed, "{}: {:?}", scene, result.failure_reason);
            assert_eq!(result.total_frames, 121);
            assert_eq!(result.render_passes, 1);
        }
    }

    #[test]
    fn test_interactions_rebuild_passes() {
        let cfg = config(Scene::Urban, 7).with_interactions();
        let result = SceneRunner::new(cfg).run().unwrap();

        assert!(result.passed, "{:?}", result.failure_reason);
        // Mount, scene switch, resize, remount
        assert_eq!(result.render_passes, 4);
    }

    #[test]
    fn test_sweep_cycles_accumulate() {
        let cfg = RunConfig {
            duration: Duration::from_secs(30),
            frame_rate_hz: 10,
            ..config(Scene::Open, 3)
        };
        let result = SceneRunner::new(cfg).run().unwrap();

        assert!(result.passed);
        assert_eq!(result.max_sweep_cycle, 10);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let a = SceneRunner::new(config(Scene::Forest, 99)).run_with_export().unwrap().1;
        let b = SceneRunner::new(config(Scene::Forest, 99)).run_with_export().unwrap().1;

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_export_collects_frames() {
        let (result, export) = SceneRunner::new(config(Scene::Open, 5)).run_with_export().unwrap();

        assert!(export.passed);
        assert_eq!(export.frames.len(), 13);
        assert_eq!(export.frames[0].sweep_angle_deg, 0.0);
        assert_eq!(export.frames.last().unwrap().points.len(), result.final_point_count);
    }

    #[test]
    fn test_scene_switch_leaves_no_previous_points() {
        let cfg = RunConfig {
            script: vec![ScriptEvent::SelectScene { at: Duration::from_secs(1), scene: Scene::Open }],
            ..config(Scene::Forest, 11)
        };
        let (result, export) = SceneRunner::new(cfg).run_with_export().unwrap();

        assert!(result.passed, "{:?}", result.failure_reason);
        let last = export.frames.last().unwrap();
        assert_eq!(last.scene, Scene::Open);
        assert!(last.points.len() <= 50);
    }

    #[test]
    fn test_with_interactions_picks_next_scene() {
        let cfg = RunConfig { scene: Scene::Open, ..Default::default() }.with_interactions();
        assert_eq!(
            cfg.script[0],
            ScriptEvent::SelectScene { at: Duration::from_millis(2500), scene: Scene::Urban }
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_runs_pass_for_any_seed_and_size(
            seed in any::<u64>(),
            scene_idx in 0usize..3,
            width in 60.0f64..900.0,
            height in 60.0f64..900.0,
        ) {
            let cfg = RunConfig {
                seed,
                scene: Scene::all()[scene_idx],
                dimensions: Dimensions::new(width, height).unwrap(),
                duration: Duration::from_secs(2),
                frame_rate_hz: 15,
                ..Default::default()
            }
            .with_interactions();

            let result = SceneRunner::new(cfg).run().unwrap();
            prop_assert!(result.passed, "{:?}", result.failure_reason);
        }
    }
}
