//! LidarScope CLI
//!
//! Replays the viewer deterministically, prints pipeline explanations, or
//! opens the terminal dashboard.

use clap::Parser;
use lidarscope_core::{ExplainConfig, Explainer, OfflineGenerator, PipelineStep, Scene};
use lidarscope_env::Dimensions;
use lidarscope_sim::{RunConfig, RunResult, SceneRunner, SimError};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// LidarScope: simulated LiDAR point clouds with an animated sweep
#[derive(Parser, Debug)]
#[command(name = "lidarscope")]
#[command(about = "Generate, animate and check simulated LiDAR scenes", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scene to run (urban, forest, open, all)
    #[arg(short = 'S', long, default_value = "all")]
    scene: String,

    /// Canvas width
    #[arg(long, default_value = "500")]
    width: f64,

    /// Canvas height
    #[arg(long, default_value = "500")]
    height: f64,

    /// Virtual seconds to simulate
    #[arg(short, long, default_value = "10")]
    duration: f64,

    /// Number of consecutive seeds to test
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Inject a scene switch, a resize and a remount into each run
    #[arg(long)]
    interact: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export sampled frames of a single scene to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Print the explanation for a pipeline step (or "all").
    /// No network backend is bundled: without API_KEY the missing-key notice
    /// is printed, with it the generic failure notice.
    #[arg(long)]
    explain: Option<String>,

    /// Print the application cards
    #[arg(long)]
    applications: bool,

    /// Open the terminal dashboard
    #[cfg(feature = "dashboard")]
    #[arg(long)]
    dashboard: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let dimensions = match Dimensions::new(args.width, args.height) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let duration = match run_duration(args.duration) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    #[cfg(feature = "dashboard")]
    {
        if args.dashboard {
            return run_dashboard(&args, dimensions);
        }
    }

    if args.explain.is_some() || args.applications {
        return run_explanations(&args);
    }

    if !args.json {
        info!("LidarScope v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenes: Vec<Scene> = if args.scene == "all" {
        Scene::all()
    } else {
        match args.scene.parse() {
            Ok(scene) => vec![scene],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenes: urban, forest, open, all");
                return ExitCode::FAILURE;
            }
        }
    };

    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let run_config = |scene: Scene, seed: u64| {
        let config = RunConfig {
            seed,
            scene,
            dimensions,
            duration,
            ..Default::default()
        };
        if args.interact {
            config.with_interactions()
        } else {
            config
        }
    };

    if let Some(export_path) = &args.export {
        if scenes.len() > 1 {
            eprintln!("Error: --export only supports a single scene, not 'all'");
            return ExitCode::FAILURE;
        }
        return run_export(run_config(scenes[0], base_seed), export_path);
    }

    let mut all_results: Vec<RunResult> = Vec::new();
    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        for scene in &scenes {
            let result = match SceneRunner::new(run_config(*scene, seed)).run() {
                Ok(r) => r,
                Err(e) => {
                    error!("✗ {} (seed={}) aborted: {}", scene.name(), seed, e);
                    return ExitCode::FAILURE;
                }
            };

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED ({} points, {} passes)",
                        scene.name(),
                        seed,
                        result.final_point_count,
                        result.render_passes
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scene.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
            all_results.push(result);
        }
    }

    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed_count,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scene": r.scene.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "frames": r.total_frames,
                    "time_secs": r.final_time_secs,
                    "points": r.final_point_count,
                    "passes": r.render_passes,
                    "sweep_cycles": r.max_sweep_cycle,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed_count == 0 {
            info!("✅ All {} scene runs passed!", total);
        } else {
            error!("❌ {}/{} scene runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scene.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    if failed_count > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Converts `--duration` seconds, rejecting values a run cannot use.
fn run_duration(secs: f64) -> Result<Duration, String> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("invalid duration: {} (expected non-negative seconds)", secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration: {} ({})", secs, e))
}

fn run_export(config: RunConfig, export_path: &str) -> ExitCode {
    info!("Running with export to: {}", export_path);
    let scene = config.scene;
    let seed = config.seed;

    let outcome = SceneRunner::new(config)
        .run_with_export()
        .and_then(|(result, export)| {
            export.write_to_file(export_path).map_err(SimError::from)?;
            info!("Exported {} frames to {}", export.frames.len(), export_path);
            Ok(result)
        });

    match outcome {
        Ok(result) if result.passed => {
            info!("✓ {} (seed={}) PASSED - exported to {}", scene.name(), seed, export_path);
            ExitCode::SUCCESS
        }
        Ok(result) => {
            error!(
                "✗ {} FAILED: {}",
                scene.name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Export run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_explanations(args: &Args) -> ExitCode {
    let steps: Vec<PipelineStep> = match args.explain.as_deref() {
        None => Vec::new(),
        Some("all") => PipelineStep::all(),
        Some(name) => match name.parse() {
            Ok(step) => vec![step],
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let explainer = Arc::new(Explainer::new(ExplainConfig::from_env(), OfflineGenerator));
    runtime.block_on(async {
        for step in steps {
            let text = explainer.explain_step(step).await;
            println!("## {}\n\n{}\n", step.label(), text);
        }

        if args.applications {
            for card in Arc::clone(&explainer).describe_applications().await {
                println!("## {}\n\n{}\n\n{}\n", card.title, card.image_url, card.description);
            }
        }
    });

    ExitCode::SUCCESS
}

#[cfg(feature = "dashboard")]
fn run_dashboard(args: &Args, dimensions: Dimensions) -> ExitCode {
    use lidarscope_core::dashboard::{spawn_explanation_worker, ScopeDashboard};
    use lidarscope_core::ViewerConfig;
    use lidarscope_env::SystemContext;

    let scene = match args.scene.as_str() {
        "all" => Scene::Urban,
        name => match name.parse() {
            Ok(scene) => scene,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let explainer = Explainer::new(ExplainConfig::from_env(), OfflineGenerator);
    let (requests, packets) = match spawn_explanation_worker(explainer) {
        Ok(channels) => channels,
        Err(e) => {
            eprintln!("Failed to start explanation worker: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = ViewerConfig {
        scene,
        dimensions,
        ..Default::default()
    };
    let mut dashboard = ScopeDashboard::new(SystemContext::shared(), config, requests, packets);
    match dashboard.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Dashboard error: {}", e);
            ExitCode::FAILURE
        }
    }
}
