//! LidarScope TUI Dashboard Module
//! ================================
//!
//! Live terminal view of the simulated scan. Uses Ratatui for rendering and
//! Crossbeam to receive explanations from a background worker thread.
//!
//! Enable with the `dashboard` feature flag.
//!
//! Features:
//! - Scene selector tabs (keys 1/2/3)
//! - Braille canvas with the point cloud, sensor glyph and rotating sweep
//! - Pipeline step list with the explanation for the active step

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Line as CanvasLine, Points, Rectangle},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::draw_list::{DrawCommand, DrawList};
use crate::explain::{Explainer, PipelineStep, TextGenerator};
use crate::scene::Scene;
use crate::viewer::{LidarViewer, ViewerConfig};
use lidarscope_env::{Dimensions, ScopeContext};

/// Logical canvas units per terminal column.
const UNITS_PER_COLUMN: f64 = 8.0;

/// Markers fainter than this are not painted.
const MIN_VISIBLE_ALPHA: f32 = 0.05;

// =============================================================================
// EXPLANATION WORKER
// =============================================================================

/// Explanation delivered from the worker thread to the TUI.
#[derive(Debug, Clone)]
pub struct ExplanationPacket {
    pub step: PipelineStep,
    pub text: String,
}

/// Starts a thread that answers step requests with explanations.
///
/// The worker exits when either channel is closed.
pub fn spawn_explanation_worker<G: TextGenerator>(
    explainer: Explainer<G>,
) -> io::Result<(Sender<PipelineStep>, Receiver<ExplanationPacket>)> {
    let (request_tx, request_rx) = channel::unbounded::<PipelineStep>();
    let (packet_tx, packet_rx) = channel::unbounded();

    thread::Builder::new()
        .name("explain-worker".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().build() {
                Ok(rt) => rt,
                Err(e) => {
                    warn!("Explanation worker could not start a runtime: {}", e);
                    return;
                }
            };
            for step in request_rx {
                let text = runtime.block_on(explainer.explain_step(step));
                if packet_tx.send(ExplanationPacket { step, text }).is_err() {
                    break;
                }
            }
            debug!("Explanation worker stopped");
        })?;

    Ok((request_tx, packet_rx))
}

// =============================================================================
// SCOPE DASHBOARD
// =============================================================================

/// TUI dashboard around a `LidarViewer`.
pub struct ScopeDashboard<C: ScopeContext> {
    ctx: Arc<C>,
    viewer: LidarViewer<DrawList, ChaCha8Rng>,
    requests: Sender<PipelineStep>,
    rx: Receiver<ExplanationPacket>,
    active_step: PipelineStep,
    /// `None` while the active step is loading
    explanation: Option<String>,
    frame_count: usize,
}

impl<C: ScopeContext> ScopeDashboard<C> {
    /// Creates a dashboard with a mounted viewer and requests the first explanation.
    pub fn new(
        ctx: Arc<C>,
        config: ViewerConfig,
        requests: Sender<PipelineStep>,
        rx: Receiver<ExplanationPacket>,
    ) -> Self {
        let dimensions = config.dimensions;
        let mut viewer = LidarViewer::new(config, ctx.rng(0));
        viewer.mount(DrawList::new(dimensions), ctx.now());

        let mut dashboard = Self {
            ctx,
            viewer,
            requests,
            rx,
            active_step: PipelineStep::Acquisition,
            explanation: None,
            frame_count: 0,
        };
        dashboard.request_explanation();
        dashboard
    }

    pub fn viewer(&self) -> &LidarViewer<DrawList, ChaCha8Rng> {
        &self.viewer
    }

    pub fn active_step(&self) -> PipelineStep {
        self.active_step
    }

    /// Applies a key press. Returns `false` when the dashboard should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let now = self.ctx.now();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char(c) => {
                if let Some(scene) = scene_for_key(c) {
                    self.viewer.select_scene(scene, now);
                }
            }
            KeyCode::Down | KeyCode::Right | KeyCode::Tab => self.select_step(self.active_step.next()),
            KeyCode::Up | KeyCode::Left | KeyCode::BackTab => self.select_step(self.active_step.previous()),
            _ => {}
        }
        true
    }

    /// Drains delivered explanations, keeping only the one for the active step.
    pub fn poll_explanations(&mut self) {
        while let Ok(packet) = self.rx.try_recv() {
            if packet.step == self.active_step {
                self.explanation = Some(packet.text);
            }
        }
    }

    fn select_step(&mut self, step: PipelineStep) {
        if step != self.active_step {
            self.active_step = step;
            self.request_explanation();
        }
    }

    fn request_explanation(&mut self) {
        self.explanation = None;
        if self.requests.send(self.active_step).is_err() {
            warn!("Explanation worker is gone");
        }
    }

    /// Run the TUI main loop (blocks until 'q' pressed)
    pub fn run(&mut self) -> io::Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        loop {
            self.poll_explanations();

            // Keep the logical canvas square and sized to the terminal
            let size = terminal.size()?;
            let canvas = split(Rect::new(0, 0, size.width, size.height)).canvas;
            let now = self.ctx.now();
            if let Ok(dimensions) = Dimensions::square(canvas_side(canvas)) {
                if self.viewer.resize(dimensions, now) {
                    if let Some(surface) = self.viewer.surface_mut() {
                        surface.resize(dimensions);
                    }
                }
            }

            self.viewer.draw(now).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            terminal.draw(|f| self.ui(f))?;
            self.frame_count += 1;

            // Handle input (non-blocking with ~30 FPS redraw)
            if event::poll(Duration::from_millis(33))? {
                if let Event::Key(key) = event::read()? {
                    if !self.handle_key(key.code) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Render the UI
    fn ui(&self, f: &mut Frame) {
        let chunks = split(f.area());

        // === SCENE TABS ===
        let scenes = Scene::all();
        let selected = scenes.iter().position(|s| *s == self.viewer.scene()).unwrap_or(0);
        let tabs = Tabs::new(
            scenes
                .iter()
                .enumerate()
                .map(|(i, s)| Line::from(format!("{} {}", i + 1, s.label())))
                .collect::<Vec<_>>(),
        )
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().title("Interactive LiDAR Simulation").borders(Borders::ALL));
        f.render_widget(tabs, chunks.header);

        // === POINT CLOUD ===
        let side = self.viewer.dimensions().width();
        let commands = self
            .viewer
            .renderer()
            .surface()
            .map(|s| s.presented().to_vec())
            .unwrap_or_default();
        let canvas = Canvas::default()
            .block(Block::default().title(format!("{} points", self.viewer.points().len())).borders(Borders::ALL))
            .marker(Marker::Braille)
            .background_color(Color::Rgb(17, 24, 39))
            .x_bounds([0.0, side])
            .y_bounds([0.0, side])
            .paint(move |ctx| {
                for command in &commands {
                    match command {
                        DrawCommand::Clear(_) => {}
                        DrawCommand::Circle { center, color, .. } => {
                            if color.a >= MIN_VISIBLE_ALPHA {
                                ctx.draw(&Points {
                                    coords: &[(center.x, flip_y(center.y, side))],
                                    color: shade(*color),
                                });
                            }
                        }
                        DrawCommand::Rect { rect, color } => ctx.draw(&Rectangle {
                            x: rect.x,
                            y: flip_y(rect.y + rect.height, side),
                            width: rect.width,
                            height: rect.height,
                            color: shade(*color),
                        }),
                        DrawCommand::Line { from, to, color, .. } => ctx.draw(&CanvasLine {
                            x1: from.x,
                            y1: flip_y(from.y, side),
                            x2: to.x,
                            y2: flip_y(to.y, side),
                            color: shade(*color),
                        }),
                    }
                }
            });
        f.render_widget(canvas, chunks.canvas);

        // === PIPELINE ===
        let steps: Vec<ListItem> = PipelineStep::all()
            .into_iter()
            .map(|step| {
                let style = if step == self.active_step {
                    Style::default().fg(Color::White).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(Span::styled(step.label(), style))
            })
            .collect();
        let list = List::new(steps).block(Block::default().title("Pipeline").borders(Borders::ALL));
        f.render_widget(list, chunks.steps);

        let body = match &self.explanation {
            Some(text) => Paragraph::new(text.as_str()).style(Style::default().fg(Color::Gray)),
            None => Paragraph::new("• • •").style(Style::default().fg(Color::Cyan).add_modifier(Modifier::SLOW_BLINK)),
        };
        let explanation = body
            .wrap(Wrap { trim: true })
            .block(Block::default().title(self.active_step.label()).borders(Borders::ALL));
        f.render_widget(explanation, chunks.explanation);

        // === FOOTER ===
        let footer = Paragraph::new(format!(
            "1-3 scene  |  ↑/↓ pipeline step  |  q quit  |  frame {}",
            self.frame_count
        ))
        .style(Style::default().fg(Color::DarkGray));
        f.render_widget(footer, chunks.footer);
    }
}

struct DashboardLayout {
    header: Rect,
    canvas: Rect,
    steps: Rect,
    explanation: Rect,
    footer: Rect,
}

fn split(area: Rect) -> DashboardLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Scene tabs
            Constraint::Min(10),   // Canvas + pipeline
            Constraint::Length(1), // Footer
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    let side_panel = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(columns[1]);

    DashboardLayout {
        header: rows[0],
        canvas: columns[0],
        steps: side_panel[0],
        explanation: side_panel[1],
        footer: rows[2],
    }
}

/// Maps a digit key to a scene.
fn scene_for_key(c: char) -> Option<Scene> {
    let index = c.to_digit(10)?.checked_sub(1)? as usize;
    Scene::all().get(index).copied()
}

/// Logical side of the square canvas that fits `area`.
///
/// Terminal cells are roughly twice as tall as they are wide.
fn canvas_side(area: Rect) -> f64 {
    let columns = area.width.min(area.height.saturating_mul(2));
    columns as f64 * UNITS_PER_COLUMN
}

/// Canvas space has y pointing down, ratatui canvases point up.
fn flip_y(y: f64, side: f64) -> f64 {
    side - y
}

/// Pre-multiplies alpha against a black terminal background.
fn shade(c: lidarscope_env::Color) -> Color {
    let scale = |v: u8| (v as f32 * c.a.clamp(0.0, 1.0)).round() as u8;
    Color::Rgb(scale(c.r), scale(c.g), scale(c.b))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lidarscope_env::SystemContext;

    fn dashboard() -> (ScopeDashboard<SystemContext>, Receiver<PipelineStep>, Sender<ExplanationPacket>) {
        let (request_tx, request_rx) = channel::unbounded();
        let (packet_tx, packet_rx) = channel::unbounded();
        let dash = ScopeDashboard::new(SystemContext::shared(), ViewerConfig::default(), request_tx, packet_rx);
        (dash, request_rx, packet_tx)
    }

    #[test]
    fn test_scene_keys() {
        assert_eq!(scene_for_key('1'), Some(Scene::Urban));
        assert_eq!(scene_for_key('2'), Some(Scene::Forest));
        assert_eq!(scene_for_key('3'), Some(Scene::Open));
        assert_eq!(scene_for_key('0'), None);
        assert_eq!(scene_for_key('4'), None);
        assert_eq!(scene_for_key('x'), None);
    }

    #[test]
    fn test_initial_explanation_is_requested() {
        let (dash, requests, _packets) = dashboard();
        assert_eq!(requests.try_recv().unwrap(), PipelineStep::Acquisition);
        assert!(dash.viewer().renderer().is_animating());
    }

    #[test]
    fn test_step_navigation_requests_explanation() {
        let (mut dash, requests, _packets) = dashboard();
        let _ = requests.try_recv();

        assert!(dash.handle_key(KeyCode::Down));
        assert_eq!(dash.active_step(), PipelineStep::Preprocessing);
        assert_eq!(requests.try_recv().unwrap(), PipelineStep::Preprocessing);
    }

    #[test]
    fn test_stale_explanations_are_dropped() {
        let (mut dash, _requests, packets) = dashboard();
        dash.handle_key(KeyCode::Down);

        packets
            .send(ExplanationPacket { step: PipelineStep::Acquisition, text: "old".into() })
            .unwrap();
        dash.poll_explanations();
        assert!(dash.explanation.is_none());

        packets
            .send(ExplanationPacket { step: PipelineStep::Preprocessing, text: "new".into() })
            .unwrap();
        dash.poll_explanations();
        assert_eq!(dash.explanation.as_deref(), Some("new"));
    }

    #[test]
    fn test_scene_key_switches_viewer() {
        let (mut dash, _requests, _packets) = dashboard();
        assert!(dash.handle_key(KeyCode::Char('3')));
        assert_eq!(dash.viewer().scene(), Scene::Open);
        assert!(!dash.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_canvas_side_is_square() {
        assert_eq!(canvas_side(Rect::new(0, 0, 80, 30)), 480.0);
        assert_eq!(canvas_side(Rect::new(0, 0, 40, 30)), 320.0);
    }

    #[test]
    fn test_shade_premultiplies_alpha() {
        assert_eq!(shade(lidarscope_env::Color::rgba(200, 100, 0, 0.5)), Color::Rgb(100, 50, 0));
    }
}
