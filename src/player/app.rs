//! Interactive terminal front-end for the playback engine.
//!
//! Draws a two-line status (transport, section, take, scrolling waveform of
//! the active group) and maps single keys to transport commands. The loop
//! sleeps on keyboard input for at most one clock interval, then drains
//! output boundaries and advances the playhead.

use super::audio::RodioOutput;
use super::engine::{PlaybackEngine, TransportState};
use super::events::{PlaybackEvent, RemoteCommand};
use super::output::{AudioOutput, SilentOutput};
use super::section::load_arrangement;
use super::segment::Segment;
use super::waveform::render_blocks;
use crate::config::Config;
use crate::constants::LOG_FILE_NAME;
use crate::utils::progress::create_progress_spinner;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{self, ClearType, disable_raw_mode, enable_raw_mode},
};
use log::{error, info, warn};
use owo_colors::OwoColorize;
use std::error::Error;
use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

const SEEK_STEP_SECONDS: f64 = 5.0;
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Options for an interactive run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skip the audio device and only keep time
    pub silent: bool,
    /// Overrides the configured shuffle seed
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyAction {
    Command(RemoteCommand),
    Rebuild,
    Quit,
}

fn key_action(key: &KeyEvent, timestamp: f64) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyAction::Quit);
    }
    let action = match key.code {
        KeyCode::Char(' ') => KeyAction::Command(RemoteCommand::TogglePlayPause),
        KeyCode::Char('n') => KeyAction::Command(RemoteCommand::Next),
        KeyCode::Char('p') => KeyAction::Command(RemoteCommand::Previous),
        KeyCode::Char('s') => KeyAction::Command(RemoteCommand::Stop),
        KeyCode::Left => KeyAction::Command(RemoteCommand::Seek(
            (timestamp - SEEK_STEP_SECONDS).max(0.0),
        )),
        KeyCode::Right => KeyAction::Command(RemoteCommand::Seek(timestamp + SEEK_STEP_SECONDS)),
        KeyCode::Char('r') => KeyAction::Rebuild,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => return None,
    };
    Some(action)
}

struct App {
    engine: PlaybackEngine,
    events: mpsc::Receiver<PlaybackEvent>,
    pixels_per_rms: f64,
    rms_frames_per_second: f64,
    message: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    fn new(mut engine: PlaybackEngine, config: &Config) -> Self {
        let events = engine.subscribe();
        Self {
            engine,
            events,
            pixels_per_rms: config.pixels_per_rms,
            rms_frames_per_second: config.rms_frames_per_second,
            message: None,
            should_quit: false,
        }
    }

    fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some((message.into(), Instant::now()));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let Some(action) = key_action(&key, self.engine.timestamp()) else {
            return;
        };
        match action {
            KeyAction::Command(command) => {
                if let Err(e) = self.engine.handle_command(command) {
                    error!("{command:?} failed: {e}");
                    self.set_message(format!("Playback failed: {e}"));
                }
            }
            KeyAction::Rebuild => {
                let was_playing = self.engine.is_playing();
                self.engine.rebuild();
                self.set_message("Drew new takes");
                if was_playing && let Err(e) = self.engine.play() {
                    error!("Restart after rebuild failed: {e}");
                    self.set_message(format!("Playback failed: {e}"));
                }
            }
            KeyAction::Quit => self.should_quit = true,
        }
    }

    /// Let the engine catch up with the output and the clock
    fn update(&mut self, now: Instant) {
        if let Err(e) = self
            .engine
            .drain_output_boundaries()
            .and_then(|_| self.engine.tick(now))
        {
            error!("Transport error: {e}");
            self.set_message(format!("Playback failed: {e}"));
        }

        let events: Vec<PlaybackEvent> = self.events.try_iter().collect();
        for event in events {
            match event {
                PlaybackEvent::GroupChanged { group, .. } => {
                    let title = self.engine.now_playing().title;
                    self.set_message(format!("Section {}: {title}", group + 1));
                }
                PlaybackEvent::Looped => self.set_message("Arrangement rebuilt from the top"),
                _ => {}
            }
        }

        if let Some((_, shown_at)) = &self.message
            && shown_at.elapsed() > STATUS_MESSAGE_TTL
        {
            self.message = None;
        }
    }

    fn status_line(&self) -> String {
        let now_playing = self.engine.now_playing();
        let icon = match self.engine.state() {
            TransportState::Playing => "▶".green().to_string(),
            TransportState::Paused => "⏸".yellow().to_string(),
            TransportState::Stopped => "■".to_string(),
            TransportState::Idle => "·".dimmed().to_string(),
        };
        let take = self
            .engine
            .current_segment()
            .map(|segment| segment.source().display_name.clone())
            .unwrap_or_default();
        let section = format!(
            "[{}/{}]",
            self.engine.active_group_index() + 1,
            self.engine.groups().len()
        );

        let mut line = format!(
            "{icon} {} {} {} / {}  {}",
            section.dimmed(),
            now_playing.title.bold(),
            format_time(now_playing.elapsed),
            format_time(now_playing.duration),
            take.cyan()
        );
        if let Some((message, _)) = &self.message {
            line.push_str(&format!("  {}", message.yellow()));
        }
        line
    }

    fn waveform_line(&self, width: usize) -> String {
        let playhead = self.engine.playhead_offset(self.pixels_per_rms);
        // Keep the playhead in the middle once the group is longer than the view
        let first_column = (playhead - width as f64 / 2.0).max(0.0).floor() as usize;
        let values = group_columns(
            self.engine.active_segments(),
            self.rms_frames_per_second,
            self.pixels_per_rms,
            first_column,
            width,
        );

        let playhead_column = (playhead.floor() as usize).saturating_sub(first_column);
        render_blocks(&values)
            .chars()
            .enumerate()
            .map(|(i, block)| {
                if i == playhead_column {
                    "│".red().to_string()
                } else {
                    block.cyan().to_string()
                }
            })
            .collect()
    }

    fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        let width = terminal::size().map(|(w, _)| w as usize).unwrap_or(80).max(10);
        queue!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::FromCursorDown),
            Print(self.status_line()),
            Print("\r\n"),
            Print(self.waveform_line(width - 1)),
            cursor::MoveUp(1),
            cursor::MoveToColumn(0),
        )?;
        out.flush()
    }
}

/// RMS values for `width` display columns starting at `first_column`, where
/// each RMS frame spans `pixels_per_rms` columns. The later segment wins where
/// two overlap; columns past the end are silent.
fn group_columns(
    segments: &[Segment],
    rms_frames_per_second: f64,
    pixels_per_rms: f64,
    first_column: usize,
    width: usize,
) -> Vec<f32> {
    let columns_per_second = rms_frames_per_second * pixels_per_rms;
    if columns_per_second <= 0.0 {
        return vec![0.0; width];
    }

    (first_column..first_column + width)
        .map(|column| {
            let t = column as f64 / columns_per_second;
            segments
                .iter()
                .rev()
                .find(|segment| segment.contains(t))
                .and_then(|segment| {
                    let index =
                        ((t - segment.playback_start_time()) * rms_frames_per_second) as usize;
                    segment.rms_values_for_range().get(index).copied()
                })
                .unwrap_or(0.0)
        })
        .collect()
}

fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn init_logging(level: log::LevelFilter) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, WriteLogger};
    use std::fs::File;

    let log_file = std::env::temp_dir().join(LOG_FILE_NAME);
    CombinedLogger::init(vec![WriteLogger::new(
        level,
        simplelog::Config::default(),
        File::create(log_file)?,
    )])?;

    Ok(())
}

fn open_output(silent: bool) -> Box<dyn AudioOutput> {
    if silent {
        info!("Running without an audio device");
        return Box::new(SilentOutput::new());
    }
    match RodioOutput::new() {
        Ok(output) => Box::new(output),
        Err(e) => {
            warn!("Falling back to silent output: {e}");
            eprintln!("{} {e}; playing silently", "Warning:".yellow());
            Box::new(SilentOutput::new())
        }
    }
}

fn run_app(app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    while !app.should_quit {
        app.draw(&mut stdout)?;

        let timeout = app.engine.time_until_next_tick(Instant::now());
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key);
        }

        app.update(Instant::now());
    }

    app.engine.stop();
    queue!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::FromCursorDown)
    )?;
    stdout.flush()?;
    Ok(())
}

/// Load `arrangement`, build its first timeline and hand the terminal to the
/// transport until the user quits.
pub fn run(arrangement: &Path, options: RunOptions) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    if options.seed.is_some() {
        config.shuffle_seed = options.seed;
    }

    init_logging(config.log_level_filter())?;
    info!("Starting takedeck with {}", arrangement.display());

    let sections = load_arrangement(arrangement)?;
    if sections.is_empty() {
        return Err(format!("{} has no sections", arrangement.display()).into());
    }

    let mut engine = PlaybackEngine::from_config(&config, open_output(options.silent));

    let spinner = create_progress_spinner();
    spinner.set_message(format!("Analyzing {} sections...", sections.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    engine.load_sections(sections);
    spinner.finish_and_clear();

    if engine.groups().iter().all(|group| group.is_empty()) {
        return Err("No playable takes found in the arrangement".into());
    }

    println!(
        "{} {}",
        "takedeck".cyan().bold(),
        "space play/pause · n/p section · ←/→ seek · s stop · r redraw takes · q quit".dimmed()
    );

    let mut app = App::new(engine, &config);

    enable_raw_mode()?;
    let res = run_app(&mut app);
    disable_raw_mode()?;
    println!();

    if let Err(e) = &res {
        error!("Player exited with error: {e}");
    }
    res
}
