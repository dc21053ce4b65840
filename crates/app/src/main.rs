use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rhythm_judge_core::{
    health::GameOverPhase, Chart, FrameInput, GameConfig, GameEvent, Schedule, Session,
    SymbolSequence,
};
use tracing_subscriber::EnvFilter;

fn main() -> rhythm_judge_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schedule { inputs } => run_schedule(&inputs),
        Commands::Simulate {
            inputs,
            fps,
            max_seconds,
            press_window,
            miss_every,
            wrong_every,
        } => run_simulate(
            &inputs,
            Autoplay {
                press_window,
                miss_every,
                wrong_every,
            },
            fps,
            max_seconds,
        ),
    }
}

fn load_schedule(chart: &Path, symbols: &Path) -> rhythm_judge_core::Result<Schedule> {
    let chart = Chart::load(chart)?;
    let symbols = SymbolSequence::load(symbols)?;
    Schedule::build(&chart, &symbols)
}

fn load_config(path: Option<&Path>) -> rhythm_judge_core::Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path),
        None => Ok(GameConfig::default()),
    }
}

fn run_schedule(inputs: &Inputs) -> rhythm_judge_core::Result<()> {
    tracing::info!(chart = ?inputs.chart, symbols = ?inputs.symbols, "building schedule");
    let schedule = load_schedule(&inputs.chart, &inputs.symbols)?;
    println!("{}", serde_json::to_string_pretty(&schedule)?);
    Ok(())
}

fn run_simulate(
    inputs: &Inputs,
    autoplay: Autoplay,
    fps: u32,
    max_seconds: f64,
) -> rhythm_judge_core::Result<()> {
    let config = load_config(inputs.config.as_deref())?;
    let schedule = load_schedule(&inputs.chart, &inputs.symbols)?;
    let mut session = Session::new(&config, schedule)?;

    let delta = 1.0 / f64::from(fps.max(1));
    let max_frames = (max_seconds / delta).ceil() as u64;
    tracing::info!(fps, max_seconds, "starting headless simulation");

    for frame in 0..max_frames {
        for lane in autoplay.presses(&session) {
            session.press_lane(lane);
        }

        for event in session.advance(FrameInput::new(delta)) {
            match event {
                GameEvent::Judged(judgment) => tracing::debug!(
                    frame,
                    note = judgment.note_id,
                    symbol = %judgment.symbol,
                    outcome = ?judgment.outcome,
                    distance = judgment.distance,
                    "judged"
                ),
                GameEvent::GameOver => tracing::info!(frame, "game over"),
                GameEvent::GameOverScreen => {
                    tracing::info!(frame, "game over screen requested");
                }
                _ => {}
            }
        }

        let health = session.engine().health();
        if let GameOverPhase::FadingOut { elapsed } = health.phase() {
            tracing::trace!(frame, elapsed, alpha = health.fade_alpha(), "fading out");
        }
        let screen_requested = health.phase() == GameOverPhase::Finished;
        if screen_requested || (session.is_complete() && !health.is_game_over()) {
            break;
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.summary())?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Scripted stand-in for a player used by `simulate`.
struct Autoplay {
    press_window: f32,
    miss_every: Option<u64>,
    wrong_every: Option<u64>,
}

impl Autoplay {
    /// Lanes to press this frame for notes within `press_window` of the line.
    fn presses(&self, session: &Session) -> Vec<usize> {
        let engine = session.engine();
        let line_x = engine.windows().line_x;
        let lanes = engine.catalog().lane_count();
        let nth = |every: Option<u64>, id: u64| every.is_some_and(|n| n > 0 && id % n == n - 1);

        session
            .notes()
            .iter()
            .filter(|note| note.distance_to(line_x) <= self.press_window)
            .filter(|note| !nth(self.miss_every, note.id))
            .filter_map(|note| {
                let lane = engine.catalog().resolve(&note.symbol).ok()?.lane;
                if nth(self.wrong_every, note.id) {
                    Some((lane + 1) % lanes)
                } else {
                    Some(lane)
                }
            })
            .collect()
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Rhythm game note scheduling and judgment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Inputs {
    /// Standard MIDI File supplying note timing.
    #[arg(long)]
    chart: PathBuf,
    /// Comma separated symbol table assigned to notes in order.
    #[arg(long)]
    symbols: PathBuf,
    /// Optional JSON game configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the note schedule and print it as JSON.
    Schedule {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Play the chart headlessly with an autoplay input source.
    Simulate {
        #[command(flatten)]
        inputs: Inputs,
        /// Frames per second of the simulated update loop.
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Upper bound on simulated time.
        #[arg(long, default_value_t = 600.0)]
        max_seconds: f64,
        /// Autoplay presses once a note is this close to the judgment line.
        #[arg(long, default_value_t = 0.05)]
        press_window: f32,
        /// Leave every Nth note unpressed.
        #[arg(long)]
        miss_every: Option<u64>,
        /// Press the wrong lane for every Nth note.
        #[arg(long)]
        wrong_every: Option<u64>,
    },
}
