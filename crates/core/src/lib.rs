//! Timing and judgment core for the Rhythm Judge game.
//!
//! A score file and a symbol table become a [`Schedule`]; a [`Session`] then
//! spawns the scheduled notes against a playback clock, moves them towards
//! the judgment line and scores key presses into combo, score and health.
//! Rendering, audio output and raw keyboard polling live with the driver.

pub mod assets;
pub mod chart;
pub mod config;
pub mod error;
pub mod game;
pub mod health;
pub mod judgment;
pub mod notes;
pub mod score;
pub mod symbols;
pub mod timeline;

pub use assets::{NoteAsset, NoteCatalog};
pub use chart::{Chart, RawNote, Schedule, ScheduledNote, TempoChange, TempoMap, TimeDivision};
pub use config::{GameConfig, SpawnPolicy};
pub use error::{Result, RhythmError};
pub use game::{FrameInput, GameEvent, Session, SessionSummary};
pub use health::{HealthManager, HealthState};
pub use judgment::{ComboState, Judgment, JudgmentEngine, JudgmentTier, JudgmentWindows, Outcome};
pub use notes::{ActiveNote, NoteField};
pub use score::{ScoreManager, ScoreState};
pub use symbols::{SymbolCycler, SymbolSequence};
pub use timeline::{NoteSpawner, PlaybackClock};
