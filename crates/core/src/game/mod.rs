//! Frame-driven play session.
//!
//! A [`Session`] owns every component and runs them in a fixed order on each
//! call to [`Session::advance`]:
//!
//! 1. key presses buffered since the previous frame are judged,
//! 2. notes that passed the judgment line are auto-missed,
//! 3. notes move and anything that left the stage is despawned,
//! 4. the clock and the spawner's wait timer advance and due notes spawn.
//!
//! A press therefore always resolves before the same note can be auto-missed.

use serde::{Deserialize, Serialize};

use crate::{
    assets::NoteCatalog,
    config::{GameConfig, SpawnerConfig},
    health::HealthState,
    judgment::{Judgment, JudgmentEngine, JudgmentStats, JudgmentWindows},
    score::ScoreState,
    HealthManager, NoteField, NoteSpawner, PlaybackClock, Result, Schedule, ScoreManager,
};

/// Outward notifications for UI and audio feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Judged(Judgment),
    Combo(u32),
    Score(ScoreState),
    Health(HealthState),
    /// Health reached zero. Emitted once per run.
    GameOver,
    /// The game-over fade finished; the driver should switch screens.
    GameOverScreen,
}

/// Per-frame input from the driver.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub delta: f64,
    /// Playback position reported by the audio device, if available. When
    /// present the clock snaps to it instead of accumulating `delta`.
    pub audio_position: Option<f64>,
}

impl FrameInput {
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            audio_position: None,
        }
    }
}

/// End-of-run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_notes: usize,
    pub spawned: usize,
    pub skipped: usize,
    pub score: ScoreState,
    pub health: HealthState,
    pub combo: u32,
    pub stats: JudgmentStats,
    pub game_over: bool,
}

#[derive(Debug)]
pub struct Session {
    spawner_config: SpawnerConfig,
    clock: PlaybackClock,
    spawner: NoteSpawner,
    field: NoteField,
    engine: JudgmentEngine,
    pending_presses: Vec<usize>,
    spawned: usize,
    skipped: usize,
}

impl Session {
    /// Wires every component from a validated config and a built schedule.
    pub fn new(config: &GameConfig, schedule: Schedule) -> Result<Self> {
        config.validate()?;

        let catalog = NoteCatalog::from_lanes(config.lanes.iter().cloned());
        let score = ScoreManager::new(config.scoring.clone(), schedule.len());
        let health = HealthManager::new(config.health.clone());
        let engine = JudgmentEngine::new(
            JudgmentWindows::from(&config.judgment),
            catalog,
            score,
            health,
        );

        tracing::info!(
            notes = schedule.len(),
            lanes = config.lanes.len(),
            max_score = engine.score().max(),
            policy = ?config.spawner.policy,
            "session ready"
        );

        Ok(Self {
            clock: PlaybackClock::new(config.spawner.music_lead_in),
            spawner: NoteSpawner::new(schedule, config.spawner.policy),
            spawner_config: config.spawner.clone(),
            field: NoteField::new(),
            engine,
            pending_presses: Vec::new(),
            spawned: 0,
            skipped: 0,
        })
    }

    /// Buffers a key press for the next [`advance`](Self::advance).
    pub fn press_lane(&mut self, lane: usize) {
        self.pending_presses.push(lane);
    }

    /// Runs one frame and returns the notifications it produced.
    pub fn advance(&mut self, input: FrameInput) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let delta = input.delta.max(0.0);

        if self.engine.health().is_game_over() {
            self.pending_presses.clear();
            if self.engine.health_mut().advance(delta as f32) {
                events.push(GameEvent::GameOverScreen);
            }
            return events;
        }

        let mut presses = std::mem::take(&mut self.pending_presses);
        presses.sort_unstable();
        presses.dedup();
        for lane in presses {
            if self.engine.health().is_game_over() {
                break;
            }
            self.engine.judge_press(lane, &mut self.field, &mut events);
        }

        if !self.engine.health().is_game_over() {
            self.engine.sweep(&mut self.field, &mut events);
        }

        if self.engine.health().is_game_over() {
            self.spawner.stop();
            self.field.clear();
            return events;
        }

        self.field.advance(delta as f32);
        let despawned = self.field.despawn_beyond(self.spawner_config.destroy_x);
        if despawned > 0 {
            tracing::warn!(despawned, "notes left the stage without judgment");
        }

        match input.audio_position {
            Some(position) => self.clock.sync_to_audio(position),
            None => self.clock.advance(delta),
        }
        for note in self.spawner.advance(delta, &self.clock) {
            if let Err(err) = self.engine.catalog().resolve(&note.symbol) {
                tracing::warn!(error = %err, time = note.time_seconds, "skipping note");
                self.skipped += 1;
                continue;
            }
            self.field.spawn(
                note.symbol,
                self.spawner_config.spawn_x,
                self.spawner_config.note_speed,
                self.clock.time_seconds,
            );
            self.spawned += 1;
        }

        events
    }

    /// Stops the spawner and clears every piece of per-run state, so the next
    /// frame starts a fresh run from the first note.
    pub fn restart(&mut self) {
        self.spawner.stop();
        self.field.clear();
        self.pending_presses.clear();
        self.engine.reset();
        self.clock.reset();
        self.spawner.rewind();
        self.spawned = 0;
        self.skipped = 0;
        tracing::info!("session restarted");
    }

    /// `true` once every note has been spawned and judged, or the game is over.
    pub fn is_complete(&self) -> bool {
        self.engine.health().is_game_over()
            || (self.spawner.is_finished() && self.field.is_empty())
    }

    pub fn notes(&self) -> &NoteField {
        &self.field
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn engine(&self) -> &JudgmentEngine {
        &self.engine
    }

    pub fn spawner(&self) -> &NoteSpawner {
        &self.spawner
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_notes: self.spawner.schedule().len(),
            spawned: self.spawned,
            skipped: self.skipped,
            score: self.engine.score().state(),
            health: self.engine.health().state(),
            combo: self.engine.combo().count,
            stats: self.engine.stats().clone(),
            game_over: self.engine.health().is_game_over(),
        }
    }
}
