//! Matching key presses against the judgment line.
//!
//! Every spawned note ends in exactly one [`Judgment`]: a key press either
//! hits it or flags it as the wrong symbol, otherwise the per-frame sweep
//! auto-misses it once it has travelled `bad_range` past the line.

use serde::{Deserialize, Serialize};

use crate::{
    assets::NoteCatalog, config::JudgmentConfig, notes::NoteId, ActiveNote, GameEvent,
    HealthManager, NoteField, ScoreManager,
};

/// Accuracy tiers from tightest to loosest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JudgmentTier {
    Perfect,
    Cool,
    Good,
    Bad,
    Miss,
}

/// Distance thresholds, strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgmentWindows {
    pub line_x: f32,
    pub perfect: f32,
    pub cool: f32,
    pub good: f32,
    pub bad: f32,
}

impl JudgmentWindows {
    /// Tightest tier whose threshold is at least `distance`; `None` beyond
    /// `bad`. Boundaries resolve to the stricter tier.
    pub fn classify(&self, distance: f32) -> Option<JudgmentTier> {
        if distance <= self.perfect {
            Some(JudgmentTier::Perfect)
        } else if distance <= self.cool {
            Some(JudgmentTier::Cool)
        } else if distance <= self.good {
            Some(JudgmentTier::Good)
        } else if distance <= self.bad {
            Some(JudgmentTier::Bad)
        } else {
            None
        }
    }

    /// Whether a note can still be judged by a key press.
    pub fn in_range(&self, note: &ActiveNote) -> bool {
        note.distance_to(self.line_x) <= self.bad
    }

    /// Whether a note has scrolled past the line beyond the bad window.
    pub fn has_passed(&self, note: &ActiveNote) -> bool {
        note.position_x < self.line_x - self.bad
    }
}

impl From<&JudgmentConfig> for JudgmentWindows {
    fn from(config: &JudgmentConfig) -> Self {
        Self {
            line_x: config.line_x,
            perfect: config.perfect_range,
            cool: config.cool_range,
            good: config.good_range,
            bad: config.bad_range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Correct symbol within `bad_range`.
    Hit(JudgmentTier),
    /// Key press whose nearest candidate showed another symbol.
    WrongSymbol,
    /// Scrolled past the line unjudged.
    AutoMiss,
}

impl Outcome {
    pub fn tier(&self) -> JudgmentTier {
        match self {
            Self::Hit(tier) => *tier,
            Self::WrongSymbol | Self::AutoMiss => JudgmentTier::Miss,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.tier() == JudgmentTier::Miss
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub note_id: NoteId,
    pub symbol: String,
    pub outcome: Outcome,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboState {
    pub count: u32,
}

impl ComboState {
    pub fn increment(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Running tally of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentStats {
    pub perfect: u32,
    pub cool: u32,
    pub good: u32,
    pub bad: u32,
    pub wrong_symbol: u32,
    pub auto_miss: u32,
    pub max_combo: u32,
}

impl JudgmentStats {
    fn record(&mut self, outcome: Outcome, combo: u32) {
        match outcome {
            Outcome::Hit(JudgmentTier::Perfect) => self.perfect += 1,
            Outcome::Hit(JudgmentTier::Cool) => self.cool += 1,
            Outcome::Hit(JudgmentTier::Good) => self.good += 1,
            Outcome::Hit(_) => self.bad += 1,
            Outcome::WrongSymbol => self.wrong_symbol += 1,
            Outcome::AutoMiss => self.auto_miss += 1,
        }
        self.max_combo = self.max_combo.max(combo);
    }

    pub fn judged(&self) -> u32 {
        self.perfect + self.cool + self.good + self.bad + self.wrong_symbol + self.auto_miss
    }
}

/// Owns combo, score and health so every outcome updates them in one place.
#[derive(Debug)]
pub struct JudgmentEngine {
    windows: JudgmentWindows,
    catalog: NoteCatalog,
    combo: ComboState,
    score: ScoreManager,
    health: HealthManager,
    stats: JudgmentStats,
}

impl JudgmentEngine {
    pub fn new(
        windows: JudgmentWindows,
        catalog: NoteCatalog,
        score: ScoreManager,
        health: HealthManager,
    ) -> Self {
        Self {
            windows,
            catalog,
            combo: ComboState::default(),
            score,
            health,
            stats: JudgmentStats::default(),
        }
    }

    /// Judges a key press on `lane` against the notes in range. At most one
    /// note is judged: the nearest with the lane's symbol, otherwise the
    /// nearest with any other symbol. A press with nothing in range, or on an
    /// unmapped lane, does nothing. Nothing is judged after game over.
    pub fn judge_press(
        &mut self,
        lane: usize,
        field: &mut NoteField,
        events: &mut Vec<GameEvent>,
    ) -> Option<Judgment> {
        if self.health.is_game_over() {
            return None;
        }
        let Some(expected) = self.catalog.lane_symbol(lane) else {
            tracing::debug!(lane, "press on unmapped lane ignored");
            return None;
        };

        let line_x = self.windows.line_x;
        let nearest = |matching: bool| {
            field
                .iter()
                .filter(|note| self.windows.in_range(note))
                .filter(|note| (note.symbol == expected) == matching)
                .min_by(|a, b| a.distance_to(line_x).total_cmp(&b.distance_to(line_x)))
                .map(|note| (note.id, note.distance_to(line_x)))
        };

        let (id, distance, outcome) = if let Some((id, distance)) = nearest(true) {
            let tier = self.windows.classify(distance)?;
            (id, distance, Outcome::Hit(tier))
        } else {
            let (id, distance) = nearest(false)?;
            (id, distance, Outcome::WrongSymbol)
        };

        let note = field.remove(id)?;
        tracing::debug!(
            lane,
            expected,
            symbol = %note.symbol,
            distance,
            ?outcome,
            "key press judged"
        );
        Some(self.apply(note, distance, outcome, events))
    }

    /// Auto-misses every note that passed the line beyond `bad_range`. Stops
    /// at the miss that ends the game.
    pub fn sweep(&mut self, field: &mut NoteField, events: &mut Vec<GameEvent>) -> Vec<Judgment> {
        let passed: Vec<NoteId> = field
            .iter()
            .filter(|note| self.windows.has_passed(note))
            .map(|note| note.id)
            .collect();

        let mut judged = Vec::with_capacity(passed.len());
        for id in passed {
            if self.health.is_game_over() {
                break;
            }
            if let Some(note) = field.remove(id) {
                let distance = note.distance_to(self.windows.line_x);
                judged.push(self.apply(note, distance, Outcome::AutoMiss, events));
            }
        }
        judged
    }

    fn apply(
        &mut self,
        note: ActiveNote,
        distance: f32,
        outcome: Outcome,
        events: &mut Vec<GameEvent>,
    ) -> Judgment {
        let judgment = Judgment {
            note_id: note.id,
            symbol: note.symbol,
            outcome,
            distance,
        };
        events.push(GameEvent::Judged(judgment.clone()));

        match outcome {
            Outcome::Hit(tier) => {
                let combo_before = self.combo.count;
                let combo = self.combo.increment();
                events.push(GameEvent::Combo(combo));

                if self.score.record_hit(tier, combo_before) > 0 {
                    events.push(GameEvent::Score(self.score.state()));
                }

                let interval = self.health.config().combo_bonus_interval;
                if interval > 0 && combo % interval == 0 {
                    let before = self.health.value();
                    self.health.increase(self.health.config().combo_bonus);
                    if self.health.value() != before {
                        events.push(GameEvent::Health(self.health.state()));
                    }
                }
            }
            Outcome::WrongSymbol | Outcome::AutoMiss => {
                self.combo.reset();
                events.push(GameEvent::Combo(0));

                let before = self.health.value();
                let game_over = self.health.decrease(self.health.config().miss_penalty);
                if self.health.value() != before {
                    events.push(GameEvent::Health(self.health.state()));
                }
                if game_over {
                    events.push(GameEvent::GameOver);
                }
            }
        }

        self.stats.record(outcome, self.combo.count);
        judgment
    }

    /// Clears combo, score, health and statistics.
    pub fn reset(&mut self) {
        self.combo.reset();
        self.score.reset();
        self.health.reset();
        self.stats = JudgmentStats::default();
    }

    pub fn windows(&self) -> &JudgmentWindows {
        &self.windows
    }

    pub fn catalog(&self) -> &NoteCatalog {
        &self.catalog
    }

    pub fn combo(&self) -> ComboState {
        self.combo
    }

    pub fn score(&self) -> &ScoreManager {
        &self.score
    }

    pub fn health(&self) -> &HealthManager {
        &self.health
    }

    pub fn health_mut(&mut self) -> &mut HealthManager {
        &mut self.health
    }

    pub fn stats(&self) -> &JudgmentStats {
        &self.stats
    }
}
