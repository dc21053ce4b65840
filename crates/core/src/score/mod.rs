use serde::{Deserialize, Serialize};

use crate::{config::ScoringConfig, JudgmentTier};

/// Current and maximum score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    pub current: u32,
    pub max: u32,
}

/// Turns hits into score. Only ever grows, capped at `max`, until
/// [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct ScoreManager {
    config: ScoringConfig,
    state: ScoreState,
}

impl ScoreManager {
    pub fn new(config: ScoringConfig, total_notes: usize) -> Self {
        let max = max_score(config.max_score, total_notes);
        Self {
            config,
            state: ScoreState { current: 0, max },
        }
    }

    pub fn weight(&self, tier: JudgmentTier) -> u32 {
        match tier {
            JudgmentTier::Perfect => self.config.perfect_weight,
            JudgmentTier::Cool => self.config.cool_weight,
            JudgmentTier::Good => self.config.good_weight,
            JudgmentTier::Bad | JudgmentTier::Miss => 0,
        }
    }

    /// Adds `combo_before * weight(tier)` and clamps to the maximum. Returns
    /// the points actually added.
    pub fn record_hit(&mut self, tier: JudgmentTier, combo_before: u32) -> u32 {
        let gained = combo_before.saturating_mul(self.weight(tier));
        let previous = self.state.current;
        self.state.current = previous.saturating_add(gained).min(self.state.max);
        self.state.current - previous
    }

    pub fn reset(&mut self) {
        self.state.current = 0;
    }

    pub fn state(&self) -> ScoreState {
        self.state
    }

    pub fn current(&self) -> u32 {
        self.state.current
    }

    pub fn max(&self) -> u32 {
        self.state.max
    }
}

/// `round(configured / notes) * notes`, rounding half to even. May differ
/// slightly from `configured`.
pub fn max_score(configured: u32, total_notes: usize) -> u32 {
    if total_notes == 0 {
        return 0;
    }
    let per_note = (f64::from(configured) / total_notes as f64).round_ties_even();
    let max = per_note * total_notes as f64;
    if max >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        max as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(total_notes: usize) -> ScoreManager {
        ScoreManager::new(ScoringConfig::default(), total_notes)
    }

    #[test]
    fn max_score_redistributes_rounded_share() {
        assert_eq!(max_score(350_000, 7), 350_000);
        assert_eq!(max_score(350_000, 3), 350_001);
        assert_eq!(max_score(100, 8), 96);
        assert_eq!(max_score(350_000, 0), 0);
    }

    #[test]
    fn hit_uses_combo_before_increment() {
        let mut score = manager(100);
        assert_eq!(score.record_hit(JudgmentTier::Perfect, 9), 900);
        assert_eq!(score.record_hit(JudgmentTier::Cool, 2), 100);
        assert_eq!(score.record_hit(JudgmentTier::Good, 1), 10);
        assert_eq!(score.record_hit(JudgmentTier::Bad, 50), 0);
        assert_eq!(score.current(), 1010);
    }

    #[test]
    fn score_is_clamped_and_monotonic() {
        let mut score = ScoreManager::new(
            ScoringConfig {
                max_score: 1000,
                ..Default::default()
            },
            2,
        );

        let mut last = 0;
        for combo in 0..20 {
            score.record_hit(JudgmentTier::Perfect, combo);
            assert!(score.current() >= last);
            assert!(score.current() <= score.max());
            last = score.current();
        }
        assert_eq!(score.current(), 1000);

        score.reset();
        assert_eq!(score.current(), 0);
        assert_eq!(score.max(), 1000);
    }
}
