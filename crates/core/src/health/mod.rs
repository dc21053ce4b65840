use serde::{Deserialize, Serialize};

use crate::config::HealthConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    pub value: f32,
    pub initial: f32,
}

/// Where the game-over transition stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameOverPhase {
    Playing,
    /// Fading out; `elapsed` seconds into a fade of `fade_duration`.
    FadingOut { elapsed: f32 },
    /// Fade done and the game-over screen has been requested.
    Finished,
}

/// Health clamped to `[0, initial]`. Reaching zero starts a one-way
/// game-over transition; after that every change is ignored.
#[derive(Debug, Clone)]
pub struct HealthManager {
    config: HealthConfig,
    value: f32,
    phase: GameOverPhase,
}

impl HealthManager {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            value: config.initial,
            config,
            phase: GameOverPhase::Playing,
        }
    }

    /// Lowers health. Returns `true` only on the call that triggers game over.
    pub fn decrease(&mut self, amount: f32) -> bool {
        if self.is_game_over() {
            return false;
        }

        self.value = (self.value - amount).min(self.config.initial).max(0.0);
        if self.value <= 0.0 {
            self.value = 0.0;
            self.phase = GameOverPhase::FadingOut { elapsed: 0.0 };
            tracing::info!("health depleted, game over");
            return true;
        }
        false
    }

    pub fn increase(&mut self, amount: f32) {
        if self.is_game_over() {
            return;
        }
        self.value = (self.value + amount).min(self.config.initial).max(0.0);
    }

    /// Runs the fade timer. Returns `true` once, on the frame the fade
    /// completes and the game-over screen should load.
    pub fn advance(&mut self, delta: f32) -> bool {
        if let GameOverPhase::FadingOut { elapsed } = self.phase {
            let elapsed = elapsed + delta;
            if elapsed >= self.config.fade_duration {
                self.phase = GameOverPhase::Finished;
                return true;
            }
            self.phase = GameOverPhase::FadingOut { elapsed };
        }
        false
    }

    /// Opacity of the fade overlay in `[0, 1]`.
    pub fn fade_alpha(&self) -> f32 {
        match self.phase {
            GameOverPhase::Playing => 0.0,
            GameOverPhase::FadingOut { elapsed } if self.config.fade_duration > 0.0 => {
                (elapsed / self.config.fade_duration).clamp(0.0, 1.0)
            }
            _ => 1.0,
        }
    }

    pub fn reset(&mut self) {
        self.value = self.config.initial;
        self.phase = GameOverPhase::Playing;
    }

    pub fn is_game_over(&self) -> bool {
        self.phase != GameOverPhase::Playing
    }

    pub fn phase(&self) -> GameOverPhase {
        self.phase
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn state(&self) -> HealthState {
        HealthState {
            value: self.value,
            initial: self.config.initial,
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> HealthManager {
        HealthManager::new(HealthConfig::default())
    }

    #[test]
    fn clamps_to_initial() {
        let mut health = manager();
        health.increase(50.0);
        assert_eq!(health.value(), 100.0);

        health.decrease(30.0);
        health.increase(10.0);
        assert_eq!(health.value(), 80.0);
    }

    #[test]
    fn game_over_fires_once() {
        let mut health = manager();
        let fired: Vec<bool> = (0..15).map(|_| health.decrease(10.0)).collect();

        assert_eq!(fired.iter().filter(|f| **f).count(), 1);
        assert!(fired[9]);
        assert_eq!(health.value(), 0.0);
        assert!(health.is_game_over());

        health.increase(40.0);
        assert_eq!(health.value(), 0.0);
    }

    #[test]
    fn overshooting_damage_clamps_to_zero() {
        let mut health = manager();
        assert!(health.decrease(250.0));
        assert_eq!(health.state().value, 0.0);
    }

    #[test]
    fn fade_requests_screen_once() {
        let mut health = manager();
        assert!(!health.advance(5.0));

        health.decrease(100.0);
        assert!(!health.advance(1.0));
        assert_eq!(health.fade_alpha(), 0.5);
        assert!(health.advance(1.0));
        assert!(!health.advance(1.0));
        assert_eq!(health.phase(), GameOverPhase::Finished);

        health.reset();
        assert_eq!(health.value(), 100.0);
        assert!(!health.is_game_over());
    }
}
