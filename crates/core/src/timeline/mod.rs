use crate::{config::SpawnPolicy, Schedule, ScheduledNote};

/// Session clock. `time_seconds` counts from session start; the music is
/// scheduled to begin `lead_in` seconds later.
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    pub time_seconds: f64,
    pub lead_in: f64,
}

impl PlaybackClock {
    pub fn new(lead_in: f64) -> Self {
        Self {
            time_seconds: 0.0,
            lead_in,
        }
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn advance(&mut self, delta: f64) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
    }

    /// Snaps the clock to a position reported by the audio device.
    pub fn sync_to_audio(&mut self, audio_position: f64) {
        self.time_seconds = (audio_position + self.lead_in).max(0.0);
    }

    /// Position inside the music; negative before playback starts.
    pub fn audio_position(&self) -> f64 {
        self.time_seconds - self.lead_in
    }
}

/// Explicit wait-state replacement for a "sleep then spawn" loop over the
/// schedule.
///
/// With [`SpawnPolicy::Relative`] each wait is `t[i] - t[i-1]` and starts on
/// the frame that emitted the previous note, so per-frame overshoot adds up.
/// With [`SpawnPolicy::Resync`] the remaining wait is recomputed from the
/// clock every frame and overshoot never carries over.
#[derive(Debug)]
pub struct NoteSpawner {
    schedule: Schedule,
    policy: SpawnPolicy,
    next_index: usize,
    remaining_delay: f64,
    stopped: bool,
}

impl NoteSpawner {
    pub fn new(schedule: Schedule, policy: SpawnPolicy) -> Self {
        let mut spawner = Self {
            schedule,
            policy,
            next_index: 0,
            remaining_delay: 0.0,
            stopped: false,
        };
        spawner.rewind();
        spawner
    }

    /// Returns to the first note and resumes emission.
    pub fn rewind(&mut self) {
        self.next_index = 0;
        self.remaining_delay = self.delay_before(0);
        self.stopped = false;
    }

    /// Halts emission until the next [`rewind`](Self::rewind).
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// `true` once every scheduled note has been emitted.
    pub fn is_finished(&self) -> bool {
        self.next_index >= self.schedule.len()
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn remaining_delay(&self) -> f64 {
        self.remaining_delay
    }

    pub fn policy(&self) -> SpawnPolicy {
        self.policy
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Advances the wait timer and returns the notes due this frame in
    /// schedule order. `clock` must already include `delta`.
    pub fn advance(&mut self, delta: f64, clock: &PlaybackClock) -> Vec<ScheduledNote> {
        let mut due = Vec::new();
        if self.stopped {
            return due;
        }

        match self.policy {
            SpawnPolicy::Relative => {
                self.remaining_delay -= delta;
                while !self.is_finished() && self.remaining_delay <= 0.0 {
                    due.push(self.schedule.notes()[self.next_index].clone());
                    self.next_index += 1;
                    self.remaining_delay = self.delay_before(self.next_index);
                }
            }
            SpawnPolicy::Resync => {
                let now = clock.time_seconds;
                while let Some(note) = self.schedule.get(self.next_index) {
                    if note.time_seconds > now {
                        break;
                    }
                    due.push(note.clone());
                    self.next_index += 1;
                }
                self.remaining_delay = self
                    .schedule
                    .get(self.next_index)
                    .map(|note| note.time_seconds - now)
                    .unwrap_or(0.0);
            }
        }

        due
    }

    fn delay_before(&self, index: usize) -> f64 {
        let notes = self.schedule.notes();
        match (index.checked_sub(1).and_then(|i| notes.get(i)), notes.get(index)) {
            (_, None) => 0.0,
            (None, Some(note)) => note.time_seconds,
            (Some(prev), Some(note)) => note.time_seconds - prev.time_seconds,
        }
    }
}
