//! Score file parsing and schedule construction.
//!
//! A [`Chart`] holds the note onsets and the tempo map read from a Standard
//! MIDI File. Only the start tick of each note matters: pitch and channel are
//! kept for diagnostics but never influence the symbol a note receives.

use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};

use crate::{symbols::SymbolCycler, RhythmError, Result, SymbolSequence};

/// Tempo assumed until the first tempo event, 120 BPM.
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

/// How ticks relate to wall time in the source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeDivision {
    /// Ticks per quarter note; tempo events apply.
    Metrical(u16),
    /// Fixed ticks per second (SMPTE frames times subframes).
    Timecode(f64),
}

/// A tempo change at a tick position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoChange {
    pub tick: u64,
    pub micros_per_quarter: u32,
}

/// Piecewise-constant tempo segments used to convert ticks into seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    division: TimeDivision,
    changes: Vec<TempoChange>,
}

impl TempoMap {
    /// Builds a map from tempo changes in any order. Changes sharing a tick
    /// keep the last one given, and tick 0 falls back to
    /// [`DEFAULT_MICROS_PER_QUARTER`] when no change starts there.
    pub fn new(division: TimeDivision, changes: impl IntoIterator<Item = TempoChange>) -> Self {
        let mut sorted: Vec<TempoChange> = changes.into_iter().collect();
        sorted.sort_by_key(|change| change.tick);

        let mut deduped: Vec<TempoChange> = Vec::with_capacity(sorted.len() + 1);
        for change in sorted {
            match deduped.last_mut() {
                Some(last) if last.tick == change.tick => *last = change,
                _ => deduped.push(change),
            }
        }

        if deduped.first().map(|c| c.tick != 0).unwrap_or(true) {
            deduped.insert(
                0,
                TempoChange {
                    tick: 0,
                    micros_per_quarter: DEFAULT_MICROS_PER_QUARTER,
                },
            );
        }

        Self {
            division,
            changes: deduped,
        }
    }

    /// A map with a single constant tempo.
    pub fn constant(ticks_per_quarter: u16, micros_per_quarter: u32) -> Self {
        Self::new(
            TimeDivision::Metrical(ticks_per_quarter),
            [TempoChange {
                tick: 0,
                micros_per_quarter,
            }],
        )
    }

    pub fn division(&self) -> TimeDivision {
        self.division
    }

    /// Tempo changes with strictly increasing ticks, the first at tick 0.
    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    /// Elapsed microseconds from tick 0 to `tick`, accumulated segment by
    /// segment.
    pub fn ticks_to_micros(&self, tick: u64) -> f64 {
        let ticks_per_quarter = match self.division {
            TimeDivision::Timecode(ticks_per_second) => {
                return tick as f64 / ticks_per_second * 1_000_000.0;
            }
            TimeDivision::Metrical(tpq) => f64::from(tpq.max(1)),
        };

        let mut micros = 0.0;
        for (index, change) in self.changes.iter().enumerate() {
            if change.tick >= tick {
                break;
            }
            let segment_end = self
                .changes
                .get(index + 1)
                .map(|next| next.tick.min(tick))
                .unwrap_or(tick);
            let micros_per_tick = f64::from(change.micros_per_quarter) / ticks_per_quarter;
            micros += (segment_end - change.tick) as f64 * micros_per_tick;
        }
        micros
    }

    pub fn ticks_to_seconds(&self, tick: u64) -> f64 {
        self.ticks_to_micros(tick) / 1_000_000.0
    }
}

/// A note onset extracted from the score file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawNote {
    pub tick: u64,
    pub key: u8,
    pub channel: u8,
}

/// Parsed score file: note onsets ordered by tick plus the tempo map.
#[derive(Debug, Clone)]
pub struct Chart {
    tempo_map: TempoMap,
    notes: Vec<RawNote>,
}

impl Chart {
    /// Creates a chart from already extracted notes. Notes are stably sorted
    /// by tick.
    pub fn new(tempo_map: TempoMap, mut notes: Vec<RawNote>) -> Self {
        notes.sort_by_key(|note| note.tick);
        Self { tempo_map, notes }
    }

    /// Reads a Standard MIDI File from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| {
            RhythmError::ChartLoad(format!("cannot read `{}`: {err}", path.display()))
        })?;
        Self::from_midi_bytes(&bytes).map_err(|err| match err {
            RhythmError::ChartLoad(reason) => {
                RhythmError::ChartLoad(format!("`{}`: {reason}", path.display()))
            }
            other => other,
        })
    }

    /// Parses Standard MIDI File bytes. Note-on events with a non-zero velocity
    /// from every track become notes; tempo meta events form the tempo map.
    pub fn from_midi_bytes(bytes: &[u8]) -> Result<Self> {
        let smf = Smf::parse(bytes)
            .map_err(|err| RhythmError::ChartLoad(format!("invalid MIDI data: {err}")))?;

        let division = match smf.header.timing {
            Timing::Metrical(tpq) => TimeDivision::Metrical(tpq.as_int()),
            Timing::Timecode(fps, subframes) => {
                TimeDivision::Timecode(f64::from(fps.as_f32()) * f64::from(subframes.max(1)))
            }
        };

        let mut tempo_changes = Vec::new();
        let mut notes = Vec::new();
        for track in &smf.tracks {
            let mut tick: u64 = 0;
            for event in track {
                tick += u64::from(event.delta.as_int());
                match event.kind {
                    TrackEventKind::Meta(MetaMessage::Tempo(micros)) => {
                        tempo_changes.push(TempoChange {
                            tick,
                            micros_per_quarter: micros.as_int(),
                        });
                    }
                    TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOn { key, vel },
                    } if vel.as_int() > 0 => {
                        notes.push(RawNote {
                            tick,
                            key: key.as_int(),
                            channel: channel.as_int(),
                        });
                    }
                    _ => {}
                }
            }
        }

        Ok(Self::new(TempoMap::new(division, tempo_changes), notes))
    }

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo_map
    }

    pub fn notes(&self) -> &[RawNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// A note ready to be spawned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNote {
    pub time_seconds: f64,
    pub symbol: String,
}

impl ScheduledNote {
    pub fn new(time_seconds: f64, symbol: impl Into<String>) -> Self {
        Self {
            time_seconds,
            symbol: symbol.into(),
        }
    }
}

/// Notes ordered by non-decreasing time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    notes: Vec<ScheduledNote>,
}

impl Schedule {
    /// Converts every chart note to seconds and pairs the `i`-th note with the
    /// `i`-th symbol of the cyclic sequence.
    pub fn build(chart: &Chart, symbols: &SymbolSequence) -> Result<Self> {
        let cycler = SymbolCycler::new(symbols)?;
        let tempo_map = chart.tempo_map();

        let mut notes = Vec::with_capacity(chart.len());
        for (index, raw) in chart.notes().iter().enumerate() {
            notes.push(ScheduledNote {
                time_seconds: tempo_map.ticks_to_seconds(raw.tick),
                symbol: cycler.symbol_at(index).to_string(),
            });
        }

        tracing::info!(
            notes = notes.len(),
            symbols = symbols.len(),
            "built note schedule"
        );
        Ok(Self { notes })
    }

    /// Creates a schedule from explicit notes, sorting them by time.
    pub fn from_notes(mut notes: Vec<ScheduledNote>) -> Self {
        notes.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
        Self { notes }
    }

    pub fn notes(&self) -> &[ScheduledNote] {
        &self.notes
    }

    pub fn get(&self, index: usize) -> Option<&ScheduledNote> {
        self.notes.get(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Assembles a single-track format 0 file from raw track event bytes.
    pub(crate) fn smf_bytes(division: [u8; 2], events: &[u8]) -> Vec<u8> {
        let mut track = events.to_vec();
        track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let mut bytes = b"MThd".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1]);
        bytes.extend_from_slice(&division);
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&track);
        bytes
    }

    /// 480 tpq, 120 BPM until tick 960, then 60 BPM. Notes at ticks
    /// 0, 480, 960 and 1440.
    pub(crate) fn two_tempo_midi() -> Vec<u8> {
        smf_bytes(
            [0x01, 0xE0],
            &[
                0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // 500000 us
                0x00, 0x90, 0x3C, 0x40, // tick 0
                0x83, 0x60, 0x80, 0x3C, 0x40, // tick 480 note off
                0x00, 0x91, 0x3E, 0x40, // tick 480
                0x83, 0x60, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // tick 960: 1000000 us
                0x00, 0x90, 0x40, 0x40, // tick 960
                0x83, 0x60, 0x90, 0x43, 0x40, // tick 1440
                0x00, 0x90, 0x45, 0x00, // velocity 0 is a note off
            ],
        )
    }

    fn symbols(values: &[&str]) -> SymbolSequence {
        SymbolSequence::new(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn converts_ticks_across_tempo_segments() {
        let map = TempoMap::new(
            TimeDivision::Metrical(480),
            [
                TempoChange {
                    tick: 960,
                    micros_per_quarter: 1_000_000,
                },
                TempoChange {
                    tick: 0,
                    micros_per_quarter: 500_000,
                },
            ],
        );

        assert_eq!(map.ticks_to_seconds(0), 0.0);
        assert!((map.ticks_to_seconds(480) - 0.5).abs() < 1e-9);
        assert!((map.ticks_to_seconds(960) - 1.0).abs() < 1e-9);
        assert!((map.ticks_to_seconds(1440) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn missing_initial_tempo_defaults_to_120_bpm() {
        let map = TempoMap::new(
            TimeDivision::Metrical(96),
            [TempoChange {
                tick: 192,
                micros_per_quarter: 250_000,
            }],
        );

        assert_eq!(map.changes()[0].tick, 0);
        assert!((map.ticks_to_seconds(192) - 1.0).abs() < 1e-9);
        assert!((map.ticks_to_seconds(288) - 1.25).abs() < 1e-9);
    }

    #[test]
    fn duplicate_tempo_ticks_keep_last_value() {
        let map = TempoMap::new(
            TimeDivision::Metrical(480),
            [
                TempoChange {
                    tick: 0,
                    micros_per_quarter: 500_000,
                },
                TempoChange {
                    tick: 0,
                    micros_per_quarter: 250_000,
                },
            ],
        );

        assert_eq!(map.changes().len(), 1);
        assert!((map.ticks_to_seconds(480) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn timecode_division_is_linear() {
        let map = TempoMap::new(TimeDivision::Timecode(1000.0), Vec::new());
        assert!((map.ticks_to_seconds(2500) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn parses_notes_and_tempo_from_midi() {
        let chart = Chart::from_midi_bytes(&two_tempo_midi()).unwrap();

        let ticks: Vec<u64> = chart.notes().iter().map(|n| n.tick).collect();
        assert_eq!(ticks, vec![0, 480, 960, 1440]);
        assert_eq!(chart.notes()[1].channel, 1);
        assert_eq!(chart.tempo_map().changes().len(), 2);
    }

    #[test]
    fn corrupt_midi_is_a_chart_load_error() {
        let err = Chart::from_midi_bytes(b"not a midi file").unwrap_err();
        assert!(matches!(err, RhythmError::ChartLoad(_)));
    }

    #[test]
    fn missing_file_is_a_chart_load_error() {
        let err = Chart::load("does/not/exist.mid").unwrap_err();
        match err {
            RhythmError::ChartLoad(reason) => assert!(reason.contains("exist.mid")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn schedule_times_and_cyclic_symbols() {
        let chart = Chart::from_midi_bytes(&two_tempo_midi()).unwrap();
        let sequence = symbols(&["A", "B", "C"]);
        let schedule = Schedule::build(&chart, &sequence).unwrap();

        let times: Vec<f64> = schedule.notes().iter().map(|n| n.time_seconds).collect();
        let expected = [0.0, 0.5, 1.0, 2.0];
        for (time, want) in times.iter().zip(expected) {
            assert!((time - want).abs() < 1e-9);
        }
        assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));

        for (index, note) in schedule.notes().iter().enumerate() {
            assert_eq!(note.symbol, sequence.values()[index % sequence.len()]);
        }
    }

    #[test]
    fn symbols_ignore_pitch_and_channel() {
        let map = TempoMap::constant(100, 1_000_000);
        let chart = Chart::new(
            map,
            vec![
                RawNote { tick: 0, key: 60, channel: 0 },
                RawNote { tick: 50, key: 90, channel: 9 },
                RawNote { tick: 120, key: 60, channel: 0 },
            ],
        );
        let schedule = Schedule::build(&chart, &symbols(&["A", "B"])).unwrap();

        let built: Vec<&str> = schedule.notes().iter().map(|n| n.symbol.as_str()).collect();
        assert_eq!(built, vec!["A", "B", "A"]);
        assert!((schedule.notes()[1].time_seconds - 0.5).abs() < 1e-9);
        assert!((schedule.notes()[2].time_seconds - 1.2).abs() < 1e-9);
    }

    #[test]
    fn empty_symbol_sequence_fails_build() {
        let chart = Chart::from_midi_bytes(&two_tempo_midi()).unwrap();
        let err = Schedule::build(&chart, &SymbolSequence::new(Vec::new())).unwrap_err();
        assert!(matches!(err, RhythmError::EmptySequence));
    }
}
