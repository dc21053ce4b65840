use serde::{Deserialize, Serialize};

/// Identifier handed out by [`NoteField::spawn`], unique within a session.
pub type NoteId = u64;

/// A note currently scrolling across the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveNote {
    pub id: NoteId,
    pub symbol: String,
    pub position_x: f32,
    /// Leftward speed in stage units per second.
    pub speed: f32,
    pub spawned_at: f64,
}

impl ActiveNote {
    /// Distance to the judgment line.
    pub fn distance_to(&self, line_x: f32) -> f32 {
        (self.position_x - line_x).abs()
    }
}

/// The set of live notes, kept in spawn order.
#[derive(Debug, Default)]
pub struct NoteField {
    notes: Vec<ActiveNote>,
    next_id: NoteId,
}

impl NoteField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(
        &mut self,
        symbol: impl Into<String>,
        position_x: f32,
        speed: f32,
        spawned_at: f64,
    ) -> NoteId {
        let id = self.next_id;
        self.next_id += 1;
        self.notes.push(ActiveNote {
            id,
            symbol: symbol.into(),
            position_x,
            speed,
            spawned_at,
        });
        id
    }

    /// Moves every note left by `speed * delta`.
    pub fn advance(&mut self, delta: f32) {
        for note in &mut self.notes {
            note.position_x -= note.speed * delta;
        }
    }

    /// Removes notes left of `destroy_x` (or with a non-finite position)
    /// without judging them. Returns how many were removed.
    pub fn despawn_beyond(&mut self, destroy_x: f32) -> usize {
        let before = self.notes.len();
        self.notes
            .retain(|note| note.position_x.is_finite() && note.position_x >= destroy_x);
        before - self.notes.len()
    }

    pub fn remove(&mut self, id: NoteId) -> Option<ActiveNote> {
        let index = self.notes.iter().position(|note| note.id == id)?;
        Some(self.notes.remove(index))
    }

    pub fn get(&self, id: NoteId) -> Option<&ActiveNote> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveNote> {
        self.notes.iter()
    }

    /// Drops every live note. Ids keep increasing across clears.
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_at_constant_speed() {
        let mut field = NoteField::new();
        let slow = field.spawn("A", 10.0, 2.0, 0.0);
        let fast = field.spawn("B", 10.0, 4.0, 0.0);

        field.advance(0.5);
        field.advance(0.25);

        assert_eq!(field.get(slow).unwrap().position_x, 8.5);
        assert_eq!(field.get(fast).unwrap().position_x, 7.0);
    }

    #[test]
    fn despawns_notes_past_the_stage() {
        let mut field = NoteField::new();
        field.spawn("A", -11.0, 1.0, 0.0);
        let kept = field.spawn("B", -9.0, 1.0, 0.0);
        field.spawn("C", f32::NAN, 1.0, 0.0);

        assert_eq!(field.despawn_beyond(-10.0), 2);
        assert_eq!(field.len(), 1);
        assert!(field.get(kept).is_some());
    }

    #[test]
    fn ids_are_unique_across_clear() {
        let mut field = NoteField::new();
        let first = field.spawn("A", 0.0, 1.0, 0.0);
        field.clear();
        let second = field.spawn("A", 0.0, 1.0, 0.0);

        assert_ne!(first, second);
        assert!(field.remove(first).is_none());
        assert_eq!(field.remove(second).unwrap().symbol, "A");
        assert!(field.is_empty());
    }
}
