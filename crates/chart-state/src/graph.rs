use std::collections::HashMap;

use thiserror::Error;

use crate::note::{Note, NoteKind};
use crate::position::NotePosition;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("a note already exists at {0:?}")]
    PositionOccupied(NotePosition),
    #[error("no note at {0:?}")]
    NotFound(NotePosition),
    #[error("cannot link {head:?} to {tail:?}")]
    InvalidLink {
        head: NotePosition,
        tail: NotePosition,
    },
    #[error("chain starting at {0:?} does not terminate")]
    CorruptChain(NotePosition),
}

/// The collision-free note set. Positions are unique keys; long-note
/// chains are stored as position links and patched on every mutation so
/// that following `next` always terminates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartGraph {
    notes: HashMap<NotePosition, Note>,
}

impl ChartGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, position: NotePosition) -> bool {
        self.notes.contains_key(&position)
    }

    pub fn get(&self, position: NotePosition) -> Option<&Note> {
        self.notes.get(&position)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn positions(&self) -> impl Iterator<Item = NotePosition> + '_ {
        self.notes.keys().copied()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub(crate) fn note_mut(&mut self, position: NotePosition) -> Option<&mut Note> {
        self.notes.get_mut(&position)
    }

    /// Inserts a note at its position. Supplied chain links are honoured
    /// only when the neighbour already exists, in which case the
    /// neighbour is pointed back at the new note; a link to an absent
    /// position is dropped so chains can be built incrementally.
    pub fn insert(&mut self, mut note: Note) -> Result<(), GraphError> {
        if self.notes.contains_key(&note.position) {
            return Err(GraphError::PositionOccupied(note.position));
        }

        match note.kind {
            NoteKind::Normal => {
                note.prev = None;
                note.next = None;
            }
            NoteKind::Long => {
                if let Some(prev) = note.prev {
                    match self.notes.get_mut(&prev) {
                        Some(neighbour) => neighbour.next = Some(note.position),
                        None => note.prev = None,
                    }
                }

                if let Some(next) = note.next {
                    match self.notes.get_mut(&next) {
                        Some(neighbour) => neighbour.prev = Some(note.position),
                        None => note.next = None,
                    }
                }
            }
        }

        self.notes.insert(note.position, note);
        Ok(())
    }

    /// Removes the note and splices its chain: the neighbours end up
    /// linked to each other, so deleting a middle note shortens the
    /// chain rather than splitting it.
    pub fn remove(&mut self, position: NotePosition) -> Result<Note, GraphError> {
        let note = self
            .notes
            .remove(&position)
            .ok_or(GraphError::NotFound(position))?;

        if let Some(prev) = note.prev {
            if let Some(neighbour) = self.notes.get_mut(&prev) {
                neighbour.next = note.next;
            }
        }

        if let Some(next) = note.next {
            if let Some(neighbour) = self.notes.get_mut(&next) {
                neighbour.prev = note.prev;
            }
        }

        Ok(note)
    }

    /// Toggles a note between normal and long. Long to normal splices
    /// the surrounding chain exactly like [`remove`](Self::remove) and
    /// clears both links; normal to long leaves the links unset for a
    /// later [`link`](Self::link).
    pub fn change_kind(&mut self, position: NotePosition, kind: NoteKind) -> Result<(), GraphError> {
        let current = self
            .notes
            .get(&position)
            .copied()
            .ok_or(GraphError::NotFound(position))?;

        if current.kind == kind {
            return Ok(());
        }

        if kind == NoteKind::Normal {
            if let Some(prev) = current.prev {
                if let Some(neighbour) = self.notes.get_mut(&prev) {
                    neighbour.next = current.next;
                }
            }

            if let Some(next) = current.next {
                if let Some(neighbour) = self.notes.get_mut(&next) {
                    neighbour.prev = current.prev;
                }
            }
        }

        if let Some(note) = self.notes.get_mut(&position) {
            note.kind = kind;
            note.prev = None;
            note.next = None;
        }

        Ok(())
    }

    /// Joins two long notes head to tail. Re-linking an existing pair is
    /// a no-op; anything that would steal an already-linked neighbour or
    /// close a cycle is rejected.
    pub fn link(&mut self, head: NotePosition, tail: NotePosition) -> Result<(), GraphError> {
        let invalid = GraphError::InvalidLink { head, tail };

        let head_note = self.notes.get(&head).copied().ok_or(invalid)?;
        let tail_note = self.notes.get(&tail).copied().ok_or(invalid)?;

        if head == tail
            || head_note.kind != NoteKind::Long
            || tail_note.kind != NoteKind::Long
        {
            return Err(invalid);
        }

        if head_note.next == Some(tail) && tail_note.prev == Some(head) {
            return Ok(());
        }

        if head_note.next.is_some() || tail_note.prev.is_some() {
            return Err(invalid);
        }

        if self.reachable_via_next(tail, head)? {
            return Err(invalid);
        }

        if let Some(note) = self.notes.get_mut(&head) {
            note.next = Some(tail);
        }
        if let Some(note) = self.notes.get_mut(&tail) {
            note.prev = Some(head);
        }

        Ok(())
    }

    fn reachable_via_next(
        &self,
        from: NotePosition,
        target: NotePosition,
    ) -> Result<bool, GraphError> {
        let mut current = Some(from);
        let mut steps = 0;

        while let Some(position) = current {
            if position == target {
                return Ok(true);
            }

            steps += 1;
            if steps > self.notes.len() {
                return Err(GraphError::CorruptChain(from));
            }

            current = self.notes.get(&position).and_then(|note| note.next);
        }

        Ok(false)
    }

    /// The chain anchored at `head`, in playback order. A dangling
    /// `next` terminates the walk; revisiting a note trips the
    /// iteration bound and reports the chain as corrupt.
    pub fn chain(&self, head: NotePosition) -> Result<Vec<Note>, GraphError> {
        let mut members = Vec::new();
        let mut current = Some(head);

        while let Some(position) = current {
            let note = self
                .notes
                .get(&position)
                .copied()
                .ok_or(GraphError::NotFound(position))?;

            members.push(note);
            if members.len() > self.notes.len() {
                return Err(GraphError::CorruptChain(head));
            }

            current = note.next.filter(|next| self.notes.contains_key(next));
        }

        Ok(members)
    }

    /// Chain roots: every normal note, plus long notes whose `prev` is
    /// unset or no longer resolves. These anchor serialization order.
    pub fn heads(&self) -> impl Iterator<Item = &Note> {
        self.notes.values().filter(|note| match note.kind {
            NoteKind::Normal => true,
            NoteKind::Long => note
                .prev
                .map_or(true, |prev| !self.notes.contains_key(&prev)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(num: u32) -> NotePosition {
        NotePosition::new(4, num, 0)
    }

    fn three_note_chain(graph: &mut ChartGraph) -> (NotePosition, NotePosition, NotePosition) {
        let (a, b, c) = (pos(0), pos(4), pos(8));

        graph.insert(Note::long(a, None, None)).unwrap();
        graph.insert(Note::long(b, None, None)).unwrap();
        graph.insert(Note::long(c, None, None)).unwrap();
        graph.link(a, b).unwrap();
        graph.link(b, c).unwrap();

        (a, b, c)
    }

    #[test]
    fn positions_are_unique() {
        let mut graph = ChartGraph::new();

        graph.insert(Note::normal(pos(0))).unwrap();
        assert_eq!(
            graph.insert(Note::normal(pos(0))),
            Err(GraphError::PositionOccupied(pos(0)))
        );

        graph.remove(pos(0)).unwrap();
        assert!(graph.insert(Note::normal(pos(0))).is_ok());
    }

    #[test]
    fn remove_missing_note_fails() {
        let mut graph = ChartGraph::new();
        assert_eq!(graph.remove(pos(3)), Err(GraphError::NotFound(pos(3))));
    }

    #[test]
    fn insert_links_back_to_existing_neighbours() {
        let mut graph = ChartGraph::new();

        graph.insert(Note::long(pos(0), None, None)).unwrap();
        graph.insert(Note::long(pos(4), Some(pos(0)), None)).unwrap();

        assert_eq!(graph.get(pos(0)).unwrap().next, Some(pos(4)));
        assert_eq!(graph.get(pos(4)).unwrap().prev, Some(pos(0)));
    }

    #[test]
    fn insert_drops_links_to_absent_neighbours() {
        let mut graph = ChartGraph::new();

        graph
            .insert(Note::long(pos(4), Some(pos(0)), Some(pos(8))))
            .unwrap();

        let note = graph.get(pos(4)).unwrap();
        assert_eq!(note.prev, None);
        assert_eq!(note.next, None);
    }

    #[test]
    fn removing_a_middle_note_splices_the_chain() {
        let mut graph = ChartGraph::new();
        let (a, b, c) = three_note_chain(&mut graph);

        graph.remove(b).unwrap();

        assert_eq!(graph.get(a).unwrap().next, Some(c));
        assert_eq!(graph.get(c).unwrap().prev, Some(a));
    }

    #[test]
    fn removing_an_end_unsets_the_neighbour_link() {
        let mut graph = ChartGraph::new();
        let (a, b, c) = three_note_chain(&mut graph);

        graph.remove(c).unwrap();
        assert_eq!(graph.get(b).unwrap().next, None);

        graph.remove(a).unwrap();
        assert_eq!(graph.get(b).unwrap().prev, None);
    }

    #[test]
    fn long_to_normal_splices_and_clears_links() {
        let mut graph = ChartGraph::new();
        let (a, b, c) = three_note_chain(&mut graph);

        graph.change_kind(b, NoteKind::Normal).unwrap();

        let middle = graph.get(b).unwrap();
        assert_eq!(middle.kind, NoteKind::Normal);
        assert_eq!(middle.prev, None);
        assert_eq!(middle.next, None);

        assert_eq!(graph.get(a).unwrap().next, Some(c));
        assert_eq!(graph.get(c).unwrap().prev, Some(a));
    }

    #[test]
    fn normal_to_long_starts_unlinked() {
        let mut graph = ChartGraph::new();

        graph.insert(Note::normal(pos(0))).unwrap();
        graph.change_kind(pos(0), NoteKind::Long).unwrap();

        let note = graph.get(pos(0)).unwrap();
        assert_eq!(note.kind, NoteKind::Long);
        assert_eq!(note.prev, None);
        assert_eq!(note.next, None);
    }

    #[test]
    fn link_rejects_cycles_and_conflicts() {
        let mut graph = ChartGraph::new();
        let (a, b, c) = three_note_chain(&mut graph);

        // closing the chain back on itself
        assert!(graph.link(c, a).is_err());

        // b already has a next
        graph.insert(Note::long(pos(12), None, None)).unwrap();
        assert!(graph.link(b, pos(12)).is_err());

        // relinking an existing pair is fine
        assert_eq!(graph.link(a, b), Ok(()));
    }

    #[test]
    fn link_requires_two_existing_long_notes() {
        let mut graph = ChartGraph::new();

        graph.insert(Note::long(pos(0), None, None)).unwrap();
        assert!(graph.link(pos(0), pos(4)).is_err());

        graph.insert(Note::normal(pos(4))).unwrap();
        assert!(graph.link(pos(0), pos(4)).is_err());

        assert!(graph.link(pos(0), pos(0)).is_err());
    }

    #[test]
    fn chain_walks_in_order() {
        let mut graph = ChartGraph::new();
        let (a, b, c) = three_note_chain(&mut graph);

        let chain = graph.chain(a).unwrap();
        let positions: Vec<_> = chain.iter().map(|note| note.position).collect();

        assert_eq!(positions, vec![a, b, c]);
    }

    #[test]
    fn chains_stay_acyclic_under_mutation() {
        let mut graph = ChartGraph::new();
        let (a, b, c) = three_note_chain(&mut graph);

        graph.remove(b).unwrap();
        graph.insert(Note::long(pos(12), Some(c), None)).unwrap();
        assert!(graph.link(pos(12), a).is_err());

        for head in [a, c, pos(12)] {
            assert!(graph.chain(head).is_ok());
        }
    }

    #[test]
    fn heads_are_normals_and_unanchored_longs() {
        let mut graph = ChartGraph::new();
        let (a, _, _) = three_note_chain(&mut graph);
        graph.insert(Note::normal(pos(20))).unwrap();

        let mut heads: Vec<_> = graph.heads().map(|note| note.position).collect();
        heads.sort();

        assert_eq!(heads, vec![a, pos(20)]);
    }
}
