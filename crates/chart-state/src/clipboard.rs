use std::collections::HashSet;

use log::debug;
use thiserror::Error;

use crate::graph::ChartGraph;
use crate::note::{Note, NoteKind};
use crate::position::NotePosition;
use crate::timing::{Tempo, TimingError};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PasteError {
    #[error("pasted notes would fall outside the track")]
    OutOfBounds,
    #[error(transparent)]
    Timing(#[from] TimingError),
}

/// Holds deep copies of a note selection. Chain links are rewritten at
/// copy time to the nearest selected chain neighbour, so pasting a
/// gapped selection reproduces only the selected sub-chain.
#[derive(Clone, Debug, Default)]
pub struct Clipboard {
    copied: Vec<Note>,
}

impl Clipboard {
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty()
    }

    pub fn len(&self) -> usize {
        self.copied.len()
    }

    pub fn copy(&mut self, graph: &ChartGraph, selection: &HashSet<NotePosition>) {
        self.copied = selection
            .iter()
            .filter_map(|position| graph.get(*position))
            .map(|note| {
                let mut copy = *note;
                if copy.kind == NoteKind::Long {
                    copy.next = nearest_selected(graph, selection, note.next, |note| note.next);
                    copy.prev = nearest_selected(graph, selection, note.prev, |note| note.prev);
                }
                copy
            })
            .collect();
    }

    /// Pastes the copied block one full block span later, so repeated
    /// pastes lay blocks down back to back. The whole paste is rejected
    /// if any shifted note would land past the end of the track.
    pub fn paste(
        &mut self,
        graph: &mut ChartGraph,
        tempo: &Tempo,
        total_samples: i64,
    ) -> Result<Vec<NotePosition>, PasteError> {
        if self.copied.is_empty() {
            return Ok(Vec::new());
        }

        let span_beats = self.span_beats(tempo)?;

        let shifted: Vec<Note> = self
            .copied
            .iter()
            .map(|note| shift_note(note, span_beats))
            .collect();

        for note in &shifted {
            if note.position.to_samples(tempo)? >= total_samples {
                return Err(PasteError::OutOfBounds);
            }
        }

        let mut pasted = Vec::with_capacity(shifted.len());

        for note in &shifted {
            let bare = Note {
                prev: None,
                next: None,
                ..*note
            };

            // a paste may land on an existing note, which it replaces
            if graph.contains(bare.position) {
                let _ = graph.remove(bare.position);
            }
            if graph.insert(bare).is_ok() {
                pasted.push(bare.position);
            }
        }

        for note in &shifted {
            if let Some(next) = note.next {
                if graph.link(note.position, next).is_err() {
                    debug!("could not relink pasted note at {:?}", note.position);
                }
            }
        }

        // keep the shifted copies so the next paste appends another span
        self.copied = shifted;

        Ok(pasted)
    }

    // One beat more than the beat distance between the first and last
    // copied note, measured with each note's own lpb.
    fn span_beats(&self, tempo: &Tempo) -> Result<u32, TimingError> {
        let mut first: Option<(i64, NotePosition)> = None;
        let mut last: Option<(i64, NotePosition)> = None;

        for note in &self.copied {
            let samples = note.position.to_samples(tempo)?;

            if first.map_or(true, |(s, _)| samples < s) {
                first = Some((samples, note.position));
            }
            if last.map_or(true, |(s, _)| samples > s) {
                last = Some((samples, note.position));
            }
        }

        match (first, last) {
            (Some((_, first)), Some((_, last))) => Ok(1 + last.beat() - first.beat()),
            _ => Ok(1),
        }
    }
}

fn shift_note(note: &Note, span_beats: u32) -> Note {
    Note {
        position: note.position.shifted(note.position.lpb * span_beats),
        kind: note.kind,
        prev: note.prev.map(|prev| prev.shifted(prev.lpb * span_beats)),
        next: note.next.map(|next| next.shifted(next.lpb * span_beats)),
    }
}

fn nearest_selected(
    graph: &ChartGraph,
    selection: &HashSet<NotePosition>,
    start: Option<NotePosition>,
    step: impl Fn(&Note) -> Option<NotePosition>,
) -> Option<NotePosition> {
    let mut current = start;

    while let Some(position) = current {
        let note = graph.get(position)?;

        if selection.contains(&position) {
            return Some(position);
        }

        current = step(note);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(num: u32) -> NotePosition {
        NotePosition::new(4, num, 0)
    }

    fn tempo() -> Tempo {
        Tempo::new(120.0, 0, 44100)
    }

    fn chain(graph: &mut ChartGraph, nums: &[u32]) {
        let mut prev: Option<NotePosition> = None;

        for &num in nums {
            graph.insert(Note::long(pos(num), None, None)).unwrap();
            if let Some(prev) = prev {
                graph.link(prev, pos(num)).unwrap();
            }
            prev = Some(pos(num));
        }
    }

    #[test]
    fn copy_keeps_only_selected_sub_chain_links() {
        let mut graph = ChartGraph::new();
        chain(&mut graph, &[0, 2, 4, 6]);

        // gapped selection: first, third and fourth members
        let selection = HashSet::from([pos(0), pos(4), pos(6)]);
        let mut clipboard = Clipboard::default();
        clipboard.copy(&graph, &selection);

        let copied: std::collections::HashMap<_, _> = clipboard
            .copied
            .iter()
            .map(|note| (note.position, *note))
            .collect();

        // the unselected member at 2 is walked through
        assert_eq!(copied[&pos(0)].next, Some(pos(4)));
        assert_eq!(copied[&pos(0)].prev, None);
        assert_eq!(copied[&pos(4)].prev, Some(pos(0)));
        assert_eq!(copied[&pos(4)].next, Some(pos(6)));
        assert_eq!(copied[&pos(6)].prev, Some(pos(4)));
        assert_eq!(copied[&pos(6)].next, None);
    }

    #[test]
    fn paste_lands_one_span_after_the_copied_block() {
        let mut graph = ChartGraph::new();
        graph.insert(Note::normal(pos(0))).unwrap();
        graph.insert(Note::normal(pos(5))).unwrap();

        let selection = HashSet::from([pos(0), pos(5)]);
        let mut clipboard = Clipboard::default();
        clipboard.copy(&graph, &selection);

        // span is 1 + 5/4 - 0/4 = 2 beats = 8 lines
        let pasted = clipboard
            .paste(&mut graph, &tempo(), i64::MAX)
            .unwrap();

        assert_eq!(pasted.len(), 2);
        assert!(graph.contains(pos(8)));
        assert!(graph.contains(pos(13)));
    }

    #[test]
    fn repeated_paste_appends_consecutive_blocks() {
        let mut graph = ChartGraph::new();
        graph.insert(Note::normal(pos(0))).unwrap();

        let selection = HashSet::from([pos(0)]);
        let mut clipboard = Clipboard::default();
        clipboard.copy(&graph, &selection);

        clipboard.paste(&mut graph, &tempo(), i64::MAX).unwrap();
        clipboard.paste(&mut graph, &tempo(), i64::MAX).unwrap();

        assert!(graph.contains(pos(4)));
        assert!(graph.contains(pos(8)));
    }

    #[test]
    fn paste_preserves_chain_structure() {
        let mut graph = ChartGraph::new();
        chain(&mut graph, &[0, 2]);

        let selection = HashSet::from([pos(0), pos(2)]);
        let mut clipboard = Clipboard::default();
        clipboard.copy(&graph, &selection);

        clipboard.paste(&mut graph, &tempo(), i64::MAX).unwrap();

        // span 1 beat = 4 lines
        let head = graph.get(pos(4)).unwrap();
        assert_eq!(head.kind, NoteKind::Long);
        assert_eq!(head.next, Some(pos(6)));
        assert_eq!(graph.get(pos(6)).unwrap().prev, Some(pos(4)));
    }

    #[test]
    fn out_of_bounds_paste_is_fully_rejected() {
        let mut graph = ChartGraph::new();
        graph.insert(Note::normal(pos(0))).unwrap();
        graph.insert(Note::normal(pos(4))).unwrap();

        let selection = HashSet::from([pos(0), pos(4)]);
        let mut clipboard = Clipboard::default();
        clipboard.copy(&graph, &selection);

        // the shifted block would span samples 44100..66150; cut it off
        let result = clipboard.paste(&mut graph, &tempo(), 50000);

        assert_eq!(result, Err(PasteError::OutOfBounds));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn pasting_an_empty_clipboard_does_nothing() {
        let mut graph = ChartGraph::new();
        let mut clipboard = Clipboard::default();

        assert_eq!(clipboard.paste(&mut graph, &tempo(), 100), Ok(Vec::new()));
    }
}
