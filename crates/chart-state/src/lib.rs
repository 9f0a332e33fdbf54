mod clipboard;
mod graph;
mod note;
pub mod persistance;
mod position;
mod snapshot;
mod timing;

use std::collections::HashSet;

pub use clipboard::{Clipboard, PasteError};
pub use graph::{ChartGraph, GraphError};
pub use note::{Note, NoteKind};
pub use position::NotePosition;
pub use snapshot::{Snapshot, ViewState};
pub use timing::{Tempo, TimingError};

/// Change notification for rendering/UI adapters. Mutations queue these
/// on the [`State`]; observers drain them with [`State::take_events`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartEvent {
    NoteAdded(NotePosition),
    NoteRemoved(NotePosition),
    NoteChanged(NotePosition),
}

/// The editable document for one loaded track. Owned exclusively by the
/// active session; every mutation goes through a method here so chart
/// invariants and change notifications cannot be bypassed.
#[derive(Clone, Debug)]
pub struct State {
    music_name: String,
    bpm: f64,
    offset_samples: i64,
    lpb: u32,
    max_block: u32,
    time_samples: i64,
    view: ViewState,
    graph: ChartGraph,
    events: Vec<ChartEvent>,
    dirty: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            music_name: String::new(),
            bpm: 120.0,
            offset_samples: 0,
            lpb: 4,
            max_block: 5,
            time_samples: 0,
            view: ViewState::default(),
            graph: ChartGraph::new(),
            events: Vec::new(),
            dirty: false,
        }
    }
}

impl State {
    /// Resets to the defaults a freshly loaded track starts from.
    pub fn clear(&mut self) {
        for position in self.graph.positions().collect::<Vec<_>>() {
            self.events.push(ChartEvent::NoteRemoved(position));
        }

        *self = Self {
            events: std::mem::take(&mut self.events),
            ..Self::default()
        };
    }

    pub fn music_name(&self) -> &str {
        &self.music_name
    }

    pub fn set_music_name(&mut self, name: &str) {
        self.music_name = name.to_owned();
        self.dirty = true;
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm;
        self.dirty = true;
    }

    pub fn offset_samples(&self) -> i64 {
        self.offset_samples
    }

    pub fn set_offset_samples(&mut self, offset_samples: i64) {
        self.offset_samples = offset_samples;
        self.dirty = true;
    }

    pub fn lpb(&self) -> u32 {
        self.lpb
    }

    pub fn set_lpb(&mut self, lpb: u32) {
        self.lpb = lpb.max(1);
        self.dirty = true;
    }

    pub fn max_block(&self) -> u32 {
        self.max_block
    }

    pub fn set_max_block(&mut self, max_block: u32) {
        self.max_block = max_block.max(1);
        self.dirty = true;
    }

    pub fn time_samples(&self) -> i64 {
        self.time_samples
    }

    pub fn set_time_samples(&mut self, time_samples: i64) {
        self.time_samples = time_samples;
        self.dirty = true;
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
        self.dirty = true;
    }

    /// Conversion parameters for the given clip sample rate.
    pub fn tempo(&self, sample_rate: u32) -> Tempo {
        Tempo::new(self.bpm, self.offset_samples, sample_rate)
    }

    pub fn graph(&self) -> &ChartGraph {
        &self.graph
    }

    pub fn add_note(&mut self, note: Note) -> Result<(), GraphError> {
        self.graph.insert(note)?;
        self.events.push(ChartEvent::NoteAdded(note.position));
        self.dirty = true;
        Ok(())
    }

    pub fn remove_note(&mut self, position: NotePosition) -> Result<Note, GraphError> {
        let note = self.graph.remove(position)?;
        self.events.push(ChartEvent::NoteRemoved(position));
        self.dirty = true;
        Ok(note)
    }

    pub fn change_note_kind(
        &mut self,
        position: NotePosition,
        kind: NoteKind,
    ) -> Result<(), GraphError> {
        self.graph.change_kind(position, kind)?;
        self.events.push(ChartEvent::NoteChanged(position));
        self.dirty = true;
        Ok(())
    }

    pub fn link_notes(
        &mut self,
        head: NotePosition,
        tail: NotePosition,
    ) -> Result<(), GraphError> {
        self.graph.link(head, tail)?;
        self.events.push(ChartEvent::NoteChanged(head));
        self.events.push(ChartEvent::NoteChanged(tail));
        self.dirty = true;
        Ok(())
    }

    pub fn copy(&mut self, clipboard: &mut Clipboard, selection: &HashSet<NotePosition>) {
        clipboard.copy(&self.graph, selection);
    }

    pub fn cut(
        &mut self,
        clipboard: &mut Clipboard,
        selection: &HashSet<NotePosition>,
    ) -> Vec<Note> {
        clipboard.copy(&self.graph, selection);

        let mut removed = Vec::new();
        for position in selection {
            if let Ok(note) = self.remove_note(*position) {
                removed.push(note);
            }
        }

        removed
    }

    pub fn paste(
        &mut self,
        clipboard: &mut Clipboard,
        sample_rate: u32,
        total_samples: i64,
    ) -> Result<Vec<NotePosition>, PasteError> {
        let tempo = self.tempo(sample_rate);
        let pasted = clipboard.paste(&mut self.graph, &tempo, total_samples)?;

        for position in &pasted {
            self.events.push(ChartEvent::NoteAdded(*position));
        }
        if !pasted.is_empty() {
            self.dirty = true;
        }

        Ok(pasted)
    }

    pub fn take_events(&mut self) -> Vec<ChartEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clean(&mut self) {
        self.dirty = false;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bpm: self.bpm,
            offset_samples: self.offset_samples,
            lpb: self.lpb,
            max_block: self.max_block,
            time_samples: self.time_samples,
            view: self.view,
            notes: self.graph.notes().map(|note| (note.position, *note)).collect(),
        }
    }

    /// Replaces the loaded document with a decoded chart.
    pub fn apply_chart(&mut self, chart: &persistance::PersistedChart, graph: ChartGraph) {
        self.clear();

        self.music_name = chart.name.clone();
        self.bpm = chart.bpm as f64;
        self.offset_samples = chart.offset;
        self.max_block = chart.max_block;

        for position in graph.positions() {
            self.events.push(ChartEvent::NoteAdded(position));
        }

        self.graph = graph;
        self.dirty = true;
    }

    /// Drives the live document to `target` with the minimal set of
    /// graph operations: scalars are overwritten, stale notes removed,
    /// missing ones inserted as normals, then kind and links corrected
    /// in place. Link targets are resolved against the post-insert note
    /// set; a target absent from both states stays unset. Returns the
    /// number of graph mutations, which is zero when the states already
    /// match.
    pub fn reconcile(&mut self, target: &Snapshot) -> usize {
        if self.bpm != target.bpm
            || self.offset_samples != target.offset_samples
            || self.lpb != target.lpb
            || self.max_block != target.max_block
            || self.time_samples != target.time_samples
            || self.view != target.view
        {
            self.bpm = target.bpm;
            self.offset_samples = target.offset_samples;
            self.lpb = target.lpb;
            self.max_block = target.max_block;
            self.time_samples = target.time_samples;
            self.view = target.view;
            self.dirty = true;
        }

        let mut mutations = 0;

        let stale: Vec<_> = self
            .graph
            .positions()
            .filter(|position| !target.notes.contains_key(position))
            .collect();

        for position in stale {
            if self.graph.remove(position).is_ok() {
                self.events.push(ChartEvent::NoteRemoved(position));
                mutations += 1;
            }
        }

        let missing: Vec<_> = target
            .notes
            .keys()
            .filter(|position| !self.graph.contains(**position))
            .copied()
            .collect();

        for position in missing {
            if self.graph.insert(Note::normal(position)).is_ok() {
                self.events.push(ChartEvent::NoteAdded(position));
                mutations += 1;
            }
        }

        for (position, want) in &target.notes {
            let prev = want.prev.filter(|link| self.graph.contains(*link));
            let next = want.next.filter(|link| self.graph.contains(*link));

            let mut changed = false;
            if let Some(live) = self.graph.note_mut(*position) {
                if live.kind != want.kind || live.prev != prev || live.next != next {
                    live.kind = want.kind;
                    live.prev = prev;
                    live.next = next;
                    changed = true;
                }
            }

            if changed {
                self.events.push(ChartEvent::NoteChanged(*position));
                mutations += 1;
            }
        }

        if mutations > 0 {
            self.dirty = true;
        }

        mutations
    }
}
