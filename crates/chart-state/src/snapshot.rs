use std::collections::HashMap;

use crate::note::Note;
use crate::position::NotePosition;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewState {
    pub offset_x: f32,
    pub width: f32,
}

/// Immutable capture of everything undo is allowed to restore. Compared
/// by deep equality, including the full note set, which is what lets
/// history drop snapshots of states that bounced back to where they
/// started.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub bpm: f64,
    pub offset_samples: i64,
    pub lpb: u32,
    pub max_block: u32,
    pub time_samples: i64,
    pub view: ViewState,
    pub notes: HashMap<NotePosition, Note>,
}
