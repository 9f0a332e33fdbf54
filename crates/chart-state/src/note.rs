use crate::position::NotePosition;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    Normal,
    Long,
}

/// A placed note. `prev`/`next` are keys into the owning [`ChartGraph`],
/// never references, so a stale link can only dangle and is re-resolved
/// through the graph on every access.
///
/// [`ChartGraph`]: crate::ChartGraph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    pub position: NotePosition,
    pub kind: NoteKind,
    pub prev: Option<NotePosition>,
    pub next: Option<NotePosition>,
}

impl Note {
    pub fn normal(position: NotePosition) -> Self {
        Self {
            position,
            kind: NoteKind::Normal,
            prev: None,
            next: None,
        }
    }

    pub fn long(
        position: NotePosition,
        prev: Option<NotePosition>,
        next: Option<NotePosition>,
    ) -> Self {
        Self {
            position,
            kind: NoteKind::Long,
            prev,
            next,
        }
    }
}
