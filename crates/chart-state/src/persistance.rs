use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{ChartGraph, GraphError};
use crate::note::{Note, NoteKind};
use crate::position::NotePosition;
use crate::timing::{Tempo, TimingError};

const NOTE_TYPE_NORMAL: u8 = 1;
const NOTE_TYPE_LONG: u8 = 2;

fn default_max_block() -> u32 {
    5
}

/// The on-disk chart document. Field names are part of the format and
/// must not change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedChart {
    pub name: String,
    #[serde(rename = "maxBlock", default = "default_max_block")]
    pub max_block: u32,
    #[serde(rename = "BPM")]
    pub bpm: u32,
    pub offset: i64,
    #[serde(default)]
    pub notes: Vec<PersistedNote>,
}

/// One chart entry. A normal note is a leaf; a long note is the head of
/// its chain and carries the remaining members, in chain order, in the
/// nested `notes` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedNote {
    #[serde(rename = "LPB")]
    pub lpb: u32,
    pub num: u32,
    pub block: u32,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub notes: Vec<PersistedNote>,
}

impl PersistedNote {
    fn leaf(note: &Note, kind: u8) -> Self {
        Self {
            lpb: note.position.lpb,
            num: note.position.num,
            block: note.position.block,
            kind,
            notes: Vec::new(),
        }
    }

    fn position(&self) -> NotePosition {
        NotePosition::new(self.lpb, self.num, self.block)
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MalformedChart {
    #[error("unknown note type {0}")]
    UnknownNoteType(u8),
    #[error("normal note at {0:?} carries a nested chain")]
    NormalWithChain(NotePosition),
    #[error("chain member at {0:?} is not a long note")]
    BadChainMember(NotePosition),
    #[error("chain member at {0:?} nests a further chain")]
    NestedChain(NotePosition),
    #[error("duplicate note at {0:?}")]
    DuplicatePosition(NotePosition),
    #[error("chain link into {0:?} could not be rebuilt")]
    BrokenChain(NotePosition),
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error(transparent)]
    Timing(#[from] TimingError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Flattens the graph into the persisted document: one entry per chain
/// head, ordered by the head's sample time (ties by lane, then lpb),
/// with each long chain nested under its head.
pub fn encode(
    graph: &ChartGraph,
    tempo: &Tempo,
    name: &str,
    max_block: u32,
) -> Result<PersistedChart, EncodeError> {
    let mut heads = graph
        .heads()
        .map(|note| Ok((note.position.to_samples(tempo)?, note)))
        .collect::<Result<Vec<_>, TimingError>>()?;

    heads.sort_by_key(|(samples, note)| (*samples, note.position.block, note.position.lpb));

    let mut notes = Vec::with_capacity(heads.len());

    for (_, head) in heads {
        match head.kind {
            NoteKind::Normal => notes.push(PersistedNote::leaf(head, NOTE_TYPE_NORMAL)),
            NoteKind::Long => {
                let chain = graph.chain(head.position)?;
                let mut entry = PersistedNote::leaf(head, NOTE_TYPE_LONG);
                entry.notes = chain[1..]
                    .iter()
                    .map(|member| PersistedNote::leaf(member, NOTE_TYPE_LONG))
                    .collect();
                notes.push(entry);
            }
        }
    }

    Ok(PersistedChart {
        name: name.to_owned(),
        max_block,
        bpm: tempo.bpm.round() as u32,
        offset: tempo.offset_samples,
        notes,
    })
}

/// Rebuilds the graph from a document. Chains are re-established by
/// inserting the head and linking each nested member to its
/// predecessor; any structural violation aborts the decode so a
/// malformed file never produces a partial chart.
pub fn decode(chart: &PersistedChart) -> Result<ChartGraph, MalformedChart> {
    let mut graph = ChartGraph::new();

    for entry in &chart.notes {
        match entry.kind {
            NOTE_TYPE_NORMAL => {
                if !entry.notes.is_empty() {
                    return Err(MalformedChart::NormalWithChain(entry.position()));
                }

                insert(&mut graph, Note::normal(entry.position()))?;
            }
            NOTE_TYPE_LONG => {
                insert(&mut graph, Note::long(entry.position(), None, None))?;

                let mut prev = entry.position();
                for member in &entry.notes {
                    if member.kind != NOTE_TYPE_LONG {
                        return Err(MalformedChart::BadChainMember(member.position()));
                    }
                    if !member.notes.is_empty() {
                        return Err(MalformedChart::NestedChain(member.position()));
                    }

                    insert(&mut graph, Note::long(member.position(), None, None))?;
                    graph
                        .link(prev, member.position())
                        .map_err(|_| MalformedChart::BrokenChain(member.position()))?;
                    prev = member.position();
                }
            }
            other => return Err(MalformedChart::UnknownNoteType(other)),
        }
    }

    Ok(graph)
}

fn insert(graph: &mut ChartGraph, note: Note) -> Result<(), MalformedChart> {
    graph
        .insert(note)
        .map_err(|_| MalformedChart::DuplicatePosition(note.position))
}
