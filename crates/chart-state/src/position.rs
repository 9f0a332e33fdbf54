use crate::timing::{Tempo, TimingError};

/// Musical coordinates of a note: `num` counts subdivisions of `lpb`
/// lines per beat, `block` is the lane. Each note remembers the lpb it
/// was placed at, so two notes on the same instant can disagree on lpb.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotePosition {
    pub lpb: u32,
    pub num: u32,
    pub block: u32,
}

impl NotePosition {
    pub fn new(lpb: u32, num: u32, block: u32) -> Self {
        Self { lpb, num, block }
    }

    pub fn to_samples(self, tempo: &Tempo) -> Result<i64, TimingError> {
        tempo.samples_at(self.num, self.lpb)
    }

    pub fn nearest(
        samples: i64,
        tempo: &Tempo,
        lpb: u32,
        block: u32,
    ) -> Result<Self, TimingError> {
        Ok(Self {
            lpb,
            num: tempo.nearest_num(samples, lpb)?,
            block,
        })
    }

    /// Whole beats from the start of the track to this position.
    pub fn beat(self) -> u32 {
        self.num / self.lpb
    }

    pub fn shifted(self, delta_num: u32) -> Self {
        Self {
            num: self.num + delta_num,
            ..self
        }
    }
}
