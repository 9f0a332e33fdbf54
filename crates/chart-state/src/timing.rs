use thiserror::Error;

/// Global playback parameters shared by every conversion. Notes never
/// own a tempo; it is read fresh on each call so BPM and offset edits
/// apply to the whole chart at once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tempo {
    pub bpm: f64,
    pub offset_samples: i64,
    pub sample_rate: u32,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TimingError {
    #[error("tempo requires a positive bpm, sample rate and lpb")]
    InvalidTempo,
}

impl Tempo {
    pub fn new(bpm: f64, offset_samples: i64, sample_rate: u32) -> Self {
        Self {
            bpm,
            offset_samples,
            sample_rate,
        }
    }

    fn samples_per_line(&self, lpb: u32) -> Result<f64, TimingError> {
        if self.bpm <= 0.0 || self.sample_rate == 0 || lpb == 0 {
            return Err(TimingError::InvalidTempo);
        }

        Ok(self.sample_rate as f64 * 60.0 / (self.bpm * lpb as f64))
    }

    /// Absolute sample offset of subdivision `num` at `lpb` lines per beat.
    pub fn samples_at(&self, num: u32, lpb: u32) -> Result<i64, TimingError> {
        let samples_per_line = self.samples_per_line(lpb)?;

        Ok(self.offset_samples + round_half_up(num as f64 * samples_per_line))
    }

    /// Inverse of [`samples_at`](Self::samples_at): the closest subdivision
    /// index to `samples`, ties resolving to the later line.
    pub fn nearest_num(&self, samples: i64, lpb: u32) -> Result<u32, TimingError> {
        let samples_per_line = self.samples_per_line(lpb)?;
        let lines = (samples - self.offset_samples) as f64 / samples_per_line;

        Ok(round_half_up(lines).max(0) as u32)
    }
}

// f64::round goes away from zero on ties; we always want the later line.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::NotePosition;

    #[test]
    fn beat_four_at_120_bpm_is_half_a_second() {
        let tempo = Tempo::new(120.0, 0, 44100);
        let position = NotePosition::new(4, 4, 1);

        // 4 * 44100 * 60 / (120 * 4)
        assert_eq!(position.to_samples(&tempo), Ok(22050));
    }

    #[test]
    fn offset_shifts_every_position() {
        let tempo = Tempo::new(120.0, 1000, 44100);

        assert_eq!(tempo.samples_at(0, 4), Ok(1000));
        assert_eq!(tempo.samples_at(4, 4), Ok(23050));
    }

    #[test]
    fn invalid_tempo_is_rejected() {
        assert_eq!(
            Tempo::new(0.0, 0, 44100).samples_at(1, 4),
            Err(TimingError::InvalidTempo)
        );
        assert_eq!(
            Tempo::new(-10.0, 0, 44100).samples_at(1, 4),
            Err(TimingError::InvalidTempo)
        );
        assert_eq!(
            Tempo::new(120.0, 0, 0).samples_at(1, 4),
            Err(TimingError::InvalidTempo)
        );
        assert_eq!(
            Tempo::new(120.0, 0, 44100).samples_at(1, 0),
            Err(TimingError::InvalidTempo)
        );
    }

    #[test]
    fn nearest_num_rounds_ties_up() {
        // 1400 samples per line, so 700 sits exactly between lines 0 and 1
        let tempo = Tempo::new(140.0, 0, 19600);

        assert_eq!(tempo.samples_at(1, 6), Ok(1400));
        assert_eq!(tempo.nearest_num(699, 6), Ok(0));
        assert_eq!(tempo.nearest_num(700, 6), Ok(1));
        assert_eq!(tempo.nearest_num(701, 6), Ok(1));
    }

    #[test]
    fn nearest_num_clamps_before_the_offset() {
        let tempo = Tempo::new(120.0, 40000, 44100);
        assert_eq!(tempo.nearest_num(0, 4), Ok(0));
    }

    #[test]
    fn positions_round_trip_through_samples() {
        let tempos = [
            Tempo::new(120.0, 0, 44100),
            Tempo::new(138.5, 2048, 44100),
            Tempo::new(60.0, -500, 48000),
            Tempo::new(240.0, 100, 22050),
        ];

        for tempo in tempos {
            for lpb in 1..=16 {
                for num in 0..=64 {
                    let position = NotePosition::new(lpb, num, 0);
                    let samples = position.to_samples(&tempo).unwrap();
                    let recovered = NotePosition::nearest(samples, &tempo, lpb, 0).unwrap();

                    assert_eq!(recovered, position, "tempo {tempo:?} lpb {lpb} num {num}");
                }
            }
        }
    }
}
