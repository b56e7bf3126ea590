//! Does some analytics on extracted pitch data. The corpus-wide mean and
//! standard deviation are what you feed into pitch normalisation when
//! training, and the per-utterance numbers are the quickest way to spot a
//! pitch tracker that's fallen over on part of the corpus (all-zero
//! contours, absurd ranges, utterances that are nearly all unvoiced).
use crate::pitch::average_pitch_contour;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceStats {
    pub id: String,
    pub frames: usize,
    pub voiced_frames: usize,
    pub voiced_ratio: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    pub pitch_mean: f32,
    pub tokens: usize,
    /// Tokens whose frame span holds no voiced frame at all
    pub unvoiced_tokens: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchReport {
    pub utterances: Vec<UtteranceStats>,
    pub pitch_mean: f32,
    pub pitch_std: f32,
    pub voiced_ratio: f32,
}

#[derive(Debug, Default)]
pub struct StatsGenerator {
    utterances: Vec<UtteranceStats>,
    sum: f64,
    sum_sq: f64,
    voiced_frames: usize,
    total_frames: usize,
}

impl StatsGenerator {
    /// Feed in one utterance's pitch contour and token durations. Unvoiced
    /// frames (pitch 0.0) are left out of every statistic except the voiced
    /// ratio itself.
    pub fn push_utterance(
        &mut self,
        id: &str,
        pitch: ArrayView1<f32>,
        durations: ArrayView1<i64>,
    ) -> anyhow::Result<()> {
        let targets = average_pitch_contour(
            pitch.insert_axis(Axis(0)),
            durations.insert_axis(Axis(0)),
        )?;
        let unvoiced_tokens = targets.row(0).iter().filter(|x| **x == 0.0).count();

        let mut voiced = 0;
        let mut sum = 0.0_f64;
        let mut pitch_min = f32::INFINITY;
        let mut pitch_max = f32::NEG_INFINITY;
        for &sample in pitch.iter() {
            if sample != 0.0 {
                voiced += 1;
                sum += f64::from(sample);
                self.sum_sq += f64::from(sample) * f64::from(sample);
                pitch_min = pitch_min.min(sample);
                pitch_max = pitch_max.max(sample);
            }
        }
        self.sum += sum;
        self.voiced_frames += voiced;
        self.total_frames += pitch.len();

        let pitch_mean = if voiced > 0 {
            (sum / voiced as f64) as f32
        } else {
            warn!("{} has no voiced frames", id);
            pitch_min = 0.0;
            pitch_max = 0.0;
            0.0
        };

        self.utterances.push(UtteranceStats {
            id: id.to_string(),
            frames: pitch.len(),
            voiced_frames: voiced,
            voiced_ratio: if pitch.is_empty() {
                0.0
            } else {
                voiced as f32 / pitch.len() as f32
            },
            pitch_min,
            pitch_max,
            pitch_mean,
            tokens: durations.len(),
            unvoiced_tokens,
        });
        Ok(())
    }

    pub fn generate_report(&self) -> PitchReport {
        let mut utterances = self.utterances.clone();
        utterances.sort_by(|a, b| a.id.cmp(&b.id));

        let (pitch_mean, pitch_std) = if self.voiced_frames > 0 {
            let mean = self.sum / self.voiced_frames as f64;
            let var = (self.sum_sq / self.voiced_frames as f64 - mean * mean).max(0.0);
            (mean as f32, var.sqrt() as f32)
        } else {
            (0.0, 0.0)
        };

        PitchReport {
            utterances,
            pitch_mean,
            pitch_std,
            voiced_ratio: if self.total_frames > 0 {
                self.voiced_frames as f32 / self.total_frames as f32
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_statistics() {
        let mut generator = StatsGenerator::default();
        let pitch = arr1(&[0.0, 100.0, 200.0, 0.0]);
        let durations = arr1(&[2_i64, 2]);

        generator.push_utterance("LJ001-0001", pitch.view(), durations.view())
            .unwrap();
        let report = generator.generate_report();

        assert_eq!(report.utterances.len(), 1);
        let utt = &report.utterances[0];
        assert_eq!(utt.frames, 4);
        assert_eq!(utt.voiced_frames, 2);
        assert_eq!(utt.pitch_min, 100.0);
        assert_eq!(utt.pitch_max, 200.0);
        assert_eq!(utt.unvoiced_tokens, 0);
        assert!((report.pitch_mean - 150.0).abs() < 1e-4);
        assert!((report.pitch_std - 50.0).abs() < 1e-3);
        assert!((report.voiced_ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fully_unvoiced_utterance() {
        let mut generator = StatsGenerator::default();
        let pitch = arr1(&[0.0, 0.0, 0.0]);
        let durations = arr1(&[1_i64, 2]);

        generator.push_utterance("silence", pitch.view(), durations.view())
            .unwrap();
        let report = generator.generate_report();

        let utt = &report.utterances[0];
        assert_eq!(utt.voiced_frames, 0);
        assert_eq!(utt.pitch_min, 0.0);
        assert_eq!(utt.pitch_max, 0.0);
        assert_eq!(utt.pitch_mean, 0.0);
        assert_eq!(utt.unvoiced_tokens, 2);
        assert_eq!(report.pitch_mean, 0.0);
        assert_eq!(report.pitch_std, 0.0);
    }

    #[test]
    fn report_sorted_by_id() {
        let mut generator = StatsGenerator::default();
        let pitch = arr1(&[120.0]);
        let durations = arr1(&[1_i64]);
        generator.push_utterance("b", pitch.view(), durations.view())
            .unwrap();
        generator.push_utterance("a", pitch.view(), durations.view())
            .unwrap();

        let report = generator.generate_report();
        let ids = report
            .utterances
            .iter()
            .map(|x| x.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["a", "b"]);
    }
}
