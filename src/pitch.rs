//! Duration-based acoustic models predict one pitch value per input token,
//! but a pitch tracker hands back one value per audio frame. At training
//! time the per-frame contour has to be collapsed into per-token targets:
//! each token owns a contiguous run of frames given by its duration, and the
//! target is the mean pitch over the voiced frames in that run.
//!
//! Trackers emit 0.0 for frames where no pitch was detected (unvoiced
//! consonants, silence). Folding those zeros into the mean would drag every
//! target near a voiced/unvoiced boundary towards zero, so unvoiced frames
//! are excluded from both the sum and the divisor. A token whose span holds
//! no voiced frame at all gets a target of exactly 0.0, which downstream
//! treats as "no pitch" rather than zero hertz. It's important this is 0.0
//! and not NaN, a single NaN here would poison the whole loss.
//!
//! Everything is built from prefix sums padded with one leading zero. The
//! sum over any frame span [start, end) is then two reads and a
//! subtraction, and the first token needs no special casing.
use anyhow::bail;
use ndarray::prelude::*;

/// Averages the voiced pitch samples over each token's frame span.
///
/// `pitch` is (batch, formants, frames) with 0.0 marking unvoiced frames,
/// `durations` is (batch, tokens) with the number of frames aligned to each
/// token. Returns a (batch, formants, tokens) array of per-token targets.
///
/// Durations are expected to sum to at most the frame count for each batch
/// row. Frames beyond the covered span are never read, and duration rows
/// that overrun the contour are clamped so trailing tokens degrade to empty
/// spans rather than reading out of bounds.
pub fn average_pitch(
    pitch: ArrayView3<f32>,
    durations: ArrayView2<i64>,
) -> anyhow::Result<Array3<f32>> {
    let (batch, n_formants, n_frames) = pitch.dim();
    let (dur_batch, n_tokens) = durations.dim();
    if batch != dur_batch {
        bail!(
            "pitch covers {} utterances but durations covers {}",
            batch,
            dur_batch
        );
    }
    if let Some(bad) = durations.iter().find(|d| **d < 0) {
        bail!("negative token duration: {}", bad);
    }

    // Inclusive prefix sum of the durations gives each token's end frame,
    // and the previous token's end is the next token's start. Ends are
    // clamped to the frame count so overruns read only frames that exist.
    let mut span_ends = Array2::<usize>::zeros((batch, n_tokens));
    for (b, durs) in durations.outer_iter().enumerate() {
        let mut total = 0;
        for (l, d) in durs.iter().enumerate() {
            total = (total + *d as usize).min(n_frames);
            span_ends[[b, l]] = total;
        }
    }

    // Running sums over the contour, one for pitch values and one for the
    // voiced-frame count, each with a leading zero slot so position t holds
    // the sum over frames [0, t).
    let mut cum_pitch = Array3::<f64>::zeros((batch, n_formants, n_frames + 1));
    let mut cum_voiced = Array3::<usize>::zeros((batch, n_formants, n_frames + 1));
    for b in 0..batch {
        for f in 0..n_formants {
            let mut sum = 0.0;
            let mut voiced = 0;
            for t in 0..n_frames {
                let sample = pitch[[b, f, t]];
                sum += f64::from(sample);
                if sample != 0.0 {
                    voiced += 1;
                }
                cum_pitch[[b, f, t + 1]] = sum;
                cum_voiced[[b, f, t + 1]] = voiced;
            }
        }
    }

    let mut targets = Array3::<f32>::zeros((batch, n_formants, n_tokens));
    for b in 0..batch {
        for l in 0..n_tokens {
            let start = if l == 0 { 0 } else { span_ends[[b, l - 1]] };
            let end = span_ends[[b, l]];
            for f in 0..n_formants {
                let voiced = cum_voiced[[b, f, end]] - cum_voiced[[b, f, start]];
                if voiced > 0 {
                    let sum = cum_pitch[[b, f, end]] - cum_pitch[[b, f, start]];
                    targets[[b, f, l]] = (sum / voiced as f64) as f32;
                }
            }
        }
    }

    Ok(targets)
}

/// Same as [`average_pitch`] for the common single-track case: a
/// (batch, frames) contour in, a (batch, tokens) target array out. The
/// formant axis is wrapped on and peeled off again around the call.
pub fn average_pitch_contour(
    pitch: ArrayView2<f32>,
    durations: ArrayView2<i64>,
) -> anyhow::Result<Array2<f32>> {
    let targets = average_pitch(pitch.insert_axis(Axis(1)), durations)?;
    Ok(targets.remove_axis(Axis(1)))
}
