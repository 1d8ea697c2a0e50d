//! Recursive echo filter
//!
//! Implements a feedback (IIR) difference equation with fixed delay taps,
//! applied per channel over interleaved stereo chunks:
//!
//! ```text
//! y[n] = clip( sum(k=0..M) b[k]*x[n - k*D]  -  sum(k=1..N) a[k-1]*y[n - k*D] )
//! ```
//!
//! Taps that reach before frame 0 of the current chunk wrap into the tail of
//! the previous-input chunk (feed-forward) or the feedback-output chunk
//! written one cycle earlier (feedback). The recursion is strictly sequential
//! within a chunk: frame `n` is written to the load chunk before frame `n+1`
//! is computed.

use crate::audio::types::{clip, Sample, CHANNELS};

/// Delay unit between taps, in stereo frames.
pub const DELAY_FRAMES: usize = 132;

/// Feed-forward multipliers, `b[0]` being the zero-delay tap.
pub const FEEDFORWARD: [f32; 4] = [0.6, 0.3, 0.1, 0.05];

/// Feedback multipliers for taps 1..=N.
pub const FEEDBACK: [f32; 3] = [0.6, 0.3, 0.1];

/// Echo filter with fixed coefficients and delay geometry.
///
/// Coefficient arrays are read-only after construction and safe to share
/// across cycles without synchronization.
pub struct EchoFilter {
    b: Vec<f32>,
    a: Vec<f32>,
    delay_frames: usize,
}

impl EchoFilter {
    /// Create a filter from explicit coefficients and a tap delay in frames.
    ///
    /// `b` holds the feed-forward multipliers including the zero-delay tap;
    /// `a` holds the feedback multipliers for taps `1..=a.len()`.
    pub fn new(b: Vec<f32>, a: Vec<f32>, delay_frames: usize) -> Self {
        Self { b, a, delay_frames }
    }

    /// Deepest lookback of any tap, in frames.
    ///
    /// Chunks must hold at least this many frames so that one chunk of
    /// history is always enough for the wrapped reads.
    pub fn history_frames(&self) -> usize {
        self.a.len().max(self.b.len().saturating_sub(1)) * self.delay_frames
    }

    /// Compute one stereo output frame.
    ///
    /// `n` is the frame index within the current chunk. Already-computed
    /// frames of the same chunk are read back from `load_out`; taps landing
    /// before frame 0 read the wrapped tail of `prev_in` / `feedback_out`.
    pub fn compute_frame(
        &self,
        n: usize,
        curr_in: &[Sample],
        prev_in: &[Sample],
        load_out: &[Sample],
        feedback_out: &[Sample],
    ) -> (Sample, Sample) {
        let len = curr_in.len();

        let mut input_sum = [0.0f32; CHANNELS];
        for (k, &b) in self.b.iter().enumerate() {
            let delay = k * self.delay_frames;
            let (source, base) = if n >= delay {
                (curr_in, CHANNELS * (n - delay))
            } else {
                (prev_in, len - CHANNELS * (delay - n))
            };
            for (ch, sum) in input_sum.iter_mut().enumerate() {
                *sum += b * source[base + ch] as f32;
            }
        }

        let mut output_sum = [0.0f32; CHANNELS];
        for (k, &a) in self.a.iter().enumerate() {
            let delay = (k + 1) * self.delay_frames;
            let (source, base) = if n >= delay {
                (load_out, CHANNELS * (n - delay))
            } else {
                (feedback_out, len - CHANNELS * (delay - n))
            };
            for (ch, sum) in output_sum.iter_mut().enumerate() {
                *sum += a * source[base + ch] as f32;
            }
        }

        (
            clip(input_sum[0] - output_sum[0]),
            clip(input_sum[1] - output_sum[1]),
        )
    }

    /// Run the filter over every frame of a chunk, writing into `load_out`.
    pub fn process_chunk(
        &self,
        curr_in: &[Sample],
        prev_in: &[Sample],
        load_out: &mut [Sample],
        feedback_out: &[Sample],
    ) {
        debug_assert_eq!(curr_in.len(), prev_in.len());
        debug_assert_eq!(curr_in.len(), load_out.len());
        debug_assert_eq!(curr_in.len(), feedback_out.len());
        debug_assert_eq!(curr_in.len() % CHANNELS, 0);
        debug_assert!(curr_in.len() / CHANNELS >= self.history_frames());

        let frames = curr_in.len() / CHANNELS;
        for n in 0..frames {
            let (left, right) = self.compute_frame(n, curr_in, prev_in, load_out, feedback_out);
            load_out[CHANNELS * n] = left;
            load_out[CHANNELS * n + 1] = right;
        }
    }
}

impl Default for EchoFilter {
    fn default() -> Self {
        Self::new(FEEDFORWARD.to_vec(), FEEDBACK.to_vec(), DELAY_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 512 frames is enough for the reference filter's 396-frame history.
    const TEST_SAMPLES: usize = 1024;

    #[test]
    fn silence_is_a_fixed_point() {
        let filter = EchoFilter::default();
        let curr_in = vec![0 as Sample; TEST_SAMPLES];
        let prev_in = vec![0 as Sample; TEST_SAMPLES];
        let feedback = vec![0 as Sample; TEST_SAMPLES];
        let mut load_out = vec![0 as Sample; TEST_SAMPLES];

        filter.process_chunk(&curr_in, &prev_in, &mut load_out, &feedback);

        assert!(load_out.iter().all(|&s| s == 0));
    }

    #[test]
    fn impulse_response_matches_difference_equation() {
        let filter = EchoFilter::default();
        let mut curr_in = vec![0 as Sample; TEST_SAMPLES];
        curr_in[0] = 10000;
        let prev_in = vec![0 as Sample; TEST_SAMPLES];
        let feedback = vec![0 as Sample; TEST_SAMPLES];
        let mut load_out = vec![0 as Sample; TEST_SAMPLES];

        filter.process_chunk(&curr_in, &prev_in, &mut load_out, &feedback);

        // y[0]   = b0*10000                                     = 6000
        // y[132] = b1*10000 - a0*y[0]                            = -600
        // y[264] = b2*10000 - (a0*y[132] + a1*y[0])              = -440
        // y[396] = b3*10000 - (a0*y[264] + a1*y[132] + a2*y[0])  = 344
        assert_eq!(load_out[0], 6000);
        assert_eq!(load_out[CHANNELS * DELAY_FRAMES], -600);
        assert_eq!(load_out[CHANNELS * 2 * DELAY_FRAMES], -440);
        assert_eq!(load_out[CHANNELS * 3 * DELAY_FRAMES], 344);

        // Impulse was left-channel only; the right channel stays silent.
        assert_eq!(load_out[1], 0);
        assert_eq!(load_out[CHANNELS * DELAY_FRAMES + 1], 0);
        assert_eq!(load_out[CHANNELS * 3 * DELAY_FRAMES + 1], 0);
    }

    #[test]
    fn taps_before_frame_zero_wrap_into_history_chunks() {
        // Small geometry: one feed-forward echo tap and one feedback tap,
        // both delayed by 4 frames, over an 8-frame chunk.
        let filter = EchoFilter::new(vec![1.0, 0.5], vec![0.5], 4);
        let frames = 8;
        let len = frames * CHANNELS;

        let mut curr_in = vec![0 as Sample; len];
        curr_in[0] = 100; // left channel, frame 0
        let mut prev_in = vec![0 as Sample; len];
        prev_in[CHANNELS * 4] = 40; // frame 4 of the previous input chunk
        let mut feedback = vec![0 as Sample; len];
        feedback[CHANNELS * 4] = 20; // frame 4 of the feedback chunk
        let mut load_out = vec![0 as Sample; len];

        filter.process_chunk(&curr_in, &prev_in, &mut load_out, &feedback);

        // n=0 wraps both taps to frame 4 of the history chunks:
        // y[0] = 1.0*100 + 0.5*40 - 0.5*20 = 110
        assert_eq!(load_out[0], 110);
        // n=4 reads the current chunk and the freshly written y[0]:
        // y[4] = 1.0*0 + 0.5*100 - 0.5*110 = -5
        assert_eq!(load_out[CHANNELS * 4], -5);
        // Untouched right channel stays silent throughout.
        assert!(load_out.iter().skip(1).step_by(2).all(|&s| s == 0));
    }

    #[test]
    fn history_frames_covers_deepest_tap() {
        assert_eq!(EchoFilter::default().history_frames(), 3 * DELAY_FRAMES);

        // Feed-forward reaching deeper than feedback.
        let filter = EchoFilter::new(vec![1.0, 0.5, 0.25, 0.1, 0.05], vec![0.5], 10);
        assert_eq!(filter.history_frames(), 40);
    }
}
