//! This structure represents a single RPC-III channel: its demultiplexed
//! sample sequence plus whatever derived rainflow state has been computed
//! for it so far.
use crate::errors::*;
use crate::primitives::find_min_max;
use crate::rainflow::{count_range_cycles, rainflow_counting, RainflowOutput};

/// Cached rainflow-derived state for a [`Channel`].
///
/// Recomputed by every [`Channel::rainflow`] call (replacing whatever was
/// cached before) and kept around so that `damage`/`get_rainflow` can be
/// consulted afterwards without re-running reversal detection.
#[derive(Debug, Clone, PartialEq)]
pub struct RainflowState {
    pub reversals: Vec<f64>,
    pub reversal_indices: Vec<usize>,
    pub cycles: Vec<f64>,
    pub residue: Vec<f64>,
    pub range_counts: Vec<f64>,
}

/// A single demultiplexed channel of an RPC-III file (or a channel about to
/// be written into one).
#[derive(Debug, Clone)]
#[repr(C)]
pub struct Channel {
    pub(crate) number: u32,
    pub(crate) name: String,
    pub(crate) units: String,
    pub(crate) scale: f64,
    pub(crate) delta_t: f64,
    pub(crate) source_file_name: Option<String>,
    pub(crate) source_file_hash: Option<String>,
    pub(crate) samples: Vec<f64>,
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) rainflow: Option<RainflowState>,
    pub(crate) applied_repetitions: f64,
}

impl Channel {
    /// Construct a channel from its demultiplexed samples.
    pub fn new(
        number: u32,
        name: String,
        units: String,
        scale: f64,
        delta_t: f64,
        source_file_name: Option<String>,
        samples: Vec<f64>,
    ) -> Self {
        let (min, max) = find_min_max(&samples);
        Channel {
            number,
            name,
            units,
            scale,
            delta_t,
            source_file_name,
            source_file_hash: None,
            samples,
            min,
            max,
            rainflow: None,
            applied_repetitions: 0.0,
        }
    }

    /// The 1-based channel number (`CHAN_<n>`).
    pub fn get_number(&self) -> u32 {
        self.number
    }

    /// `DESC.CHAN_<n>`.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// `UNITS.CHAN_<n>`.
    pub fn get_units(&self) -> &str {
        &self.units
    }

    /// `SCALE.CHAN_<n>`.
    pub fn get_scale(&self) -> f64 {
        self.scale
    }

    pub fn get_delta_t(&self) -> f64 {
        self.delta_t
    }

    /// The file this channel was decoded from, if it came from one.
    pub fn get_source_file_name(&self) -> Option<&str> {
        self.source_file_name.as_deref()
    }

    /// The hex-encoded hash of the source file (set by the caller after
    /// decoding, via [`Channel::set_source_file_hash`]), if known.
    pub fn get_source_file_hash(&self) -> Option<&str> {
        self.source_file_hash.as_deref()
    }

    /// Attach the source file's hash after construction, for callers that
    /// compute it once per file (e.g. `RpcFile::get_file_hash`) rather than
    /// per channel.
    pub fn set_source_file_hash(&mut self, hash: String) {
        self.source_file_hash = Some(hash);
    }

    /// The demultiplexed, physical-unit sample sequence.
    pub fn get_samples(&self) -> &[f64] {
        &self.samples
    }

    /// Minimum sample value.
    pub fn get_min(&self) -> f64 {
        self.min
    }

    /// Maximum sample value.
    pub fn get_max(&self) -> f64 {
        self.max
    }

    /// Recompute the cached min/max from the current sample sequence.
    ///
    /// Exposed separately from [`Channel::scale_value`] so a caller that
    /// mutates `samples` through some other path (rare; most callers go
    /// through `scale_value`) can still refresh the cache explicitly.
    pub fn set_min_max(&mut self) {
        let (min, max) = find_min_max(&self.samples);
        self.min = min;
        self.max = max;
    }

    /// Multiply every sample and the stored scale factor by `s`, in place.
    ///
    /// Used to renormalize a channel's physical units (e.g. `g` to `m/s^2`)
    /// without touching the raw on-disk representation `SCALE.CHAN_<n>`
    /// would otherwise imply.
    /// ```
    /// use rpc3_core::Channel;
    /// let mut c = Channel::new(1, "CH1".to_string(), "g".to_string(), 10.0, 0.001, None, vec![1.0, -2.0]);
    /// c.scale_value(2.0);
    /// assert_eq!(c.get_samples(), &[2.0, -4.0]);
    /// assert_eq!(c.get_scale(), 20.0);
    /// ```
    pub fn scale_value(&mut self, s: f64) {
        for v in &mut self.samples {
            *v *= s;
        }
        self.scale *= s;
        self.set_min_max();
    }

    /// The applied repetition count from the most recent [`Channel::rainflow`]
    /// call; `0.0` until rainflow has run (or after [`Channel::clear_rainflow`]).
    pub fn get_applied_repetitions(&self) -> f64 {
        self.applied_repetitions
    }

    /// Drop any cached rainflow state (forces the next [`Channel::rainflow`]
    /// call to recompute it from the current samples) and reset the applied
    /// repetition count to zero.
    pub fn clear_rainflow(&mut self) {
        self.rainflow = None;
        self.applied_repetitions = 0.0;
    }

    /// Run rainflow counting for this channel's samples, weighting the
    /// resulting range-count table by `repeats`, and cache the result.
    ///
    /// Every call recomputes and replaces whatever was cached before --
    /// calling `rainflow` a second time (with the same or different
    /// parameters) discards the previous cache rather than reusing it, so
    /// `damage`/`get_rainflow` always reflect the most recent call.
    pub fn rainflow(&mut self, repeats: f64, close_residuals: bool, bins: usize) -> &RainflowState {
        let RainflowOutput {
            reversals,
            reversal_indices,
            cycles,
            residue,
        } = rainflow_counting(&self.samples, bins, close_residuals);
        let range_counts = count_range_cycles(&cycles, repeats);
        self.rainflow = Some(RainflowState {
            reversals,
            reversal_indices,
            cycles,
            residue,
            range_counts,
        });
        self.applied_repetitions = repeats;
        self.rainflow.as_ref().unwrap()
    }

    /// Directly install an externally computed cycle sequence (flat
    /// `[start, end, start, end, ...]`) as this channel's rainflow cycles,
    /// bypassing reversal detection. Used when cycles have already been
    /// derived elsewhere (e.g. by the cross-event aggregator) and only need
    /// range counting.
    pub fn set_rainflow_cycles(&mut self, cycles: Vec<f64>, repeats: f64) {
        let range_counts = count_range_cycles(&cycles, repeats);
        self.rainflow = Some(RainflowState {
            reversals: Vec::new(),
            reversal_indices: Vec::new(),
            cycles,
            residue: Vec::new(),
            range_counts,
        });
        self.applied_repetitions = repeats;
    }

    /// Relative fatigue damage under a power-law (Basquin) relation, using
    /// the cached rainflow range-count table.
    ///
    /// Returns an error if [`Channel::rainflow`] has not been run yet.
    pub fn damage(&self, slope: f64) -> Result<f64, RpcError> {
        let state = self.rainflow.as_ref().ok_or_else(|| RpcError::InvalidEquivalentSignalParams {
            msg: format!("channel {} has no rainflow state yet", self.name),
        })?;
        Ok(crate::primitives::calc_damage(slope, &state.range_counts))
    }

    /// The cached rainflow state, if [`Channel::rainflow`] has run.
    pub fn get_rainflow(&self) -> Option<&RainflowState> {
        self.rainflow.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_channel() -> Channel {
        Channel::new(
            1,
            "CH1".to_string(),
            "g".to_string(),
            10.0,
            0.001,
            None,
            vec![0.0, 5.0, -3.0, 4.0, -2.0, 6.0, 0.0],
        )
    }

    #[test]
    fn new_computes_min_max() {
        let c = sample_channel();
        assert_eq!(c.get_min(), -3.0);
        assert_eq!(c.get_max(), 6.0);
    }

    #[test]
    fn source_file_hash_is_unset_until_attached() {
        let mut c = sample_channel();
        assert_eq!(c.get_source_file_hash(), None);
        c.set_source_file_hash("abc123".to_string());
        assert_eq!(c.get_source_file_hash(), Some("abc123"));
    }

    #[test]
    fn rainflow_called_twice_with_same_params_is_stable() {
        let mut c = sample_channel();
        let first = c.rainflow(1.0, false, 8).clone();
        let second = c.rainflow(1.0, false, 8);
        assert_eq!(&first, second);
    }

    #[test]
    fn rainflow_called_again_discards_the_previous_cache() {
        let mut c = sample_channel();
        c.rainflow(1.0, false, 8);
        assert_eq!(c.get_applied_repetitions(), 1.0);
        c.rainflow(5.0, false, 8);
        assert_eq!(c.get_applied_repetitions(), 5.0);
        // range-count totals scale with the new repeat count, not the old one.
        let state = c.get_rainflow().unwrap();
        let total: f64 = state.range_counts.chunks_exact(2).map(|rc| rc[1]).sum();
        assert!(total > 0.0);
    }

    #[test]
    fn damage_requires_rainflow_first() {
        let c = sample_channel();
        assert!(c.damage(5.0).is_err());
    }

    #[test]
    fn scale_value_multiplies_samples_and_scale_and_refreshes_min_max() {
        let mut c = sample_channel();
        let before = c.get_samples().to_vec();
        c.scale_value(2.0);
        let after = c.get_samples().to_vec();
        for (b, a) in before.iter().zip(after.iter()) {
            assert!((a - b * 2.0).abs() < 1e-9);
        }
        assert_eq!(c.get_scale(), 20.0);
        assert_eq!(c.get_max(), 12.0);
        assert_eq!(c.get_min(), -6.0);
    }

    #[test]
    fn clear_rainflow_resets_applied_repetitions() {
        let mut c = sample_channel();
        c.rainflow(3.0, false, 8);
        assert_eq!(c.get_applied_repetitions(), 3.0);
        c.clear_rainflow();
        assert_eq!(c.get_applied_repetitions(), 0.0);
        assert!(c.get_rainflow().is_none());
    }
}
