//! Cumulative-damage curves and level-crossing counts derived from an
//! already-computed range-count table or a set of rainflow cycle sequences.
use crate::equivalent_signal::build_rainflow_table;
use crate::primitives::linspace;

/// Step data for plotting cumulative cycle count and cumulative damage
/// against range, gated to ignore ranges below a given fraction of the
/// largest range present.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeRainflowData {
    /// Step-function range axis, length `n + 1`: the first entry duplicates
    /// the second so the curve starts flat at the sentinel.
    pub range: Vec<f64>,
    /// Cumulative cycle count, length `n + 1`, `ncum[0]` pinned to `1.0`.
    pub ncum: Vec<f64>,
    /// Cumulative damage percentage, length `n + 1`, `dcum[0]` pinned to `0.0`.
    pub dcum: Vec<f64>,
    /// The total Miner-sum damage across every (post-gate) row, in absolute
    /// (not percentage) terms.
    pub total_damage: f64,
}

/// Build the cumulative rainflow curve from a flat `[range, count, range,
/// count, ...]` table (as produced by [`crate::rainflow::count_range_cycles`]
/// or [`crate::aggregate::combine_channels_range_counts`]).
///
/// Duplicate range values are merged before gating. `gate_percent` drops any
/// range at or below `gate_percent / 100 * max_range` -- small-amplitude
/// cycles are usually gated out of a fatigue test spec because a rig cannot
/// reproduce them accurately.
///
/// The first entry of `ncum` is pinned to `1.0` and the first entry of
/// `dcum` is pinned to `0.0` regardless of the actual cumulative values at
/// that point, matching the convention the step curve is always drawn with
/// (a plot that starts at zero cycles looks wrong on a log axis, so the
/// first point is nailed down rather than computed); `range`'s leading entry
/// is duplicated so the three arrays stay aligned as a step function.
pub fn cumulative_rainflow_data(range_counts: &[f64], slope: f64, gate_percent: f64) -> CumulativeRainflowData {
    let mut merged: std::collections::BTreeMap<u64, (f64, f64)> = std::collections::BTreeMap::new();
    for pair in range_counts.chunks_exact(2) {
        let (r, c) = (pair[0], pair[1]);
        let entry = merged.entry(r.to_bits()).or_insert((r, 0.0));
        entry.1 += c;
    }
    let mut rows: Vec<(f64, f64)> = merged.into_values().collect();
    let max_range = rows.iter().map(|r| r.0).fold(0.0_f64, f64::max);
    let gate = max_range * gate_percent / 100.0;
    rows.retain(|r| r.0 > gate);
    rows.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let total_damage: f64 = rows.iter().map(|(r, c)| c * r.powf(slope)).sum();

    let n = rows.len();
    let mut range = Vec::with_capacity(n + 1);
    let mut ncum = Vec::with_capacity(n + 1);
    let mut dcum = Vec::with_capacity(n + 1);
    range.push(rows.first().map(|r| r.0).unwrap_or(0.0));
    ncum.push(1.0);
    dcum.push(0.0);

    let mut cum_count = 0.0;
    let mut cum_damage_pct = 0.0;
    for (r, c) in &rows {
        cum_count += c;
        let damage_pct = if total_damage > 0.0 { (c * r.powf(slope)) / total_damage * 100.0 } else { 0.0 };
        cum_damage_pct += damage_pct;
        range.push(*r);
        ncum.push(cum_count);
        dcum.push(cum_damage_pct);
    }
    CumulativeRainflowData { range, ncum, dcum, total_damage }
}

/// Find the index of the half-open interval `[edges[i], edges[i+1])` (the
/// last interval is closed on both ends) containing `v`, by linear scan.
fn bin_index(edges: &[f64], v: f64) -> Option<usize> {
    if edges.len() < 2 {
        return None;
    }
    for i in 0..edges.len() - 1 {
        let is_last = i == edges.len() - 2;
        if v >= edges[i] && (v < edges[i + 1] || (is_last && v <= edges[i + 1])) {
            return Some(i);
        }
    }
    None
}

/// Build a level-crossing curve from one or more rainflow cycle sequences
/// (each a flat `[peak, valley, peak, valley, ...]` sequence), weighted by
/// their repetition counts, over `bin_count`-point regions split at the
/// weighted mean.
///
/// The cycle maxima and minima (each weighted by its cycle's repetition
/// count) are pooled into one `2 * cycleCount`-long weighted sample set;
/// its weighted mean splits the set into a low region (`linspace(min, mean,
/// bin_count)`) and a high region (`linspace(mean, max, bin_count)`), each
/// binned into a weighted histogram by linear search. The low region's
/// histogram is turned into a left-to-right cumulative sum (fewest crossings
/// near the minimum, most near the mean) and the high region's into a
/// right-to-left cumulative sum (most crossings near the mean, fewest near
/// the maximum); both curve ends are pinned to `1.0` rather than the
/// (usually zero) true crossing count there, for a cleaner log-scale plot.
/// `levels[i]` is the left edge of the bin `counts[i]` aggregates, so both
/// returned sequences are always the same length.
///
/// Returns `(levels, cumulative_crossing_counts)`.
pub fn level_crossing(rf_list: &[Vec<f64>], repetitions: &[f64], bin_count: usize) -> (Vec<f64>, Vec<f64>) {
    if rf_list.is_empty() || bin_count < 2 {
        return (Vec::new(), Vec::new());
    }
    let table = match build_rainflow_table(rf_list, repetitions, 1.0) {
        Ok(t) if !t.range.is_empty() => t,
        _ => return (Vec::new(), Vec::new()),
    };

    let mut values = table.max_of_cycle.clone();
    values.extend_from_slice(&table.min_of_cycle);
    let mut weights = table.cycle_repets.clone();
    weights.extend_from_slice(&table.cycle_repets);

    let sum_w: f64 = weights.iter().sum();
    let mean = if sum_w > 0.0 {
        values.iter().zip(weights.iter()).map(|(v, w)| v * w).sum::<f64>() / sum_w
    } else {
        0.0
    };
    let global_min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let global_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let low_edges = linspace(global_min, mean, bin_count);
    let high_edges = linspace(mean, global_max, bin_count);

    let mut low_hist = vec![0.0; low_edges.len().saturating_sub(1)];
    let mut high_hist = vec![0.0; high_edges.len().saturating_sub(1)];
    for (&v, &w) in values.iter().zip(weights.iter()) {
        if v <= mean {
            if let Some(i) = bin_index(&low_edges, v) {
                low_hist[i] += w;
            }
        } else if let Some(i) = bin_index(&high_edges, v) {
            high_hist[i] += w;
        }
    }

    let mut low_cum = Vec::with_capacity(low_hist.len());
    let mut running = 0.0;
    for h in &low_hist {
        running += h;
        low_cum.push(running);
    }
    let mut high_cum = vec![0.0; high_hist.len()];
    running = 0.0;
    for (i, h) in high_hist.iter().enumerate().rev() {
        running += h;
        high_cum[i] = running;
    }

    // Each array entry is a bin's left edge paired with that bin's cumulative
    // count, for both the low and high regions; trim the trailing edge of
    // each region the same way (it belongs to a bin that doesn't exist) so
    // `levels` and `counts` stay the same length.
    let mut levels = Vec::with_capacity(low_edges.len() + high_edges.len() - 2);
    levels.extend_from_slice(&low_edges[..low_edges.len().saturating_sub(1)]);
    levels.extend_from_slice(&high_edges[..high_edges.len().saturating_sub(1)]);

    let mut counts = Vec::with_capacity(low_cum.len() + high_cum.len());
    counts.extend(low_cum);
    counts.extend(high_cum);

    if let Some(first) = counts.first_mut() {
        *first = 1.0;
    }
    if let Some(last) = counts.last_mut() {
        *last = 1.0;
    }
    (levels, counts)
}
