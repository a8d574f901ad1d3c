//! The ASTM four-point rainflow counting engine.
//!
//! Reversal detection runs against a bin-quantized copy of the signal so
//! that near-flat noise around a turning point does not get counted as a
//! string of spurious micro-reversals; the four-point extraction and range
//! counting then run against the (unquantized) reversal values themselves.
use crate::errors::*;
use crate::primitives::{find_min_max, linspace};

/// The result of running rainflow reversal detection and cycle extraction
/// over one sample sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RainflowOutput {
    /// The turning points of the (quantized) signal, in order.
    pub reversals: Vec<f64>,
    /// Index into the original sample sequence for each reversal.
    pub reversal_indices: Vec<usize>,
    /// Closed cycles as a flat `[start, end, start, end, ...]` sequence.
    pub cycles: Vec<f64>,
    /// Unclosed reversals left over after four-point extraction.
    pub residue: Vec<f64>,
}

/// Quantize a sequence into `bins` equal-width bins spanning its min/max,
/// replacing each sample with the midpoint of the bin it falls in.
///
/// The boundary sequence runs from `min - dy` to `max + dy` with
/// `dy = (max - min) / (2 * bins)`, `bins + 2` points total (`bins + 1`
/// bins), so that the sequence minimum and maximum land at a bin midpoint
/// rather than exactly on an edge.
fn quantize_to_bins(samples: &[f64], bins: usize) -> Vec<f64> {
    if bins == 0 || samples.len() < 2 {
        return samples.to_vec();
    }
    let (min, max) = find_min_max(samples);
    if (max - min).abs() < f64::EPSILON {
        return samples.to_vec();
    }
    let dy = (max - min) / (2.0 * bins as f64);
    let edges = linspace(min - dy, max + dy, bins + 2);
    samples
        .iter()
        .map(|&v| {
            let mut idx = match edges.iter().position(|&e| e > v) {
                Some(0) => 0,
                Some(p) => p - 1,
                None => edges.len() - 2,
            };
            if idx >= edges.len() - 1 {
                idx = edges.len() - 2;
            }
            (edges[idx] + edges[idx + 1]) / 2.0
        })
        .collect()
}

/// Keep the first point, the last point, and every interior point where the
/// quantized sequence changes direction.
///
/// Quantization produces long runs of identical values (plateaus), so the
/// direction test first collapses each plateau down to a single candidate
/// (its first sample), the way the source algorithm does: testing adjacent
/// *raw* quantized samples directly would see a zero delta at every
/// plateau edge and never detect the turn that the plateau as a whole
/// represents. The first candidate is always kept; the last is always kept
/// to terminate the sequence; interior candidates are kept only where the
/// sign of the incoming slope differs from the sign of the outgoing slope.
fn detect_reversals(q: &[f64]) -> (Vec<f64>, Vec<usize>) {
    if q.len() < 2 {
        return (q.to_vec(), (0..q.len()).collect());
    }
    let mut candidates: Vec<usize> = vec![0];
    for j in 1..q.len() {
        if q[j] != q[j - 1] {
            candidates.push(j);
        }
    }
    if *candidates.last().unwrap() != q.len() - 1 {
        candidates.push(q.len() - 1);
    }
    if candidates.len() < 2 {
        return (vec![q[0], q[q.len() - 1]], vec![0, q.len() - 1]);
    }
    if candidates.len() == 2 {
        // No interior change at all: trivial two-point reversal sequence.
        return (
            vec![q[candidates[0]], q[candidates[1]]],
            vec![candidates[0], candidates[1]],
        );
    }
    let mut reversals = vec![q[candidates[0]]];
    let mut indices = vec![candidates[0]];
    for m in 0..candidates.len() - 2 {
        let (c0, c1, c2) = (candidates[m], candidates[m + 1], candidates[m + 2]);
        let d1 = q[c1] - q[c0];
        let d2 = q[c2] - q[c1];
        if d1 * d2 < 0.0 {
            reversals.push(q[c1]);
            indices.push(c1);
        }
    }
    let last = *candidates.last().unwrap();
    reversals.push(q[last]);
    indices.push(last);
    (reversals, indices)
}

/// ASTM four-point cycle extraction: a closed cycle is recognized whenever
/// the middle range of four consecutive reversals is no larger than either
/// of its neighboring ranges.
fn four_point_extraction(reversals: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut stack: Vec<f64> = Vec::new();
    let mut cycles: Vec<f64> = Vec::new();
    for &y in reversals {
        stack.push(y);
        loop {
            let n = stack.len();
            if n < 4 {
                break;
            }
            let y1 = stack[n - 4];
            let y2 = stack[n - 3];
            let y3 = stack[n - 2];
            let y4 = stack[n - 1];
            let r1 = (y2 - y1).abs();
            let r2 = (y3 - y2).abs();
            let r3 = (y4 - y3).abs();
            if r2 <= r1 && r2 <= r3 {
                cycles.push(y2);
                cycles.push(y3);
                stack.drain(n - 3..n - 1);
            } else {
                break;
            }
        }
    }
    (cycles, stack)
}

/// Join two reversal sequences end to end, resolving the shared joint by
/// `t1 = dAend * dBstart` and `t2 = dAend * dJoin`, where `dAend` is the
/// trend of `a`'s last segment, `dBstart` the trend of `b`'s first segment,
/// and `dJoin` the trend across the joint itself.
///
/// - `t1 > 0, t2 < 0`: a genuine local extremum at the joint, the two
///   sequences are simply concatenated.
/// - `t1 > 0, t2 >= 0`: the joint is not a reversal, both joint points
///   (`a`'s last, `b`'s first) are dropped.
/// - `t1 < 0, t2 >= 0`: a genuine local extremum, `b`'s duplicate leading
///   point is dropped.
/// - `t1 < 0, t2 < 0`: a genuine local extremum, `a`'s trailing point is
///   dropped.
/// - `t1 == 0`: the joint is a repeated endpoint rather than a real
///   direction change.
pub fn concatenate_reversals(a: &[f64], b: &[f64]) -> Result<Vec<f64>, RpcError> {
    if a.len() < 2 || b.len() < 2 {
        let mut out = a.to_vec();
        out.extend_from_slice(b);
        return Ok(out);
    }
    let d_a_end = a[a.len() - 1] - a[a.len() - 2];
    let d_b_start = b[1] - b[0];
    let d_join = b[0] - a[a.len() - 1];
    let t1 = d_a_end * d_b_start;
    let t2 = d_a_end * d_join;
    let mut out = Vec::with_capacity(a.len() + b.len());
    if t1 > 0.0 && t2 < 0.0 {
        out.extend_from_slice(a);
        out.extend_from_slice(b);
    } else if t1 > 0.0 && t2 >= 0.0 {
        out.extend_from_slice(&a[..a.len() - 1]);
        out.extend_from_slice(&b[1..]);
    } else if t1 < 0.0 && t2 >= 0.0 {
        out.extend_from_slice(a);
        out.extend_from_slice(&b[1..]);
    } else if t1 < 0.0 && t2 < 0.0 {
        out.extend_from_slice(&a[..a.len() - 1]);
        out.extend_from_slice(b);
    } else {
        return Err(RpcError::RepeatedEndpoint);
    }
    Ok(out)
}

/// Run reversal detection and four-point cycle extraction over a sample
/// sequence. When `close_residuals` is set, the leftover residue is doubled
/// against itself (the standard way of forcing every half-cycle in the
/// residue closed) and the extra closed cycles that yields are folded in.
pub fn rainflow_counting(samples: &[f64], bins: usize, close_residuals: bool) -> RainflowOutput {
    let quantized = quantize_to_bins(samples, bins);
    let (reversals, reversal_indices) = detect_reversals(&quantized);
    let (mut cycles, residue) = four_point_extraction(&reversals);
    if close_residuals && residue.len() >= 2 {
        if let Ok(doubled) = concatenate_reversals(&residue, &residue) {
            let (closed, _leftover) = four_point_extraction(&doubled);
            cycles.extend(closed);
        }
    }
    RainflowOutput {
        reversals,
        reversal_indices,
        cycles,
        residue,
    }
}

/// Turn a flat `[start, end, start, end, ...]` cycle sequence into a flat
/// `[range, count, range, count, ...]` table, sorted by descending range,
/// weighting every cycle by `repeats`.
pub fn count_range_cycles(cycles: &[f64], repeats: f64) -> Vec<f64> {
    let mut table: std::collections::BTreeMap<u64, (f64, f64)> = std::collections::BTreeMap::new();
    for pair in cycles.chunks_exact(2) {
        let range = (pair[1] - pair[0]).abs();
        let entry = table.entry(range.to_bits()).or_insert((range, 0.0));
        entry.1 += repeats;
    }
    let mut rows: Vec<(f64, f64)> = table.into_values().collect();
    rows.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    rows.into_iter().flat_map(|(r, c)| [r, c]).collect()
}
