//! Cross-event aggregation: combining rainflow range counts for channels
//! that share a name across several independently recorded events (test
//! runs, load cases, ...), each carried out a caller-supplied number of
//! repeats.
use crate::channel::Channel;
use crate::errors::*;
use crate::rainflow::{concatenate_reversals, count_range_cycles, rainflow_counting};

/// One recorded event: a source file's identity plus how many times its
/// content should be counted as having repeated (e.g. "this load case runs
/// 12 times over the vehicle's service life").
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub file_id: String,
    pub repeats: f64,
}

fn merge_range_counts(into: &mut std::collections::BTreeMap<u64, (f64, f64)>, table: &[f64]) {
    for pair in table.chunks_exact(2) {
        let entry = into.entry(pair[0].to_bits()).or_insert((pair[0], 0.0));
        entry.1 += pair[1];
    }
}

fn flatten_sorted(table: std::collections::BTreeMap<u64, (f64, f64)>) -> Vec<f64> {
    let mut rows: Vec<(f64, f64)> = table.into_values().collect();
    rows.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    rows.into_iter().flat_map(|(r, c)| [r, c]).collect()
}

/// One group's combined output: the still-open residue chain (a flat
/// `[turning point, turning point, ...]` sequence, retained so the
/// equivalent-signal builder can fold it in as an extra synthetic channel)
/// alongside the combined, closure-inclusive range-count table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedChannel {
    pub residual_cycles: Vec<f64>,
    pub range_counts: Vec<f64>,
}

/// Combine the rainflow range counts of every channel sharing a name across
/// the given events, returning one combined result per distinct channel name.
///
/// For each event's channel: closed cycles are counted and weighted by the
/// event's `repeats`; the residue is chained into the group's running
/// residue (itself repeated `repeats` times first, so a channel that
/// recurs several times in one event contributes that many copies of its
/// own unclosed excursion) using [`concatenate_reversals`], in the order
/// `events` are given. Once every event has been folded in, the final
/// residue chain is closed with one more pass of cycle extraction and its
/// resulting cycles are merged into the group's range-count table too —
/// this is the "closure" step that keeps a long-running excursion from
/// simply being dropped just because it never reversed within a single
/// event. The pre-closure residue chain itself is returned alongside the
/// table, unclosed, so callers can still hand it to the equivalent-signal
/// builder as its own cycle sequence.
pub fn combine_channels_range_counts(
    channels: &[Channel],
    events: &[Event],
    bins: usize,
) -> Result<std::collections::HashMap<String, CombinedChannel>, RpcError> {
    let mut by_name: std::collections::BTreeMap<String, Vec<(&Channel, f64)>> = std::collections::BTreeMap::new();
    for channel in channels {
        let repeats = channel
            .get_source_file_hash()
            .and_then(|file_hash| events.iter().find(|e| e.file_id == file_hash))
            .map(|e| e.repeats)
            .unwrap_or(1.0);
        by_name
            .entry(channel.get_name().to_string())
            .or_default()
            .push((channel, repeats));
    }

    let mut result = std::collections::HashMap::new();
    for (name, members) in by_name {
        let mut combined: std::collections::BTreeMap<u64, (f64, f64)> = std::collections::BTreeMap::new();
        let mut residue_chain: Vec<f64> = Vec::new();
        for (channel, repeats) in members {
            let output = rainflow_counting(channel.get_samples(), bins, false);
            let weighted = count_range_cycles(&output.cycles, repeats);
            merge_range_counts(&mut combined, &weighted);

            let reps = (repeats.round() as i64).max(1) as usize;
            let mut this_residue = output.residue.clone();
            for _ in 1..reps {
                this_residue = concatenate_reversals(&this_residue, &output.residue)?;
            }
            residue_chain = if residue_chain.is_empty() {
                this_residue
            } else {
                concatenate_reversals(&residue_chain, &this_residue)?
            };
        }

        if residue_chain.len() >= 2 {
            let closing = crate::rainflow::rainflow_counting(&residue_chain, bins, true);
            let closing_counts = count_range_cycles(&closing.cycles, 1.0);
            merge_range_counts(&mut combined, &closing_counts);
        }

        result.insert(
            name,
            CombinedChannel { residual_cycles: residue_chain, range_counts: flatten_sorted(combined) },
        );
    }
    Ok(result)
}
