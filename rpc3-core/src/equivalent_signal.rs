//! Building a reduced "equivalent damage" signal from one or more cycle
//! sequences: a small number of blocks, each a single representative
//! range/mean repeated enough times to reproduce (approximately) the
//! original fatigue damage, suitable for driving a physical test rig.
use crate::errors::*;

/// The full per-cycle columnar table the block partition works from, sorted
/// ascending by range. Columns mirror the eight pieces of information every
/// individual cycle needs before being folded into a block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RainflowTable {
    pub range: Vec<f64>,
    pub damage_of_cycle: Vec<f64>,
    pub cumul_damage: Vec<f64>,
    pub cycle_index: Vec<usize>,
    pub perc_cumul_damage: Vec<f64>,
    pub max_of_cycle: Vec<f64>,
    pub cycle_repets: Vec<f64>,
    pub min_of_cycle: Vec<f64>,
}

/// One row of the reduced equivalent-damage signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalentSignalRow {
    pub range: f64,
    pub mean: f64,
    pub repetition: f64,
    pub percent_damage: f64,
    pub block_damage: f64,
    pub adjusted_mean: f64,
}

/// Build the per-cycle rainflow table from one or more cycle sequences
/// (each a flat `[peak, valley, peak, valley, ...]` sequence, as produced by
/// [`crate::rainflow::rainflow_counting`]) and their matching repetition
/// counts, sorted ascending by range.
///
/// Fails if any cycle sequence has an odd length.
pub fn build_rainflow_table(cycle_sequences: &[Vec<f64>], repetitions: &[f64], slope: f64) -> Result<RainflowTable, RpcError> {
    struct Row {
        range: f64,
        max: f64,
        min: f64,
        repets: f64,
        damage: f64,
        original_index: usize,
    }
    let mut rows = Vec::new();
    for (cycles, &repets) in cycle_sequences.iter().zip(repetitions.iter()) {
        if cycles.len() % 2 != 0 {
            return Err(RpcError::InvalidEquivalentSignalParams {
                msg: "cycle sequence must have an even number of entries".to_string(),
            });
        }
        for pair in cycles.chunks_exact(2) {
            let (p, v) = (pair[0], pair[1]);
            let range = (p - v).abs();
            let original_index = rows.len();
            rows.push(Row { range, max: p.max(v), min: p.min(v), repets, damage: repets * range.powf(slope), original_index });
        }
    }
    // `cycle_index` must travel with its row through the sort below, so it
    // keeps tracking each cycle's position in the original (pre-sort)
    // flattened order rather than its position in the sorted table.
    rows.sort_by(|a, b| a.range.partial_cmp(&b.range).unwrap_or(std::cmp::Ordering::Equal));

    let total_damage: f64 = rows.iter().map(|r| r.damage).sum();
    let mut table = RainflowTable::default();
    let mut running = 0.0;
    for r in rows {
        running += r.damage;
        table.range.push(r.range);
        table.damage_of_cycle.push(r.damage);
        table.cumul_damage.push(running);
        table.cycle_index.push(r.original_index);
        table.perc_cumul_damage.push(if total_damage > 0.0 { r.damage / total_damage } else { 0.0 });
        table.max_of_cycle.push(r.max);
        table.cycle_repets.push(r.repets);
        table.min_of_cycle.push(r.min);
    }
    Ok(table)
}

struct Block {
    range: f64,
    mean: f64,
    adjusted_mean: f64,
    block_damage: f64,
    repetition: f64,
    percent_damage: f64,
}

/// Reduce a set of cycle sequences to `blocks_number` equivalent-damage
/// blocks.
///
/// The sorted cycle table is partitioned by repeatedly finding, across all
/// current boundary pairs, the split point that maximizes
/// `damageAccumulated · (maxRange − rangeAtSplit)` (the "maximum rectangle"
/// heuristic) and folding the resulting square height into every cycle's
/// range up to that split. Each finished block's range is then scaled down
/// (never its damage) until the total repetition count clears
/// `min_num_of_cycles`, the last block is forced to span the signal's full
/// `[min, max]` envelope, and every block's representative mean is clipped
/// back inside that envelope. The block list is reversed before being
/// returned, so the highest-range block is played first.
pub fn eq_dmg_signal(
    cycle_sequences: &[Vec<f64>],
    repetitions: &[f64],
    blocks_number: usize,
    min_num_of_cycles: f64,
    slope: f64,
) -> Result<Vec<EquivalentSignalRow>, RpcError> {
    if blocks_number == 0 {
        return Err(RpcError::InvalidEquivalentSignalParams {
            msg: "blocks_number must be at least 1".to_string(),
        });
    }

    let mut table = build_rainflow_table(cycle_sequences, repetitions, slope)?;
    let n = table.range.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let total_cycle_repets: f64 = table.cycle_repets.iter().sum();
    if total_cycle_repets < min_num_of_cycles {
        return Err(RpcError::InvalidEquivalentSignalParams {
            msg: "signal carries fewer cycles than the requested minimum".to_string(),
        });
    }

    let total_damage = *table.cumul_damage.last().unwrap();
    let global_max = table.max_of_cycle.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let global_min = table.min_of_cycle.iter().cloned().fold(f64::INFINITY, f64::min);
    let r_max = table.range[n - 1];

    // Step 3: max-rectangle block partition, indices into the sorted table.
    let mut boundaries = vec![0usize, n - 1];
    for _ in 1..blocks_number {
        let mut best: Option<(usize, usize, f64, f64)> = None; // (lo, split, square_height, s)
        for w in boundaries.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            let mut damage_of_block = 0.0;
            for a in (lo + 1)..hi {
                damage_of_block += table.damage_of_cycle[a];
                let square_height = r_max - table.range[a];
                let s = damage_of_block * square_height;
                if best.map_or(true, |b| s > b.3) {
                    best = Some((lo, a, square_height, s));
                }
            }
        }
        let (lower_bound, index_of_division, square_height) = match best {
            Some((lo, a, sh, _)) => (lo, a, sh),
            None => break,
        };
        for c in (lower_bound + 1)..=index_of_division {
            table.range[c] += square_height;
        }
        if let Err(pos) = boundaries.binary_search(&index_of_division) {
            boundaries.insert(pos, index_of_division);
        }
    }

    // Step 4: build blocks from the (now partially rectangled) table.
    let mut blocks: Vec<Block> = Vec::with_capacity(boundaries.len().saturating_sub(1));
    for w in boundaries.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        if lo >= hi {
            continue;
        }
        let mut block_damage = 0.0;
        let mut mean_accum = 0.0;
        let mut final_range = table.range[hi];
        let mut count = 0usize;
        for i in (lo + 1)..=hi {
            block_damage += table.damage_of_cycle[i];
            mean_accum += table.max_of_cycle[i] - table.range[i] / 2.0;
            final_range = table.range[i];
            count += 1;
        }
        let block_mean = if count > 0 { mean_accum / count as f64 } else { 0.0 };
        let repetition = if final_range > 0.0 { block_damage / final_range.powf(slope) } else { f64::INFINITY };
        blocks.push(Block {
            range: final_range,
            mean: block_mean,
            adjusted_mean: block_mean,
            block_damage,
            repetition,
            percent_damage: if total_damage > 0.0 { 100.0 * block_damage / total_damage } else { 0.0 },
        });
    }

    // Step 5: scale ranges down until the total repetition count clears the floor.
    let b = blocks.len();
    if b > 0 {
        let snapshot: Vec<f64> = blocks.iter().map(|blk| blk.range).collect();
        let mut scale = 1.0_f64;
        loop {
            let total_reps: f64 = blocks.iter().map(|blk| blk.repetition).sum();
            if total_reps > min_num_of_cycles || scale <= 0.0 {
                break;
            }
            scale -= 1e-4;
            blocks[0].range *= scale;
            for k in 1..b.saturating_sub(1) {
                let candidate = blocks[k].range * scale;
                let mid = (snapshot[k - 1] + snapshot[k]) / 2.0;
                if candidate >= mid {
                    blocks[k].range = candidate;
                }
            }
            let last = b - 1;
            let range = global_max - global_min;
            blocks[last].range = range;
            blocks[last].mean = global_max;
            blocks[last].adjusted_mean = global_max - range / 2.0;

            for blk in &mut blocks {
                blk.repetition = if blk.range > 0.0 { blk.block_damage / blk.range.powf(slope) } else { f64::INFINITY };
                blk.percent_damage = if total_damage > 0.0 { 100.0 * blk.block_damage / total_damage } else { 0.0 };
            }
        }
    }

    // Step 6: mean clipping against the forced last block's envelope.
    if let Some(last) = blocks.last() {
        let signal_min = last.mean - last.range;
        let signal_max = last.mean;
        for blk in &mut blocks {
            if blk.adjusted_mean - blk.range / 2.0 < signal_min {
                blk.adjusted_mean = blk.range / 2.0 + signal_min;
            } else if blk.adjusted_mean + blk.range / 2.0 > signal_max {
                blk.adjusted_mean = signal_max - blk.range / 2.0;
            }
        }
    }

    // Step 7: reverse so the highest-range block comes first.
    blocks.reverse();
    Ok(blocks
        .into_iter()
        .map(|blk| EquivalentSignalRow {
            range: blk.range,
            mean: blk.mean,
            repetition: blk.repetition,
            percent_damage: blk.percent_damage,
            block_damage: blk.block_damage,
            adjusted_mean: blk.adjusted_mean,
        })
        .collect())
}
