use std::collections::HashMap;

use crate::block_id::BlockId;

const NONE: i64 = -1;

/// Per-block last-3-access bookkeeping and backward-distance scoring
/// for the LRU-K (K=3) replacement policy.
///
/// This state is global to the pool, not per-frame: it tracks exactly
/// the blocks currently resident in the pool's frame table.
#[derive(Debug, Default)]
pub struct AccessHistory {
    accesses: HashMap<BlockId, [i64; 3]>,
    backward_dist: HashMap<BlockId, f64>,
    time: i64,
}

impl AccessHistory {
    pub fn new() -> Self {
        Self {
            accesses: HashMap::new(),
            backward_dist: HashMap::new(),
            time: 1,
        }
    }

    pub fn backward_distance(&self, block: &BlockId) -> Option<f64> {
        self.backward_dist.get(block).copied()
    }

    pub fn contains(&self, block: &BlockId) -> bool {
        self.accesses.contains_key(block)
    }

    pub fn tracked_blocks(&self) -> impl Iterator<Item = &BlockId> {
        self.backward_dist.keys()
    }

    #[cfg(test)]
    pub(crate) fn history_of(&self, block: &BlockId) -> Option<[i64; 3]> {
        self.accesses.get(block).copied()
    }

    /// Records an access to `block`, invoked *after* the pin succeeds.
    /// Ages every other tracked block's backward distance by one.
    pub fn record_access(&mut self, block: &BlockId) {
        let t = self.time;
        let dist = {
            let slots = self
                .accesses
                .entry(block.clone())
                .or_insert([NONE, NONE, NONE]);

            if slots[0] == NONE {
                *slots = [t, NONE, NONE];
                f64::INFINITY
            } else if slots[1] == NONE {
                slots[1] = t;
                f64::INFINITY
            } else if slots[2] == NONE {
                slots[2] = t;
                (slots[2] - slots[0]) as f64
            } else {
                *slots = [slots[1], slots[2], t];
                (slots[2] - slots[0]) as f64
            }
        };
        self.backward_dist.insert(block.clone(), dist);
        self.time += 1;

        for (b, d) in self.backward_dist.iter_mut() {
            if b != block {
                *d += 1.0;
            }
        }
    }

    /// Erases `block`'s history, e.g. on eviction.
    pub fn remove(&mut self, block: &BlockId) {
        self.accesses.remove(block);
        self.backward_dist.remove(block);
    }
}
