use crate::block_id::BlockId;

/// Chooses an unpinned resident block to evict, or `None` if every
/// resident block is pinned.
///
/// Operates over exactly the blocks the caller's `recency_queue`
/// names (i.e. exactly `Pool::table`), never a diverging
/// `AccessHistory`-only view. `distance_of` and `is_unpinned` are
/// callbacks rather than a concrete `AccessHistory`/`Pool` reference so
/// the selection logic stays a pure function of the recency order and
/// current scores.
pub fn select_victim(
    recency_queue: &[BlockId],
    distance_of: impl Fn(&BlockId) -> Option<f64>,
    is_unpinned: impl Fn(&BlockId) -> bool,
) -> Option<BlockId> {
    // Phase 1: any under-K (infinite backward-distance) unpinned block,
    // oldest-touched-first.
    for block in recency_queue {
        if is_unpinned(block) && distance_of(block) == Some(f64::INFINITY) {
            return Some(block.clone());
        }
    }

    // Phase 2: max finite backward-distance, ties broken by the same
    // head-to-tail recency order (first occurrence of the max wins).
    let mut best: Option<(&BlockId, f64)> = None;
    for block in recency_queue {
        if !is_unpinned(block) {
            continue;
        }
        let Some(d) = distance_of(block) else {
            continue;
        };
        if d.is_infinite() {
            continue;
        }
        match best {
            None => best = Some((block, d)),
            Some((_, best_d)) if d > best_d => best = Some((block, d)),
            _ => {}
        }
    }
    best.map(|(block, _)| block.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_history::AccessHistory;
    use std::collections::{HashMap, HashSet};

    fn history_with(entries: &[(&BlockId, usize)]) -> AccessHistory {
        let mut h = AccessHistory::new();
        for (block, count) in entries {
            for _ in 0..*count {
                h.record_access(block);
            }
        }
        h
    }

    #[test]
    fn prefers_under_k_block_oldest_touched_first() {
        let b1 = BlockId::new("f", 1);
        let b2 = BlockId::new("f", 2);
        let b3 = BlockId::new("f", 3);
        // b1 and b3 fully accessed (finite dist); b2 under-K (infinite).
        let h = history_with(&[(&b1, 3), (&b2, 1), (&b3, 3)]);

        let queue = vec![b1.clone(), b2.clone(), b3.clone()];
        let victim = select_victim(&queue, |b| h.backward_distance(b), |_| true);
        assert_eq!(victim, Some(b2));
    }

    #[test]
    fn picks_max_finite_distance_when_no_infinite_candidates() {
        let b1 = BlockId::new("f", 1);
        let b2 = BlockId::new("f", 2);
        let mut h = AccessHistory::new();
        // b1: accesses at 1,2,3 -> dist 2, then aged by b2's accesses.
        h.record_access(&b1);
        h.record_access(&b1);
        h.record_access(&b1);
        // b2: accesses at 4,5,6 -> dist 2 (not aged further).
        h.record_access(&b2);
        h.record_access(&b2);
        h.record_access(&b2);
        // b1 aged 3 times (once per b2 access) -> 2+3=5; b2 stays at 2.
        assert_eq!(h.backward_distance(&b1), Some(5.0));
        assert_eq!(h.backward_distance(&b2), Some(2.0));

        let queue = vec![b1.clone(), b2.clone()];
        let victim = select_victim(&queue, |b| h.backward_distance(b), |_| true);
        assert_eq!(victim, Some(b1));
    }

    #[test]
    fn finite_ties_broken_by_recency_queue_order() {
        let b1 = BlockId::new("f", 1);
        let b2 = BlockId::new("f", 2);
        // Tie constructed directly: a genuine tie between two distinct
        // blocks cannot arise from AccessHistory's sequential aging (one
        // block always finalizes its distance strictly after the other),
        // so the distance lookup is supplied directly here to exercise
        // the tie-break rule in isolation.
        let mut distances = HashMap::new();
        distances.insert(b1.clone(), 4.0);
        distances.insert(b2.clone(), 4.0);
        let distance_of = |b: &BlockId| distances.get(b).copied();

        let queue = vec![b1.clone(), b2.clone()];
        assert_eq!(select_victim(&queue, distance_of, |_| true), Some(b1.clone()));

        let queue_reversed = vec![b2.clone(), b1.clone()];
        assert_eq!(select_victim(&queue_reversed, distance_of, |_| true), Some(b2));
    }

    #[test]
    fn skips_pinned_frames() {
        let b1 = BlockId::new("f", 1);
        let b2 = BlockId::new("f", 2);
        let h = history_with(&[(&b1, 1), (&b2, 1)]);
        let pinned: HashSet<BlockId> = [b1.clone()].into_iter().collect();

        let queue = vec![b1.clone(), b2.clone()];
        let victim = select_victim(&queue, |b| h.backward_distance(b), |b| !pinned.contains(b));
        assert_eq!(victim, Some(b2));
    }

    #[test]
    fn none_when_everything_pinned() {
        let b1 = BlockId::new("f", 1);
        let h = history_with(&[(&b1, 1)]);
        let queue = vec![b1];
        assert_eq!(select_victim(&queue, |b| h.backward_distance(b), |_| false), None);
    }
}
