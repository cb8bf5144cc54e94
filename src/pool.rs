use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::access_history::AccessHistory;
use crate::block_id::BlockId;
use crate::block_store::BlockStore;
use crate::errors::Result;
use crate::frame::Frame;
use crate::log::LogStore;
use crate::victim;

/// A frame shared out to callers via [`crate::coordinator::BufferMgr::pin`].
/// Two threads pinning the same block observe the same `Arc`.
pub type SharedFrame = Arc<Mutex<Frame>>;

/// The resident set: a frame table keyed by block id, plus the
/// head-to-tail recency queue used only as a replacement tie-break.
/// Represented as a plain `Vec<BlockId>` rather than an intrusive
/// list, since pool sizes are small.
pub struct Pool {
    block_store: Arc<dyn BlockStore>,
    log_store: Arc<dyn LogStore>,
    capacity: usize,
    table: HashMap<BlockId, SharedFrame>,
    recency_queue: Vec<BlockId>,
    access_history: AccessHistory,
}

impl Pool {
    pub fn new(
        capacity: usize,
        block_store: Arc<dyn BlockStore>,
        log_store: Arc<dyn LogStore>,
    ) -> Self {
        assert!(capacity > 0, "buffer pool capacity must be positive");
        Self {
            block_store,
            log_store,
            capacity,
            table: HashMap::with_capacity(capacity),
            recency_queue: Vec::with_capacity(capacity),
            access_history: AccessHistory::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn resident_count(&self) -> usize {
        self.table.len()
    }

    pub fn find_existing(&self, blk: &BlockId) -> Option<SharedFrame> {
        self.table.get(blk).cloned()
    }

    pub fn recency_queue(&self) -> &[BlockId] {
        &self.recency_queue
    }

    pub fn access_history(&self) -> &AccessHistory {
        &self.access_history
    }

    /// Count of frames in `table` with `pins == 0`, for invariant checks.
    pub fn unpinned_resident_count(&self) -> usize {
        self.table.values().filter(|f| !f.lock().is_pinned()).count()
    }

    fn touch(&mut self, blk: &BlockId) {
        self.recency_queue.retain(|b| b != blk);
        self.recency_queue.push(blk.clone());
    }

    /// Ensures `blk` is resident, on a hit moving it to the tail of the
    /// recency queue, on a miss allocating a fresh frame or evicting an
    /// unpinned victim. Returns the resident frame, or `Ok(None)`
    /// if no victim is available (the caller should wait and retry).
    pub fn ensure_resident(&mut self, blk: &BlockId) -> Result<Option<SharedFrame>> {
        if let Some(frame) = self.table.get(blk) {
            self.touch(blk);
            return Ok(Some(frame.clone()));
        }

        let frame = if self.table.len() < self.capacity {
            Arc::new(Mutex::new(Frame::new(
                self.block_store.clone(),
                self.log_store.clone(),
            )))
        } else {
            let table = &self.table;
            let access_history = &self.access_history;
            let victim_block = match victim::select_victim(
                &self.recency_queue,
                |b| access_history.backward_distance(b),
                |b| !table[b].lock().is_pinned(),
            ) {
                Some(v) => v,
                None => return Ok(None),
            };

            let frame = self
                .table
                .remove(&victim_block)
                .expect("victim must be resident");
            self.recency_queue.retain(|b| b != &victim_block);
            self.access_history.remove(&victim_block);
            frame
        };

        frame.lock().assign_to_block(blk.clone())?;

        self.table.insert(blk.clone(), frame.clone());
        self.recency_queue.push(blk.clone());
        Ok(Some(frame))
    }

    pub fn record_access(&mut self, blk: &BlockId) {
        self.access_history.record_access(blk);
    }

    pub fn frames(&self) -> impl Iterator<Item = (&BlockId, &SharedFrame)> {
        self.table.iter()
    }
}
