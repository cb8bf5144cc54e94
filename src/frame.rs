use std::sync::Arc;

use crate::block_id::BlockId;
use crate::block_store::BlockStore;
use crate::log::LogStore;

/// A single in-memory page-frame: a block's bytes plus the metadata the
/// Coordinator and Victim Selector need to manage it.
///
/// Frame performs no locking of its own; all mutation happens under the
/// pool-wide mutex held by [`crate::coordinator::BufferMgr`].
pub struct Frame {
    block_store: Arc<dyn BlockStore>,
    log_store: Arc<dyn LogStore>,
    block: Option<BlockId>,
    contents: Vec<u8>,
    pins: u32,
    dirty: bool,
    tx_num: i64,
    lsn: i64,
}

impl Frame {
    pub fn new(block_store: Arc<dyn BlockStore>, log_store: Arc<dyn LogStore>) -> Self {
        let block_size = block_store.block_size();
        Self {
            block_store,
            log_store,
            block: None,
            contents: vec![0u8; block_size],
            pins: 0,
            dirty: false,
            tx_num: -1,
            lsn: -1,
        }
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.contents
    }

    pub fn is_pinned(&self) -> bool {
        self.pins > 0
    }

    pub fn pin_count(&self) -> u32 {
        self.pins
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn modifying_tx(&self) -> i64 {
        self.tx_num
    }

    /// Records that `tx` modified this frame's contents up to `lsn`.
    ///
    /// Precondition: the frame is assigned to a block. Violating this
    /// is a programming error and aborts the process.
    pub fn set_modified(&mut self, tx: i64, lsn: i64) {
        assert!(
            self.block.is_some(),
            "set_modified called on an unassigned frame"
        );
        self.dirty = true;
        self.tx_num = tx;
        if lsn >= 0 {
            self.lsn = self.lsn.max(lsn);
        }
    }

    pub fn pin(&mut self) {
        self.pins += 1;
    }

    /// Precondition: `pins > 0`. Violating this is a programming error
    /// and aborts the process.
    pub fn unpin(&mut self) {
        assert!(self.pins > 0, "unpin called on a frame with pin count 0");
        self.pins -= 1;
    }

    /// Writes this frame's contents to disk if dirty, log-before-data.
    ///
    /// Gated on the single predicate `dirty`, even though `tx_num >= 0`
    /// tracks an equivalent condition. In debug builds this asserts the
    /// two predicates agree, surfacing any divergence instead of
    /// silently trusting one over the other.
    pub fn flush(&mut self) -> crate::errors::Result<()> {
        debug_assert_eq!(
            self.dirty,
            self.tx_num >= 0,
            "dirty flag and modifying-tx disagree on frame for block {:?}",
            self.block
        );
        if !self.dirty {
            return Ok(());
        }
        let block = self
            .block
            .clone()
            .expect("dirty frame must be assigned to a block");
        self.log_store.flush(self.lsn)?;
        self.block_store.write(&block, &self.contents)?;
        self.tx_num = -1;
        self.dirty = false;
        Ok(())
    }

    /// Reassigns this (evictable) frame to `block`, flushing first if
    /// dirty and then reading `block`'s contents in.
    ///
    /// Precondition: `pins == 0`. On I/O failure the frame is reset to
    /// unassigned rather than left half-updated, so the pool does not
    /// lose the slot.
    pub fn assign_to_block(&mut self, block: BlockId) -> crate::errors::Result<()> {
        assert_eq!(self.pins, 0, "assign_to_block on a pinned frame");

        if let Err(e) = self.flush() {
            self.reset_unassigned();
            return Err(e);
        }

        match self.block_store.read(&block, &mut self.contents) {
            Ok(()) => {
                self.block = Some(block);
                self.pins = 0;
                Ok(())
            }
            Err(e) => {
                self.reset_unassigned();
                Err(e.into())
            }
        }
    }

    fn reset_unassigned(&mut self) {
        self.block = None;
        self.pins = 0;
        self.dirty = false;
        self.tx_num = -1;
        self.lsn = -1;
    }
}
