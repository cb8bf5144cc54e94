use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::block_id::BlockId;
use crate::block_store::BlockStore;
use crate::errors::{Error, Result};
use crate::log::LogStore;
use crate::pool::{Pool, SharedFrame};
use crate::{get_caller_name, printdbg};

/// Upper bound on how long [`BufferMgr::pin`] waits for a frame before
/// raising [`Error::BufferAbort`].
pub const MAX_WAIT: Duration = Duration::from_secs(10);

struct PoolState {
    pool: Pool,
    /// Count of frames with `pins == 0` plus unallocated slots,
    /// maintained as a running counter rather than recomputed on every
    /// call.
    available: usize,
}

/// A pinned frame handle returned by [`BufferMgr::pin`].
///
/// Two threads pinning the same block receive handles wrapping the
/// same underlying frame; this crate performs no synchronization of
/// content access beyond that, callers coordinate per-page reads and
/// writes under their own latch discipline once a frame is pinned.
#[derive(Clone)]
pub struct PinnedFrame {
    block: BlockId,
    frame: SharedFrame,
}

impl PinnedFrame {
    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn contents(&self) -> Vec<u8> {
        self.frame.lock().contents().to_vec()
    }

    pub fn with_contents_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(self.frame.lock().contents_mut())
    }

    pub fn is_pinned(&self) -> bool {
        self.frame.lock().is_pinned()
    }

    pub fn pin_count(&self) -> u32 {
        self.frame.lock().pin_count()
    }

    pub fn is_dirty(&self) -> bool {
        self.frame.lock().is_dirty()
    }

    pub fn modifying_tx(&self) -> i64 {
        self.frame.lock().modifying_tx()
    }

    pub fn set_modified(&self, tx: i64, lsn: i64) {
        self.frame.lock().set_modified(tx, lsn);
    }
}

/// The public buffer pool coordinator: `pin`/`unpin`/`flush_all`/
/// `available`/`find_existing`, backed by a single pool-wide mutex and
/// condition variable.
pub struct BufferMgr {
    state: Arc<(Mutex<PoolState>, Condvar)>,
    max_wait: Duration,
}

impl BufferMgr {
    pub fn new(
        capacity: usize,
        block_store: Arc<dyn BlockStore>,
        log_store: Arc<dyn LogStore>,
    ) -> Self {
        Self::with_max_wait(capacity, block_store, log_store, MAX_WAIT)
    }

    pub fn with_max_wait(
        capacity: usize,
        block_store: Arc<dyn BlockStore>,
        log_store: Arc<dyn LogStore>,
        max_wait: Duration,
    ) -> Self {
        let pool = Pool::new(capacity, block_store, log_store);
        let state = PoolState {
            pool,
            available: capacity,
        };
        Self {
            state: Arc::new((Mutex::new(state), Condvar::new())),
            max_wait,
        }
    }

    /// Pins `blk`, waiting and retrying on contention up to `MAX_WAIT`.
    ///
    /// Raises [`Error::BufferAbort`] if no frame could be secured
    /// within the timeout.
    pub fn pin(&self, blk: &BlockId) -> Result<PinnedFrame> {
        let start = Instant::now();
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();

        loop {
            if let Some(frame) = Self::try_to_pin(&mut state, blk)? {
                printdbg!(
                    "{} pinned {blk}, pin count now {}",
                    get_caller_name!(),
                    frame.lock().pin_count()
                );
                return Ok(PinnedFrame {
                    block: blk.clone(),
                    frame,
                });
            }

            let elapsed = start.elapsed();
            if elapsed >= self.max_wait {
                return Err(Error::BufferAbort);
            }
            let _ = cvar.wait_for(&mut state, self.max_wait - elapsed);
            if start.elapsed() >= self.max_wait {
                return Err(Error::BufferAbort);
            }
        }
    }

    /// Looks up or allocates `blk`, pins it, and records the access.
    /// Returns `Ok(None)` when no victim is available (the caller's
    /// `pin` loop waits and retries).
    fn try_to_pin(state: &mut PoolState, blk: &BlockId) -> Result<Option<SharedFrame>> {
        let frame = match state.pool.ensure_resident(blk)? {
            Some(frame) => frame,
            None => return Ok(None),
        };

        let was_unpinned = !frame.lock().is_pinned();
        if was_unpinned {
            state.available -= 1;
        }
        frame.lock().pin();

        // Access History is updated exactly once per successful pin,
        // after the pin count has been incremented and after any
        // eviction side-effects on the history have been applied.
        state.pool.record_access(blk);

        Ok(Some(frame))
    }

    /// Unpins `frame`; if its pin count reaches zero, wakes all waiters.
    pub fn unpin(&self, frame: &PinnedFrame) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        let became_evictable = {
            let mut f = frame.frame.lock();
            f.unpin();
            !f.is_pinned()
        };
        if became_evictable {
            state.available += 1;
        }
        drop(state);

        printdbg!(
            "{} unpinned {}, evictable: {became_evictable}",
            get_caller_name!(),
            frame.block()
        );

        if became_evictable {
            cvar.notify_all();
        }
    }

    /// Flushes every resident frame whose modifying transaction is `tx`.
    pub fn flush_all(&self, tx: i64) -> Result<()> {
        let (lock, _cvar) = &*self.state;
        let state = lock.lock();
        for (_, frame) in state.pool.frames() {
            let mut f = frame.lock();
            if f.modifying_tx() == tx {
                f.flush()?;
            }
        }
        Ok(())
    }

    /// Current count of unpinned-or-unallocated slots.
    pub fn available(&self) -> usize {
        let (lock, _cvar) = &*self.state;
        lock.lock().available
    }

    /// Diagnostic lookup: returns the resident frame for `blk`, if any,
    /// without pinning it.
    pub fn find_existing(&self, blk: &BlockId) -> Option<PinnedFrame> {
        let (lock, _cvar) = &*self.state;
        let state = lock.lock();
        state.pool.find_existing(blk).map(|frame| PinnedFrame {
            block: blk.clone(),
            frame,
        })
    }

    pub fn capacity(&self) -> usize {
        let (lock, _cvar) = &*self.state;
        lock.lock().pool.capacity()
    }
}
