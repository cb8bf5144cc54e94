mod access_history;
mod block_id;
mod block_store;
mod coordinator;
mod errors;
mod frame;
mod log;
mod pool;
mod victim;

pub use block_id::BlockId;
pub use block_store::{BlockStore, FileBlockStore};
pub use coordinator::{BufferMgr, PinnedFrame, MAX_WAIT};
pub use errors::{Error, Result};
pub use frame::Frame;
pub use log::{FileLogStore, LogStore};

#[macro_export]
macro_rules! printdbg {
    ($val: expr $(, $args: expr)*) => {
        #[cfg(debug_assertions)]
        println!($val $(, $args)*)
    };
}

#[macro_export]
macro_rules! get_caller_name {
    () => {{
        let mut bt = backtrace::Backtrace::new_unresolved();
        bt.resolve();
        let frames = bt.frames();
        if frames.len() > 1 {
            let caller_frame = &frames[1];
            if let Some(symbol) = caller_frame.symbols().first() {
                if let Some(name) = symbol.name() {
                    name.to_string()
                } else {
                    "Unknown Caller".to_string()
                }
            } else {
                "Unknown Caller".to_string()
            }
        } else {
            "No Caller Found".to_string() // In case the stack isn't deep enough
        }
    }};
}
