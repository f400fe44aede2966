//! Engine-facing layer: single handles, the concurrent pool and share contexts.

pub mod pool;
pub mod shared;
pub mod single;

pub use pool::{PoolKey, PoolOption, TransferPool};
pub use shared::{ShareType, SharedContext};
pub use single::{Sink, TransferHandle, TransferInfo, UploadFile};
