pub mod buffer;
pub mod cache;
pub mod codec;

pub use buffer::RxBuffer;
pub use cache::WriteCache;
pub use codec::{TextCodec, TransferMode};
