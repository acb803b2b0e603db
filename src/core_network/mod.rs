pub mod data_channel;
pub mod network;
pub mod pasv;
pub mod port;

pub use data_channel::{DataChannel, DataChannelManager, PassiveEndpoint};
pub use network::{send_all, Connection, Listener, SocketPool, StdSocketPool};
