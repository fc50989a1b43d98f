//! The language-server runtime: JSON-RPC framing, the synchronous
//! request dispatcher, and the server state tying the project manager
//! to the wire.

pub mod dispatch;
pub mod logging;
pub mod protocol;
pub mod state;
pub mod transport;

pub use dispatch::Dispatcher;
pub use state::ServerState;
