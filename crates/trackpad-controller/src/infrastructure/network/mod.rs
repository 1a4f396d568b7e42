//! Network infrastructure for the controller application.

pub mod discovery;
pub mod session;

pub use discovery::{PeerFinder, StaticPeerFinder};
pub use session::{ConnectionSession, SessionConfig, SessionEvent, SessionHandle, SessionState};
