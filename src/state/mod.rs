pub mod connection;
pub mod correlator;

pub use connection::ConnectionState;
pub use correlator::{Correlator, Dispatch, PendingReply};
