// aquadash-api: wire protocol and WebSocket transport for the tank dashboard.

pub mod error;
pub mod protocol;
pub mod websocket;

pub use error::Error;
pub use protocol::{DecodeError, InboundMessage, NewDevice, OutboundMessage, WireDevice};
pub use websocket::{Connection, ConnectionOptions, ConnectionState, FrameHandler, Outbox};
