// In-process protocol between sessions and the engine actor.
//
// Sessions never touch relation storage: they send SQL text over a bounded
// channel and read reply messages from a per-request channel.

mod channel;
mod message;

pub use channel::{
    channel_endpoints, ChannelEngineConn, DriverConn, DriverEndpoint, EngineEndpoint, Envelope,
    Replies,
};
pub use message::{Message, Request};

use crate::core::{Error, Result};

/// Reply primitives the engine writes while executing one request.
pub trait EngineConn {
    fn write_result(&mut self, last_insert_id: i64, rows_affected: i64) -> Result<()>;
    fn write_error(&mut self, err: &Error) -> Result<()>;
    fn write_row_header(&mut self, header: Vec<String>) -> Result<()>;
    fn write_row(&mut self, row: Vec<Option<String>>) -> Result<()>;
    fn write_row_end(&mut self) -> Result<()>;
}
