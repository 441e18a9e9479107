use super::message::{Message, Request};
use super::EngineConn;
use crate::core::{Error, Result};
use log::debug;
use tokio::sync::mpsc;

/// One request in flight, with the path its replies go back on.
#[derive(Debug)]
pub struct Envelope {
    pub session: String,
    pub request: Request,
    pub reply: mpsc::UnboundedSender<Message>,
}

/// Builds a connected pair of endpoints over an in-process channel.
///
/// `capacity` bounds how many requests may queue in front of the engine.
#[must_use]
pub fn channel_endpoints(capacity: usize) -> (DriverEndpoint, EngineEndpoint) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (DriverEndpoint { tx }, EngineEndpoint { rx })
}

/// Driver side: hands out one `DriverConn` per session.
#[derive(Debug, Clone)]
pub struct DriverEndpoint {
    tx: mpsc::Sender<Envelope>,
}

impl DriverEndpoint {
    pub fn connect(&self, session: impl Into<String>) -> Result<DriverConn> {
        if self.tx.is_closed() {
            return Err(Error::EngineStopped);
        }
        Ok(DriverConn {
            session: session.into(),
            tx: self.tx.clone(),
        })
    }
}

#[derive(Debug)]
pub struct DriverConn {
    session: String,
    tx: mpsc::Sender<Envelope>,
}

impl DriverConn {
    /// Queues a request and returns the stream its replies arrive on.
    pub async fn send(&self, request: Request) -> Result<Replies> {
        let (reply, rx) = mpsc::unbounded_channel();
        let envelope = Envelope {
            session: self.session.clone(),
            request,
            reply,
        };
        self.tx
            .send(envelope)
            .await
            .map_err(|_| Error::EngineStopped)?;
        Ok(Replies { rx })
    }

    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Replies to one request. Ends once the engine is done with it.
#[derive(Debug)]
pub struct Replies {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Replies {
    pub async fn next(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

/// Engine side: yields requests from every connected session in arrival order.
#[derive(Debug)]
pub struct EngineEndpoint {
    rx: mpsc::Receiver<Envelope>,
}

impl EngineEndpoint {
    /// Waits for the next request. `None` once every driver handle is gone.
    pub async fn accept(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Refuses further requests; already queued ones can still be drained.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// `EngineConn` writing onto a request's reply channel.
#[derive(Debug)]
pub struct ChannelEngineConn {
    session: String,
    reply: mpsc::UnboundedSender<Message>,
}

impl ChannelEngineConn {
    #[must_use]
    pub const fn new(session: String, reply: mpsc::UnboundedSender<Message>) -> Self {
        Self { session, reply }
    }

    // A session that stopped listening (timeout, drop) is not an engine
    // failure: the statement already ran.
    fn send(&self, message: Message) -> Result<()> {
        if self.reply.send(message).is_err() {
            debug!("session {} left before its reply was written", self.session);
        }
        Ok(())
    }
}

impl EngineConn for ChannelEngineConn {
    fn write_result(&mut self, last_insert_id: i64, rows_affected: i64) -> Result<()> {
        self.send(Message::Result {
            last_insert_id,
            rows_affected,
        })
    }

    fn write_error(&mut self, err: &Error) -> Result<()> {
        self.send(Message::Error(err.to_string()))
    }

    fn write_row_header(&mut self, header: Vec<String>) -> Result<()> {
        self.send(Message::RowHeader(header))
    }

    fn write_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        self.send(Message::Row(row))
    }

    fn write_row_end(&mut self) -> Result<()> {
        self.send(Message::RowEnd)
    }
}
