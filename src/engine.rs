/// Engine actor
///
/// One thread per engine owns the relation storage and executes requests
/// strictly in arrival order. Sessions talk to it only through the protocol
/// channel, so storage is never shared between threads.

use crate::core::Result;
use crate::driver::ConnConfig;
use crate::executor::Dispatcher;
use crate::protocol::{ChannelEngineConn, EngineEndpoint, Envelope, Request};
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tokio::sync::watch;

pub struct Engine {
    name: String,
    stop: watch::Sender<bool>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Starts the engine thread serving requests from `endpoint`.
    pub fn new(endpoint: EngineEndpoint, config: &ConnConfig) -> Result<Self> {
        let name = if config.database.is_empty() {
            "engine".to_string()
        } else {
            format!("engine-{}", config.database)
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (stop, stop_rx) = watch::channel(false);
        let running = Arc::new(AtomicBool::new(true));

        let thread_running = Arc::clone(&running);
        let thread_name = name.clone();
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _running = RunningFlag(thread_running);
                runtime.block_on(serve(endpoint, stop_rx));
                info!("{thread_name} stopped");
            })?;

        info!("{name} started");
        Ok(Self {
            name,
            stop,
            running,
            handle: Mutex::new(Some(handle)),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signals the loop to exit and waits for the thread. Requests still
    /// queued are dropped, so their sessions see `EngineStopped`.
    pub fn stop(&self) {
        // Fails only if the loop already exited.
        let _ = self.stop.send(true);

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("{} thread panicked", self.name);
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clears the running flag when the engine thread ends, including by panic.
struct RunningFlag(Arc<AtomicBool>);

impl Drop for RunningFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Serves requests until stopped. Returns the dispatcher with its final state.
async fn serve(mut endpoint: EngineEndpoint, mut stop: watch::Receiver<bool>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    loop {
        tokio::select! {
            biased;
            // A dropped sender also ends the loop.
            _ = stop.changed() => break,
            envelope = endpoint.accept() => match envelope {
                Some(envelope) => handle(&mut dispatcher, envelope),
                None => break,
            },
        }
    }
    endpoint.close();
    dispatcher
}

fn handle(dispatcher: &mut Dispatcher, envelope: Envelope) {
    let Envelope { session, request, reply } = envelope;
    let mut conn = ChannelEngineConn::new(session.clone(), reply);

    let outcome = match request {
        Request::Statement(text) => {
            debug!("[{session}] {text}");
            dispatcher.execute(&text, &mut conn)
        }
        Request::Batch(statements) => {
            debug!("[{session}] batch of {} statements", statements.len());
            dispatcher.execute_batch(&statements, &mut conn)
        }
    };
    if let Err(err) = outcome {
        error!("[{session}] failed to write reply: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::protocol::{channel_endpoints, DriverConn, Message};

    async fn roundtrip(conn: &DriverConn, sql: &str) -> Vec<Message> {
        let mut replies = conn.send(Request::Statement(sql.to_string())).await.unwrap();
        let mut messages = Vec::new();
        while let Some(message) = replies.next().await {
            messages.push(message);
        }
        messages
    }

    #[tokio::test]
    async fn test_engine_serves_requests_in_order() {
        let (driver, endpoint) = channel_endpoints(4);
        let engine = Engine::new(endpoint, &ConnConfig::default()).unwrap();
        let conn = driver.connect("test").unwrap();

        assert_eq!(
            roundtrip(&conn, "CREATE TABLE t (a INT)").await,
            vec![Message::Result { last_insert_id: 0, rows_affected: 1 }]
        );
        assert_eq!(
            roundtrip(&conn, "CREATE TABLE t (a INT)").await,
            vec![Message::Error("relation 't' already exists".into())]
        );
        roundtrip(&conn, "INSERT INTO t VALUES (7)").await;
        assert_eq!(
            roundtrip(&conn, "SELECT a FROM t").await,
            vec![
                Message::RowHeader(vec!["a".into()]),
                Message::Row(vec![Some("7".into())]),
                Message::RowEnd,
            ]
        );
        assert!(engine.is_running());
    }

    #[tokio::test]
    async fn test_stop_refuses_further_requests() {
        let (driver, endpoint) = channel_endpoints(4);
        let engine = Engine::new(endpoint, &ConnConfig::default()).unwrap();
        let conn = driver.connect("test").unwrap();

        engine.stop();
        assert!(!engine.is_running());
        assert!(matches!(
            conn.send(Request::Statement("DROP DATABASE x".into())).await,
            Err(Error::EngineStopped)
        ));

        // Idempotent.
        engine.stop();
    }

    #[tokio::test]
    async fn test_concurrent_sessions_create_every_relation() {
        let (driver, endpoint) = channel_endpoints(4);
        let (stop, stop_rx) = watch::channel(false);
        let server = tokio::spawn(serve(endpoint, stop_rx));

        let mut tasks = Vec::new();
        for i in 0..16 {
            let conn = driver.connect(format!("s{i}")).unwrap();
            tasks.push(tokio::spawn(async move {
                roundtrip(&conn, &format!("CREATE TABLE t{i} (a INT)")).await
            }));
        }
        for task in tasks {
            assert_eq!(
                task.await.unwrap(),
                vec![Message::Result { last_insert_id: 0, rows_affected: 1 }]
            );
        }

        stop.send(true).unwrap();
        let dispatcher = server.await.unwrap();
        let mut expected: Vec<String> = (0..16).map(|i| format!("t{i}")).collect();
        expected.sort();
        assert_eq!(dispatcher.database().relation_names(), expected);
    }

    #[test]
    fn test_running_flag_cleared_on_panic() {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let outcome = std::thread::spawn(move || {
            let _running = RunningFlag(flag);
            panic!("engine thread failed");
        })
        .join();
        assert!(outcome.is_err());
        assert!(!running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_engine_exits_when_drivers_are_gone() {
        let (driver, endpoint) = channel_endpoints(1);
        let engine = Engine::new(endpoint, &ConnConfig::default()).unwrap();
        drop(driver);

        let handle = engine.handle.lock().unwrap().take().unwrap();
        tokio::task::spawn_blocking(move || handle.join().unwrap()).await.unwrap();
        assert!(!engine.is_running());
    }
}
