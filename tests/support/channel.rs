//! Scripted channel transport for reconnection tests.
//!
//! Each `connect` call pops the next scripted outcome: a handshake failure,
//! or a connection that delivers its events in order and then either drops
//! or stays open until the test ends.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use fleetsync::{ChannelConnection, ChannelEvent, ChannelTransport, SyncError};

pub enum ConnectOutcome {
    /// Handshake fails with this error.
    Fail(SyncError),
    /// Handshake succeeds; the connection yields these events, then drops.
    ConnectThenDrop(Vec<ChannelEvent>),
    /// Handshake succeeds; the connection yields these events, then stays
    /// open until the channel is closed.
    ConnectThenPend(Vec<ChannelEvent>),
}

pub struct ScriptedChannelTransport {
    script: Mutex<VecDeque<ConnectOutcome>>,
    connects: Mutex<usize>,
}

impl ScriptedChannelTransport {
    pub fn new(outcomes: Vec<ConnectOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            connects: Mutex::new(0),
        }
    }

    /// Number of connect attempts observed so far.
    pub fn connect_count(&self) -> usize {
        *self.connects.lock().unwrap()
    }

    /// Append another outcome to the script.
    pub fn push(&self, outcome: ConnectOutcome) {
        self.script.lock().unwrap().push_back(outcome);
    }
}

#[async_trait]
impl ChannelTransport for ScriptedChannelTransport {
    async fn connect(&self, _token: &str) -> Result<Box<dyn ChannelConnection>, SyncError> {
        *self.connects.lock().unwrap() += 1;
        let outcome = self.script.lock().unwrap().pop_front();
        match outcome {
            None => Err(SyncError::Transport {
                status: None,
                message: "connection refused".into(),
            }),
            Some(ConnectOutcome::Fail(err)) => Err(err),
            Some(ConnectOutcome::ConnectThenDrop(events)) => Ok(Box::new(ScriptedConnection {
                events: events.into(),
                pend_after: false,
            })),
            Some(ConnectOutcome::ConnectThenPend(events)) => Ok(Box::new(ScriptedConnection {
                events: events.into(),
                pend_after: true,
            })),
        }
    }
}

struct ScriptedConnection {
    events: VecDeque<ChannelEvent>,
    pend_after: bool,
}

#[async_trait]
impl ChannelConnection for ScriptedConnection {
    async fn next_event(&mut self) -> Option<ChannelEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        if self.pend_after {
            std::future::pending::<()>().await;
        }
        None
    }
}
