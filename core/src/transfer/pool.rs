//! Concurrent driver for many transfer handles on one thread.

use std::collections::BTreeMap;
use std::time::Duration;

use curl::multi::{Easy2Handle, Multi};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::transfer::single::{Sink, TransferHandle};

/// Index of a handle within one pool run, in registration order.
pub type PoolKey = usize;

/// How long one wait may block when no socket reports activity.
const WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Pool-level tuning forwarded to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOption {
    /// HTTP/1 pipelining and HTTP/2 multiplexing switches.
    Pipelining { http1: bool, multiplex: bool },
    MaxHostConnections(usize),
    MaxTotalConnections(usize),
    MaxConnects(usize),
    MaxPipelineLength(usize),
}

pub struct TransferPool {
    multi: Multi,
    handles: Vec<Easy2Handle<Sink>>,
}

impl Default for TransferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferPool")
            .field("handles", &self.handles.len())
            .finish()
    }
}

impl TransferPool {
    pub fn new() -> Self {
        Self {
            multi: Multi::new(),
            handles: Vec::new(),
        }
    }

    pub fn set_option(&mut self, option: PoolOption) -> Result<()> {
        match option {
            PoolOption::Pipelining { http1, multiplex } => self.multi.pipelining(http1, multiplex),
            PoolOption::MaxHostConnections(max) => self.multi.set_max_host_connections(max),
            PoolOption::MaxTotalConnections(max) => self.multi.set_max_total_connections(max),
            PoolOption::MaxConnects(max) => self.multi.set_max_connects(max),
            PoolOption::MaxPipelineLength(max) => self.multi.set_pipeline_length(max),
        }
        .map_err(Error::batch)
    }

    /// Register a handle. The accumulator is reset before the handle is
    /// attached, so a rejected handle is simply dropped.
    pub fn add(&mut self, mut handle: TransferHandle) -> Result<PoolKey> {
        handle.sink_mut().reset()?;
        let key = self.handles.len();
        let mut attached = self.multi.add2(handle.into_easy()).map_err(Error::batch)?;
        attached.set_token(key).map_err(Error::engine)?;
        self.handles.push(attached);
        Ok(key)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drive every registered transfer to completion.
    ///
    /// Returns the captured body of each transfer keyed by its `PoolKey`.
    /// The first failure, of the pool or of any member, aborts the run.
    pub fn execute(&mut self) -> Result<BTreeMap<PoolKey, Vec<u8>>> {
        let mut outcomes = BTreeMap::new();
        loop {
            let running = self.multi.perform().map_err(Error::batch)?;
            self.multi.messages(|message| {
                if let (Ok(key), Some(result)) = (message.token(), message.result()) {
                    outcomes.insert(key, result);
                }
            });
            trace!(running, completed = outcomes.len(), "pool iteration");
            if running == 0 {
                break;
            }
            self.multi.wait(&mut [], WAIT_TIMEOUT).map_err(Error::batch)?;
        }

        let mut bodies = BTreeMap::new();
        for (key, handle) in self.handles.iter_mut().enumerate() {
            let outcome = match outcomes.remove(&key) {
                Some(outcome) => outcome,
                None => {
                    warn!(key, "transfer left the pool without a completion message");
                    return Err(Error::BatchTransfer {
                        message: format!("no completion reported for transfer {key}"),
                        code: 0,
                    });
                }
            };
            bodies.insert(key, handle.get_mut().finish(outcome)?);
        }
        debug!(transfers = bodies.len(), "pool run complete");
        Ok(bodies)
    }

    /// Detach every handle and hand it back, in key order.
    pub fn release(self) -> Result<Vec<TransferHandle>> {
        let TransferPool { multi, handles } = self;
        handles
            .into_iter()
            .map(|handle| {
                multi
                    .remove2(handle)
                    .map(TransferHandle::from_easy)
                    .map_err(Error::batch)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_registration_order() {
        let mut pool = TransferPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.add(TransferHandle::new()).unwrap(), 0);
        assert_eq!(pool.add(TransferHandle::new()).unwrap(), 1);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.release().unwrap().len(), 2);
    }

    #[test]
    fn tuning_options_are_accepted() {
        let mut pool = TransferPool::new();
        pool.set_option(PoolOption::MaxHostConnections(4)).unwrap();
        pool.set_option(PoolOption::MaxTotalConnections(8)).unwrap();
        pool.set_option(PoolOption::MaxConnects(8)).unwrap();
    }
}
