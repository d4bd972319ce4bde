//! Advisory previews computed off the input path.
//!
//! Each request is tagged with a generation number. Only a result carrying
//! the latest generation is ever handed back; anything older was computed
//! for a buffer that has since changed and is dropped on receipt.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::grammar::command::{Invocation, PreviewFn};

type PreviewMessage = (u64, Option<String>);

pub struct PreviewRunner {
    generation: u64,
    tx: Sender<PreviewMessage>,
    rx: Receiver<PreviewMessage>,
}

impl Default for PreviewRunner {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            generation: 0,
            tx,
            rx,
        }
    }
}

impl PreviewRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start computing a preview on a worker thread. Earlier requests
    /// become stale.
    pub fn request(&mut self, preview: PreviewFn, invocation: Invocation) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("preview-{generation}"))
            .spawn(move || {
                let output = preview(&invocation);
                // the runner may be gone by now
                let _ = tx.send((generation, output));
            });
        if let Err(e) = spawned {
            warn!("failed to spawn preview worker: {e}");
        }
        generation
    }

    /// Invalidate any in-flight preview without starting a new one.
    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    /// Return the current preview if it has arrived.
    pub fn poll(&mut self) -> Option<String> {
        while let Ok((generation, output)) = self.rx.try_recv() {
            if let Some(output) = self.accept(generation, output) {
                return Some(output);
            }
        }
        None
    }

    /// Block until the current preview arrives or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok((generation, output)) => {
                    if generation == self.generation {
                        return output;
                    }
                    self.accept(generation, output);
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!("preview {} timed out after {:?}", self.generation, timeout);
                    return None;
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn accept(&self, generation: u64, output: Option<String>) -> Option<String> {
        if generation == self.generation {
            output
        } else {
            debug!(
                "dropping stale preview {} (current {})",
                generation, self.generation
            );
            None
        }
    }
}
