//! Latest-wins background jobs.
//!
//! Work runs on its own thread and its result travels back over a channel tagged with the
//! generation that spawned it. Only the newest generation is ever handed to the owner; a result
//! from superseded work is dropped when polled.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use tracing::debug;

/// A background computation where each new request supersedes the previous one.
#[derive(Debug)]
pub struct LatestJob<T> {
    name: String,
    generation: u64,
    finished: u64,
    tx: Sender<(u64, T)>,
    rx: Receiver<(u64, T)>,
}

impl<T: Send + 'static> LatestJob<T> {
    /// Create a job slot; `name` labels its worker threads.
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            name: name.into(),
            generation: 0,
            finished: 0,
            tx,
            rx,
        }
    }

    /// Run `work` on a new thread. Any earlier in-flight work becomes stale.
    ///
    /// Returns the generation assigned to this request.
    pub fn spawn<F>(&mut self, work: F) -> io::Result<u64>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        thread::Builder::new()
            .name(format!("{}-{generation}", self.name))
            .spawn(move || {
                // The owner may be gone; the result is simply dropped then.
                let _ = tx.send((generation, work()));
            })?;
        Ok(generation)
    }

    /// The newest finished result, if one arrived since the last poll.
    pub fn poll(&mut self) -> Option<T> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok((generation, value)) if generation == self.generation => {
                    self.finished = generation;
                    latest = Some(value);
                }
                Ok((generation, _)) => {
                    debug!(job = %self.name, generation, current = self.generation, "discarding stale result");
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        latest
    }

    /// Block until the newest request finishes and return its result.
    pub fn wait(&mut self) -> Option<T> {
        if !self.is_pending() {
            return None;
        }
        while let Ok((generation, value)) = self.rx.recv() {
            if generation == self.generation {
                self.finished = generation;
                return Some(value);
            }
            debug!(job = %self.name, generation, "discarding stale result");
        }
        None
    }

    /// The newest request has not delivered a result yet.
    pub fn is_pending(&self) -> bool {
        self.finished < self.generation
    }

    /// Generation of the newest request (0 before the first spawn).
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
