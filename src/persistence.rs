//! Background persistence
//!
//! [`BackgroundStore`] moves settings writes off the UI tick. Writes are
//! queued per [`LayoutKey`] and handed to a worker thread; a newer write for
//! a key that is still queued replaces the older one, so the last writer
//! wins. Reads drain the queue first so they always observe earlier writes.

use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::{debug, error, info};

use crate::config::store::SettingsStore;
use crate::types::{ElementId, LayoutKey, Settings};

/// A background write that did not make it to storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoreFailure {
    pub key: LayoutKey,
    pub error: String,
}

#[derive(Default)]
struct QueueState {
    pending: HashMap<LayoutKey, Settings>,
    busy: bool,
    failures: Vec<StoreFailure>,
}

struct Shared {
    inner: Arc<dyn SettingsStore>,
    state: Mutex<QueueState>,
    idle: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write everything queued, then wake any flushers.
    fn drain(&self) {
        loop {
            let batch: Vec<(LayoutKey, Settings)> = {
                let mut state = self.lock();
                if state.pending.is_empty() {
                    state.busy = false;
                    self.idle.notify_all();
                    return;
                }
                state.busy = true;
                state.pending.drain().collect()
            };

            for (key, settings) in batch {
                match self.inner.store(&key, &settings) {
                    Ok(()) => debug!(layout = %key, "Background write complete"),
                    Err(err) => {
                        error!(layout = %key, error = %format!("{err:#}"), "Background write failed");
                        self.lock().failures.push(StoreFailure {
                            key,
                            error: format!("{err:#}"),
                        });
                    }
                }
            }
        }
    }
}

pub struct BackgroundStore {
    shared: Arc<Shared>,
    wake: Option<Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for BackgroundStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("BackgroundStore")
            .field("pending", &state.pending.len())
            .field("busy", &state.busy)
            .field("failures", &state.failures.len())
            .finish()
    }
}

impl BackgroundStore {
    /// Spawn the writer thread in front of `inner`
    pub fn spawn(inner: Arc<dyn SettingsStore>) -> Result<Self> {
        let shared = Arc::new(Shared {
            inner,
            state: Mutex::new(QueueState::default()),
            idle: Condvar::new(),
        });
        let (sender, receiver) = mpsc::channel();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("settings-writer".to_string())
            .spawn(move || run_worker(worker_shared, receiver))
            .context("Failed to spawn settings writer thread")?;

        info!("Settings writer started");
        Ok(Self {
            shared,
            wake: Some(sender),
            worker: Some(worker),
        })
    }

    /// Block until every queued write has been attempted
    pub fn flush(&self) {
        let mut state = self.shared.lock();
        while state.busy || !state.pending.is_empty() {
            state = self
                .shared
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Failed background writes since the last call
    pub fn take_failures(&self) -> Vec<StoreFailure> {
        std::mem::take(&mut self.shared.lock().failures)
    }
}

impl SettingsStore for BackgroundStore {
    fn retrieve(&self, key: &LayoutKey, element_ids: &[ElementId]) -> Result<Settings> {
        self.flush();
        self.shared.inner.retrieve(key, element_ids)
    }

    /// Queue the write and return immediately
    fn store(&self, key: &LayoutKey, settings: &Settings) -> Result<()> {
        let replaced = self
            .shared
            .lock()
            .pending
            .insert(key.clone(), settings.clone())
            .is_some();

        let sent = self.wake.as_ref().map(|wake| wake.send(()).is_ok()).unwrap_or(false);
        if !sent {
            self.shared.lock().pending.remove(key);
            return Err(anyhow!("Settings writer has stopped; {key} was not queued"));
        }

        debug!(layout = %key, replaced, "Queued settings write");
        Ok(())
    }
}

impl Drop for BackgroundStore {
    fn drop(&mut self) {
        // closing the channel lets the worker drain and exit
        self.wake.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Settings writer thread panicked");
            }
        }
        let failures = self.shared.lock().failures.len();
        info!(unreported_failures = failures, "Settings writer stopped");
    }
}

fn run_worker(shared: Arc<Shared>, wake: Receiver<()>) {
    while wake.recv().is_ok() {
        shared.drain();
    }
    shared.drain();
}
