// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A fixed number of threads that render whatever the cache pair
//! hands them, and nap when it has nothing to hand out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cache::SharedCache;
use error::CacheError;

/// How long an idle worker sleeps before asking again.
pub const IDLE_SLEEP: Duration = Duration::from_millis(100);

/// The running worker threads.  Dropping the pool stops and joins them.
#[derive(Debug)]
pub struct WorkerPool {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `threads` workers on `cache`.  Worker `i` uses `i` as its
    /// seed for finding work.
    pub fn spawn(cache: &SharedCache, threads: usize) -> Result<WorkerPool, CacheError> {
        let stop = Arc::new(AtomicBool::new(false));
        let mut pool = WorkerPool {
            stop: Arc::clone(&stop),
            handles: Vec::with_capacity(threads),
        };
        for seed in 0..threads {
            let cache = cache.clone();
            let stop = Arc::clone(&stop);
            let handle = thread::Builder::new()
                .name(format!("mandel-worker-{}", seed))
                .spawn(move || work(&cache, seed, &stop))
                .map_err(CacheError::Spawn)?;
            pool.handles.push(handle);
        }
        debug!(threads, "started worker pool");
        Ok(pool)
    }

    /// Number of worker threads.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True if the pool was started with no threads.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Asks every worker to stop once its current tile is done.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Stops the workers and waits for them.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn work(cache: &SharedCache, seed: usize, stop: &AtomicBool) {
    trace!(seed, "worker started");
    while !stop.load(Ordering::Acquire) {
        match cache.get_work(seed) {
            Ok(Some(tile)) => tile.render(),
            Ok(None) => thread::sleep(IDLE_SLEEP),
            Err(e) => {
                error!(seed, error = %e, "worker giving up");
                break;
            }
        }
    }
    trace!(seed, "worker stopped");
}
