//! Disk scheduler: serializes page I/O onto a single background worker.
//!
//! Callers enqueue [`DiskRequest`]s and later block on the request's
//! [`DiskFuture`]. The queue is FIFO; pipelining is obtained by scheduling
//! several requests before waiting on any of their futures. A `None` in the
//! queue is the shutdown sentinel: the worker drains up to it and exits.

use log::{debug, error};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use crate::common::config::{PageId, DB_PAGE_SIZE};
use crate::storage::disk::disk_manager::DiskManager;

pub type PageBuffer = Arc<Mutex<Box<[u8; DB_PAGE_SIZE]>>>;

/// A write or read request for the disk manager to execute.
pub struct DiskRequest {
    /// True for a write, false for a read.
    pub is_write: bool,
    /// Shared buffer the worker reads from (write) or fills (read).
    pub data: PageBuffer,
    /// Page being read from / written to disk.
    pub page_id: PageId,
    /// Fulfilled with the outcome once the request completes.
    pub callback: DiskSchedulerPromise,
}

struct PromiseState {
    result: Mutex<Option<bool>>,
    cond: Condvar,
}

/// Completion handle pair. The scheduler keeps the promise half; the caller
/// keeps the future half and blocks on [`DiskFuture::wait`].
pub struct DiskSchedulerPromise {
    state: Arc<PromiseState>,
}

pub struct DiskFuture {
    state: Arc<PromiseState>,
}

impl DiskSchedulerPromise {
    fn complete(&self, success: bool) {
        let mut result = self.state.result.lock();
        *result = Some(success);
        self.state.cond.notify_all();
    }
}

impl DiskFuture {
    /// Blocks until the paired promise is fulfilled and returns the outcome.
    pub fn wait(&self) -> bool {
        let mut result = self.state.result.lock();
        while result.is_none() {
            self.state.cond.wait(&mut result);
        }
        result.unwrap()
    }
}

type RequestQueue = Arc<(Mutex<VecDeque<Option<DiskRequest>>>, Condvar)>;

/// Schedules disk read and write operations on a background worker thread.
pub struct DiskScheduler {
    request_queue: RequestQueue,
    background_thread: Option<thread::JoinHandle<()>>,
}

impl DiskScheduler {
    pub fn new(disk_manager: Arc<dyn DiskManager>) -> Self {
        let request_queue: RequestQueue = Arc::new((Mutex::new(VecDeque::new()), Condvar::new()));

        let worker_queue = Arc::clone(&request_queue);
        let background_thread = thread::spawn(move || {
            Self::start_worker_thread(worker_queue, disk_manager);
        });

        Self {
            request_queue,
            background_thread: Some(background_thread),
        }
    }

    /// Creates a linked promise/future pair for a request.
    pub fn create_promise() -> (DiskSchedulerPromise, DiskFuture) {
        let state = Arc::new(PromiseState {
            result: Mutex::new(None),
            cond: Condvar::new(),
        });
        (
            DiskSchedulerPromise {
                state: Arc::clone(&state),
            },
            DiskFuture { state },
        )
    }

    /// Enqueues a request. Non-blocking; completion is reported through the
    /// request's promise.
    pub fn schedule(&self, request: DiskRequest) {
        let (lock, cvar) = &*self.request_queue;
        let mut queue = lock.lock();
        queue.push_back(Some(request));
        cvar.notify_one();
    }

    /// Convenience wrapper: builds the request, schedules it, and returns the
    /// future to wait on.
    pub fn schedule_io(&self, is_write: bool, data: PageBuffer, page_id: PageId) -> DiskFuture {
        let (promise, future) = Self::create_promise();
        self.schedule(DiskRequest {
            is_write,
            data,
            page_id,
            callback: promise,
        });
        future
    }

    /// Enqueues the shutdown sentinel; the worker exits after draining.
    pub fn destroy(&self) {
        let (lock, cvar) = &*self.request_queue;
        let mut queue = lock.lock();
        queue.push_back(None);
        cvar.notify_one();
    }

    fn start_worker_thread(queue: RequestQueue, disk_manager: Arc<dyn DiskManager>) {
        let (lock, cvar) = &*queue;
        loop {
            let request = {
                let mut queue = lock.lock();
                while queue.is_empty() {
                    cvar.wait(&mut queue);
                }
                queue.pop_front().unwrap()
            };

            let Some(request) = request else {
                debug!("disk scheduler worker received shutdown sentinel");
                break;
            };

            let success = {
                let mut data = request.data.lock();
                if request.is_write {
                    disk_manager.write_page(request.page_id, &data)
                } else {
                    disk_manager.read_page(request.page_id, &mut data)
                }
            };
            if !success {
                error!(
                    "disk {} failed for page {}",
                    if request.is_write { "write" } else { "read" },
                    request.page_id
                );
            }
            request.callback.complete(success);
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        self.destroy();
        if let Some(handle) = self.background_thread.take() {
            handle.join().unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::disk::disk_manager::MemoryDiskManager;

    fn buffer() -> PageBuffer {
        Arc::new(Mutex::new(Box::new([0u8; DB_PAGE_SIZE])))
    }

    #[test]
    fn test_schedule_write_then_read() {
        let dm = Arc::new(MemoryDiskManager::new());
        let scheduler = DiskScheduler::new(dm);

        let write_buf = buffer();
        write_buf.lock()[0] = 42;
        assert!(scheduler.schedule_io(true, Arc::clone(&write_buf), 7).wait());

        let read_buf = buffer();
        assert!(scheduler.schedule_io(false, Arc::clone(&read_buf), 7).wait());
        assert_eq!(read_buf.lock()[0], 42);
    }

    #[test]
    fn test_pipelined_requests_complete_in_order() {
        let dm = Arc::new(MemoryDiskManager::new());
        let scheduler = DiskScheduler::new(dm);

        let mut futures = Vec::new();
        for i in 0..16u64 {
            let buf = buffer();
            buf.lock()[0] = i as u8;
            futures.push(scheduler.schedule_io(true, buf, i));
        }
        for future in futures {
            assert!(future.wait());
        }

        let read_buf = buffer();
        assert!(scheduler.schedule_io(false, Arc::clone(&read_buf), 15).wait());
        assert_eq!(read_buf.lock()[0], 15);
    }
}
