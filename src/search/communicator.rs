//! Process-wide coordination between the `JobRunner` and its workers: a
//! monotonic stop latch plus a sleep-with-wakeup for the control loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Condvar;
use std::sync::Mutex;
use std::time::Duration;

pub struct JobCommunicator {
    stop: AtomicBool,
    wake: Mutex<()>,
    condvar: Condvar,
}

impl JobCommunicator {
    #[must_use]
    pub fn new() -> JobCommunicator {
        JobCommunicator {
            stop: AtomicBool::new(false),
            wake: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    /// Sets the stop flag. Idempotent and safe from any thread.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        let _guard = self.wake.lock().unwrap_or_else(|p| p.into_inner());
        self.condvar.notify_all();
    }

    /// Clears the stop flag before a new search.
    pub fn reset(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }

    /// The hot-path poll used by workers at every node.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// The main thread's sleep-with-wakeup; returns true iff `stop` was
    /// observed either before or during the wait.
    #[must_use]
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        let guard = self.wake.lock().unwrap_or_else(|p| p.into_inner());
        let _ = self
            .condvar
            .wait_timeout_while(guard, duration, |()| !self.is_stopped())
            .unwrap_or_else(|p| p.into_inner());
        self.is_stopped()
    }
}

impl Default for JobCommunicator {
    fn default() -> JobCommunicator {
        JobCommunicator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn stop_is_idempotent_and_visible_immediately() {
        let comm = JobCommunicator::new();
        assert!(!comm.is_stopped());
        comm.stop();
        comm.stop();
        assert!(comm.is_stopped());
    }

    #[test]
    fn reset_clears_a_previously_stopped_latch() {
        let comm = JobCommunicator::new();
        comm.stop();
        comm.reset();
        assert!(!comm.is_stopped());
    }

    #[test]
    fn wait_returns_immediately_when_already_stopped() {
        let comm = JobCommunicator::new();
        comm.stop();
        assert!(comm.wait(Duration::from_secs(5)));
    }

    #[test]
    fn wait_wakes_up_promptly_when_stopped_from_another_thread() {
        let comm = Arc::new(JobCommunicator::new());
        let comm_clone = Arc::clone(&comm);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            comm_clone.stop();
        });
        let stopped = comm.wait(Duration::from_secs(5));
        handle.join().unwrap();
        assert!(stopped);
    }

    #[test]
    fn wait_times_out_when_never_stopped() {
        let comm = JobCommunicator::new();
        assert!(!comm.wait(Duration::from_millis(10)));
    }
}
