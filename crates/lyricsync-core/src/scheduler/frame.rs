//! Draw-loop tick scheduling, decoupled from any particular event loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

pub type TickCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

/// Requests a single callback on the next frame, like `requestAnimationFrame`
pub trait Scheduler: Send {
    fn schedule_tick(&mut self, callback: TickCallback) -> TickHandle;

    /// Cancel a tick that has not fired yet. Unknown or fired handles are ignored.
    fn cancel(&mut self, handle: TickHandle);
}

/// Fires each tick one frame interval later on the tokio runtime
#[derive(Debug)]
pub struct TokioFrameScheduler {
    frame: Duration,
    next_id: u64,
    tasks: HashMap<TickHandle, JoinHandle<()>>,
}

impl TokioFrameScheduler {
    pub fn new(frame: Duration) -> Self {
        Self {
            // zero would spin the runtime
            frame: frame.max(Duration::from_millis(1)),
            next_id: 0,
            tasks: HashMap::new(),
        }
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }
}

impl Scheduler for TokioFrameScheduler {
    fn schedule_tick(&mut self, callback: TickCallback) -> TickHandle {
        self.tasks.retain(|_, task| !task.is_finished());

        let handle = TickHandle(self.next_id);
        self.next_id += 1;

        let frame = self.frame;
        let task = tokio::spawn(async move {
            tokio::time::sleep(frame).await;
            callback();
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioFrameScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    pending: Vec<(TickHandle, TickCallback)>,
}

/// Ticks fire only when [`fire`](Self::fire) is called. Clones share the queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every tick scheduled so far; ticks scheduled by the callbacks wait for the next call
    pub fn fire(&self) -> usize {
        let due = std::mem::take(&mut self.state.lock().pending);
        let count = due.len();
        for (_, callback) in due {
            callback();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_tick(&mut self, callback: TickCallback) -> TickHandle {
        let mut state = self.state.lock();
        let handle = TickHandle(state.next_id);
        state.next_id += 1;
        state.pending.push((handle, callback));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.state.lock().pending.retain(|(h, _)| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> TickCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let make = {
            let count = Arc::clone(&count);
            move || -> TickCallback {
                let count = Arc::clone(&count);
                Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
            }
        };
        (count, make)
    }

    #[test]
    fn test_manual_fire_and_cancel() {
        let (count, make) = counter();
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.schedule_tick(make());
        scheduler.schedule_tick(make());
        scheduler.cancel(a);
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.fire(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.fire(), 0);
    }

    #[test]
    fn test_manual_reschedule_waits_for_next_fire() {
        let scheduler = ManualScheduler::new();
        let inner = scheduler.clone();
        let mut outer = scheduler.clone();
        outer.schedule_tick(Box::new(move || {
            let mut inner = inner;
            inner.schedule_tick(Box::new(|| {}));
        }));

        assert_eq!(scheduler.fire(), 1);
        assert_eq!(scheduler.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_tick_fires_after_one_frame() {
        let (count, make) = counter();
        let mut scheduler = TokioFrameScheduler::new(Duration::from_millis(16));
        scheduler.schedule_tick(make());

        tokio::time::sleep(Duration::from_millis(8)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(16)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_frame_is_raised() {
        assert_eq!(TokioFrameScheduler::new(Duration::ZERO).frame(), Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_cancel() {
        let (count, make) = counter();
        let mut scheduler = TokioFrameScheduler::new(Duration::from_millis(16));
        let handle = scheduler.schedule_tick(make());
        scheduler.cancel(handle);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
