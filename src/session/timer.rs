use std::sync::{
    Arc,
    atomic::{AtomicU32, AtomicU64, Ordering},
};
use std::time::Duration;

use tokio::{task::JoinHandle, time::interval};

const TICK: Duration = Duration::from_secs(1);

/// Counts whole seconds while running. The count survives `stop`.
#[derive(Debug, Default)]
pub struct Stopwatch {
    elapsed: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Stopwatch {
    pub fn start(&mut self) {
        self.stop();
        let elapsed = Arc::clone(&self.elapsed);
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(TICK);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                elapsed.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    pub fn set_elapsed(&self, secs: u64) {
        self.elapsed.store(secs, Ordering::Relaxed);
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Advisory rest countdown. Starting it again restarts from the full length.
#[derive(Debug, Default)]
pub struct Countdown {
    remaining: Arc<AtomicU32>,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn start(&mut self, secs: u32) {
        self.cancel();
        self.remaining.store(secs, Ordering::Relaxed);
        let remaining = Arc::clone(&self.remaining);
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(TICK);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let prev = remaining
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |r| r.checked_sub(1))
                    .unwrap_or(0);
                if prev <= 1 {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
        }
        self.remaining.store(0, Ordering::Relaxed);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Relaxed)
    }

    pub fn is_counting(&self) -> bool {
        self.remaining() > 0
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn stopwatch_counts_and_freezes() {
        let mut sw = Stopwatch::default();
        sw.start();
        sleep(Duration::from_millis(5_500)).await;
        assert_eq!(sw.elapsed(), 5);

        sw.stop();
        sleep(Duration::from_secs(10)).await;
        assert_eq!(sw.elapsed(), 5);
        assert!(!sw.is_running());

        sw.set_elapsed(100);
        sw.start();
        sleep(Duration::from_millis(2_500)).await;
        assert_eq!(sw.elapsed(), 102);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_down_and_stops_at_zero() {
        let mut cd = Countdown::default();
        cd.start(3);
        assert_eq!(cd.remaining(), 3);

        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(cd.remaining(), 2);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(cd.remaining(), 0);
        assert!(!cd.is_counting());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_restart_and_cancel() {
        let mut cd = Countdown::default();
        cd.start(60);
        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(cd.remaining(), 50);

        cd.start(60);
        assert_eq!(cd.remaining(), 60);
        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(cd.remaining(), 59);

        cd.cancel();
        assert_eq!(cd.remaining(), 0);
        sleep(Duration::from_secs(3)).await;
        assert_eq!(cd.remaining(), 0);
    }
}
