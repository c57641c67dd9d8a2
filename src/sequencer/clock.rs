// Tick clock - background timer emitting one event per beat
//
// Ticks go through a channel of capacity 1: if the owner has not consumed
// the previous tick yet, the new one is coalesced instead of queued, so the
// owner never runs two ticks back to back to catch up.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// One timer firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Firing number since the clock started (gaps mean coalesced ticks)
    pub sequence: u64,
}

pub struct TickClock {
    period: Duration,
    ticks: Receiver<Tick>,
    stop_tx: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
    coalesced: Arc<AtomicU64>,
}

impl TickClock {
    /// Spawn the timer thread; the first tick fires one period from now
    pub fn start(period: Duration) -> Self {
        let (tick_tx, ticks) = bounded(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let coalesced = Arc::new(AtomicU64::new(0));

        let handle = Self::spawn_timer_thread(period, tick_tx, stop_rx, coalesced.clone());
        log::debug!("Tick clock armed with period {:?}", period);

        Self {
            period,
            ticks,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            coalesced,
        }
    }

    fn spawn_timer_thread(
        period: Duration,
        tick_tx: Sender<Tick>,
        stop_rx: Receiver<()>,
        coalesced: Arc<AtomicU64>,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let started = Instant::now();
            let mut sequence: u64 = 0;

            loop {
                // Deadlines are absolute so a slow iteration does not drift the grid
                let multiple = u32::try_from(sequence + 1).unwrap_or(u32::MAX);
                let Some(deadline) = started.checked_add(period.saturating_mul(multiple)) else {
                    break;
                };

                match stop_rx.recv_deadline(deadline) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                sequence += 1;
                match tick_tx.try_send(Tick { sequence }) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        coalesced.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Receiving end; usable with `crossbeam_channel::select!`
    pub fn ticks(&self) -> &Receiver<Tick> {
        &self.ticks
    }

    /// Block until the next tick; None once the clock is stopped
    pub fn wait(&self) -> Option<Tick> {
        self.ticks.recv().ok()
    }

    /// Next tick if one is pending
    pub fn poll(&self) -> Option<Tick> {
        match self.ticks.try_recv() {
            Ok(tick) => Some(tick),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Ticks that fired while a previous one was still pending
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Cancel the timer; no tick fires after this returns
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Tick clock thread panicked");
            }
            log::debug!("Tick clock stopped");
        }

        // Discard a tick that fired just before the stop
        while self.ticks.try_recv().is_ok() {}
    }
}

impl Drop for TickClock {
    fn drop(&mut self) {
        self.stop();
    }
}
