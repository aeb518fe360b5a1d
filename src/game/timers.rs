//! Cancelable per-room timers
//!
//! Each kind has at most one live task. Scheduling a kind aborts its previous
//! task and bumps the kind's epoch; firings post back into the room queue and
//! are ignored unless their epoch is still current.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::room::RoomCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Aiming deadline
    Turn,
    /// Fixed-rate physics clock
    Tick,
    /// Forfeit after a disconnect
    ReconnectGrace,
    /// Hand the turn over after a round ends
    RoundAdvance,
}

impl TimerKind {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        match self {
            TimerKind::Turn => 0,
            TimerKind::Tick => 1,
            TimerKind::ReconnectGrace => 2,
            TimerKind::RoundAdvance => 3,
        }
    }
}

#[derive(Default)]
struct TimerSlot {
    handle: Option<JoinHandle<()>>,
    epoch: u64,
}

/// Timer handles owned by one room
pub struct RoomTimers {
    room_tx: mpsc::Sender<RoomCommand>,
    slots: [TimerSlot; TimerKind::COUNT],
}

impl RoomTimers {
    pub fn new(room_tx: mpsc::Sender<RoomCommand>) -> Self {
        Self {
            room_tx,
            slots: Default::default(),
        }
    }

    /// Fire `kind` once after `delay`, replacing any live timer of that kind
    pub fn schedule_once(&mut self, kind: TimerKind, delay: Duration) {
        let epoch = self.reset(kind);
        let tx = self.room_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RoomCommand::Timer { kind, epoch }).await;
        });
        self.slots[kind.index()].handle = Some(handle);
    }

    /// Fire `kind` every `period` (first firing after one period)
    pub fn schedule_every(&mut self, kind: TimerKind, period: Duration) {
        let epoch = self.reset(kind);
        let tx = self.room_tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(RoomCommand::Timer { kind, epoch }).await.is_err() {
                    break;
                }
            }
        });
        self.slots[kind.index()].handle = Some(handle);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.reset(kind);
    }

    pub fn cancel_all(&mut self) {
        for kind in [
            TimerKind::Turn,
            TimerKind::Tick,
            TimerKind::ReconnectGrace,
            TimerKind::RoundAdvance,
        ] {
            self.cancel(kind);
        }
    }

    /// Whether a firing with this epoch belongs to the live timer of `kind`
    pub fn is_current(&self, kind: TimerKind, epoch: u64) -> bool {
        let slot = &self.slots[kind.index()];
        slot.handle.is_some() && slot.epoch == epoch
    }

    /// Forget a one-shot timer that has delivered its firing
    pub fn mark_fired(&mut self, kind: TimerKind) {
        self.slots[kind.index()].handle = None;
    }

    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.slots[kind.index()].handle.is_some()
    }

    fn reset(&mut self, kind: TimerKind) -> u64 {
        let slot = &mut self.slots[kind.index()];
        if let Some(handle) = slot.handle.take() {
            debug!(?kind, epoch = slot.epoch, "Cancelling timer");
            handle.abort();
        }
        slot.epoch = slot.epoch.wrapping_add(1);
        slot.epoch
    }
}

impl Drop for RoomTimers {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(handle) = slot.handle.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn next_firing(rx: &mut mpsc::Receiver<RoomCommand>) -> (TimerKind, u64) {
        match rx.recv().await {
            Some(RoomCommand::Timer { kind, epoch }) => (kind, epoch),
            other => panic!("expected timer firing, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut timers = RoomTimers::new(tx);
        let start = Instant::now();

        timers.schedule_once(TimerKind::Turn, Duration::from_millis(500));
        let (kind, epoch) = next_firing(&mut rx).await;

        assert_eq!(kind, TimerKind::Turn);
        assert!(timers.is_current(kind, epoch));
        assert_eq!(start.elapsed(), Duration::from_millis(500));

        timers.mark_fired(kind);
        assert!(!timers.is_active(kind));
        assert!(!timers.is_current(kind, epoch));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_previous() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut timers = RoomTimers::new(tx);
        let start = Instant::now();

        timers.schedule_once(TimerKind::Turn, Duration::from_millis(100));
        timers.schedule_once(TimerKind::Turn, Duration::from_millis(300));
        timers.schedule_once(TimerKind::ReconnectGrace, Duration::from_millis(1_000));

        let (kind, epoch) = next_firing(&mut rx).await;
        assert_eq!(kind, TimerKind::Turn);
        assert_eq!(epoch, 2);
        assert_eq!(start.elapsed(), Duration::from_millis(300));

        let (kind, _) = next_firing(&mut rx).await;
        assert_eq!(kind, TimerKind::ReconnectGrace);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_firing_is_stale() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut timers = RoomTimers::new(tx);

        timers.schedule_every(TimerKind::Tick, Duration::from_millis(10));
        let (kind, epoch) = next_firing(&mut rx).await;
        assert!(timers.is_current(kind, epoch));

        let (_, second) = next_firing(&mut rx).await;
        assert_eq!(second, epoch);

        timers.cancel(TimerKind::Tick);
        assert!(!timers.is_current(TimerKind::Tick, epoch));
        assert!(!timers.is_active(TimerKind::Tick));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_silences_everything() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut timers = RoomTimers::new(tx);
        timers.schedule_once(TimerKind::Turn, Duration::from_millis(10));
        timers.schedule_every(TimerKind::Tick, Duration::from_millis(10));
        timers.cancel_all();

        let outcome = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(outcome.is_err());
    }
}
