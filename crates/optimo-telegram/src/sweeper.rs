//! Reminder delivery sweep.
//!
//! A sweep ranges every reminder due at or before now, takes a delivery lease
//! on each, sends it, and removes it only after the send succeeded. A failed
//! send releases the lease so the next sweep retries.
//!
//! # Delivery guarantees
//!
//! - A reminder is never sent before its due time.
//! - Delivery is at-least-once. Overlapping sweeps (cron plus the in-process
//!   loop, or several instances) do not double-send: the lease admits one
//!   sweeper per reminder, and a successful send leaves the lease in place
//!   until it expires. A duplicate needs a successful send, a failed removal
//!   and the lease expiring before a later sweep.
//! - Delivery delay is bounded by the sweep interval. A 5-minute cron against
//!   minute-level reminders delivers up to 5 minutes late.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use optimo_persistence::ReminderStore;

use crate::error::Result;
use crate::messages;
use crate::transport::{ChatTransport, SendOptions};

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Delivered and removed.
    pub sent: usize,
    /// Send failed; left pending for the next sweep.
    pub failed: usize,
    /// Leased by a concurrent sweep.
    pub skipped: usize,
}

/// Delivers due reminders through a [`ChatTransport`].
#[derive(Clone)]
pub struct Sweeper {
    reminders: ReminderStore,
    transport: Arc<dyn ChatTransport>,
    lease: Duration,
}

impl Sweeper {
    pub fn new(reminders: ReminderStore, transport: Arc<dyn ChatTransport>, lease: Duration) -> Self {
        Self {
            reminders,
            transport,
            lease,
        }
    }

    /// Runs one sweep at `now_ms`.
    ///
    /// Store failures abort the sweep; transport failures only count as
    /// `failed`.
    pub async fn run(&self, now_ms: i64) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for stored in self.reminders.due(now_ms).await? {
            let reminder = &stored.reminder;

            if !self.reminders.claim(reminder, self.lease).await? {
                debug!(id = %reminder.id, "Reminder leased by another sweep");
                report.skipped += 1;
                continue;
            }

            let text = messages::reminder_delivery(&reminder.task);
            match self
                .transport
                .send_message(reminder.chat_id, &text, SendOptions::plain())
                .await
            {
                Ok(()) => {
                    report.sent += 1;
                    if let Err(e) = self.reminders.remove(&stored).await {
                        warn!(id = %reminder.id, error = %e, "Reminder delivered but not removed; lease holds until expiry");
                    }
                    info!(id = %reminder.id, chat_id = reminder.chat_id, "Reminder delivered");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(id = %reminder.id, chat_id = reminder.chat_id, error = %e, "Reminder delivery failed, will retry");
                    if let Err(e) = self.reminders.release(reminder).await {
                        warn!(id = %reminder.id, error = %e, "Failed to release lease; retry waits for expiry");
                    }
                }
            }
        }

        if report != SweepReport::default() {
            info!(
                sent = report.sent,
                failed = report.failed,
                skipped = report.skipped,
                "Sweep finished"
            );
        }
        Ok(report)
    }

    /// Runs one sweep at the current time.
    pub async fn run_now(&self) -> Result<SweepReport> {
        self.run(Utc::now().timestamp_millis()).await
    }

    /// Sweeps every `period` until the returned task is aborted.
    pub fn spawn_loop(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(period_secs = period.as_secs(), "In-process sweep loop started");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_now().await {
                    warn!(error = %e, "Sweep failed");
                }
            }
        })
    }
}
