/// Renewal reminder scheduler
///
/// Runs the reminder sweep on a fixed interval until its shutdown token is
/// cancelled. The first sweep starts immediately. A failed sweep is logged
/// and retried at the next tick; it never stops the loop.
///
/// # Example
///
/// ```no_run
/// use cluster_worker::scheduler::ReminderScheduler;
/// use cluster_shared::notify::{MailConfig, Notifier};
/// use sqlx::PgPool;
/// use std::time::Duration;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let notifier = Notifier::from_config(&MailConfig::default())?;
/// let scheduler = ReminderScheduler::new(pool, notifier, Duration::from_secs(86_400));
///
/// let shutdown = scheduler.shutdown_token();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// scheduler.run().await;
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use cluster_shared::{
    notify::Notifier,
    reminders::{send_renewal_reminders, ReminderScope, ReminderSummary},
};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct ReminderScheduler {
    db: PgPool,
    notifier: Notifier,
    interval: Duration,
    shutdown_token: CancellationToken,
}

impl ReminderScheduler {
    pub fn new(db: PgPool, notifier: Notifier, interval: Duration) -> Self {
        Self {
            db,
            notifier,
            interval,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token that stops [`run`](Self::run) when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs a single sweep as of now, skipping members already reminded
    /// for their current renewal date
    pub async fn run_once(&self) -> Result<ReminderSummary, sqlx::Error> {
        send_renewal_reminders(
            &self.db,
            &self.notifier,
            Utc::now(),
            ReminderScope::NotYetReminded,
        )
        .await
    }

    /// Sweeps every interval until shutdown
    pub async fn run(&self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Reminder scheduler starting");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Reminder scheduler shut down");
                    break;
                }

                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(summary) if summary.failed() > 0 => tracing::warn!(
                            sent = summary.sent,
                            failed = summary.failed(),
                            "Some renewal reminders were not delivered"
                        ),
                        Ok(summary) => tracing::debug!(sent = summary.sent, "Sweep complete"),
                        Err(e) => tracing::error!(error = %e, "Renewal reminder sweep failed"),
                    }
                }
            }
        }
    }
}
