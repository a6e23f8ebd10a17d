/// Renewal reminder sweep
///
/// Finds active memberships renewing within the reminder window and emails
/// each owner. Sends are sequential; one failed send doesn't stop the sweep.
/// Each delivered reminder is stamped on the membership so the scheduled
/// sweep can skip owners it already reminded this term.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::lifecycle;
use crate::models::membership::Membership;
use crate::notify::Notifier;

/// Which due memberships a sweep covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderScope {
    /// Every due membership, whether or not it was reminded before
    AllDue,
    /// Due memberships not yet reminded for their current renewal date
    NotYetReminded,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSummary {
    /// Reminders delivered
    pub sent: usize,
    /// Memberships that were due
    pub total_memberships: usize,
}

impl ReminderSummary {
    pub fn failed(&self) -> usize {
        self.total_memberships - self.sent
    }

    /// Human-readable result line
    pub fn message(&self) -> String {
        if self.total_memberships == 0 {
            "No memberships are due for renewal".to_string()
        } else {
            format!("Sent {} renewal reminders", self.sent)
        }
    }
}

/// Emails every owner in `scope` whose membership renews within the
/// window around `now`
pub async fn send_renewal_reminders(
    pool: &PgPool,
    notifier: &Notifier,
    now: DateTime<Utc>,
    scope: ReminderScope,
) -> Result<ReminderSummary, sqlx::Error> {
    let (from, to) = lifecycle::reminder_window(now);
    let skip_reminded = scope == ReminderScope::NotYetReminded;
    let due = Membership::due_for_reminder(pool, from, to, skip_reminded).await?;

    let mut summary = ReminderSummary {
        sent: 0,
        total_memberships: due.len(),
    };

    for recipient in &due {
        let message = notifier.templates().renewal_reminder(
            &recipient.email,
            &recipient.first_name,
            &recipient.company_name,
            recipient.renewal_date,
        );

        if notifier.notify(message).await {
            Membership::mark_reminded(pool, recipient.membership_id, now).await?;
            summary.sent += 1;
        } else {
            tracing::warn!(
                membership_id = %recipient.membership_id,
                "Renewal reminder not delivered"
            );
        }
    }

    tracing::info!(
        sent = summary.sent,
        total = summary.total_memberships,
        "Renewal reminder sweep finished"
    );

    Ok(summary)
}
