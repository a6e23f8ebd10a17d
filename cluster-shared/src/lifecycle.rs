/// Membership lifecycle rules
///
/// Pure functions over membership state: renewal-date arithmetic, the
/// preconditions of each admin transition, and the renewal-reminder window.
/// The ledger in [`crate::models::membership`] applies them inside a row
/// lock; nothing here touches the database.
///
/// | Operation | Precondition | Effect |
/// |---|---|---|
/// | apply | owns a company, no live membership | pending / pending |
/// | approve | status != active | active / paid |
/// | reject | status == pending | expired |
/// | renew | none | renewal = max(renewal, now) + 1 year, active / pending |
/// | record payment | amount finite and >= 0 | append entry, paid |
/// | set status | none | overwrite |

use chrono::{DateTime, Duration, Months, Utc};

use crate::models::membership::MembershipStatus;

/// Length of one membership period
pub const MEMBERSHIP_TERM_MONTHS: u32 = 12;

/// Reminders go out for renewals due within this many days
pub const RENEWAL_REMINDER_DAYS: i64 = 30;

/// Default membership level when an applicant doesn't name one
pub const DEFAULT_MEMBERSHIP_LEVEL: &str = "Estándar";

/// Rejected lifecycle transitions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    /// Applicant has no company profile yet
    #[error("You must register a company before applying for a membership")]
    CompanyRequired,

    /// Applicant already holds an active or pending membership
    #[error("You already have an active or pending membership")]
    LiveMembershipExists,

    /// Approve called on an active membership
    #[error("Membership is already active")]
    AlreadyActive,

    /// Reject called on a membership that isn't pending
    #[error("Membership is not pending approval")]
    NotPending,

    /// Negative, NaN or infinite payment amount
    #[error("Payment amount must be a non-negative number")]
    InvalidAmount,

    /// Date arithmetic left chrono's supported range
    #[error("Date is out of range")]
    DateOutOfRange,
}

/// Adds one membership term to a date
///
/// Month arithmetic clamps to the end of the month, so Feb 29 rolls to
/// Feb 28 of the following year.
pub fn add_term(date: DateTime<Utc>) -> Result<DateTime<Utc>, LifecycleError> {
    date.checked_add_months(Months::new(MEMBERSHIP_TERM_MONTHS))
        .ok_or(LifecycleError::DateOutOfRange)
}

/// Renewal date of a new membership starting at `start`
pub fn initial_renewal_date(start: DateTime<Utc>) -> Result<DateTime<Utc>, LifecycleError> {
    add_term(start)
}

/// Renewal date after renewing at `now`
///
/// Extends from the current renewal date when it is still in the future,
/// otherwise from `now`, so a renewal never shortens a paid period.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use cluster_shared::lifecycle::next_renewal_date;
///
/// let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
/// let lapsed = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
/// assert_eq!(
///     next_renewal_date(lapsed, now).unwrap(),
///     Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
/// );
/// ```
pub fn next_renewal_date(
    current_renewal: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, LifecycleError> {
    add_term(current_renewal.max(now))
}

/// Approve is allowed from any status except active
pub fn check_approve(status: MembershipStatus) -> Result<(), LifecycleError> {
    if status == MembershipStatus::Active {
        return Err(LifecycleError::AlreadyActive);
    }
    Ok(())
}

/// Reject is only allowed while pending
pub fn check_reject(status: MembershipStatus) -> Result<(), LifecycleError> {
    if status != MembershipStatus::Pending {
        return Err(LifecycleError::NotPending);
    }
    Ok(())
}

pub fn check_payment_amount(amount: f64) -> Result<(), LifecycleError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(LifecycleError::InvalidAmount);
    }
    Ok(())
}

/// `[now, now + 30 days]`, the window of renewals that get a reminder
pub fn reminder_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::days(RENEWAL_REMINDER_DAYS))
}
