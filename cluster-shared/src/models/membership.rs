/// Membership ledger
///
/// A membership links a user and their company to a yearly term with a
/// status, a payment status and an append-only payment history. Every
/// transition that reads then writes a membership runs in a transaction
/// holding the row lock, and the rules themselves live in
/// [`crate::lifecycle`].
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_status AS ENUM ('active', 'pending', 'expired');
/// CREATE TYPE payment_status AS ENUM ('paid', 'pending', 'overdue');
///
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     -- NO ACTION: a company with memberships cannot be deleted
///     company_id UUID NOT NULL REFERENCES companies(id),
///     membership_level VARCHAR(100) NOT NULL DEFAULT 'Estándar',
///     start_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     renewal_date TIMESTAMPTZ NOT NULL,
///     status membership_status NOT NULL DEFAULT 'pending',
///     payment_status payment_status NOT NULL DEFAULT 'pending',
///     last_reminded_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX memberships_one_live_per_user
///     ON memberships(user_id) WHERE status IN ('active', 'pending');
///
/// CREATE TABLE membership_payments (
///     seq BIGSERIAL PRIMARY KEY,
///     membership_id UUID NOT NULL REFERENCES memberships(id) ON DELETE CASCADE,
///     paid_at TIMESTAMPTZ NOT NULL,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
///     description TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use cluster_shared::models::membership::{Membership, NewPayment};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let approved = Membership::approve(&pool, id).await?;
/// let paid = Membership::record_payment(&pool, id, NewPayment {
///     amount: 2500.0,
///     description: "Cuota anual".to_string(),
///     date: None,
/// }).await?;
/// assert_eq!(paid.payment_history.len(), approved.payment_history.len() + 1);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::company::CompanySector;
use crate::lifecycle::{self, LifecycleError};

/// Partial unique index enforcing one live membership per user
pub const LIVE_MEMBERSHIP_CONSTRAINT: &str = "memberships_one_live_per_user";

const MEMBERSHIP_COLUMNS: &str = "m.id, m.user_id, m.company_id, m.membership_level, \
     m.start_date, m.renewal_date, m.status, m.payment_status, m.created_at, m.updated_at";

/// Lifecycle status of a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Pending,
    Expired,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Pending => "pending",
            MembershipStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MembershipStatus::Active),
            "pending" => Ok(MembershipStatus::Pending),
            "expired" => Ok(MembershipStatus::Expired),
            other => Err(format!("Invalid membership status: {}", other)),
        }
    }
}

/// Payment status of a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "pending" => Ok(PaymentStatus::Pending),
            "overdue" => Ok(PaymentStatus::Overdue),
            other => Err(format!("Invalid payment status: {}", other)),
        }
    }
}

/// One recorded payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentEntry {
    /// When the payment was made
    #[sqlx(rename = "paid_at")]
    pub date: DateTime<Utc>,

    pub amount: f64,

    pub description: String,
}

/// Payment to append to a membership's history
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: f64,
    pub description: String,
    /// Defaults to now
    pub date: Option<DateTime<Utc>>,
}

/// Application for a new membership
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub membership_level: String,
    /// Defaults to now
    pub start_date: Option<DateTime<Utc>>,
}

/// Membership record with its payment history
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub membership_level: String,
    pub start_date: DateTime<Utc>,
    /// End of the current paid period
    pub renewal_date: DateTime<Utc>,
    pub status: MembershipStatus,
    pub payment_status: PaymentStatus,
    /// Payments in insertion order
    #[sqlx(skip)]
    pub payment_history: Vec<PaymentEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner fields shown next to a membership in admin listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Company fields shown next to a membership
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub company_name: String,
    pub sector: CompanySector,
}

/// Membership joined with its owner and company
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDetail {
    #[serde(flatten)]
    pub membership: Membership,
    pub user: MemberSummary,
    pub company: CompanySummary,
}

#[derive(sqlx::FromRow)]
struct MembershipDetailRow {
    #[sqlx(flatten)]
    membership: Membership,
    owner_email: String,
    owner_first_name: String,
    owner_last_name: String,
    company_name: String,
    company_sector: CompanySector,
}

impl From<MembershipDetailRow> for MembershipDetail {
    fn from(row: MembershipDetailRow) -> Self {
        Self {
            membership: row.membership,
            user: MemberSummary {
                email: row.owner_email,
                first_name: row.owner_first_name,
                last_name: row.owner_last_name,
            },
            company: CompanySummary {
                company_name: row.company_name,
                sector: row.company_sector,
            },
        }
    }
}

/// Who to notify about a membership
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MembershipRecipient {
    pub membership_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub company_name: String,
    pub renewal_date: DateTime<Utc>,
}

/// Filters for the admin listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipFilter {
    pub status: Option<MembershipStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Error type for ledger operations
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("Membership not found")]
    NotFound,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Reports a hit on the live-membership index as a lifecycle error
fn map_write_error(err: sqlx::Error) -> MembershipError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.constraint() == Some(LIVE_MEMBERSHIP_CONSTRAINT) =>
        {
            MembershipError::Lifecycle(LifecycleError::LiveMembershipExists)
        }
        _ => MembershipError::Database(err),
    }
}

const DETAIL_SELECT: &str = r#"
    SELECT m.id, m.user_id, m.company_id, m.membership_level, m.start_date, m.renewal_date,
           m.status, m.payment_status, m.created_at, m.updated_at,
           u.email::text AS owner_email, u.first_name AS owner_first_name,
           u.last_name AS owner_last_name,
           c.company_name, c.sector AS company_sector
    FROM memberships m
    JOIN users u ON u.id = m.user_id
    JOIN companies c ON c.id = m.company_id
"#;

impl Membership {
    /// Loads payment history for one membership
    async fn load_payments<'e>(
        executor: impl PgExecutor<'e>,
        membership_id: Uuid,
    ) -> Result<Vec<PaymentEntry>, sqlx::Error> {
        sqlx::query_as::<_, PaymentEntry>(
            r#"
            SELECT paid_at, amount, description
            FROM membership_payments
            WHERE membership_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(membership_id)
        .fetch_all(executor)
        .await
    }

    /// Fills `payment_history` for a batch of memberships in one query
    async fn attach_payments(
        pool: &PgPool,
        memberships: &mut [Membership],
    ) -> Result<(), sqlx::Error> {
        if memberships.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = memberships.iter().map(|m| m.id).collect();

        #[derive(sqlx::FromRow)]
        struct Row {
            membership_id: Uuid,
            #[sqlx(flatten)]
            entry: PaymentEntry,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT membership_id, paid_at, amount, description
            FROM membership_payments
            WHERE membership_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut by_membership: HashMap<Uuid, Vec<PaymentEntry>> = HashMap::new();
        for row in rows {
            by_membership.entry(row.membership_id).or_default().push(row.entry);
        }

        for membership in memberships.iter_mut() {
            membership.payment_history = by_membership.remove(&membership.id).unwrap_or_default();
        }

        Ok(())
    }

    async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM memberships m WHERE m.id = $1 FOR UPDATE",
            MEMBERSHIP_COLUMNS
        );

        sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a membership with its payment history
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM memberships m WHERE m.id = $1", MEMBERSHIP_COLUMNS);

        let Some(mut membership) = sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        membership.payment_history = Self::load_payments(pool, id).await?;
        Ok(Some(membership))
    }

    /// Whether the user holds an active or pending membership
    pub async fn has_live_membership(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM memberships
                WHERE user_id = $1 AND status IN ('active', 'pending')
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Creates a pending application
    ///
    /// The renewal date is one term after the start date. A concurrent
    /// application that slips past the pre-check is caught by the partial
    /// unique index and reported the same way.
    pub async fn apply(pool: &PgPool, data: NewMembership) -> Result<Self, MembershipError> {
        if Self::has_live_membership(pool, data.user_id).await? {
            return Err(LifecycleError::LiveMembershipExists.into());
        }

        let start = data.start_date.unwrap_or_else(Utc::now);
        let renewal = lifecycle::initial_renewal_date(start)?;

        let query = format!(
            r#"
            INSERT INTO memberships AS m
                (user_id, company_id, membership_level, start_date, renewal_date,
                 status, payment_status)
            VALUES ($1, $2, $3, $4, $5, 'pending', 'pending')
            RETURNING {}
            "#,
            MEMBERSHIP_COLUMNS
        );

        let membership = sqlx::query_as::<_, Membership>(&query)
            .bind(data.user_id)
            .bind(data.company_id)
            .bind(data.membership_level)
            .bind(start)
            .bind(renewal)
            .fetch_one(pool)
            .await
            .map_err(map_write_error)?;

        tracing::info!(
            membership_id = %membership.id,
            user_id = %membership.user_id,
            renewal_date = %membership.renewal_date,
            "Membership application created"
        );

        Ok(membership)
    }

    /// Checks the locked row, then runs `update_sql` (bound to `$1 = id`)
    async fn transition(
        pool: &PgPool,
        id: Uuid,
        check: impl FnOnce(&Membership) -> Result<(), LifecycleError>,
        update_sql: &str,
    ) -> Result<Self, MembershipError> {
        let mut tx = pool.begin().await?;

        let current = Self::lock(&mut *tx, id)
            .await?
            .ok_or(MembershipError::NotFound)?;
        check(&current)?;

        let query = format!("{} RETURNING {}", update_sql, MEMBERSHIP_COLUMNS);
        let mut updated = sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;
        updated.payment_history = Self::load_payments(&mut *tx, id).await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Approves an application: active and paid
    pub async fn approve(pool: &PgPool, id: Uuid) -> Result<Self, MembershipError> {
        let membership = Self::transition(
            pool,
            id,
            |m| lifecycle::check_approve(m.status),
            r#"UPDATE memberships AS m
               SET status = 'active', payment_status = 'paid', updated_at = NOW()
               WHERE m.id = $1"#,
        )
        .await?;

        tracing::info!(membership_id = %id, "Membership approved");
        Ok(membership)
    }

    /// Rejects a pending application
    pub async fn reject(pool: &PgPool, id: Uuid) -> Result<Self, MembershipError> {
        let membership = Self::transition(
            pool,
            id,
            |m| lifecycle::check_reject(m.status),
            r#"UPDATE memberships AS m
               SET status = 'expired', updated_at = NOW()
               WHERE m.id = $1"#,
        )
        .await?;

        tracing::info!(membership_id = %id, "Membership rejected");
        Ok(membership)
    }

    /// Renews for one more term from `max(renewal_date, now)`
    ///
    /// The membership becomes active with payment pending until a payment
    /// is recorded.
    pub async fn renew(pool: &PgPool, id: Uuid) -> Result<Self, MembershipError> {
        let mut tx = pool.begin().await?;

        let current = Self::lock(&mut *tx, id)
            .await?
            .ok_or(MembershipError::NotFound)?;
        let next = lifecycle::next_renewal_date(current.renewal_date, Utc::now())?;

        let query = format!(
            r#"
            UPDATE memberships AS m
            SET renewal_date = $2, status = 'active', payment_status = 'pending',
                updated_at = NOW()
            WHERE m.id = $1
            RETURNING {}
            "#,
            MEMBERSHIP_COLUMNS
        );

        let mut renewed = sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .bind(next)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;
        renewed.payment_history = Self::load_payments(&mut *tx, id).await?;

        tx.commit().await?;

        tracing::info!(
            membership_id = %id,
            previous_renewal = %current.renewal_date,
            renewal_date = %renewed.renewal_date,
            "Membership renewed"
        );

        Ok(renewed)
    }

    /// Appends a payment and marks the membership paid
    pub async fn record_payment(
        pool: &PgPool,
        id: Uuid,
        payment: NewPayment,
    ) -> Result<Self, MembershipError> {
        lifecycle::check_payment_amount(payment.amount)?;

        let mut tx = pool.begin().await?;

        Self::lock(&mut *tx, id)
            .await?
            .ok_or(MembershipError::NotFound)?;

        sqlx::query(
            r#"
            INSERT INTO membership_payments (membership_id, paid_at, amount, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(payment.date.unwrap_or_else(Utc::now))
        .bind(payment.amount)
        .bind(&payment.description)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            r#"
            UPDATE memberships AS m
            SET payment_status = 'paid', updated_at = NOW()
            WHERE m.id = $1
            RETURNING {}
            "#,
            MEMBERSHIP_COLUMNS
        );

        let mut updated = sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        updated.payment_history = Self::load_payments(&mut *tx, id).await?;

        tx.commit().await?;

        tracing::info!(
            membership_id = %id,
            amount = payment.amount,
            payments = updated.payment_history.len(),
            "Payment recorded"
        );

        Ok(updated)
    }

    /// Overwrites the status with no transition check
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: MembershipStatus,
    ) -> Result<Self, MembershipError> {
        let query = format!(
            r#"
            UPDATE memberships AS m
            SET status = $2, updated_at = NOW()
            WHERE m.id = $1
            RETURNING {}
            "#,
            MEMBERSHIP_COLUMNS
        );

        let mut updated = sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
            .map_err(map_write_error)?
            .ok_or(MembershipError::NotFound)?;
        updated.payment_history = Self::load_payments(pool, id).await?;

        Ok(updated)
    }

    /// Overwrites the payment status with no transition check
    pub async fn set_payment_status(
        pool: &PgPool,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Self, MembershipError> {
        let query = format!(
            r#"
            UPDATE memberships AS m
            SET payment_status = $2, updated_at = NOW()
            WHERE m.id = $1
            RETURNING {}
            "#,
            MEMBERSHIP_COLUMNS
        );

        let mut updated = sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .bind(payment_status)
            .fetch_optional(pool)
            .await?
            .ok_or(MembershipError::NotFound)?;
        updated.payment_history = Self::load_payments(pool, id).await?;

        Ok(updated)
    }

    /// The user's most recent membership with company and owner fields
    pub async fn current_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<MembershipDetail>, sqlx::Error> {
        let query = format!(
            "{} WHERE m.user_id = $1 ORDER BY m.created_at DESC LIMIT 1",
            DETAIL_SELECT
        );

        let row = sqlx::query_as::<_, MembershipDetailRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut detail = MembershipDetail::from(row);
        detail.membership.payment_history = Self::load_payments(pool, detail.membership.id).await?;
        Ok(Some(detail))
    }

    /// Admin listing, newest first
    pub async fn list(
        pool: &PgPool,
        filter: &MembershipFilter,
    ) -> Result<Vec<MembershipDetail>, sqlx::Error> {
        let query = format!(
            r#"{}
            WHERE ($1::membership_status IS NULL OR m.status = $1)
              AND ($2::payment_status IS NULL OR m.payment_status = $2)
            ORDER BY m.created_at DESC"#,
            DETAIL_SELECT
        );

        let rows = sqlx::query_as::<_, MembershipDetailRow>(&query)
            .bind(filter.status)
            .bind(filter.payment_status)
            .fetch_all(pool)
            .await?;

        Self::details_with_payments(pool, rows).await
    }

    /// Pending applications, oldest first
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<MembershipDetail>, sqlx::Error> {
        let query = format!(
            "{} WHERE m.status = 'pending' ORDER BY m.created_at ASC",
            DETAIL_SELECT
        );

        let rows = sqlx::query_as::<_, MembershipDetailRow>(&query)
            .fetch_all(pool)
            .await?;

        Self::details_with_payments(pool, rows).await
    }

    async fn details_with_payments(
        pool: &PgPool,
        rows: Vec<MembershipDetailRow>,
    ) -> Result<Vec<MembershipDetail>, sqlx::Error> {
        let mut details: Vec<MembershipDetail> = rows.into_iter().map(Into::into).collect();
        let mut memberships: Vec<Membership> =
            details.iter().map(|d| d.membership.clone()).collect();

        Self::attach_payments(pool, &mut memberships).await?;

        for (detail, membership) in details.iter_mut().zip(memberships) {
            detail.membership.payment_history = membership.payment_history;
        }

        Ok(details)
    }

    /// Owner and company of a membership, for notifications
    pub async fn recipient(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<MembershipRecipient>, sqlx::Error> {
        sqlx::query_as::<_, MembershipRecipient>(
            r#"
            SELECT m.id AS membership_id, u.email::text AS email, u.first_name,
                   c.company_name, m.renewal_date
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            JOIN companies c ON c.id = m.company_id
            WHERE m.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Active memberships renewing within `[from, to]`, soonest first
    ///
    /// With `skip_reminded`, memberships already reminded inside the
    /// reminder window of their current renewal date are left out.
    pub async fn due_for_reminder(
        pool: &PgPool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        skip_reminded: bool,
    ) -> Result<Vec<MembershipRecipient>, sqlx::Error> {
        sqlx::query_as::<_, MembershipRecipient>(
            r#"
            SELECT m.id AS membership_id, u.email::text AS email, u.first_name,
                   c.company_name, m.renewal_date
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            JOIN companies c ON c.id = m.company_id
            WHERE m.status = 'active'
              AND m.renewal_date >= $1
              AND m.renewal_date <= $2
              AND (
                  NOT $3
                  OR m.last_reminded_at IS NULL
                  OR m.last_reminded_at < m.renewal_date - make_interval(days => $4)
              )
            ORDER BY m.renewal_date ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(skip_reminded)
        .bind(lifecycle::RENEWAL_REMINDER_DAYS as i32)
        .fetch_all(pool)
        .await
    }

    /// Stamps the time a renewal reminder was delivered
    pub async fn mark_reminded(
        pool: &PgPool,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE memberships SET last_reminded_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_membership() -> Membership {
        let now = Utc::now();
        Membership {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            membership_level: "Premium".to_string(),
            start_date: now,
            renewal_date: lifecycle::initial_renewal_date(now).unwrap(),
            status: MembershipStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_history: vec![PaymentEntry {
                date: now,
                amount: 1200.0,
                description: "Cuota anual".to_string(),
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("active".parse::<MembershipStatus>().unwrap(), MembershipStatus::Active);
        assert_eq!("expired".parse::<MembershipStatus>().unwrap(), MembershipStatus::Expired);
        assert!("cancelled".parse::<MembershipStatus>().is_err());

        assert_eq!("overdue".parse::<PaymentStatus>().unwrap(), PaymentStatus::Overdue);
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_membership_serializes_camel_case() {
        let json = serde_json::to_value(sample_membership()).unwrap();

        assert_eq!(json["status"], "pending");
        assert_eq!(json["paymentStatus"], "pending");
        assert_eq!(json["membershipLevel"], "Premium");
        assert!(json.get("renewalDate").is_some());
        assert_eq!(json["paymentHistory"][0]["amount"], 1200.0);
        assert_eq!(json["paymentHistory"][0]["description"], "Cuota anual");
        assert!(json["paymentHistory"][0].get("date").is_some());
    }

    #[test]
    fn test_detail_flattens_membership() {
        let detail = MembershipDetail {
            membership: sample_membership(),
            user: MemberSummary {
                email: "luis@empresa4.com".to_string(),
                first_name: "Luis".to_string(),
                last_name: "Ramírez".to_string(),
            },
            company: CompanySummary {
                company_name: "Bebidas del Centro".to_string(),
                sector: CompanySector::Bebidas,
            },
        };

        let json = serde_json::to_value(detail).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["user"]["firstName"], "Luis");
        assert_eq!(json["company"]["companyName"], "Bebidas del Centro");
        assert_eq!(json["company"]["sector"], "Bebidas");
    }

    #[test]
    fn test_filter_deserializes_query_values() {
        let filter: MembershipFilter =
            serde_json::from_str(r#"{"status":"active","paymentStatus":"overdue"}"#).unwrap();
        assert_eq!(filter.status, Some(MembershipStatus::Active));
        assert_eq!(filter.payment_status, Some(PaymentStatus::Overdue));
    }
}
