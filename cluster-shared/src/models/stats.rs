/// Aggregate counts for the admin dashboard
///
/// Read-only projection over users, companies and memberships. Counts are
/// computed with `FILTER` aggregates, one query per table. Pass a
/// transaction to read every count from one snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Acquire, Postgres};

use super::company::CompanySector;
use crate::lifecycle;

#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserCounts {
    pub total: i64,
    pub admin: i64,
    pub member: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SectorCount {
    pub sector: CompanySector,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCounts {
    pub total: i64,
    pub published: i64,
    pub unpublished: i64,
    /// Companies per sector, largest first
    pub sector_distribution: Vec<SectorCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MembershipCounts {
    pub total: i64,
    pub active: i64,
    pub pending: i64,
    pub expired: i64,
    pub paid: i64,
    pub pending_payment: i64,
    pub overdue: i64,
    /// Active memberships renewing within the reminder window
    pub upcoming_renewals: i64,
}

/// Full dashboard payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminStats {
    pub users: UserCounts,
    pub companies: CompanyCounts,
    pub memberships: MembershipCounts,
}

impl AdminStats {
    /// Computes every count as of `now`
    pub async fn collect<'a, A>(conn: A, now: DateTime<Utc>) -> Result<Self, sqlx::Error>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let users = sqlx::query_as::<_, UserCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE role = 'admin') AS admin,
                   COUNT(*) FILTER (WHERE role = 'member') AS member
            FROM users
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;

        let (total, published): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_published)
            FROM companies
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;

        let sector_distribution = sqlx::query_as::<_, SectorCount>(
            r#"
            SELECT sector, COUNT(*) AS count
            FROM companies
            GROUP BY sector
            ORDER BY count DESC, sector ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let (from, to) = lifecycle::reminder_window(now);
        let memberships = sqlx::query_as::<_, MembershipCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE status = 'expired') AS expired,
                   COUNT(*) FILTER (WHERE payment_status = 'paid') AS paid,
                   COUNT(*) FILTER (WHERE payment_status = 'pending') AS pending_payment,
                   COUNT(*) FILTER (WHERE payment_status = 'overdue') AS overdue,
                   COUNT(*) FILTER (
                       WHERE status = 'active' AND renewal_date >= $1 AND renewal_date <= $2
                   ) AS upcoming_renewals
            FROM memberships
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Self {
            users,
            companies: CompanyCounts {
                total,
                published,
                unpublished: total - published,
                sector_distribution,
            },
            memberships,
        })
    }
}
