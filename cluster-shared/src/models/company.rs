/// Company model and database operations
///
/// Each user owns at most one company profile. Profiles start unpublished
/// and only published ones are visible to other members.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     company_name VARCHAR(255) NOT NULL,
///     logo VARCHAR(512),
///     sector company_sector NOT NULL,
///     description TEXT NOT NULL,
///     contact_info JSONB NOT NULL,
///     social_media JSONB NOT NULL DEFAULT '{}',
///     is_published BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX companies_owner_id_key ON companies(owner_id);
/// ```
///
/// # Example
///
/// ```no_run
/// use cluster_shared::models::company::{Company, CompanySector};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let dairy = Company::list(&pool, Some(CompanySector::Lacteos), true).await?;
/// for company in dairy {
///     println!("{}", company.company_name);
/// }
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Unique index backing the one-company-per-user rule
pub const OWNER_UNIQUE_CONSTRAINT: &str = "companies_owner_id_key";

/// Foreign key from memberships that blocks deleting a company in use
pub const MEMBERSHIP_COMPANY_CONSTRAINT: &str = "memberships_company_id_fkey";

const COMPANY_COLUMNS: &str = "id, owner_id, company_name, logo, sector, description, \
     contact_info, social_media, is_published, created_at, updated_at";

/// Industry segment of a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "company_sector")]
pub enum CompanySector {
    #[sqlx(rename = "Servicios Financieros")]
    #[serde(rename = "Servicios Financieros")]
    ServiciosFinancieros,
    Frescos,
    #[sqlx(rename = "Cárnicos")]
    #[serde(rename = "Cárnicos")]
    Carnicos,
    #[sqlx(rename = "Lácteos")]
    #[serde(rename = "Lácteos")]
    Lacteos,
    Procesados,
    Bebidas,
    #[sqlx(rename = "Tecnología")]
    #[serde(rename = "Tecnología")]
    Tecnologia,
    #[sqlx(rename = "Logística")]
    #[serde(rename = "Logística")]
    Logistica,
    #[sqlx(rename = "Consultoría")]
    #[serde(rename = "Consultoría")]
    Consultoria,
    Otro,
}

impl CompanySector {
    pub const ALL: [CompanySector; 10] = [
        CompanySector::ServiciosFinancieros,
        CompanySector::Frescos,
        CompanySector::Carnicos,
        CompanySector::Lacteos,
        CompanySector::Procesados,
        CompanySector::Bebidas,
        CompanySector::Tecnologia,
        CompanySector::Logistica,
        CompanySector::Consultoria,
        CompanySector::Otro,
    ];

    /// Label as stored and sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySector::ServiciosFinancieros => "Servicios Financieros",
            CompanySector::Frescos => "Frescos",
            CompanySector::Carnicos => "Cárnicos",
            CompanySector::Lacteos => "Lácteos",
            CompanySector::Procesados => "Procesados",
            CompanySector::Bebidas => "Bebidas",
            CompanySector::Tecnologia => "Tecnología",
            CompanySector::Logistica => "Logística",
            CompanySector::Consultoria => "Consultoría",
            CompanySector::Otro => "Otro",
        }
    }
}

impl fmt::Display for CompanySector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanySector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompanySector::ALL
            .into_iter()
            .find(|sector| sector.as_str() == s)
            .ok_or_else(|| format!("Invalid sector: {}", s))
    }
}

/// Treats `""` and whitespace-only strings as absent
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }))
}

/// Rejects strings that are empty after trimming
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Contact details of a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactInfo {
    #[validate(custom(function = "not_blank", message = "Address is required"))]
    pub address: String,

    #[validate(custom(function = "not_blank", message = "Phone is required"))]
    pub phone: String,

    #[validate(email(message = "A valid contact email is required"))]
    pub email: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

/// Social media links, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SocialMedia {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Facebook must be a valid URL"))]
    pub facebook: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Instagram must be a valid URL"))]
    pub instagram: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "LinkedIn must be a valid URL"))]
    pub linkedin: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Twitter must be a valid URL"))]
    pub twitter: Option<String>,
}

/// Company profile
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,

    /// Owning user
    pub owner_id: Uuid,

    pub company_name: String,

    /// Logo URL
    pub logo: Option<String>,

    pub sector: CompanySector,

    pub description: String,

    pub contact_info: Json<ContactInfo>,

    pub social_media: Json<SocialMedia>,

    /// Visible to other members when true
    pub is_published: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a company
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCompany {
    #[validate(custom(function = "not_blank", message = "Company name is required"))]
    pub company_name: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo: Option<String>,

    pub sector: CompanySector,

    #[validate(custom(function = "not_blank", message = "Description is required"))]
    pub description: String,

    #[validate(nested)]
    pub contact_info: ContactInfo,

    #[serde(default)]
    #[validate(nested)]
    pub social_media: SocialMedia,
}

/// Partial update of contact details
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactInfoPatch {
    #[validate(custom(function = "not_blank", message = "Address cannot be empty"))]
    pub address: Option<String>,

    #[validate(custom(function = "not_blank", message = "Phone cannot be empty"))]
    pub phone: Option<String>,

    #[validate(email(message = "A valid contact email is required"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

/// Partial update of social links
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SocialMediaPatch {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Facebook must be a valid URL"))]
    pub facebook: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Instagram must be a valid URL"))]
    pub instagram: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "LinkedIn must be a valid URL"))]
    pub linkedin: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Twitter must be a valid URL"))]
    pub twitter: Option<String>,
}

/// Allow-listed partial update of a company
///
/// Unknown keys are rejected at deserialization. `isPublished` is not
/// patchable; it only changes through the publish toggle.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCompany {
    #[validate(custom(function = "not_blank", message = "Company name cannot be empty"))]
    pub company_name: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo: Option<String>,

    pub sector: Option<CompanySector>,

    #[validate(custom(function = "not_blank", message = "Description cannot be empty"))]
    pub description: Option<String>,

    #[validate(nested)]
    pub contact_info: Option<ContactInfoPatch>,

    #[validate(nested)]
    pub social_media: Option<SocialMediaPatch>,
}

impl UpdateCompany {
    /// Merges the patch onto a company field by field
    pub fn apply_to(self, company: &mut Company) {
        if let Some(name) = self.company_name {
            company.company_name = name.trim().to_string();
        }
        if let Some(logo) = self.logo {
            company.logo = Some(logo);
        }
        if let Some(sector) = self.sector {
            company.sector = sector;
        }
        if let Some(description) = self.description {
            company.description = description;
        }
        if let Some(contact) = self.contact_info {
            let current = &mut company.contact_info.0;
            if let Some(address) = contact.address {
                current.address = address;
            }
            if let Some(phone) = contact.phone {
                current.phone = phone;
            }
            if let Some(email) = contact.email {
                current.email = email.trim().to_lowercase();
            }
            if let Some(website) = contact.website {
                current.website = Some(website);
            }
        }
        if let Some(social) = self.social_media {
            let current = &mut company.social_media.0;
            if social.facebook.is_some() {
                current.facebook = social.facebook;
            }
            if social.instagram.is_some() {
                current.instagram = social.instagram;
            }
            if social.linkedin.is_some() {
                current.linkedin = social.linkedin;
            }
            if social.twitter.is_some() {
                current.twitter = social.twitter;
            }
        }
    }
}

impl Company {
    /// Creates a company owned by `owner_id`, unpublished
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on [`OWNER_UNIQUE_CONSTRAINT`] when the
    /// owner already has a company.
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        data: CreateCompany,
    ) -> Result<Self, sqlx::Error> {
        let mut contact = data.contact_info;
        contact.email = contact.email.trim().to_lowercase();

        let query = format!(
            r#"
            INSERT INTO companies
                (owner_id, company_name, logo, sector, description, contact_info, social_media)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );

        sqlx::query_as::<_, Company>(&query)
            .bind(owner_id)
            .bind(data.company_name.trim())
            .bind(data.logo)
            .bind(data.sector)
            .bind(data.description)
            .bind(Json(contact))
            .bind(Json(data.social_media))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);

        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The company owned by a user, if any
    pub async fn find_by_owner(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM companies WHERE owner_id = $1", COMPANY_COLUMNS);

        sqlx::query_as::<_, Company>(&query)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists companies ordered by name
    ///
    /// With `published_only` set, drafts are excluded.
    pub async fn list(
        pool: &PgPool,
        sector: Option<CompanySector>,
        published_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM companies
            WHERE ($1::company_sector IS NULL OR sector = $1)
              AND (NOT $2 OR is_published)
            ORDER BY company_name ASC
            "#,
            COMPANY_COLUMNS
        );

        sqlx::query_as::<_, Company>(&query)
            .bind(sector)
            .bind(published_only)
            .fetch_all(pool)
            .await
    }

    /// Applies a patch under a row lock
    ///
    /// Returns `None` if the company doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: UpdateCompany,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!(
            "SELECT {} FROM companies WHERE id = $1 FOR UPDATE",
            COMPANY_COLUMNS
        );
        let Some(mut company) = sqlx::query_as::<_, Company>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        patch.apply_to(&mut company);

        let update = format!(
            r#"
            UPDATE companies
            SET company_name = $2,
                logo = $3,
                sector = $4,
                description = $5,
                contact_info = $6,
                social_media = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );

        let updated = sqlx::query_as::<_, Company>(&update)
            .bind(id)
            .bind(&company.company_name)
            .bind(&company.logo)
            .bind(company.sector)
            .bind(&company.description)
            .bind(&company.contact_info)
            .bind(&company.social_media)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(updated))
    }

    /// Deletes a company
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation on [`MEMBERSHIP_COMPANY_CONSTRAINT`]
    /// while any membership references the company, so the ledger and its
    /// payment history are never removed with it.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flips the published flag and returns the updated company
    pub async fn toggle_publish(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE companies
            SET is_published = NOT is_published, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );

        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
