/// Development seed data
///
/// Creates one admin and four member companies, each member holding an
/// active, paid membership with its first payment recorded. Accounts are
/// matched by email, so running the seed again only fills in what is
/// missing and never touches existing rows.

use cluster_shared::{
    auth::password::hash_password,
    models::{
        company::{Company, CompanySector, ContactInfo, CreateCompany, SocialMedia},
        membership::{Membership, NewMembership, NewPayment},
        user::{CreateUser, User, UserRole},
    },
};
use sqlx::PgPool;

/// A seeded account
#[derive(Debug, Clone, Copy)]
pub struct SeedAccount {
    pub email: &'static str,
    pub password: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub role: UserRole,
    pub company: Option<SeedCompany>,
}

/// A seeded company and the membership it holds
#[derive(Debug, Clone, Copy)]
pub struct SeedCompany {
    pub name: &'static str,
    pub sector: CompanySector,
    pub description: &'static str,
    pub address: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    /// Bare domain; links are built from it
    pub domain: &'static str,
    pub membership_level: &'static str,
    pub first_payment: f64,
}

pub const ACCOUNTS: [SeedAccount; 5] = [
    SeedAccount {
        email: "admin@clusteralimentos.com",
        password: "Admin123!",
        first_name: "Administrador",
        last_name: "Principal",
        role: UserRole::Admin,
        company: None,
    },
    SeedAccount {
        email: "juan.perez@empresa1.com",
        password: "Empresa1!",
        first_name: "Juan",
        last_name: "Pérez",
        role: UserRole::Member,
        company: Some(SeedCompany {
            name: "Bebidas Guanajuato",
            sector: CompanySector::Bebidas,
            description: "Producción de bebidas artesanales en Guanajuato.",
            address: "Calle Principal 123, León, Guanajuato",
            phone: "4771234567",
            email: "contacto@bebidasguanajuato.com",
            domain: "bebidasguanajuato.com",
            membership_level: "Premium",
            first_payment: 5000.0,
        }),
    },
    SeedAccount {
        email: "maria.lopez@empresa2.com",
        password: "Empresa2!",
        first_name: "María",
        last_name: "López",
        role: UserRole::Member,
        company: Some(SeedCompany {
            name: "Lácteos del Bajío",
            sector: CompanySector::Lacteos,
            description: "Producción y distribución de lácteos en la región del Bajío.",
            address: "Av. Industrial 456, Irapuato, Guanajuato",
            phone: "4621234567",
            email: "info@lacteosdelbajio.com",
            domain: "lacteosdelbajio.com",
            membership_level: "Estándar",
            first_payment: 3000.0,
        }),
    },
    SeedAccount {
        email: "carlos.rodriguez@empresa3.com",
        password: "Empresa3!",
        first_name: "Carlos",
        last_name: "Rodríguez",
        role: UserRole::Member,
        company: Some(SeedCompany {
            name: "Cárnicos Premium",
            sector: CompanySector::Carnicos,
            description: "Cortes premium y productos cárnicos.",
            address: "Blvd. Torres Landa 789, Celaya, Guanajuato",
            phone: "4611234567",
            email: "ventas@carnicospremium.com",
            domain: "carnicospremium.com",
            membership_level: "Premium",
            first_payment: 5000.0,
        }),
    },
    SeedAccount {
        email: "laura.martinez@empresa4.com",
        password: "Empresa4!",
        first_name: "Laura",
        last_name: "Martínez",
        role: UserRole::Member,
        company: Some(SeedCompany {
            name: "Alimentos Procesados del Centro",
            sector: CompanySector::Procesados,
            description: "Elaboración de alimentos procesados.",
            address: "Parque Industrial 1011, Salamanca, Guanajuato",
            phone: "4641234567",
            email: "info@alimentosprocesados.com",
            domain: "alimentosprocesados.com",
            membership_level: "Estándar",
            first_payment: 3000.0,
        }),
    },
];

/// What a seed run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_created: usize,
    pub users_skipped: usize,
    pub companies_created: usize,
    pub memberships_created: usize,
}

impl SeedCompany {
    fn input(&self) -> CreateCompany {
        CreateCompany {
            company_name: self.name.to_string(),
            logo: None,
            sector: self.sector,
            description: self.description.to_string(),
            contact_info: ContactInfo {
                address: self.address.to_string(),
                phone: self.phone.to_string(),
                email: self.email.to_string(),
                website: Some(format!("https://www.{}", self.domain)),
            },
            social_media: SocialMedia {
                facebook: Some(format!("https://facebook.com/{}", self.handle())),
                instagram: Some(format!("https://instagram.com/{}", self.handle())),
                linkedin: Some(format!("https://linkedin.com/company/{}", self.handle())),
                twitter: None,
            },
        }
    }

    fn handle(&self) -> &'static str {
        self.domain.split('.').next().unwrap_or(self.domain)
    }
}

/// Inserts every missing seed account with its company and membership
pub async fn seed(pool: &PgPool) -> anyhow::Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for account in &ACCOUNTS {
        if User::find_by_email(pool, account.email).await?.is_some() {
            tracing::info!(email = account.email, "Seed account exists, skipping");
            summary.users_skipped += 1;
            continue;
        }

        let user = User::create(
            pool,
            CreateUser {
                email: account.email.to_string(),
                password_hash: hash_password(account.password)?,
                first_name: account.first_name.to_string(),
                last_name: account.last_name.to_string(),
                role: account.role,
            },
        )
        .await?;
        summary.users_created += 1;

        let Some(seed_company) = account.company else {
            continue;
        };

        let company = Company::create(pool, user.id, seed_company.input()).await?;
        Company::toggle_publish(pool, company.id).await?;
        summary.companies_created += 1;

        let membership = Membership::apply(
            pool,
            NewMembership {
                user_id: user.id,
                company_id: company.id,
                membership_level: seed_company.membership_level.to_string(),
                start_date: None,
            },
        )
        .await?;
        Membership::approve(pool, membership.id).await?;
        Membership::record_payment(
            pool,
            membership.id,
            NewPayment {
                amount: seed_company.first_payment,
                description: format!(
                    "Pago inicial de membresía {}",
                    seed_company.membership_level
                ),
                date: None,
            },
        )
        .await?;
        summary.memberships_created += 1;

        tracing::debug!(email = account.email, company = seed_company.name, "Seeded member");
    }

    tracing::info!(
        users_created = summary.users_created,
        users_skipped = summary.users_skipped,
        companies = summary.companies_created,
        memberships = summary.memberships_created,
        "Seed finished"
    );

    Ok(summary)
}
