/// End-to-end tests for the membership API
///
/// These drive the real router and database:
/// - registration, login and the password-reset flow
/// - company visibility and ownership rules
/// - the membership lifecycle from application through renewal
/// - admin account management
///
/// Run with: DATABASE_URL=... cargo test -p cluster-api -- --test-threads=1

#[allow(dead_code)]
mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use cluster_shared::lifecycle;
use common::{company_body, reset_token_from, TestContext, ORGANIZATION, PASSWORD};
use serde_json::{json, Value};

macro_rules! context {
    () => {
        match TestContext::new().await {
            Some(ctx) => ctx,
            None => return,
        }
    };
}

fn renewal_date(membership: &Value) -> DateTime<Utc> {
    membership["renewalDate"]
        .as_str()
        .expect("renewalDate")
        .parse()
        .expect("RFC 3339 timestamp")
}

#[tokio::test]
async fn test_register_sends_welcome_and_rejects_duplicates() {
    let ctx = context!();
    let member = ctx.register("member").await;

    let welcome = ctx.emails_to(&member.email).await;
    assert_eq!(welcome.len(), 1);
    assert_eq!(welcome[0].subject, format!("Welcome to {}", ORGANIZATION));

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": member.email.to_uppercase(),
                "password": PASSWORD,
                "firstName": "Otra",
                "lastName": "Persona",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_register_validation_errors_name_wire_fields() {
    let ctx = context!();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "nope", "password": "123" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"firstName"));
}

#[tokio::test]
async fn test_login_and_me() {
    let ctx = context!();
    let member = ctx.register("member").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": member.email, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    // An unknown address gets the same answer as a wrong password
    let (unknown_status, unknown_body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody-here@test.cluster.mx", "password": PASSWORD })),
        )
        .await;
    assert_eq!(unknown_status, status);
    assert_eq!(unknown_body, body);

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": member.email, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = ctx
        .request("GET", "/api/auth/me", Some(&format!("Bearer {}", token)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], member.email.as_str());
    assert!(me.get("passwordHash").is_none());

    // An empty patch leaves the profile as it was
    let (status, unchanged) = ctx
        .request("PUT", "/api/auth/profile", Some(&member.bearer()), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["firstName"], me["firstName"]);
    assert_eq!(unchanged["email"], me["email"]);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_password_reset_flow() {
    let ctx = context!();
    let member = ctx.register("member").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "nobody-here@test.cluster.mx" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let unknown_answer = body["message"].clone();

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": member.email })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], unknown_answer);

    let emails = ctx.emails_to(&member.email).await;
    let token = reset_token_from(emails.last().unwrap());

    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": member.email, "token": "forged", "password": "brand-new" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": member.email, "token": token, "password": "brand-new" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password reset successfully");

    // Tokens are single use
    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": member.email, "token": token, "password": "again-new" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": member.email, "password": "brand-new" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let subjects: Vec<String> = ctx
        .emails_to(&member.email)
        .await
        .into_iter()
        .map(|m| m.subject)
        .collect();
    assert!(subjects.contains(&"Your password was changed".to_string()));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_company_visibility_and_ownership() {
    let ctx = context!();
    let owner = ctx.register("member").await;
    let other = ctx.register("member").await;
    let admin = ctx.register("admin").await;

    let company_id = ctx.create_company(&owner, "Lácteos del Valle").await;
    let uri = format!("/api/companies/{}", company_id);

    // One company per user
    let (status, body) = ctx
        .request(
            "POST",
            "/api/companies",
            Some(&owner.bearer()),
            Some(company_body("Segunda Empresa")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You already have a registered company");

    // Unpublished: owner and admin only
    let (status, _) = ctx.request("GET", &uri, Some(&other.bearer()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = ctx.request("GET", &uri, Some(&admin.bearer()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .request("GET", "/api/companies", Some(&other.bearer()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["id"] == company_id.to_string()));

    // Only the owner or an admin may change it
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("{}/publish", uri),
            Some(&other.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("{}/publish", uri),
            Some(&owner.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isPublished"], true);

    let (status, body) = ctx.request("GET", &uri, Some(&other.bearer()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["companyName"], "Lácteos del Valle");

    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner.bearer()),
            Some(json!({ "description": "Quesos artesanales" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Quesos artesanales");
    assert_eq!(body["contactInfo"]["phone"], "555-0100");

    let (status, _) = ctx.request("DELETE", &uri, Some(&other.bearer()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = ctx.request("DELETE", &uri, Some(&owner.bearer()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Company deleted successfully");
    let (status, _) = ctx.request("GET", &uri, Some(&admin.bearer()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_membership_lifecycle() {
    let ctx = context!();
    let member = ctx.register("member").await;
    let admin = ctx.register("admin").await;

    // No company yet
    let (status, _) = ctx
        .request(
            "POST",
            "/api/memberships/apply",
            Some(&member.bearer()),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.create_company(&member, "Bebidas del Norte").await;

    let (status, applied) = ctx
        .request(
            "POST",
            "/api/memberships/apply",
            Some(&member.bearer()),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", applied);
    assert_eq!(applied["status"], "pending");
    assert_eq!(applied["paymentStatus"], "pending");
    assert_eq!(applied["membershipLevel"], "Estándar");
    let id = applied["id"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .request(
            "POST",
            "/api/memberships/apply",
            Some(&member.bearer()),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Members cannot use the admin routes
    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/memberships/{}/approve", id),
            Some(&member.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, pending) = ctx
        .request("GET", "/api/memberships/pending", Some(&admin.bearer()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(pending.as_array().unwrap().iter().any(|m| m["id"] == id.as_str()));

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/memberships/{}/approve", id),
            Some(&admin.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Membership approved successfully");
    assert_eq!(body["membership"]["status"], "active");

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/memberships/{}/reject", id),
            Some(&admin.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/api/memberships/{}/payment", id),
            Some(&admin.bearer()),
            Some(json!({ "amount": -5.0, "description": "Cuota" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/api/memberships/{}/payment", id),
            Some(&admin.bearer()),
            Some(json!({ "amount": 1200.0, "description": "Cuota anual" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["membership"]["paymentStatus"], "paid");
    assert_eq!(body["membership"]["paymentHistory"][0]["amount"], 1200.0);

    let renewal_before = renewal_date(&body["membership"]);
    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/memberships/{}/renew", id),
            Some(&admin.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Membership renewed successfully");
    assert_eq!(
        renewal_date(&body["membership"]),
        lifecycle::add_term(renewal_before).unwrap()
    );
    assert_eq!(body["membership"]["paymentStatus"], "pending");

    let (status, me) = ctx
        .request("GET", "/api/memberships/me", Some(&member.bearer()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["status"], "active");
    assert_eq!(me["company"]["companyName"], "Bebidas del Norte");

    let subjects: Vec<String> = ctx
        .emails_to(&member.email)
        .await
        .into_iter()
        .map(|m| m.subject)
        .collect();
    assert!(subjects.contains(&"Your membership has been approved".to_string()));
    assert!(subjects.contains(&"Membership renewed".to_string()));

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/memberships/{}/status", id),
            Some(&admin.bearer()),
            Some(json!({ "status": "expired" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["membership"]["status"], "expired");

    let (status, filtered) = ctx
        .request(
            "GET",
            "/api/memberships?status=expired",
            Some(&admin.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(filtered
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["status"] == "expired"));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_company_with_membership_history_cannot_be_deleted() {
    let ctx = context!();
    let member = ctx.register("member").await;
    let admin = ctx.register("admin").await;
    let company_id = ctx.create_company(&member, "Cárnicos del Sur").await;

    let (_, applied) = ctx
        .request(
            "POST",
            "/api/memberships/apply",
            Some(&member.bearer()),
            Some(json!({})),
        )
        .await;
    let id = applied["id"].as_str().unwrap().to_string();
    ctx.request(
        "PUT",
        &format!("/api/memberships/{}/approve", id),
        Some(&admin.bearer()),
        None,
    )
    .await;
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/api/memberships/{}/payment", id),
            Some(&admin.bearer()),
            Some(json!({ "amount": 1200.0, "description": "Cuota anual" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/companies/{}", company_id);
    for caller in [&member, &admin] {
        let (status, body) = ctx.request("DELETE", &uri, Some(&caller.bearer()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cannot delete a company with membership records");
    }

    let (status, me) = ctx
        .request("GET", "/api/memberships/me", Some(&member.bearer()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id.as_str());
    assert_eq!(me["paymentHistory"].as_array().unwrap().len(), 1);
    assert_eq!(me["paymentHistory"][0]["amount"], 1200.0);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_unknown_membership_is_not_found() {
    let ctx = context!();
    let admin = ctx.register("admin").await;

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/memberships/{}/approve", uuid::Uuid::new_v4()),
            Some(&admin.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Membership not found");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_admin_user_management() {
    let ctx = context!();
    let member = ctx.register("member").await;
    let admin = ctx.register("admin").await;

    let (status, _) = ctx
        .request("GET", "/api/admin/stats", Some(&member.bearer()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) = ctx
        .request("GET", "/api/admin/stats", Some(&admin.bearer()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["users"]["total"].as_i64().unwrap() >= 2);

    let (status, admins) = ctx
        .request("GET", "/api/admin/users?role=admin", Some(&admin.bearer()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(admins.as_array().unwrap().iter().all(|u| u["role"] == "admin"));

    let status_uri = format!("/api/admin/users/{}/status", member.id);
    let (status, _) = ctx
        .request("PUT", &status_uri, Some(&admin.bearer()), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .request(
            "PUT",
            &status_uri,
            Some(&admin.bearer()),
            Some(json!({ "isActive": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], false);

    // Deactivated accounts lose access immediately
    let (status, _) = ctx
        .request("GET", "/api/auth/me", Some(&member.bearer()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/admin/users/{}/role", member.id),
            Some(&admin.bearer()),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User role updated successfully");
    assert_eq!(body["user"]["role"], "admin");

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/api/admin/users/{}/role", uuid::Uuid::new_v4()),
            Some(&admin.bearer()),
            Some(json!({ "role": "member" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_send_renewal_reminders_reports_counts() {
    let ctx = context!();
    let admin = ctx.register("admin").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/api/memberships/send-renewal-reminders",
            Some(&admin.bearer()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert!(body["sent"].as_u64().unwrap() <= body["totalMemberships"].as_u64().unwrap());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_health() {
    let ctx = context!();
    let (status, body) = ctx.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}
