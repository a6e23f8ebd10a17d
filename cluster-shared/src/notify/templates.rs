/// Email templates
///
/// Every user-supplied value is HTML-escaped before interpolation. Dates
/// are rendered like "March 1, 2026".

use chrono::{DateTime, Utc};

use super::mailer::EmailMessage;

/// Formats a date for display in emails
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Escapes text for safe inclusion in HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the emails sent on lifecycle events
#[derive(Debug, Clone)]
pub struct Templates {
    organization: String,
}

impl Templates {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    fn signature(&self) -> String {
        format!(
            "<p>Best regards,<br>The {} team</p>",
            escape_html(&self.organization)
        )
    }

    fn message(&self, to: &str, subject: String, body: String) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject,
            html: format!("{}\n{}", body, self.signature()),
        }
    }

    pub fn welcome(&self, to: &str, first_name: &str) -> EmailMessage {
        let org = escape_html(&self.organization);
        self.message(
            to,
            format!("Welcome to {}", self.organization),
            format!(
                "<h1>Welcome, {}!</h1>\n\
                 <p>Thank you for registering with {}.</p>\n\
                 <p>You can now complete your company profile and apply for a membership.</p>",
                escape_html(first_name),
                org
            ),
        )
    }

    pub fn membership_approved(&self, to: &str, first_name: &str, company: &str) -> EmailMessage {
        self.message(
            to,
            "Your membership has been approved".to_string(),
            format!(
                "<h1>Congratulations, {}!</h1>\n\
                 <p>The membership application for <strong>{}</strong> has been approved.</p>\n\
                 <p>You are now officially part of {}.</p>",
                escape_html(first_name),
                escape_html(company),
                escape_html(&self.organization)
            ),
        )
    }

    pub fn membership_renewed(
        &self,
        to: &str,
        first_name: &str,
        company: &str,
        renewal_date: DateTime<Utc>,
    ) -> EmailMessage {
        self.message(
            to,
            "Membership renewed".to_string(),
            format!(
                "<h1>Hello, {}</h1>\n\
                 <p>The membership for <strong>{}</strong> has been renewed.</p>\n\
                 <p>The new expiration date is <strong>{}</strong>.</p>",
                escape_html(first_name),
                escape_html(company),
                format_date(renewal_date)
            ),
        )
    }

    pub fn renewal_reminder(
        &self,
        to: &str,
        first_name: &str,
        company: &str,
        renewal_date: DateTime<Utc>,
    ) -> EmailMessage {
        self.message(
            to,
            "Membership renewal reminder".to_string(),
            format!(
                "<h1>Hello, {}</h1>\n\
                 <p>The membership for <strong>{}</strong> expires on <strong>{}</strong>.</p>\n\
                 <p>To keep enjoying the benefits of {}, please renew before that date.</p>",
                escape_html(first_name),
                escape_html(company),
                format_date(renewal_date),
                escape_html(&self.organization)
            ),
        )
    }

    pub fn password_reset(&self, to: &str, first_name: &str, token: &str) -> EmailMessage {
        self.message(
            to,
            "Password reset".to_string(),
            format!(
                "<h1>Hello, {}</h1>\n\
                 <p>You asked to reset your password. Use this token within the next hour:</p>\n\
                 <p><strong>{}</strong></p>\n\
                 <p>If you did not request this, you can ignore this message.</p>",
                escape_html(first_name),
                escape_html(token)
            ),
        )
    }

    pub fn password_changed(&self, to: &str, first_name: &str) -> EmailMessage {
        self.message(
            to,
            "Your password was changed".to_string(),
            format!(
                "<h1>Hello, {}</h1>\n\
                 <p>Your password has been reset successfully.</p>\n\
                 <p>If you did not make this change, contact an administrator right away.</p>",
                escape_html(first_name)
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn templates() -> Templates {
        Templates::new("Cluster Alimentos")
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2026, 3, 1, 15, 30, 0).unwrap();
        assert_eq!(format_date(date), "March 1, 2026");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>Tom & \"Jerry's\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&#39;s&quot;&lt;/b&gt;"
        );
        assert_eq!(escape_html("Lácteos"), "Lácteos");
    }

    #[test]
    fn test_welcome() {
        let msg = templates().welcome("ana@empresa.mx", "Ana");
        assert_eq!(msg.to, "ana@empresa.mx");
        assert_eq!(msg.subject, "Welcome to Cluster Alimentos");
        assert!(msg.html.contains("Welcome, Ana!"));
        assert!(msg.html.contains("The Cluster Alimentos team"));
    }

    #[test]
    fn test_reminder_includes_company_and_date() {
        let date = Utc.with_ymd_and_hms(2026, 7, 15, 0, 0, 0).unwrap();
        let msg = templates().renewal_reminder("a@b.mx", "Luis", "Bebidas <Centro>", date);

        assert_eq!(msg.subject, "Membership renewal reminder");
        assert!(msg.html.contains("Bebidas &lt;Centro&gt;"));
        assert!(msg.html.contains("July 15, 2026"));
    }

    #[test]
    fn test_renewed_and_approved() {
        let date = Utc.with_ymd_and_hms(2027, 1, 2, 0, 0, 0).unwrap();
        let renewed = templates().membership_renewed("a@b.mx", "Luis", "Frescos SA", date);
        assert!(renewed.html.contains("January 2, 2027"));

        let approved = templates().membership_approved("a@b.mx", "Luis", "Frescos SA");
        assert_eq!(approved.subject, "Your membership has been approved");
        assert!(approved.html.contains("<strong>Frescos SA</strong>"));
    }

    #[test]
    fn test_password_reset_contains_token() {
        let msg = templates().password_reset("a@b.mx", "Luis", "abc123");
        assert!(msg.html.contains("<strong>abc123</strong>"));
        let changed = templates().password_changed("a@b.mx", "Luis");
        assert_eq!(changed.subject, "Your password was changed");
    }
}
