//! HTML bodies for the two mails sent per submission.
//!
//! Both documents share [`EMAIL_STYLES`] and the footer. Every value that came
//! from the submitter goes through [`html_escape`] before it is interpolated.

use crate::contact::ContactSubmission;

pub const ADMIN_SUBJECT: &str = "New Contact Form Submission - ABM Groups";
pub const USER_SUBJECT: &str = "Thank You for Contacting ABM Groups";

const EMAIL_STYLES: &str = r#"<style>
    body { font-family: 'Poppins', sans-serif; background-color: #1A1A1A; color: #f0f0f0; margin: 0; padding: 0; }
    .container { max-width: 600px; margin: 0 auto; padding: 20px; background-color: #2C2C2C; border-radius: 8px; }
    h3 { color: #FFD700; }
    p { color: #f0f0f0; line-height: 1.6; }
    .highlight { color: #FFD700; }
    .footer { margin-top: 20px; font-size: 12px; color: #a0a0a0; text-align: center; }
    .logo { color: #FFD700; font-weight: bold; font-size: 24px; text-align: center; }
</style>"#;

/// Organization details shown in the logo, signature and footer.
#[derive(Debug, Clone)]
pub struct Branding {
    pub organization: String,
    pub location: String,
    pub team_signature: String,
    /// Display name on the operator notification.
    pub admin_sender_name: String,
    /// Display name on the confirmation sent to the submitter.
    pub user_sender_name: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            organization: "ABM Groups".to_string(),
            location: "Kottakupam, Tamil Nadu".to_string(),
            team_signature: "ABM Groups Team".to_string(),
            admin_sender_name: "ABM Groups Contact".to_string(),
            user_sender_name: "ABM Groups".to_string(),
        }
    }
}

pub fn render_admin_notification(branding: &Branding, submission: &ContactSubmission) -> String {
    let content = format!(
        r#"<h3>New Contact Form Submission</h3>
        <p><strong>Name:</strong> <span class="highlight">{name}</span></p>
        <p><strong>Email:</strong> <span class="highlight">{email}</span></p>
        <p><strong>Description:</strong> <span class="highlight">{description}</span></p>"#,
        name = html_escape(&submission.name),
        email = html_escape(&submission.email),
        description = html_escape(&submission.description),
    );
    render_document(branding, &content)
}

pub fn render_user_confirmation(branding: &Branding, submission: &ContactSubmission) -> String {
    let name = html_escape(&submission.name);
    let content = format!(
        r#"<h3>Thank You, {name}!</h3>
        <p>Dear {name},</p>
        <p>Thank you for reaching out to {organization}. We have received your message and will get back to you soon.</p>
        <p>Best Regards,<br><span class="highlight">{signature}</span></p>"#,
        organization = html_escape(&branding.organization),
        signature = html_escape(&branding.team_signature),
    );
    render_document(branding, &content)
}

fn render_document(branding: &Branding, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    {styles}
</head>
<body>
    <div class="container">
        <div class="logo">{organization}</div>
        {content}
        <div class="footer">
            <p>{organization} | {location}</p>
        </div>
    </div>
</body>
</html>
"#,
        styles = EMAIL_STYLES,
        organization = html_escape(&branding.organization),
        location = html_escape(&branding.location),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
