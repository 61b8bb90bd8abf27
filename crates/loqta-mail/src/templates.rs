use chrono::Utc;
use loqta_types::models::ItemCategory;

use crate::config::SmtpConfig;

/// Rendered message: subject plus HTML and plaintext alternatives.
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn category_label(category: ItemCategory) -> &'static str {
    match category {
        ItemCategory::Lost => "Lost Item",
        ItemCategory::Found => "Found Item",
    }
}

fn outreach_line(category: ItemCategory) -> &'static str {
    match category {
        ItemCategory::Lost => {
            "They believe they found your lost item and would like to connect with you."
        }
        ItemCategory::Found => {
            "They believe this is their lost item and would like to verify ownership."
        }
    }
}

/// Email sent to a report's contact address when another user reaches out.
pub fn claim_outreach(
    sender_name: &str,
    sender_email: &str,
    item_title: &str,
    category: ItemCategory,
    item_link: &str,
) -> EmailContent {
    let subject = format!("{sender_name} reached out about your {category} item on Loqta");
    let label = category_label(category);
    let line = outreach_line(category);

    let html = format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
  </head>
  <body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: linear-gradient(135deg, #DC2626 0%, #B91C1C 100%); padding: 30px; text-align: center; border-radius: 12px 12px 0 0;">
      <h1 style="color: white; margin: 0; font-size: 24px;">Loqta</h1>
    </div>
    <div style="background: #ffffff; padding: 30px; border: 1px solid #e5e7eb; border-top: none; border-radius: 0 0 12px 12px;">
      <h2 style="color: #1f2937; margin-top: 0;">Hello,</h2>
      <p style="color: #4b5563; font-size: 16px;">
        <strong>{sender_name}</strong> ({sender_email}) contacted you via Loqta regarding your <strong>{item_title}</strong>.
      </p>
      <div style="background: #f9fafb; border-left: 4px solid #00BFA6; padding: 16px; margin: 20px 0; border-radius: 4px;">
        <p style="margin: 0; color: #6b7280; font-size: 14px;">
          <strong>Item Type:</strong> {label}<br/>
          <strong>Item Title:</strong> {item_title}
        </p>
      </div>
      <p style="color: #4b5563; font-size: 16px;">{line}</p>
      <p style="color: #4b5563; font-size: 16px;">
        Please log in to your Loqta account to view their message and respond.
      </p>
      <div style="text-align: center; margin: 30px 0;">
        <a href="{item_link}"
           style="display: inline-block; background: #00BFA6; color: white; padding: 12px 24px; text-decoration: none; border-radius: 8px; font-weight: 600; font-size: 16px;">
          View on Loqta
        </a>
      </div>
      <hr style="border: none; border-top: 1px solid #e5e7eb; margin: 30px 0;">
      <p style="color: #9ca3af; font-size: 14px; margin: 0;">
        Best regards,<br/>
        <strong>The Loqta Team</strong>
      </p>
    </div>
  </body>
</html>"#
    );

    let text = format!(
        "Hello,\n\n\
         {sender_name} ({sender_email}) contacted you via Loqta regarding your {item_title}.\n\n\
         Item Type: {label}\n\
         Item Title: {item_title}\n\n\
         {line}\n\n\
         Please log in to your Loqta account to view their message and respond.\n\n\
         Best regards,\n\
         The Loqta Team"
    );

    EmailContent { subject, html, text }
}

/// Plaintext email to the finder of an item, optionally disclosing the
/// private handover location. Sent through the HTTP provider chain.
pub fn found_item_inquiry(
    receiver_name: &str,
    item_title: &str,
    description: Option<&str>,
    location: Option<&str>,
    handover_location: Option<&str>,
) -> EmailContent {
    let subject = "Someone requested info about your found item".to_string();

    let mut body = format!(
        "Hi {receiver_name},\n\n\
         Someone on Loqta believes they lost the item you found:\n\n\
         Item: {item_title}\n"
    );
    if let Some(description) = description.filter(|s| !s.is_empty()) {
        body.push_str(&format!("Description: {description}\n"));
    }
    if let Some(location) = location.filter(|s| !s.is_empty()) {
        body.push_str(&format!("General Location: {location}\n"));
    }
    if let Some(handover) = handover_location.filter(|s| !s.is_empty()) {
        body.push_str(&format!("\nHANDOVER LOCATION:\n{handover}\n"));
    }
    body.push_str("\nPlease log in to Loqta to view their message and verify ownership.\n\n- The Loqta Team");

    EmailContent {
        subject,
        html: String::new(),
        text: body,
    }
}

/// Diagnostic message for the SMTP test endpoint.
pub fn smtp_test(config: &SmtpConfig) -> EmailContent {
    let subject = "Loqta - SMTP Test Email".to_string();
    let test_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

    let html = format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: linear-gradient(135deg, #00BFA6 0%, #00A693 100%); padding: 30px; text-align: center; border-radius: 12px 12px 0 0;">
      <h1 style="color: white; margin: 0; font-size: 24px;">Loqta</h1>
    </div>
    <div style="background: #ffffff; padding: 30px; border: 1px solid #e5e7eb; border-top: none; border-radius: 0 0 12px 12px;">
      <h2 style="color: #1f2937; margin-top: 0;">SMTP Test Successful</h2>
      <p style="color: #4b5563; font-size: 16px;">
        Congratulations! Your SMTP configuration is working correctly.
      </p>
      <div style="background: #f9fafb; border-left: 4px solid #00BFA6; padding: 16px; margin: 20px 0; border-radius: 4px;">
        <p style="margin: 0; color: #6b7280; font-size: 14px;">
          <strong>SMTP Host:</strong> {host}<br/>
          <strong>SMTP Port:</strong> {port}<br/>
          <strong>From Email:</strong> {username}<br/>
          <strong>Test Time:</strong> {test_time}
        </p>
      </div>
      <p style="color: #4b5563; font-size: 16px;">
        Your email system is now ready to send emails to users' contact emails!
      </p>
    </div>
  </body>
</html>"#,
        host = config.host,
        port = config.port,
        username = config.username,
    );

    let text = format!(
        "Loqta - SMTP Test Email\n\n\
         SMTP Test Successful!\n\n\
         Congratulations! Your SMTP configuration is working correctly.\n\n\
         SMTP Host: {}\n\
         SMTP Port: {}\n\
         From Email: {}\n\
         Test Time: {test_time}\n\n\
         Your email system is now ready to send emails to users' contact emails!\n\n\
         Best regards,\n\
         The Loqta Team",
        config.host, config.port, config.username,
    );

    EmailContent { subject, html, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outreach_subject_names_sender_and_category() {
        let email = claim_outreach(
            "Sam",
            "sam@example.com",
            "Black Wallet",
            ItemCategory::Found,
            "https://loqta.app/items?itemId=x",
        );
        assert_eq!(
            email.subject,
            "Sam reached out about your found item on Loqta"
        );
        assert!(email.html.contains("Black Wallet"));
        assert!(email.html.contains("https://loqta.app/items?itemId=x"));
        assert!(email.text.contains("sam@example.com"));
    }

    #[test]
    fn outreach_line_depends_on_category() {
        let lost = claim_outreach("S", "s@e.com", "Keys", ItemCategory::Lost, "link");
        assert!(lost.text.contains("they found your lost item"));
        assert!(lost.text.contains("Item Type: Lost Item"));

        let found = claim_outreach("S", "s@e.com", "Keys", ItemCategory::Found, "link");
        assert!(found.text.contains("this is their lost item"));
        assert!(found.text.contains("Item Type: Found Item"));
    }

    #[test]
    fn inquiry_includes_handover_block_only_when_set() {
        let with = found_item_inquiry(
            "finder",
            "Black Wallet",
            Some("Leather, slightly worn"),
            Some("Central Station"),
            Some("Locker 12, main hall"),
        );
        assert_eq!(with.subject, "Someone requested info about your found item");
        assert!(with.text.contains("HANDOVER LOCATION:\nLocker 12, main hall"));
        assert!(with.text.contains("Description: Leather, slightly worn"));
        assert!(with.text.contains("General Location: Central Station"));

        let without = found_item_inquiry("finder", "Black Wallet", None, Some(""), None);
        assert!(!without.text.contains("HANDOVER LOCATION"));
        assert!(!without.text.contains("Description:"));
        assert!(!without.text.contains("General Location:"));
    }

    #[test]
    fn smtp_test_reports_config_without_password() {
        let email = smtp_test(&SmtpConfig {
            host: "smtp.gmail.com".into(),
            port: 587,
            username: "noreply@loqta.app".into(),
            password: "secret".into(),
        });
        assert!(email.text.contains("smtp.gmail.com"));
        assert!(email.text.contains("587"));
        assert!(!email.text.contains("secret"));
        assert!(!email.html.contains("secret"));
    }
}
