/// Categorization of raw SMTP failure text into the fixed set of user-facing
/// errors. The transport reports failures as free text mixing OS error names
/// and SMTP reply codes; each category matches the substrings observed in
/// practice, first match wins.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Trial/sandbox sender accounts that may only mail the administrator.
    AccountLimitation,
    Auth,
    ConnectionRefused,
    Timeout,
    Rejected,
    Tls,
    Other,
}

#[derive(Debug, Clone)]
pub struct ClassifiedFailure {
    pub kind: FailureKind,
    /// Short user-facing message.
    pub message: String,
    /// Longer user-facing explanation; may quote the raw server response.
    pub details: String,
    /// HTTP status this failure should surface as. Connection-class failures
    /// are 503, everything else is a 500.
    pub status: u16,
}

pub fn classify_send_failure(raw: &str) -> ClassifiedFailure {
    let text = raw.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if contains_any(&["trial", "can only send", "administrator", "450"]) {
        ClassifiedFailure {
            kind: FailureKind::AccountLimitation,
            message: "Email service account limitation".into(),
            details: format!(
                "Your email service account has restrictions. The server responded: \"{raw}\". \
                 Please check your email service configuration or switch to Gmail SMTP."
            ),
            status: 500,
        }
    } else if contains_any(&[
        "eauth",
        "authentication",
        "invalid login",
        "invalid credentials",
        "535",
    ]) {
        ClassifiedFailure {
            kind: FailureKind::Auth,
            message: "SMTP authentication failed".into(),
            details: "Invalid SMTP username or password. Please check your SMTP_USERNAME and \
                      SMTP_PASSWORD environment variables."
                .into(),
            status: 500,
        }
    } else if contains_any(&["econnrefused", "connection refused", "enotfound"]) {
        ClassifiedFailure {
            kind: FailureKind::ConnectionRefused,
            message: "SMTP connection refused".into(),
            details: "Cannot connect to SMTP server. Please check your SMTP_HOST and SMTP_PORT \
                      settings."
                .into(),
            status: 503,
        }
    } else if contains_any(&["etimeout", "timeout", "etimedout", "timed out"]) {
        ClassifiedFailure {
            kind: FailureKind::Timeout,
            message: "SMTP connection timeout".into(),
            details: "Connection to SMTP server timed out. Please check your network connection \
                      and SMTP server settings."
                .into(),
            status: 503,
        }
    } else if contains_any(&["rejected", "550", "553", "554", "552"]) {
        ClassifiedFailure {
            kind: FailureKind::Rejected,
            message: "Email rejected by server".into(),
            details: format!(
                "The email was rejected by the SMTP server. Server response: \"{raw}\". \
                 Please check the recipient email address and your account settings."
            ),
            status: 500,
        }
    } else if contains_any(&["tls", "ssl", "certificate", "eprotocol"]) {
        ClassifiedFailure {
            kind: FailureKind::Tls,
            message: "SMTP TLS/SSL error".into(),
            details: format!("TLS/SSL connection error: {raw}"),
            status: 500,
        }
    } else {
        ClassifiedFailure {
            kind: FailureKind::Other,
            message: "Email sending failed".into(),
            details: if raw.trim().is_empty() {
                "An unknown error occurred. Please check your SMTP configuration and try again."
                    .into()
            } else {
                raw.to_string()
            },
            status: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_account_limitations() {
        let c = classify_send_failure(
            "450 You can only send testing emails to your own email address",
        );
        assert_eq!(c.kind, FailureKind::AccountLimitation);
        assert_eq!(c.message, "Email service account limitation");
        assert_eq!(c.status, 500);
        assert!(c.details.contains("can only send"));
    }

    #[test]
    fn authentication_failures() {
        for raw in ["EAUTH", "535 5.7.8 Invalid credentials", "Invalid login: rejected?"] {
            // "Invalid login: rejected?" must classify as auth, not rejection:
            // the auth check runs first.
            let c = classify_send_failure(raw);
            assert_eq!(c.kind, FailureKind::Auth, "raw: {raw}");
            assert_eq!(c.status, 500);
        }
    }

    #[test]
    fn connection_class_failures_are_503() {
        let refused = classify_send_failure("connect ECONNREFUSED 127.0.0.1:587");
        assert_eq!(refused.kind, FailureKind::ConnectionRefused);
        assert_eq!(refused.status, 503);

        let timed_out = classify_send_failure("connection timed out after 10s");
        assert_eq!(timed_out.kind, FailureKind::Timeout);
        assert_eq!(timed_out.status, 503);

        let dns = classify_send_failure("getaddrinfo ENOTFOUND smtp.example.invalid");
        assert_eq!(dns.kind, FailureKind::ConnectionRefused);
    }

    #[test]
    fn server_rejections_quote_the_response() {
        let c = classify_send_failure("550 5.1.1 The email account does not exist");
        assert_eq!(c.kind, FailureKind::Rejected);
        assert!(c.details.contains("550 5.1.1"));
        assert_eq!(c.status, 500);
    }

    #[test]
    fn tls_failures() {
        let c = classify_send_failure("certificate verify failed");
        assert_eq!(c.kind, FailureKind::Tls);
        assert!(c.details.contains("certificate verify failed"));
    }

    #[test]
    fn unknown_text_passes_through_as_generic() {
        let c = classify_send_failure("something odd happened");
        assert_eq!(c.kind, FailureKind::Other);
        assert_eq!(c.message, "Email sending failed");
        assert_eq!(c.details, "something odd happened");

        let empty = classify_send_failure("  ");
        assert!(empty.details.contains("unknown error"));
    }
}
