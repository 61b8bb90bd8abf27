/// Minimal recipient validation: `local@domain.tld`, no whitespace anywhere.
/// Deliverability is the SMTP server's problem, not ours.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Display name for an address with no profile behind it: the local part.
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("  finder@loqta.app  "));
        assert!(is_valid_email("first.last@mail.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@missing-local.com"));
        assert!(!is_valid_email("missing-domain@"));
        assert!(!is_valid_email("no-tld@host"));
        assert!(!is_valid_email("dot@.com"));
        assert!(!is_valid_email("spaced name@host.com"));
        assert!(!is_valid_email("two@@host.com"));
    }

    #[test]
    fn local_part_is_the_fallback_display_name() {
        assert_eq!(local_part("finder@loqta.app"), "finder");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
    }
}
