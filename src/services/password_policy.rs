/// Password and email shape rules, checked at the API boundary before any
/// hashing or storage work happens.

/// 8 to 32 characters with at least one uppercase letter, one lowercase
/// letter, and one digit.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if !(8..=32).contains(&len) {
        return Err("Password must be between 8 and 32 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit");
    }
    Ok(())
}

/// Structural email check: one `@`, non-empty local part, and a dotted
/// domain. Deliverability is the mail server's problem.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    let domain_ok = {
        let labels: Vec<&str> = domain.split('.').collect();
        labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
    };

    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err("Invalid email address");
    }
    Ok(())
}
