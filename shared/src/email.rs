//! Email address helpers used when matching inbound mail to clients.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Lowercased DNS name with at least one dot
    static ref DOMAIN_REGEX: Regex =
        Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)+$").unwrap();
}

/// Free-mail providers that never identify a client business
const PUBLIC_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "outlook.com",
    "hotmail.com",
    "live.com",
    "msn.com",
    "yahoo.com",
    "icloud.com",
    "me.com",
    "aol.com",
    "proton.me",
    "protonmail.com",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email address is required")]
    Empty,
    #[error("'{0}' is not an email address")]
    MissingAt(String),
    #[error("'{0}' is not a valid email domain")]
    InvalidDomain(String),
}

/// Lowercased `local@domain` from `jane@acme.com` or `Jane <Jane@Acme.com>`.
pub fn normalize_address(raw: &str) -> Result<String, EmailError> {
    let address = bare_address(raw);
    if address.is_empty() {
        return Err(EmailError::Empty);
    }

    let (local, domain) = address
        .rsplit_once('@')
        .ok_or_else(|| EmailError::MissingAt(address.to_string()))?;
    if local.is_empty() {
        return Err(EmailError::MissingAt(address.to_string()));
    }

    let domain = domain.trim_end_matches('.').to_lowercase();
    if !DOMAIN_REGEX.is_match(&domain) {
        return Err(EmailError::InvalidDomain(domain));
    }

    Ok(format!("{}@{}", local.to_lowercase(), domain))
}

/// Extract the lowercased domain of an address
pub fn extract_email_domain(raw: &str) -> Result<String, EmailError> {
    let address = normalize_address(raw)?;
    let domain = address
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_string())
        .unwrap_or_default();
    Ok(domain)
}

/// Whether the domain belongs to a consumer mail provider
pub fn is_public_domain(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    PUBLIC_DOMAINS.contains(&domain.as_str())
}

/// Strip a display name and angle brackets, if any
fn bare_address(raw: &str) -> &str {
    let trimmed = raw.trim();
    match (trimmed.rfind('<'), trimmed.rfind('>')) {
        (Some(start), Some(end)) if start < end => trimmed[start + 1..end].trim(),
        _ => trimmed,
    }
}
