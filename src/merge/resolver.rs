/// Placeholder token resolution.
///
/// Tokens are bracket-delimited identifiers in run text (`{name}`,
/// `{email}`, …). Fixed tokens map to record fields, two of them through
/// convention-specific number formatting; everything else falls through to
/// the record's open field map. A token no rule recognizes stays literal.
use crate::merge::record::Record;
use crate::merge::MergePolicies;
use memchr::memchr;
use serde::{Deserialize, Serialize};

/// The distinguished token that marks the image-insertion shape.
pub const IMAGE_TOKEN: &str = "qr";

/// Contact-number formatting conventions.
///
/// Instantiated for Korean numbers by default; both prefixes are plain
/// configuration and carry no behavior of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactFormatPolicy {
    /// 11-digit values starting with this sequence are mobile numbers; the
    /// leading prefix digit is dropped and the rest regrouped `2.4.4`
    pub mobile_prefix: String,

    /// 8-digit values starting with this 4-digit dialing prefix are
    /// representative numbers, expanded to the dotted `XXXX.XXXX` form
    pub representative_prefix: String,
}

impl Default for ContactFormatPolicy {
    fn default() -> Self {
        Self {
            mobile_prefix: "010".to_string(),
            representative_prefix: "1588".to_string(),
        }
    }
}

/// Values that stand for "no data" in ingested contact columns.
fn is_blank_value(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed == "-" || trimmed == "0"
}

/// Replace separator characters with dots, collapsing runs of them.
fn normalize_separators(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dot = false;
    for c in value.chars() {
        if c == ' ' || c == '-' || c == '/' || c == '.' {
            pending_dot = !out.is_empty();
        } else {
            if pending_dot {
                out.push('.');
                pending_dot = false;
            }
            out.push(c);
        }
    }
    out
}

/// Format a contact number per the mobile-number convention.
///
/// Blank markers resolve to empty. An 11-digit number carrying the national
/// mobile prefix drops the leading prefix digit and regroups the remaining
/// ten digits `2.4.4` (`010-1234-5678` → `10.1234.5678`); anything else is
/// lightly normalized.
pub fn format_contact_number(raw: &str, policy: &ContactFormatPolicy) -> String {
    let trimmed = raw.trim();
    if is_blank_value(trimmed) {
        return String::new();
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with(policy.mobile_prefix.as_str()) {
        let rest = &digits[1..];
        return format!("{}.{}.{}", &rest[..2], &rest[2..6], &rest[6..]);
    }
    normalize_separators(trimmed)
}

/// Format an internal line / representative number.
///
/// Blank markers resolve to empty. An 8-digit value beginning with the
/// configured 4-digit dialing prefix is expanded to the dotted
/// `XXXX.XXXX` form; anything else is lightly normalized.
pub fn format_extension(raw: &str, policy: &ContactFormatPolicy) -> String {
    let trimmed = raw.trim();
    if is_blank_value(trimmed) {
        return String::new();
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 8 && digits.starts_with(policy.representative_prefix.as_str()) {
        return format!("{}.{}", &digits[..4], &digits[4..]);
    }
    normalize_separators(trimmed)
}

/// Resolve one token name (lowercased, braces stripped) against a record.
///
/// Returns `None` only when the token is recognized by no rule at all, in
/// which case the caller leaves the literal token in place. Known tokens
/// with empty backing fields resolve to the empty string.
pub fn resolve(token: &str, record: &Record, policies: &MergePolicies) -> Option<String> {
    match token {
        "name" => Some(record.name.trim().to_string()),
        "name_en" => Some(record.name_en.trim().to_string()),
        "organization" => Some(record.organization.trim().to_string()),
        "role" => Some(record.role.trim().to_string()),
        "role_en" => Some(record.resolved_role_en(&policies.roles).to_string()),
        "email" => Some(record.email.trim().to_string()),
        "phone" => Some(format_contact_number(&record.phone, &policies.contact)),
        "mobile" => Some(format_contact_number(&record.mobile, &policies.contact)),
        "fax" => Some(format_contact_number(&record.fax, &policies.contact)),
        "extension" => Some(format_extension(&record.extension, &policies.contact)),
        _ => record.custom(token).map(|v| v.trim().to_string()),
    }
}

/// Apply every matching token replacement to a piece of paragraph text.
///
/// Fixed tokens and custom fields alike; tokens are matched
/// case-insensitively, unresolvable ones stay literal.
pub fn substitute_tokens(text: &str, record: &Record, policies: &MergePolicies) -> String {
    if memchr(b'{', text.as_bytes()).is_none() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            // unterminated token, keep the remainder literal
            out.push_str(tail);
            return out;
        };
        let token = tail[1..close].to_lowercase();
        match resolve(&token, record, policies) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}
