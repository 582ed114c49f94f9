// Logging utilities
// Secret masking plus the JSON / text line formats used by the fern dispatch.

use log::Level;
use serde_json::json;

/// Mask sensitive data in logs: first and last four characters survive on
/// values longer than eight characters.
pub fn mask_sensitive(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let start: String = chars[..4].iter().collect();
    let end: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", start, end)
}

/// Mask the credential in an `Authorization` style value
/// (`Bearer eyJ...` → `Bearer ***`).
pub fn mask_bearer(value: &str) -> String {
    let trimmed = value.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((scheme, _)) if scheme.eq_ignore_ascii_case("bearer") => format!("{} ***", scheme),
        _ if trimmed.is_empty() => String::new(),
        _ => "***".to_string(),
    }
}

/// Replace the value of `param` in a URL's query string (e.g. the geocoding
/// account name) with `***`.
pub fn mask_query_param(url: &str, param: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let masked: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == param => format!("{}=***", key),
            _ => pair.to_string(),
        })
        .collect();
    format!("{}?{}", base, masked.join("&"))
}

fn take_tag(message: &str, tag: &str) -> (Option<String>, String) {
    let Some(start) = message.find(tag) else {
        return (None, message.to_string());
    };
    let Some(len) = message[start..].find(']') else {
        return (None, message.to_string());
    };
    let value = message[start + tag.len()..start + len].trim().to_string();
    let rest = format!("{} {}", &message[..start], &message[start + len + 1..])
        .trim()
        .to_string();
    (Some(value), rest)
}

/// Parse phase and step from log message
/// Extracts [PHASE: ...] and [STEP: ...] patterns
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let (phase, cleaned) = take_tag(message, "[PHASE:");
    let (step, cleaned) = take_tag(&cleaned, "[STEP:");
    (phase, step, cleaned)
}

/// `correlation_id=...` value embedded by the fetchers, if any.
pub fn extract_correlation_id(message: &str) -> Option<&str> {
    let start = message.find("correlation_id=")? + "correlation_id=".len();
    let rest = &message[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// Format log entry as JSON for structured logging
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }
    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }
    if let Some(id) = extract_correlation_id(message) {
        log_entry["correlationId"] = json!(id);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry as human-readable text
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());
    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }
    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }
    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}
