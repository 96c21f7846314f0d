//! Typed errors raised at the API boundary

use reqwest::StatusCode;
use thiserror::Error;

/// Errors reported by the KuberDock API or its response envelope
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with an error envelope or a non-2xx status
    #[error("{}", server_message(*status, kind.as_deref(), message))]
    Server {
        status: StatusCode,
        kind: Option<String>,
        message: String,
    },

    /// No token and no user/password pair is available
    #[error(
        "No credentials configured.\n\
        Run 'kdctl login', or set --token / KD_TOKEN, or --user and --password."
    )]
    Unauthenticated,

    /// The response body did not follow the {"status", "data"} envelope
    #[error("Unexpected response from {url}: {reason}")]
    Envelope { url: String, reason: String },
}

fn server_message(status: StatusCode, kind: Option<&str>, message: &str) -> String {
    let mut msg = match kind {
        Some(kind) => format!("{message} ({kind}, HTTP {})", status.as_u16()),
        None => format!("{message} (HTTP {})", status.as_u16()),
    };

    let hint = match status {
        StatusCode::UNAUTHORIZED => "Check your credentials or run 'kdctl login' again",
        StatusCode::FORBIDDEN => "Your account may not have sufficient permissions",
        StatusCode::NOT_FOUND => "The requested resource was not found",
        StatusCode::SERVICE_UNAVAILABLE => "KuberDock may be in maintenance mode",
        _ => "",
    };
    if !hint.is_empty() {
        msg.push_str("\nHint: ");
        msg.push_str(hint);
    }
    msg
}

/// Errors raised while turning `--id` / `--name` into a resource id
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{kind} '{name}' not found{}", suggestion(suggestions))]
    NotFound {
        kind: &'static str,
        name: String,
        suggestions: Vec<String>,
    },

    #[error("{kind} name '{name}' is ambiguous, matching ids: {}", ids.join(", "))]
    Ambiguous {
        kind: &'static str,
        name: String,
        ids: Vec<String>,
    },
}

fn suggestion(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!(". Did you mean: {}?", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_message() {
        let err = ApiError::Server {
            status: StatusCode::NOT_ACCEPTABLE,
            kind: Some("DuplicateName".to_string()),
            message: "data already exists".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "data already exists (DuplicateName, HTTP 406)"
        );
    }

    #[test]
    fn test_server_error_hint() {
        let err = ApiError::Server {
            status: StatusCode::NOT_FOUND,
            kind: None,
            message: "Persistent disk not found.".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("Persistent disk not found. (HTTP 404)"));
        assert!(text.contains("Hint: The requested resource was not found"));
    }

    #[test]
    fn test_not_found_suggestions() {
        let err = ResolveError::NotFound {
            kind: "domain",
            name: "exmple.com".to_string(),
            suggestions: vec!["example.com".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "domain 'exmple.com' not found. Did you mean: example.com?"
        );

        let err = ResolveError::NotFound {
            kind: "pod",
            name: "web".to_string(),
            suggestions: vec![],
        };
        assert_eq!(err.to_string(), "pod 'web' not found");
    }
}
