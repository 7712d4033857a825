use reqwest::StatusCode;

/// Errors surfaced by the backend API.
///
/// The backend reports failures as an HTTP status plus a JSON body of the
/// form `{"error": "message"}`. Status codes map onto these variants in
/// `from_status`; connection-level failures become `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
  /// Sign-in rejected (bad credentials)
  Auth(String),
  /// Session missing or expired
  Unauthorized,
  /// Request rejected by validation (422 and other 4xx)
  Validation(String),
  /// Resource does not exist
  NotFound,
  /// Backend failure (5xx)
  Server(String),
  /// Could not reach the backend at all
  Transport(String),
}

impl ApiError {
  /// Map an HTTP error status and its reported message onto the taxonomy.
  pub fn from_status(status: StatusCode, message: String) -> Self {
    match status {
      StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
      StatusCode::NOT_FOUND => ApiError::NotFound,
      s if s.is_client_error() => ApiError::Validation(message),
      _ => ApiError::Server(message),
    }
  }
}

impl std::fmt::Display for ApiError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ApiError::Auth(msg) => write!(f, "{}", msg),
      ApiError::Unauthorized => write!(f, "session expired"),
      ApiError::Validation(msg) => write!(f, "{}", msg),
      ApiError::NotFound => write!(f, "not found"),
      ApiError::Server(msg) => write!(f, "server error: {}", msg),
      ApiError::Transport(msg) => write!(f, "connection failed: {}", msg),
    }
  }
}

impl std::error::Error for ApiError {}

/// Pull the `error` field out of a backend error body, if there is one.
pub fn error_message_from_body(body: &str) -> Option<String> {
  let value: serde_json::Value = serde_json::from_str(body).ok()?;
  value
    .get("error")
    .and_then(|v| v.as_str())
    .map(String::from)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unauthorized_mapping() {
    let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "Unauthenticated.".to_string());
    assert_eq!(err, ApiError::Unauthorized);
  }

  #[test]
  fn test_not_found_mapping() {
    let err = ApiError::from_status(StatusCode::NOT_FOUND, "No query results.".to_string());
    assert_eq!(err, ApiError::NotFound);
  }

  #[test]
  fn test_validation_mapping() {
    let err = ApiError::from_status(
      StatusCode::UNPROCESSABLE_ENTITY,
      "The title field is required.".to_string(),
    );
    assert_eq!(
      err,
      ApiError::Validation("The title field is required.".to_string())
    );

    // Other 4xx codes are validation failures too
    let err = ApiError::from_status(StatusCode::CONFLICT, "Duplicate title.".to_string());
    assert_eq!(err, ApiError::Validation("Duplicate title.".to_string()));
  }

  #[test]
  fn test_server_mapping() {
    let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
    assert_eq!(err, ApiError::Server("boom".to_string()));
  }

  #[test]
  fn test_error_message_from_body() {
    assert_eq!(
      error_message_from_body(r#"{"error": "Task not found"}"#),
      Some("Task not found".to_string())
    );
    assert_eq!(error_message_from_body(r#"{"data": []}"#), None);
    assert_eq!(error_message_from_body("<html>nope</html>"), None);
  }

  #[test]
  fn test_display() {
    assert_eq!(
      ApiError::Auth("invalid email or password".to_string()).to_string(),
      "invalid email or password"
    );
    assert_eq!(ApiError::Unauthorized.to_string(), "session expired");
    assert_eq!(
      ApiError::Transport("connection refused".to_string()).to_string(),
      "connection failed: connection refused"
    );
  }
}
