use serde::Serialize;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::Session;

#[derive(Serialize)]
struct Credentials<'a> {
  email: &'a str,
  password: &'a str,
}

/// Exchange credentials for a session.
///
/// Primes the CSRF cookie first, then posts the login. A 401 here means the
/// credentials were wrong, not that a session expired, so it is remapped
/// before it reaches the caller.
pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<Session, ApiError> {
  api.prime_csrf().await?;

  let credentials = Credentials { email, password };
  match api.post_json("api/auth/login", &credentials).await {
    Ok(session) => Ok(session),
    Err(ApiError::Unauthorized) => Err(ApiError::Auth("invalid email or password".to_string())),
    Err(e) => Err(e),
  }
}
