//! Bearer-token credentials for the Google Sheets backend.
//!
//! Obtaining the token (service-account exchange, `gcloud auth
//! print-access-token`, a sidecar refresher) happens outside this process;
//! this module only locates it.

use std::{fmt, path::PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Environment variable consulted when no token is configured explicitly.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Where to look for an access token, in priority order: inline value,
/// then file, then [`ACCESS_TOKEN_ENV`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialSource {
  pub access_token:      Option<String>,
  pub access_token_file: Option<PathBuf>,
}

/// An OAuth bearer token scoped to read and write the spreadsheet.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
  pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

  pub fn secret(&self) -> &str { &self.0 }

  /// Resolve a token from `source`, falling back to the environment.
  pub fn resolve(source: &CredentialSource) -> Result<Self> {
    Self::resolve_with_env(source, std::env::var(ACCESS_TOKEN_ENV).ok())
  }

  /// As [`Self::resolve`], with the environment value supplied by the caller.
  pub fn resolve_with_env(source: &CredentialSource, env: Option<String>) -> Result<Self> {
    if let Some(token) = source.access_token.as_deref().and_then(non_blank) {
      return Ok(Self::new(token));
    }

    if let Some(path) = &source.access_token_file {
      let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::Credentials(format!("cannot read token file {}: {e}", path.display()))
      })?;
      return non_blank(&raw)
        .map(Self::new)
        .ok_or_else(|| Error::Credentials(format!("token file {} is empty", path.display())));
    }

    env
      .as_deref()
      .and_then(non_blank)
      .map(Self::new)
      .ok_or_else(|| {
        Error::Credentials(format!(
          "no access token found; set `access_token`, `access_token_file`, or the \
           {ACCESS_TOKEN_ENV} environment variable"
        ))
      })
  }
}

impl fmt::Debug for AccessToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("AccessToken(***)") }
}

fn non_blank(s: &str) -> Option<&str> {
  let trimmed = s.trim();
  (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn inline_token_wins() {
    let source = CredentialSource {
      access_token:      Some(" inline ".into()),
      access_token_file: Some("/nonexistent".into()),
    };
    let token = AccessToken::resolve_with_env(&source, Some("env".into())).unwrap();
    assert_eq!(token.secret(), "inline");
  }

  #[test]
  fn token_file_is_trimmed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ya29.token").unwrap();
    let source = CredentialSource {
      access_token:      None,
      access_token_file: Some(file.path().to_path_buf()),
    };
    let token = AccessToken::resolve_with_env(&source, None).unwrap();
    assert_eq!(token.secret(), "ya29.token");
  }

  #[test]
  fn unreadable_file_is_a_credentials_error() {
    let source = CredentialSource {
      access_token:      None,
      access_token_file: Some("/nonexistent/token".into()),
    };
    let err = AccessToken::resolve_with_env(&source, Some("env".into())).unwrap_err();
    assert!(matches!(err, Error::Credentials(ref m) if m.contains("/nonexistent/token")));
  }

  #[test]
  fn environment_is_the_last_resort() {
    let token = AccessToken::resolve_with_env(&CredentialSource::default(), Some("env".into()))
      .unwrap();
    assert_eq!(token.secret(), "env");
  }

  #[test]
  fn nothing_configured_names_every_option() {
    let err = AccessToken::resolve_with_env(&CredentialSource::default(), Some("  ".into()))
      .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("access_token_file"));
    assert!(msg.contains(ACCESS_TOKEN_ENV));
  }

  #[test]
  fn debug_hides_the_secret() {
    assert_eq!(format!("{:?}", AccessToken::new("s3cret")), "AccessToken(***)");
  }
}
