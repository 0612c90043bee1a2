//! Async HTTP client wrapping the parking JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use parking_core::{report::Report, submission::SubmissionForm};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Origin tag attached to submissions made from the command line.
pub const CLI_ORIGIN: &str = "cli";

/// Connection settings for the parking API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the parking JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// Dashboard filters, sent as comma-separated query parameters.
#[derive(Debug, Clone, Default)]
pub struct Filter {
  pub units: Vec<String>,
  pub days:  Vec<String>,
  pub hours: Vec<u8>,
}

impl Filter {
  fn query(&self) -> Vec<(&'static str, String)> {
    let mut q = Vec::new();
    if !self.units.is_empty() {
      q.push(("unit", self.units.join(",")));
    }
    if !self.days.is_empty() {
      q.push(("day", self.days.join(",")));
    }
    if !self.hours.is_empty() {
      let hours: Vec<String> = self.hours.iter().map(u8::to_string).collect();
      q.push(("hour", hours.join(",")));
    }
    q
  }
}

#[derive(Serialize)]
struct SubmissionBody<'a> {
  #[serde(flatten)]
  form:   &'a SubmissionForm,
  origin: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct Created {
  pub registration_id: Uuid,
  pub rows:            usize,
}

/// `GET /report` as seen by the client.
#[derive(Debug, Deserialize)]
pub struct ReportView {
  #[serde(flatten)]
  pub report:        Report,
  pub origin:        Value,
  #[serde(default)]
  pub rejected_rows: usize,
  pub warning:       Option<String>,
}

/// A downloaded CSV export.
#[derive(Debug)]
pub struct Export {
  /// Suggested by the server's `Content-Disposition`, if any.
  pub filename: Option<String>,
  pub bytes:    Vec<u8>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Form ──────────────────────────────────────────────────────────────────

  /// `POST /api/submissions`
  pub async fn submit(&self, form: &SubmissionForm) -> Result<Created> {
    let resp = self
      .client
      .post(self.url("/submissions"))
      .json(&SubmissionBody { form, origin: CLI_ORIGIN })
      .send()
      .await
      .context("POST /submissions failed")?;

    let resp = ensure_success(resp, "POST /submissions").await?;
    resp.json().await.context("deserialising submission receipt")
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  /// `GET /api/report?unit=..&day=..&hour=..&top=..`
  pub async fn report(&self, filter: &Filter, top: Option<usize>) -> Result<ReportView> {
    let mut query = filter.query();
    if let Some(top) = top {
      query.push(("top", top.to_string()));
    }
    let resp = self
      .client
      .get(self.url("/report"))
      .query(&query)
      .send()
      .await
      .context("GET /report failed")?;

    let resp = ensure_success(resp, "GET /report").await?;
    resp.json().await.context("deserialising report")
  }

  /// `GET /api/export?unit=..&day=..&hour=..`
  pub async fn export(&self, filter: &Filter) -> Result<Export> {
    let resp = self
      .client
      .get(self.url("/export"))
      .query(&filter.query())
      .send()
      .await
      .context("GET /export failed")?;

    let resp = ensure_success(resp, "GET /export").await?;
    let filename = resp
      .headers()
      .get(reqwest::header::CONTENT_DISPOSITION)
      .and_then(|v| v.to_str().ok())
      .and_then(attachment_filename);
    let bytes = resp.bytes().await.context("reading export body")?.to_vec();
    Ok(Export { filename, bytes })
  }
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn ensure_success(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<Value>()
    .await
    .ok()
    .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_owned))
    .unwrap_or_else(|| status.to_string());
  Err(anyhow!("{what} → {status}: {message}"))
}

/// The `filename` parameter of an `attachment` disposition.
fn attachment_filename(disposition: &str) -> Option<String> {
  disposition
    .split(';')
    .map(str::trim)
    .find_map(|part| part.strip_prefix("filename="))
    .map(|name| name.trim_matches('"').to_owned())
    .filter(|name| !name.is_empty() && !name.contains(['/', '\\']))
}
