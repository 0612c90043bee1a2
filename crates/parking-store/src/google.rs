//! [`GoogleSheet`]: the Google Sheets v4 REST implementation of [`Sheet`].
//!
//! One instance addresses one tab (by title) of one spreadsheet (by id).
//! Values are written with `RAW` input: every cell is stored as the exact
//! text given, so phones, IDs with leading zeros and plates such as `12E4`
//! are never reinterpreted as numbers or dates.

use parking_core::sheet::Sheet;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::{AccessToken, Error, Result};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Grid size of a sheet created by [`Sheet::ensure_sheet`].
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLUMNS: u32 = 40;

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GoogleSheet {
  client:         Client,
  base:           Url,
  spreadsheet_id: String,
  sheet_name:     String,
  token:          AccessToken,
}

impl GoogleSheet {
  /// Address `sheet_name` in the spreadsheet `spreadsheet_id` on the public
  /// Sheets API.
  pub fn connect(
    client: Client,
    token: AccessToken,
    spreadsheet_id: impl Into<String>,
    sheet_name: impl Into<String>,
  ) -> Result<Self> {
    Self::with_api_base(client, token, SHEETS_API_BASE, spreadsheet_id, sheet_name)
  }

  /// As [`Self::connect`], against another API root.
  pub fn with_api_base(
    client: Client,
    token: AccessToken,
    api_base: &str,
    spreadsheet_id: impl Into<String>,
    sheet_name: impl Into<String>,
  ) -> Result<Self> {
    let base = Url::parse(api_base)?;
    if base.cannot_be_a_base() {
      return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
    }
    Ok(Self {
      client,
      base,
      spreadsheet_id: spreadsheet_id.into(),
      sheet_name: sheet_name.into(),
      token,
    })
  }

  pub fn spreadsheet_id(&self) -> &str { &self.spreadsheet_id }

  pub fn sheet_name(&self) -> &str { &self.sheet_name }

  /// `{base}/{segments...}`, each segment percent-encoded.
  fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  /// A `values/{range}` endpoint for an A1 range on this sheet.
  fn values_endpoint(&self, range_suffix: &str) -> Result<Url> {
    let range = format!("{}{range_suffix}", quote_sheet_name(&self.sheet_name));
    self.endpoint(&[&self.spreadsheet_id, "values", &range])
  }

  fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
    req.bearer_auth(self.token.secret())
  }

  async fn get_values(&self, range_suffix: &str) -> Result<Vec<Vec<String>>> {
    let url = self.values_endpoint(range_suffix)?;
    let resp = self.authorized(self.client.get(url)).send().await?;
    let body: ValueRange = check(resp).await?.json().await?;
    Ok(body.into_rows())
  }

  async fn sheet_titles(&self) -> Result<Vec<String>> {
    let mut url = self.endpoint(&[&self.spreadsheet_id])?;
    url.query_pairs_mut().append_pair("fields", "sheets.properties.title");
    let resp = self.authorized(self.client.get(url)).send().await?;
    let body: Spreadsheet = check(resp).await?.json().await?;
    Ok(body.sheets.into_iter().map(|s| s.properties.title).collect())
  }
}

/// Quote a sheet title for use in an A1 range (`'It''s'`).
fn quote_sheet_name(name: &str) -> String { format!("'{}'", name.replace('\'', "''")) }

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Spreadsheet {
  #[serde(default)]
  sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
  properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
  title: String,
}

#[derive(Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<Value>>,
}

impl ValueRange {
  fn into_rows(self) -> Vec<Vec<String>> {
    self
      .values
      .into_iter()
      .map(|row| row.into_iter().map(cell_text).collect())
      .collect()
  }
}

fn cell_text(value: Value) -> String {
  match value {
    Value::String(s) => s,
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: String,
  #[serde(default)]
  status:  String,
}

/// Pass successful responses through; turn anything else into
/// [`Error::Status`] carrying Google's own message when there is one.
async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let text = resp.text().await.unwrap_or_default();
  let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
    Ok(ErrorEnvelope { error }) if !error.status.is_empty() => {
      format!("{}: {}", error.status, error.message)
    }
    Ok(ErrorEnvelope { error }) => error.message,
    Err(_) if text.trim().is_empty() => status.canonical_reason().unwrap_or_default().to_owned(),
    Err(_) => text,
  };
  Err(Error::Status { status: status.as_u16(), message })
}

// ─── Sheet impl ──────────────────────────────────────────────────────────────

impl Sheet for GoogleSheet {
  type Error = Error;

  async fn ensure_sheet(&self) -> Result<()> {
    if self.sheet_titles().await?.iter().any(|t| *t == self.sheet_name) {
      return Ok(());
    }

    let batch = format!("{}:batchUpdate", self.spreadsheet_id);
    let url = self.endpoint(&[&batch])?;
    let body = json!({
      "requests": [{
        "addSheet": {
          "properties": {
            "title": self.sheet_name,
            "gridProperties": {
              "rowCount": NEW_SHEET_ROWS,
              "columnCount": NEW_SHEET_COLUMNS,
            },
          },
        },
      }],
    });
    let resp = self.authorized(self.client.post(url)).json(&body).send().await?;
    check(resp).await?;
    info!(spreadsheet = %self.spreadsheet_id, sheet = %self.sheet_name, "created sheet");
    Ok(())
  }

  async fn read_values(&self) -> Result<Vec<Vec<String>>> {
    let rows = self.get_values("").await?;
    debug!(sheet = %self.sheet_name, rows = rows.len(), "read sheet values");
    Ok(rows)
  }

  async fn header(&self) -> Result<Option<Vec<String>>> {
    Ok(self.get_values("!1:1").await?.into_iter().next())
  }

  async fn set_header(&self, header: Vec<String>) -> Result<()> {
    let mut url = self.values_endpoint("!1:1")?;
    url.query_pairs_mut().append_pair("valueInputOption", "RAW");
    let body = json!({ "majorDimension": "ROWS", "values": [header] });
    let resp = self.authorized(self.client.put(url)).json(&body).send().await?;
    check(resp).await?;
    Ok(())
  }

  async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
    if rows.is_empty() {
      return Ok(());
    }
    let mut url = self.values_endpoint("!A1:append")?;
    url
      .query_pairs_mut()
      .append_pair("valueInputOption", "RAW")
      .append_pair("insertDataOption", "INSERT_ROWS");
    let body = json!({ "majorDimension": "ROWS", "values": rows });
    let resp = self.authorized(self.client.post(url)).json(&body).send().await?;
    check(resp).await?;
    Ok(())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
  };
  use parking_core::sheet::{Diagnose, FailureKind};

  use super::*;

  /// One spreadsheet holding a single tab, served the way the Sheets API
  /// serves it.
  #[derive(Default)]
  struct Fake {
    titles:   Vec<String>,
    values:   Vec<Vec<String>>,
    requests: Vec<String>,
    deny:     bool,
  }

  type Shared = Arc<Mutex<Fake>>;

  fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer test-token")
  }

  fn denied() -> axum::response::Response {
    (
      StatusCode::FORBIDDEN,
      Json(json!({
        "error": {
          "code": 403,
          "message": "The caller does not have permission",
          "status": "PERMISSION_DENIED",
        }
      })),
    )
      .into_response()
  }

  async fn spreadsheet(
    State(fake): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
  ) -> axum::response::Response {
    let mut fake = fake.lock().unwrap();
    fake.requests.push(format!("GET {id}"));
    if fake.deny || !authorized(&headers) {
      return denied();
    }
    let sheets: Vec<_> =
      fake.titles.iter().map(|t| json!({ "properties": { "title": t } })).collect();
    Json(json!({ "sheets": sheets })).into_response()
  }

  async fn batch_update(
    State(fake): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
  ) -> axum::response::Response {
    let mut fake = fake.lock().unwrap();
    fake.requests.push(format!("POST {id}"));
    let title = body["requests"][0]["addSheet"]["properties"]["title"]
      .as_str()
      .unwrap()
      .to_owned();
    fake.titles.push(title);
    Json(json!({})).into_response()
  }

  async fn get_values(
    State(fake): State<Shared>,
    Path((_, range)): Path<(String, String)>,
  ) -> axum::response::Response {
    let mut fake = fake.lock().unwrap();
    fake.requests.push(format!("GET values {range}"));
    if fake.deny {
      return denied();
    }
    let values: Vec<Vec<String>> = if range.ends_with("!1:1") {
      fake.values.first().cloned().into_iter().collect()
    } else {
      fake.values.clone()
    };
    if values.is_empty() {
      return Json(json!({ "range": range })).into_response();
    }
    Json(json!({ "range": range, "values": values })).into_response()
  }

  async fn put_values(
    State(fake): State<Shared>,
    Path((_, range)): Path<(String, String)>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    Json(body): Json<Value>,
  ) -> axum::response::Response {
    let mut fake = fake.lock().unwrap();
    fake.requests.push(format!("PUT values {range} {}", query["valueInputOption"]));
    let header: Vec<String> = serde_json::from_value(body["values"][0].clone()).unwrap();
    match fake.values.first_mut() {
      Some(first) => *first = header,
      None => fake.values.push(header),
    }
    Json(json!({})).into_response()
  }

  async fn append_values(
    State(fake): State<Shared>,
    Path((_, range)): Path<(String, String)>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    Json(body): Json<Value>,
  ) -> axum::response::Response {
    let mut fake = fake.lock().unwrap();
    fake.requests.push(format!(
      "POST values {range} {} {}",
      query["valueInputOption"], query["insertDataOption"]
    ));
    if fake.deny {
      return denied();
    }
    let rows: Vec<Vec<String>> = serde_json::from_value(body["values"].clone()).unwrap();
    fake.values.extend(rows);
    Json(json!({})).into_response()
  }

  /// Start the fake API on an ephemeral port; returns the API base URL.
  async fn serve(fake: Shared) -> String {
    let app = Router::new()
      .route("/v4/spreadsheets/{id}", get(spreadsheet).post(batch_update))
      .route(
        "/v4/spreadsheets/{id}/values/{range}",
        get(get_values).put(put_values).post(append_values),
      )
      .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/v4/spreadsheets")
  }

  async fn sheet(fake: &Shared) -> GoogleSheet {
    let base = serve(Arc::clone(fake)).await;
    GoogleSheet::with_api_base(
      Client::new(),
      AccessToken::new("test-token"),
      &base,
      "sheet-id",
      "formularios",
    )
    .unwrap()
  }

  fn row(cells: &[&str]) -> Vec<String> { cells.iter().map(|c| (*c).to_owned()).collect() }

  // `:batchUpdate` and `:append` are part of the last path segment, so the
  // fake sees them inside the `{id}` and `{range}` captures.

  #[tokio::test]
  async fn ensure_sheet_creates_missing_tab_once() {
    let fake = Shared::default();
    let s = sheet(&fake).await;

    s.ensure_sheet().await.unwrap();
    s.ensure_sheet().await.unwrap();

    let fake = fake.lock().unwrap();
    assert_eq!(fake.titles, ["formularios"]);
    assert_eq!(fake.requests, [
      "GET sheet-id",
      "POST sheet-id:batchUpdate",
      "GET sheet-id"
    ]);
  }

  #[tokio::test]
  async fn header_and_rows_round_trip() {
    let fake = Shared::default();
    let s = sheet(&fake).await;

    assert!(s.header().await.unwrap().is_none());
    assert!(s.read_values().await.unwrap().is_empty());

    let header = row(&["name", "national_id", "phone", "plate"]);
    let typed = row(&["Ana", "0012345", "+595981123456", "12E4"]);
    s.set_header(header.clone()).await.unwrap();
    s.append_rows(vec![typed.clone()]).await.unwrap();

    assert_eq!(s.header().await.unwrap(), Some(header.clone()));
    assert_eq!(s.read_values().await.unwrap(), [header, typed]);

    let fake = fake.lock().unwrap();
    assert!(fake.requests.contains(&"PUT values 'formularios'!1:1 RAW".to_owned()));
    assert!(
      fake
        .requests
        .contains(&"POST values 'formularios'!A1:append RAW INSERT_ROWS".to_owned())
    );
  }

  #[tokio::test]
  async fn google_errors_are_classified() {
    let fake = Shared::default();
    fake.lock().unwrap().deny = true;
    let s = sheet(&fake).await;

    let err = s.append_rows(vec![row(&["x"])]).await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::PermissionDenied);
    assert!(err.to_string().contains("PERMISSION_DENIED"));
  }

  #[tokio::test]
  async fn wrong_token_is_rejected() {
    let fake = Shared::default();
    let base = serve(Arc::clone(&fake)).await;
    let s = GoogleSheet::with_api_base(
      Client::new(),
      AccessToken::new("stale"),
      &base,
      "sheet-id",
      "formularios",
    )
    .unwrap();
    let err = s.ensure_sheet().await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 403, .. }));
  }

  #[tokio::test]
  async fn unreachable_api_is_unreachable() {
    let s = GoogleSheet::with_api_base(
      Client::new(),
      AccessToken::new("t"),
      "http://127.0.0.1:9/v4/spreadsheets",
      "sheet-id",
      "formularios",
    )
    .unwrap();
    let err = s.read_values().await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::Unreachable);
  }

  #[test]
  fn sheet_names_are_quoted() {
    assert_eq!(quote_sheet_name("formularios"), "'formularios'");
    assert_eq!(quote_sheet_name("Bob's"), "'Bob''s'");
  }

  #[test]
  fn cannot_be_a_base_is_rejected() {
    let err = GoogleSheet::with_api_base(
      Client::new(),
      AccessToken::new("t"),
      "mailto:nobody@example.com",
      "id",
      "formularios",
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::Url(_)));
  }
}
