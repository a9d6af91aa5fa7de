// ============================================================================
// Stubs HTTP locaux pour les tests d'intégration
// ============================================================================
// Chaque stub est un petit routeur axum lancé sur 127.0.0.1:0 :
// - HistoStub  : CryptoCompare /data/histohour
// - SheetsStub : Google Sheets /v4/spreadsheets/{id}/values/{range}
// - TokenStub  : endpoint token OAuth2
// ============================================================================

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use pricesheet::api::{GoogleSheetsClient, OAuthClient};
use pricesheet::auth::{CredentialManager, FileCredentialStore, OutOfBandAuthorizer};
use pricesheet::models::credential::SPREADSHEETS_SCOPE;
use pricesheet::models::Credential;
use pricesheet::relay::SheetUpdater;

pub const SPREADSHEET_ID: &str = "spreadsheet-123";
pub const GOOD_REFRESH: &str = "good-refresh";
pub const FRESH_TOKEN: &str = "fresh-token";
pub const GOOD_CODE: &str = "good-code";
/// Refresh token accepté, mais dont la réponse porte un expires_in aberrant
pub const HUGE_EXPIRY_REFRESH: &str = "huge-expiry-refresh";

/// Lance un routeur sur un port libre et retourne son URL de base
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// ============================================================================
// CryptoCompare
// ============================================================================

/// Corps "Success" avec 3 barres ; la dernière a l'heure `time` et la clôture `close`
pub fn bars_body(time: i64, close: f64) -> Value {
    json!({
        "Response": "Success",
        "Type": 100,
        "Aggregated": false,
        "TimeFrom": time - 7200,
        "TimeTo": time,
        "Data": [
            {"time": time - 7200, "high": 1.0, "low": 1.0, "open": 1.0, "close": 1.0,
             "volumefrom": 1.0, "volumeto": 1.0, "conversionType": "direct", "conversionSymbol": ""},
            {"time": time - 3600, "high": 2.0, "low": 2.0, "open": 2.0, "close": 2.0,
             "volumefrom": 2.0, "volumeto": 2.0, "conversionType": "direct", "conversionSymbol": ""},
            {"time": time, "high": close + 10.0, "low": close - 10.0, "open": close - 1.0, "close": close,
             "volumefrom": 12.5, "volumeto": 250.75, "conversionType": "direct", "conversionSymbol": ""}
        ]
    })
}

#[derive(Clone, Default)]
pub struct HistoStub {
    responses: Arc<Mutex<HashMap<String, (u16, Value)>>>,
    requests: Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>,
}

impl HistoStub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Réponse servie pour un `tsym` donné
    pub fn respond(&self, tsym: &str, status: u16, body: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .insert(tsym.to_string(), (status, body));
        self
    }

    /// Paramètres de requête et header Authorization reçus
    pub fn requests(&self) -> Vec<(HashMap<String, String>, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/data/histohour", get(histohour))
            .with_state(self.clone());
        spawn(app).await
    }
}

async fn histohour(
    State(stub): State<HistoStub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let tsym = params.get("tsym").cloned().unwrap_or_default();
    stub.requests.lock().unwrap().push((params, auth));

    match stub.responses.lock().unwrap().get(&tsym) {
        Some((status, body)) => (StatusCode::from_u16(*status).unwrap(), Json(body.clone())),
        None => (
            StatusCode::OK,
            Json(json!({"Response": "Error", "Message": "market does not exist for this coin pair"})),
        ),
    }
}

// ============================================================================
// Google Sheets
// ============================================================================

#[derive(Default)]
struct SheetsState {
    access_token: String,
    sheets: HashMap<String, Vec<Vec<Value>>>,
    writes: Vec<String>,
    value_input_options: Vec<Option<String>>,
}

/// Feuille de calcul en mémoire
#[derive(Clone, Default)]
pub struct SheetsStub {
    state: Arc<Mutex<SheetsState>>,
}

impl SheetsStub {
    /// `access_token` : seul Bearer accepté
    pub fn new(access_token: &str) -> Self {
        let stub = Self::default();
        stub.state.lock().unwrap().access_token = access_token.to_string();
        stub
    }

    /// Ajoute un onglet avec `rows` lignes déjà remplies en colonne A
    pub fn with_sheet(self, name: &str, rows: usize) -> Self {
        let existing = (0..rows).map(|i| vec![json!(format!("row {}", i + 1))]).collect();
        self.state
            .lock()
            .unwrap()
            .sheets
            .insert(name.to_string(), existing);
        self
    }

    pub fn rows(&self, sheet: &str) -> Vec<Vec<Value>> {
        self.state
            .lock()
            .unwrap()
            .sheets
            .get(sheet)
            .cloned()
            .unwrap_or_default()
    }

    /// Plages écrites, dans l'ordre
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn value_input_options(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().value_input_options.clone()
    }

    pub async fn start(&self) -> String {
        let app = Router::new()
            .route(
                "/v4/spreadsheets/:id/values/:range",
                get(read_values).put(write_values),
            )
            .with_state(self.clone());
        spawn(app).await
    }
}

fn google_error(status: StatusCode, message: &str, kind: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message, "status": kind}})),
    )
}

fn authorized(state: &SheetsState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.access_token);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

/// "USDC!A:A" -> ("USDC", "A:A") ; "'My Sheet'!A3" -> ("My Sheet", "A3")
fn split_range(range: &str) -> (String, String) {
    let (sheet, cells) = range.rsplit_once('!').unwrap_or((range, ""));
    let sheet = sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .map(|s| s.replace("''", "'"))
        .unwrap_or_else(|| sheet.to_string());
    (sheet, cells.to_string())
}

async fn read_values(
    State(stub): State<SheetsStub>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    let state = stub.state.lock().unwrap();
    if !authorized(&state, &headers) || id != SPREADSHEET_ID {
        return google_error(
            StatusCode::UNAUTHORIZED,
            "Request had invalid authentication credentials.",
            "UNAUTHENTICATED",
        );
    }

    let (sheet, _) = split_range(&range);
    match state.sheets.get(&sheet) {
        None => google_error(
            StatusCode::BAD_REQUEST,
            &format!("Unable to parse range: {}", range),
            "INVALID_ARGUMENT",
        ),
        Some(rows) if rows.is_empty() => (
            StatusCode::OK,
            Json(json!({"range": format!("{}!A1:A1000", sheet), "majorDimension": "ROWS"})),
        ),
        Some(rows) => {
            let column: Vec<Value> = rows
                .iter()
                .map(|r| Value::Array(r.iter().take(1).cloned().collect()))
                .collect();
            (
                StatusCode::OK,
                Json(json!({"range": format!("{}!A1:A1000", sheet), "majorDimension": "ROWS", "values": column})),
            )
        }
    }
}

async fn write_values(
    State(stub): State<SheetsStub>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = stub.state.lock().unwrap();
    if !authorized(&state, &headers) || id != SPREADSHEET_ID {
        return google_error(
            StatusCode::UNAUTHORIZED,
            "Request had invalid authentication credentials.",
            "UNAUTHENTICATED",
        );
    }

    let (sheet, cells) = split_range(&range);
    let row: usize = match cells.strip_prefix('A').and_then(|r| r.parse().ok()) {
        Some(row) if row >= 1 => row,
        _ => {
            return google_error(
                StatusCode::BAD_REQUEST,
                &format!("Unable to parse range: {}", range),
                "INVALID_ARGUMENT",
            )
        }
    };

    let values = body["values"][0].as_array().cloned().unwrap_or_default();
    let width = values.len();

    let Some(rows) = state.sheets.get_mut(&sheet) else {
        return google_error(
            StatusCode::BAD_REQUEST,
            &format!("Unable to parse range: {}", range),
            "INVALID_ARGUMENT",
        );
    };
    if rows.len() < row {
        rows.resize(row, Vec::new());
    }
    rows[row - 1] = values;

    state.writes.push(range.clone());
    state
        .value_input_options
        .push(query.get("valueInputOption").cloned());

    (
        StatusCode::OK,
        Json(json!({
            "spreadsheetId": id,
            "updatedRange": format!("{}!A{}:H{}", sheet, row, row),
            "updatedRows": 1,
            "updatedColumns": width,
            "updatedCells": width,
        })),
    )
}

// ============================================================================
// OAuth2 token endpoint
// ============================================================================

#[derive(Clone, Default)]
pub struct TokenStub {
    calls: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl TokenStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HashMap<String, String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Retourne l'URL complète de l'endpoint (à utiliser comme token_uri)
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/token", post(token))
            .with_state(self.clone());
        format!("{}/token", spawn(app).await)
    }
}

async fn token(
    State(stub): State<TokenStub>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    stub.calls.lock().unwrap().push(form.clone());

    let invalid_grant = (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "invalid_grant", "error_description": "Token has been expired or revoked."})),
    );

    match form.get("grant_type").map(String::as_str) {
        Some("refresh_token") if form.get("refresh_token").map(String::as_str) == Some(GOOD_REFRESH) => (
            StatusCode::OK,
            Json(json!({
                "access_token": FRESH_TOKEN,
                "expires_in": 3599,
                "scope": SPREADSHEETS_SCOPE,
                "token_type": "Bearer"
            })),
        ),
        Some("refresh_token") if form.get("refresh_token").map(String::as_str) == Some(HUGE_EXPIRY_REFRESH) => (
            StatusCode::OK,
            Json(json!({
                "access_token": FRESH_TOKEN,
                "expires_in": i64::MAX,
                "token_type": "Bearer"
            })),
        ),
        Some("authorization_code") if form.get("code").map(String::as_str) == Some(GOOD_CODE) => (
            StatusCode::OK,
            Json(json!({
                "access_token": "code-token",
                "refresh_token": "new-refresh",
                "expires_in": 3599,
                "scope": SPREADSHEETS_SCOPE,
                "token_type": "Bearer"
            })),
        ),
        Some("refresh_token") | Some("authorization_code") => invalid_grant,
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        ),
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn credential(
    token_uri: &str,
    token: &str,
    refresh_token: Option<&str>,
    expiry: Option<DateTime<Utc>>,
) -> Credential {
    Credential {
        token: token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        token_uri: token_uri.to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        scopes: vec![SPREADSHEETS_SCOPE.to_string()],
        expiry,
    }
}

pub fn write_token(path: &FsPath, credential: &Credential) {
    std::fs::write(path, serde_json::to_string_pretty(credential).unwrap()).unwrap();
}

pub fn read_token(path: &FsPath) -> Credential {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Updater de production (token.json + endpoint token + Sheets) branché sur les stubs
pub fn updater(sheets_url: &str, token_path: &FsPath) -> SheetUpdater {
    let sheets = GoogleSheetsClient::new(sheets_url, SPREADSHEET_ID).unwrap();
    let credentials = CredentialManager::new(
        Arc::new(FileCredentialStore::new(token_path)),
        Arc::new(OAuthClient::new()),
        Arc::new(OutOfBandAuthorizer::new(token_path)),
    );
    SheetUpdater::new(Arc::new(sheets), credentials)
}
