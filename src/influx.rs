use crate::errors::AppError;
use crate::model::LastHeardRecord;
use chrono::{DateTime, Utc};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const MEASUREMENT: &str = "last_heard";
pub const DEFAULT_PORT: u16 = 8086;
pub const DEFAULT_DB: &str = "pistar";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Float(f64),
    Int(i64),
}

/// One time-series point as InfluxDB 1.x stores it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    pub measurement: String,
    pub time: DateTime<Utc>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl From<&LastHeardRecord> for Point {
    fn from(r: &LastHeardRecord) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("mode".to_string(), FieldValue::Str(r.mode.clone()));
        fields.insert("callsign".to_string(), FieldValue::Str(r.callsign.clone()));
        fields.insert("target".to_string(), FieldValue::Str(r.target.clone()));
        fields.insert("source".to_string(), FieldValue::Str(r.source.clone()));
        fields.insert("duration".to_string(), FieldValue::Float(r.duration));
        fields.insert("loss".to_string(), FieldValue::Int(i64::from(r.loss)));
        if let Some(ber) = r.ber {
            fields.insert("ber".to_string(), FieldValue::Float(ber));
        }
        Point {
            measurement: MEASUREMENT.to_string(),
            time: r.timestamp,
            fields,
        }
    }
}

#[inline]
fn escape_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ',' | '=' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[inline]
fn escape_str_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            // Line protocol ends a point at a newline, even inside quotes.
            '\n' | '\r' => out.push(' '),
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl FieldValue {
    fn encode(&self) -> String {
        match self {
            FieldValue::Str(s) => escape_str_value(s),
            FieldValue::Float(v) => format!("{:?}", v),
            FieldValue::Int(v) => format!("{}i", v),
        }
    }
}

impl Point {
    /// Line protocol, second precision.
    pub fn to_line_protocol(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", escape_key(k), v.encode()))
            .collect::<Vec<_>>()
            .join(",");
        format!("{} {} {}", escape_key(&self.measurement), fields, self.time.timestamp())
    }
}

/// "host", "host/" or "http(s)://host" plus port -> base URL.
pub fn base_url(host: &str, port: u16) -> Result<String, AppError> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(AppError::Config("empty InfluxDB host".into()));
    }
    if host.contains("://") {
        Ok(format!("{}:{}", host, port))
    } else {
        Ok(format!("http://{}:{}", host, port))
    }
}

#[derive(Debug, Default, Deserialize)]
struct StatementResult {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

/// First error reported in a `/query` response body, if any.
fn query_error(body: &str) -> Option<String> {
    let resp: QueryResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return Some(format!("unreadable response '{}': {}", body, e)),
    };
    resp.error
        .or_else(|| resp.results.into_iter().find_map(|r| r.error))
}

pub struct InfluxClient {
    client: reqwest::blocking::Client,
    base: String,
    db: String,
}

impl InfluxClient {
    /// Check the server answers and make sure `db` exists.
    pub fn connect(host: &str, port: u16, db: &str) -> Result<Self, AppError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("http client: {}", e)))?;
        Self::connect_with(client, host, port, db)
    }

    pub fn connect_with(
        client: reqwest::blocking::Client,
        host: &str,
        port: u16,
        db: &str,
    ) -> Result<Self, AppError> {
        let base = base_url(host, port)?;

        let ping = client
            .get(format!("{}/ping", base))
            .send()
            .map_err(|e| AppError::StorageConnect(format!("{}: {}", base, e)))?;
        trace!("ping {} -> {}", base, ping.status());
        if !ping.status().is_success() {
            return Err(AppError::StorageConnect(format!("{}: ping status {}", base, ping.status())));
        }

        let this = InfluxClient { client, base, db: db.to_string() };
        this.create_database()?;
        debug!("using database '{}' on {}", this.db, this.base);
        Ok(this)
    }

    fn create_database(&self) -> Result<(), AppError> {
        let stmt = format!("CREATE DATABASE \"{}\"", self.db.replace('"', "\\\""));
        let resp = self
            .client
            .post(format!("{}/query", self.base))
            .form(&[("q", stmt.as_str())])
            .send()
            .map_err(|e| AppError::StorageConnect(format!("{}: {}", self.base, e)))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| AppError::StorageConnect(format!("{}: {}", self.base, e)))?;
        trace!("create database -> {} {}", status, body);
        if let Some(err) = query_error(&body) {
            return Err(AppError::StorageConnect(format!("create database '{}': {}", self.db, err)));
        }
        if !status.is_success() {
            return Err(AppError::StorageConnect(format!("create database '{}': status {}", self.db, status)));
        }
        Ok(())
    }

    pub fn write_points(&self, points: &[Point]) -> Result<(), AppError> {
        if points.is_empty() {
            info!("Nothing to write");
            return Ok(());
        }
        let body = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");
        trace!("line protocol:\n{}", body);

        let resp = self
            .client
            .post(format!("{}/write", self.base))
            .query(&[("db", self.db.as_str()), ("precision", "s")])
            .body(body)
            .send()
            .map_err(|e| AppError::StorageWrite(format!("{}: {}", self.base, e)))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(AppError::StorageWrite(format!("status {}: {}", status, text.trim())));
        }
        info!("Wrote {} points to '{}'", points.len(), self.db);
        Ok(())
    }
}
