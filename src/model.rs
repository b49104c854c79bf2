use chrono::{DateTime, Utc};
use std::fmt;

/// One row of the dashboard's "last heard" table.
#[derive(Clone, Debug, PartialEq)]
pub struct LastHeardRecord {
    pub timestamp: DateTime<Utc>,
    pub mode: String,
    pub callsign: String,
    pub target: String,
    pub source: String,
    pub duration: f64,
    pub loss: u8,
    pub ber: Option<f64>, // None when the dashboard shows "??"
}

impl Default for LastHeardRecord {
    fn default() -> Self {
        Self {
            timestamp: DateTime::<Utc>::default(), // Unix epoch
            mode: "unknown".into(),
            callsign: "unknown".into(),
            target: "unknown".into(),
            source: "unknown".into(),
            duration: 0.0,
            loss: 0,
            ber: Some(0.0),
        }
    }
}

impl fmt::Display for LastHeardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ber = match self.ber {
            Some(b) => b.to_string(),
            None => "??".to_string(),
        };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}%\t{}%",
            self.timestamp.to_rfc3339(),
            self.mode,
            self.callsign,
            self.target,
            self.source,
            self.duration,
            self.loss,
            ber
        )
    }
}
