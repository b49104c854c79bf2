use crate::dashboard::{self, PageFetcher};
use crate::errors::AppError;
use crate::lastheard::{self, ParseContext};
use crate::model::LastHeardRecord;
use log::{debug, info, warn};

#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub records: Vec<LastHeardRecord>,
    pub rows_examined: usize,
}

/// Parse already-extracted table rows, keeping row order and dropping the
/// rows that do not parse (the header row among them).
pub fn scrape_rows<S: AsRef<str>>(rows: &[Vec<S>], ctx: &ParseContext) -> ScrapeOutcome {
    info!("Parsing {} entries...", rows.len().saturating_sub(1));

    let mut records = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match lastheard::parse_row(row, ctx) {
            Ok(rec) => {
                info!("{}", rec);
                records.push(rec);
            }
            Err(e) => {
                debug!("skipping row {}: {}", idx, e);
            }
        }
    }

    if records.is_empty() && rows.len() > 1 {
        warn!("no usable rows; enable --log debug to see why rows were skipped");
    }
    ScrapeOutcome { records, rows_examined: rows.len() }
}

/// One scrape cycle: fetch the "last heard" page and parse its table.
pub fn scrape_last_heard(
    fetcher: &dyn PageFetcher,
    url: &str,
    ctx: &ParseContext,
) -> Result<ScrapeOutcome, AppError> {
    info!("Getting Pi-Star page {}", url);
    let body = fetcher.fetch(url)?;
    let rows = dashboard::extract_rows(&body);
    Ok(scrape_rows(&rows, ctx))
}
