use crate::errors::AppError;
use log::trace;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// Path of the "last heard" fragment below the dashboard root.
pub const LAST_HEARD_PATH: &str = "/mmdvmhost/lh.php";

pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, AppError>;
}

pub fn last_heard_url(dashboard_url: &str) -> String {
    format!("{}{}", dashboard_url.trim_end_matches('/'), LAST_HEARD_PATH)
}

/// Blocking HTTP fetcher. Pi-Star ships a self-signed certificate, so
/// certificate checks are off.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, AppError> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("http client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        HttpFetcher { client }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, AppError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::Fetch(format!("'{}': {}", url, e)))?;
        let status = resp.status();
        trace!("GET {} -> {}", url, status);
        if !status.is_success() {
            return Err(AppError::Fetch(format!("'{}': status {}", url, status)));
        }
        resp.text()
            .map_err(|e| AppError::Fetch(format!("'{}': reading body: {}", url, e)))
    }
}

#[inline]
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>()
}

/// Rows of the first `<table>` in the page, each as its `<td>` texts.
/// Header rows built from `<th>` come back with no cells.
pub fn extract_rows(html: &str) -> Vec<Vec<String>> {
    // Static selectors; parsing them cannot fail.
    let table_sel = Selector::parse("table").expect("valid selector");
    let row_sel = Selector::parse("tr").expect("valid selector");
    let cell_sel = Selector::parse("td").expect("valid selector");

    let document = Html::parse_document(html);
    let Some(table) = document.select(&table_sel).next() else {
        trace!("no <table> in page");
        return Vec::new();
    };

    table
        .select(&row_sel)
        .map(|row| row.select(&cell_sel).map(cell_text).collect())
        .collect()
}

#[cfg(test)]
pub(crate) struct StaticFetcher(pub Result<String, String>);

#[cfg(test)]
impl PageFetcher for StaticFetcher {
    fn fetch(&self, _url: &str) -> Result<String, AppError> {
        self.0.clone().map_err(AppError::Fetch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_http;

    #[test]
    fn builds_last_heard_url() {
        assert_eq!(last_heard_url("http://pi-star.local"), "http://pi-star.local/mmdvmhost/lh.php");
        assert_eq!(last_heard_url("http://pi-star.local/"), "http://pi-star.local/mmdvmhost/lh.php");
    }

    #[test]
    fn extracts_cells_from_first_table() {
        let html = r#"<html><body>
            <table>
              <tr><th>Time</th><th>Mode</th></tr>
              <tr><td>15:10:34 Mar 25th</td><td><b>DMR</b> Slot 2</td></tr>
              <tr><td>a</td><td>TG&nbsp;262</td><td>c</td></tr>
            </table>
            <table><tr><td>ignored</td></tr></table>
        </body></html>"#;
        let rows = extract_rows(html);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1], vec!["15:10:34 Mar 25th", "DMR Slot 2"]);
        assert_eq!(rows[2][1], "TG\u{a0}262");
    }

    #[test]
    fn fetches_page_body() {
        let (port, server) = test_http::serve(vec![("200 OK", "<table></table>")]);
        let fetcher = HttpFetcher::with_client(test_http::direct_client());
        let url = last_heard_url(&format!("http://127.0.0.1:{}", port));

        assert_eq!(fetcher.fetch(&url).unwrap(), "<table></table>");
        let seen = server.join().unwrap();
        assert!(seen[0].starts_with("GET /mmdvmhost/lh.php "));
    }

    #[test]
    fn error_status_is_fetch_failure() {
        let (port, _server) = test_http::serve(vec![("500 Internal Server Error", "oops")]);
        let fetcher = HttpFetcher::with_client(test_http::direct_client());
        let err = fetcher.fetch(&format!("http://127.0.0.1:{}/mmdvmhost/lh.php", port)).unwrap_err();
        match err {
            AppError::Fetch(msg) => assert!(msg.contains("500"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unreachable_dashboard_is_fetch_failure() {
        let fetcher = HttpFetcher::with_client(test_http::direct_client());
        let url = format!("http://127.0.0.1:{}/mmdvmhost/lh.php", test_http::closed_port());
        assert!(matches!(fetcher.fetch(&url), Err(AppError::Fetch(_))));
    }

    #[test]
    fn page_without_table_has_no_rows() {
        assert!(extract_rows("<html><body><p>offline</p></body></html>").is_empty());
    }
}
