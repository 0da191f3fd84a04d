//! Blocking connection utilities for the judge and the spreadsheet exports.
//! Every failure here is fatal for the run, so nothing is retried.

use crate::judge::{self, ContestListData, RankData};
use crate::{CONTEST_PAGE_LENGTH, Contest, HandleProblems, SheetRef};
use anyhow::{Context, Result, anyhow};
use log::debug;
pub use reqwest::blocking::Client;
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

/// The judge only answers its data endpoints for browser-looking requests.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:92.0) Gecko/20100101 Firefox/92.0";

/// Helper function to classify reqwest error types
fn error_type_str(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection"
    } else if e.is_request() {
        "request/DNS"
    } else if e.is_body() {
        "body"
    } else if e.is_decode() {
        "decode"
    } else {
        "unknown"
    }
}

/// Build the HTTP client shared by every request of a run.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );

    Client::builder()
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")
}

/// Send a request and make sure the server answered with a success status.
fn send(request: RequestBuilder, what: &str) -> Result<Response> {
    let response = request
        .send()
        .map_err(|e| anyhow!("Network error ({}) while {what}: {e}", error_type_str(&e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let msg = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow!("Server returned an error ({status}) while {what}: {msg}"));
    }
    Ok(response)
}

/// List the contests whose title matches `title_filter`, in the judge's order.
///
/// # Errors
/// Returns an error on network failure, a non-success status, or a payload
/// that does not look like a contest listing.
pub fn get_contests(client: &Client, judge_base: &str, title_filter: &str) -> Result<Vec<Contest>> {
    let url = format!("{judge_base}/contest/data");
    let length = CONTEST_PAGE_LENGTH.to_string();
    let params = [
        ("draw", "1"),
        ("start", "0"),
        ("length", length.as_str()),
        ("sortDir", "asc"),
        ("sortCol", "4"),
        ("category", "all"),
        ("running", "0"),
        ("title", title_filter),
    ];
    debug!("Listing contests from {url} with title {title_filter:?}");

    let list = send(client.get(&url).query(&params), "listing contests")?
        .json::<ContestListData>()
        .context("Failed to deserialize contest listing")?;
    judge::parse_contest_list(&list)
}

/// Fetch the accepted problems of every participant of a contest.
///
/// # Errors
/// Returns an error on network failure, a non-success status, or a payload
/// that does not look like a contest ranking.
pub fn get_submissions(client: &Client, judge_base: &str, contest_id: u64) -> Result<HandleProblems> {
    let url = format!("{judge_base}/contest/rank/single/{contest_id}");
    debug!("Fetching submissions from {url}");

    let rank = send(client.get(&url), "fetching submissions")?
        .json::<RankData>()
        .with_context(|| format!("Failed to deserialize ranking of contest {contest_id}"))?;
    judge::accepted_by_handle(&rank)
        .with_context(|| format!("Malformed ranking of contest {contest_id}"))
}

/// Download a sheet as CSV text.
///
/// # Errors
/// Returns an error on network failure or a non-success status.
pub fn get_sheet_csv(client: &Client, sheet: &SheetRef) -> Result<String> {
    let url = sheet.export_url();
    debug!("Downloading sheet {sheet} from {url}");

    send(client.get(&url), "downloading a sheet")?
        .text()
        .with_context(|| format!("Failed to read sheet {sheet}"))
}
