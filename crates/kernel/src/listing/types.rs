//! Request parameters and response envelope for list endpoints.

use chrono::{DateTime, Months, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page used when `page` is absent or invalid.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when `limit` is absent or invalid.
pub const DEFAULT_LIMIT: u32 = 10;

/// Identity of the caller a listing is computed for.
///
/// Only the user id matters to the engine: it drives the viewer flags and
/// decides whether anonymous authorship may be revealed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    user_id: Option<Uuid>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    /// True when the viewer is the given user.
    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Raw query string of a list endpoint.
///
/// Everything is captured as text so that malformed numbers, dates and ids
/// can be normalized instead of rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
    pub search: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub filter: Option<String>,
    #[serde(rename = "sortBy", alias = "sort_by")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub id_user: Option<String>,
    pub id_subject: Option<String>,
    pub id_lecturer: Option<String>,
}

impl ListQuery {
    /// The free-text keyword, from `q` or `search`, if not blank.
    pub fn keyword(&self) -> Option<&str> {
        [self.q.as_deref(), self.search.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Outcome of parsing an optional parameter that was present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed<T> {
    Valid(T),
    Malformed,
}

impl<T> Parsed<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Parsed::Valid(v),
            None => Parsed::Malformed,
        }
    }
}

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Start of `from` and the last millisecond of `to`, in UTC.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.from.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = self.to.and_time(end_of_day()).and_utc();
        (start, end)
    }
}

fn end_of_day() -> chrono::NaiveTime {
    chrono::NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(chrono::NaiveTime::MIN)
}

/// Parse a calendar date given as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

/// Relative "created since" windows offered by forum listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentWindow {
    Today,
    Week,
    Month,
    Year,
}

impl RecentWindow {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "today" => Some(RecentWindow::Today),
            "week" => Some(RecentWindow::Week),
            "month" => Some(RecentWindow::Month),
            "year" => Some(RecentWindow::Year),
            _ => None,
        }
    }

    /// Earliest creation time inside the window ending at `now`.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RecentWindow::Today => now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc(),
            RecentWindow::Week => now - TimeDelta::days(7),
            RecentWindow::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
            RecentWindow::Year => now.checked_sub_months(Months::new(12)).unwrap_or(now),
        }
    }
}

/// Typed filter parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub search: Option<String>,
    pub date_range: Option<Parsed<DateRange>>,
    pub recent: Option<RecentWindow>,
    pub author_id: Option<Parsed<Uuid>>,
    pub subject_id: Option<Parsed<Uuid>>,
    pub lecturer_id: Option<Parsed<Uuid>>,
}

impl ListParams {
    /// Normalize a raw query string.
    ///
    /// A date range only applies when both ends are given. A relative window
    /// is ignored when a date range is present.
    pub fn from_query(query: &ListQuery) -> Self {
        let date_range = match (present(&query.from), present(&query.to)) {
            (Some(from), Some(to)) => Some(match (parse_date(from), parse_date(to)) {
                (Some(from), Some(to)) => Parsed::Valid(DateRange { from, to }),
                _ => Parsed::Malformed,
            }),
            _ => None,
        };

        let recent = if date_range.is_none() {
            present(&query.filter).and_then(RecentWindow::parse)
        } else {
            None
        };

        Self {
            search: query.keyword().map(str::to_string),
            date_range,
            recent,
            author_id: parse_id(&query.id_user),
            subject_id: parse_id(&query.id_subject),
            lecturer_id: parse_id(&query.id_lecturer),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_id(value: &Option<String>) -> Option<Parsed<Uuid>> {
    present(value).map(|raw| Parsed::from_option(Uuid::parse_str(raw).ok()))
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    #[serde(rename = "currentPage")]
    pub current_page: u32,
    pub limit: u32,
    #[serde(rename = "totalData")]
    pub total_items: u64,
    #[serde(rename = "totalPage")]
    pub total_pages: u64,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
}
