use std::fmt;

use chrono::{Days, NaiveDate};
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One search to run against a single source over an inclusive date range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub source_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub page_size: u64,
    pub fetch_full_text: bool,
}

impl SearchRequest {
    pub fn new(
        query: impl Into<String>,
        source_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        page_size: u64,
        fetch_full_text: bool,
    ) -> Result<SearchRequest> {
        let request = SearchRequest {
            query: query.into(),
            source_id,
            start_date,
            end_date,
            page_size,
            fetch_full_text,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidRequest("query cannot be empty".into()));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidRequest("page_size must be positive".into()));
        }
        if self.start_date > self.end_date {
            return Err(Error::InvalidRequest(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

/// Inclusive span of calendar days sent as the service's date restriction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window of `width` days starting at `start`, never reaching past `limit`.
    pub fn clamped(start: NaiveDate, width: u64, limit: NaiveDate) -> DateWindow {
        let end = start
            .checked_add_days(Days::new(width.saturating_sub(1)))
            .map_or(limit, |end| end.min(limit));
        DateWindow { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// 1-indexed inclusive slice of a window's result list.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub begin: u64,
    pub end: u64,
}

impl PageRange {
    pub fn first(page_size: u64) -> PageRange {
        PageRange {
            begin: 1,
            end: page_size,
        }
    }

    pub fn next(self, page_size: u64) -> PageRange {
        PageRange {
            begin: self.begin + page_size,
            end: self.end + page_size,
        }
    }

    pub fn is_first(&self) -> bool {
        self.begin == 1
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub headline: String,
    #[serde(rename = "pub")]
    pub publication: String,
    pub pub_date: String,
    pub length: String,
    pub attachment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

/// A document as written to the results collection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StoredDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub session_id: i64,
    pub project_id: String,
    pub query: String,
    pub source_id: i64,
    #[serde(flatten)]
    pub document: DocumentRecord,
    pub saved_at: DateTime,
}

impl StoredDocument {
    pub fn new(
        document: DocumentRecord,
        session_id: i64,
        project_id: String,
        query: String,
        source_id: i64,
    ) -> StoredDocument {
        StoredDocument {
            id: ObjectId::new(),
            session_id,
            project_id,
            query,
            source_id,
            document,
            saved_at: DateTime::now(),
        }
    }
}
