//! Book model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    config::FilterMode,
    error::{AppError, AppResult, BookAction},
};

/// Book record as stored on the shelf
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_page: Option<u32>,
    /// Derived: `readPage == pageCount`
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<bool>,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub inserted_at: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Build a new record from validated fields, stamping both timestamps with `now`.
    pub fn new(id: String, fields: BookFields, now: DateTime<Utc>) -> Self {
        let finished = fields.is_finished();
        Self {
            id,
            name: fields.name,
            year: fields.year,
            author: fields.author,
            summary: fields.summary,
            publisher: fields.publisher,
            page_count: fields.page_count,
            read_page: fields.read_page,
            finished,
            reading: fields.reading,
            inserted_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field. `id` and `inserted_at` are left alone.
    pub fn apply(&mut self, fields: BookFields, now: DateTime<Utc>) {
        self.finished = fields.is_finished();
        self.name = fields.name;
        self.year = fields.year;
        self.author = fields.author;
        self.summary = fields.summary;
        self.publisher = fields.publisher;
        self.page_count = fields.page_count;
        self.read_page = fields.read_page;
        self.reading = fields.reading;
        self.updated_at = now;
    }
}

/// Short book representation returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            publisher: book.publisher.clone(),
        }
    }
}

/// Create / update book request body
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "whole_number::deserialize")]
    pub year: Option<i32>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "whole_number::deserialize")]
    pub page_count: Option<u32>,
    #[serde(default, deserialize_with = "whole_number::deserialize")]
    pub read_page: Option<u32>,
    pub reading: Option<bool>,
}

/// Payload that passed validation: `name` is present and pages are consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct BookFields {
    pub name: String,
    pub year: Option<i32>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<u32>,
    pub read_page: Option<u32>,
    pub reading: Option<bool>,
}

impl BookFields {
    pub fn is_finished(&self) -> bool {
        self.read_page == self.page_count
    }
}

impl BookPayload {
    /// Check the payload for `action`. The name check runs before the page check.
    pub fn validate(self, action: BookAction) -> AppResult<BookFields> {
        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(AppError::MissingName(action)),
        };

        if let (Some(read_page), Some(page_count)) = (self.read_page, self.page_count) {
            if read_page > page_count {
                return Err(AppError::PageOverflow(action));
            }
        }

        Ok(BookFields {
            name,
            year: self.year,
            author: self.author,
            summary: self.summary,
            publisher: self.publisher,
            page_count: self.page_count,
            read_page: self.read_page,
            reading: self.reading,
        })
    }
}

/// Query parameters for listing books
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    /// Case-insensitive substring of the book name
    pub name: Option<String>,
    /// `0` or `1`
    pub reading: Option<String>,
    /// `0` or `1`
    pub finished: Option<String>,
}

/// A single predicate applied while scanning the shelf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    Name(String),
    Reading(bool),
    Finished(bool),
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::Name(needle) => book.name.to_lowercase().contains(needle.as_str()),
            BookFilter::Reading(flag) => book.reading == Some(*flag),
            BookFilter::Finished(flag) => book.finished == *flag,
        }
    }
}

/// Parse a `0`/`1` query flag. Anything else is not a flag.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

impl BookQuery {
    /// Build the query from raw `key=value` pairs.
    ///
    /// The first `name` wins. A flag given more than once keeps all its values
    /// joined with `,`, which never parses as a flag, so it filters nothing.
    /// Unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => {
                    query.name.get_or_insert(value);
                    continue;
                }
                "reading" => &mut query.reading,
                "finished" => &mut query.finished,
                _ => continue,
            };
            *slot = Some(match slot.take() {
                Some(existing) => format!("{},{}", existing, value),
                None => value,
            });
        }
        query
    }

    /// Resolve the query into the filters to apply.
    ///
    /// In [`FilterMode::Exclusive`] only the highest priority parameter is
    /// honored (`name`, then `reading`, then `finished`), and an invalid flag
    /// value disables filtering altogether. In [`FilterMode::Combined`] every
    /// supplied parameter contributes and invalid flags are skipped one by one.
    pub fn filters(&self, mode: FilterMode) -> Vec<BookFilter> {
        let name = self
            .name
            .as_ref()
            .map(|name| BookFilter::Name(name.to_lowercase()));

        match mode {
            FilterMode::Exclusive => {
                if let Some(filter) = name {
                    return vec![filter];
                }
                if let Some(reading) = &self.reading {
                    return parse_flag(reading)
                        .map(BookFilter::Reading)
                        .into_iter()
                        .collect();
                }
                if let Some(finished) = &self.finished {
                    return parse_flag(finished)
                        .map(BookFilter::Finished)
                        .into_iter()
                        .collect();
                }
                Vec::new()
            }
            FilterMode::Combined => {
                let reading = self
                    .reading
                    .as_deref()
                    .and_then(parse_flag)
                    .map(BookFilter::Reading);
                let finished = self
                    .finished
                    .as_deref()
                    .and_then(parse_flag)
                    .map(BookFilter::Finished);
                name.into_iter().chain(reading).chain(finished).collect()
            }
        }
    }
}

/// Numbers from clients may arrive as `100` or `100.0`; both are accepted
/// as long as the value is whole and fits the target type.
mod whole_number {
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        let Some(value) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return Err(D::Error::custom(format!("expected a whole number, found {}", value)));
        }
        T::try_from(value as i64)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("number {} out of range", value)))
    }
}

/// Timestamps go out as `2024-01-01T10:00:00.000Z`
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}
