//! Company record types and list query parameters.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Columns selected from the store and accepted as sort keys.
pub const COMPANY_COLUMNS: &[&str] = &[
    "id",
    "name",
    "ticker",
    "ethics_score",
    "source_reason",
    "last_updated",
];

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 200;

/// Full representation of a company returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// UUID of the company.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ticker: Option<String>,
    /// Ethics score between 0 and 100.
    #[serde(default)]
    pub ethics_score: Option<i32>,
    /// Reasoning behind the ethics score.
    #[serde(default)]
    pub source_reason: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Partial update of a company record.
///
/// Each field is doubly optional: absent leaves the column alone, `null`
/// clears it, a value sets it. Only present fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyUpdate {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub ticker: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub ethics_score: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub source_reason: Option<Option<String>>,
}

impl CompanyUpdate {
    /// True when the request carried no fields at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ticker.is_none()
            && self.ethics_score.is_none()
            && self.source_reason.is_none()
    }

    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(None) = self.name {
            return Err("name may not be null".to_string());
        }
        if let Some(Some(score)) = self.ethics_score {
            check_score(score)?;
        }
        Ok(())
    }
}

/// Body sent when a fresh score is written back.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreUpdate<'a> {
    pub ethics_score: i32,
    pub source_reason: &'a str,
}

pub fn check_score(score: i32) -> Result<(), String> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(format!(
            "ethics_score must be between {} and {}, got {}",
            MIN_SCORE, MAX_SCORE, score
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort specification, written `column` or `-column` for descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub column: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (column, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, Direction::Desc),
            None => (raw, Direction::Asc),
        };
        if !COMPANY_COLUMNS.contains(&column) {
            return Err(format!(
                "cannot order by '{}'; expected one of {}",
                column,
                COMPANY_COLUMNS.join(", ")
            ));
        }
        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            column: "ethics_score".to_string(),
            direction: Direction::Desc,
        }
    }
}

/// PostgREST `order` parameter form, e.g. `ethics_score.desc`.
impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{}.{}", self.column, dir)
    }
}

/// Raw query string of `GET /companies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub order: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl ListQuery {
    /// A page of `limit` records starting at `offset`, default ordering.
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            search: None,
            order: SortOrder::default(),
            limit,
            offset,
        }
    }

    /// Inclusive row range for the `Range` header.
    pub fn range_header(&self) -> String {
        let end = u64::from(self.offset) + u64::from(self.limit) - 1;
        format!("{}-{}", self.offset, end)
    }
}

impl TryFrom<ListParams> for ListQuery {
    type Error = String;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {}, got {}", MAX_LIMIT, limit));
        }

        let order = match params.order.as_deref() {
            Some(raw) => SortOrder::parse(raw)?,
            None => SortOrder::default(),
        };

        let search = params
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        Ok(Self {
            search,
            order,
            limit,
            offset: params.offset.unwrap_or(0),
        })
    }
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accept RFC 3339 timestamps and zone-less `timestamp` columns (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<String>::deserialize(deserializer)? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sort_order_parse() {
        let desc = SortOrder::parse("-ethics_score").unwrap();
        assert_eq!(desc.direction, Direction::Desc);
        assert_eq!(desc.to_string(), "ethics_score.desc");

        let asc = SortOrder::parse("name").unwrap();
        assert_eq!(asc.to_string(), "name.asc");

        assert!(SortOrder::parse("-password").is_err());
        assert!(SortOrder::parse("").is_err());
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::try_from(ListParams::default()).unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
        assert_eq!(query.order, SortOrder::default());
        assert_eq!(query.range_header(), "0-49");
    }

    #[test]
    fn test_list_query_bounds() {
        let too_big = ListParams {
            limit: Some(201),
            ..Default::default()
        };
        assert!(ListQuery::try_from(too_big).is_err());

        let zero = ListParams {
            limit: Some(0),
            ..Default::default()
        };
        assert!(ListQuery::try_from(zero).is_err());

        let page = ListParams {
            limit: Some(200),
            offset: Some(400),
            q: Some("  ".into()),
            ..Default::default()
        };
        let query = ListQuery::try_from(page).unwrap();
        assert_eq!(query.range_header(), "400-599");
        assert!(query.search.is_none());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let update: CompanyUpdate =
            serde_json::from_str(r#"{"ticker": null, "ethics_score": 70}"#).unwrap();
        assert_eq!(update.ticker, Some(None));
        assert_eq!(update.ethics_score, Some(Some(70)));
        assert_eq!(update.name, None);

        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"ticker": null, "ethics_score": 70}));
    }

    #[test]
    fn test_update_validation() {
        let empty: CompanyUpdate = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());

        let bad_score: CompanyUpdate = serde_json::from_str(r#"{"ethics_score": 101}"#).unwrap();
        assert!(bad_score.validate().is_err());

        let null_name: CompanyUpdate = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert!(null_name.validate().is_err());

        let ok: CompanyUpdate = serde_json::from_str(r#"{"ethics_score": 0}"#).unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_company_timestamps() {
        let with_zone: Company = serde_json::from_str(
            r#"{"id":"1","name":"Acme","last_updated":"2024-05-01T12:00:00+00:00"}"#,
        )
        .unwrap();
        assert_eq!(
            with_zone.last_updated,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );

        let naive: Company = serde_json::from_str(
            r#"{"id":"1","name":"Acme","last_updated":"2024-05-01T12:00:00.123456"}"#,
        )
        .unwrap();
        assert!(naive.last_updated.is_some());

        let missing: Company = serde_json::from_str(r#"{"id":"1","name":"Acme"}"#).unwrap();
        assert!(missing.last_updated.is_none());
        assert!(missing.ticker.is_none());
    }
}
