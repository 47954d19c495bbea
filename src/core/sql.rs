//! SQL text builders for the remote GSC query service.
//!
//! Nothing here talks to the network; every builder returns the statement as a
//! `String`. The remote dialect is BigQuery-like: backslash escapes inside string
//! literals, `ROW_NUMBER() OVER (...)` and back-quoted identifiers.

use crate::domain::model::{RankBucket, ReportingWindow};
use crate::utils::error::{LensError, Result};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// GSC data usually lands with a delay of a few days.
pub const GSC_LAG_DAYS: i64 = 3;
pub const DEFAULT_WINDOW_DAYS: u32 = 28;
pub const MAX_WINDOW_DAYS: u32 = 480;
pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const MAX_LIST_LIMIT: u32 = 1000;
pub const DEFAULT_QUERY_LIMIT: u32 = 200;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(`[A-Za-z0-9_.\-]+`|[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)*)$")
        .expect("identifier pattern is valid")
});

impl ReportingWindow {
    /// Resolve the current and previous period from optional request dates.
    pub fn resolve(
        today: NaiveDate,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        days: Option<u32>,
    ) -> Result<Self> {
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(LensError::validation(format!(
                "days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        let span = Duration::days(days as i64 - 1);

        let (current_start, current_end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, shift(start, span)?),
            (None, Some(end)) => (shift(end, -span)?, end),
            (None, None) => {
                let end = shift(today, -Duration::days(GSC_LAG_DAYS))?;
                (shift(end, -span)?, end)
            }
        };

        if current_start > current_end {
            return Err(LensError::validation(format!(
                "start date {} is after end date {}",
                current_start, current_end
            )));
        }

        let length = (current_end - current_start).num_days();
        if length + 1 > MAX_WINDOW_DAYS as i64 {
            return Err(LensError::validation(format!(
                "date range may not exceed {} days",
                MAX_WINDOW_DAYS
            )));
        }

        let previous_end = shift(current_start, -Duration::days(1))?;
        let previous_start = shift(previous_end, -Duration::days(length))?;

        Ok(Self {
            current_start,
            current_end,
            previous_start,
            previous_end,
        })
    }
}

/// Date arithmetic that reports overflow instead of panicking.
fn shift(date: NaiveDate, delta: Duration) -> Result<NaiveDate> {
    date.checked_add_signed(delta)
        .ok_or_else(|| LensError::validation(format!("date out of range near {}", date)))
}

/// Quote a string literal. `'` is doubled and `\` escaped.
pub fn sql_literal(value: &str) -> Result<String> {
    if value.contains('\0') {
        return Err(LensError::validation("value contains a NUL byte"));
    }
    Ok(format!(
        "'{}'",
        value.replace('\\', "\\\\").replace('\'', "''")
    ))
}

pub fn sql_identifier(value: &str) -> Result<&str> {
    if IDENTIFIER.is_match(value) {
        Ok(value)
    } else {
        Err(LensError::InvalidConfigValueError {
            field: "query.table".to_string(),
            value: value.to_string(),
            reason: "not a plain table identifier".to_string(),
        })
    }
}

/// `LIKE` pattern matching everything that starts with `prefix`.
pub fn like_prefix(prefix: &str) -> Result<String> {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    sql_literal(&format!("{}%", escaped))
}

fn date_literal(date: NaiveDate) -> String {
    format!("'{}'", date.format("%Y-%m-%d"))
}

/// CASE expression mapping a position column to a [`RankBucket`] name.
pub fn rank_bucket_case(column: &str) -> String {
    let arms: Vec<String> = RankBucket::ALL
        .iter()
        .filter_map(|bucket| {
            bucket
                .upper_bound()
                .map(|upper| format!("WHEN {} <= {} THEN '{}'", column, upper, bucket.as_str()))
        })
        .collect();
    format!(
        "CASE {} ELSE '{}' END",
        arms.join(" "),
        RankBucket::Beyond.as_str()
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageListParams {
    pub table: String,
    pub site: String,
    pub window: ReportingWindow,
    pub limit: u32,
    pub min_clicks: u64,
    pub page_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageQueriesParams {
    pub table: String,
    pub site: String,
    pub page: String,
    pub window: ReportingWindow,
    pub limit: u32,
}

fn period_aggregate(
    table: &str,
    filter: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    format!(
        "  SELECT page, query,\n\
         \x20        SUM(clicks) AS clicks,\n\
         \x20        SUM(impressions) AS impressions,\n\
         \x20        SUM(position * impressions) / NULLIF(SUM(impressions), 0) AS position\n\
         \x20 FROM {table}\n\
         \x20 WHERE {filter}\n\
         \x20   AND date BETWEEN {start} AND {end}\n\
         \x20 GROUP BY page, query",
        table = table,
        filter = filter,
        start = date_literal(start),
        end = date_literal(end),
    )
}

fn check_limit(limit: u32, max: u32) -> Result<u32> {
    if limit == 0 || limit > max {
        return Err(LensError::validation(format!(
            "limit must be between 1 and {}",
            max
        )));
    }
    Ok(limit)
}

/// Site-wide page list: best query per page, previous-period comparison and a
/// rank-bucket pivot of every query the page ranks for.
pub fn build_page_list_query(params: &PageListParams) -> Result<String> {
    let table = sql_identifier(&params.table)?;
    let limit = check_limit(params.limit, MAX_LIST_LIMIT)?;

    let mut filter = format!("site = {}", sql_literal(&params.site)?);
    if let Some(prefix) = params.page_prefix.as_deref().filter(|p| !p.is_empty()) {
        filter.push_str(&format!(" AND page LIKE {}", like_prefix(prefix)?));
    }

    let window = &params.window;
    let current = period_aggregate(table, &filter, window.current_start, window.current_end);
    let previous = period_aggregate(table, &filter, window.previous_start, window.previous_end);

    let pivot: Vec<String> = RankBucket::ALL
        .iter()
        .map(|bucket| {
            format!(
                "         SUM(CASE WHEN rank_bucket = '{name}' THEN 1 ELSE 0 END) AS rank_{name}",
                name = bucket.as_str()
            )
        })
        .collect();
    let pivot_columns: Vec<String> = RankBucket::ALL
        .iter()
        .map(|bucket| format!("       t.rank_{}", bucket.as_str()))
        .collect();

    Ok(format!(
        "WITH current_period AS (\n{current}\n),\n\
         previous_period AS (\n{previous}\n),\n\
         bucketed AS (\n\
         \x20 SELECT page, query, clicks, impressions, position,\n\
         \x20        {bucket_case} AS rank_bucket\n\
         \x20 FROM current_period\n\
         ),\n\
         ranked AS (\n\
         \x20 SELECT page, query, clicks, impressions, position,\n\
         \x20        ROW_NUMBER() OVER (PARTITION BY page ORDER BY clicks DESC, impressions DESC, query ASC) AS rn\n\
         \x20 FROM current_period\n\
         ),\n\
         page_totals AS (\n\
         \x20 SELECT page,\n\
         \x20        SUM(clicks) AS total_clicks,\n\
         \x20        SUM(impressions) AS total_impressions,\n\
         \x20        COUNT(*) AS keyword_count,\n\
         {pivot}\n\
         \x20 FROM bucketed\n\
         \x20 GROUP BY page\n\
         ),\n\
         previous_totals AS (\n\
         \x20 SELECT page,\n\
         \x20        SUM(clicks) AS prev_total_clicks,\n\
         \x20        SUM(impressions) AS prev_total_impressions\n\
         \x20 FROM previous_period\n\
         \x20 GROUP BY page\n\
         )\n\
         SELECT t.page,\n\
         \x20      r.query AS best_query,\n\
         \x20      r.clicks AS best_query_clicks,\n\
         \x20      r.impressions AS best_query_impressions,\n\
         \x20      r.position AS best_query_position,\n\
         \x20      p.clicks AS prev_best_query_clicks,\n\
         \x20      p.position AS prev_best_query_position,\n\
         \x20      t.total_clicks,\n\
         \x20      t.total_impressions,\n\
         \x20      pt.prev_total_clicks,\n\
         \x20      pt.prev_total_impressions,\n\
         \x20      t.keyword_count,\n\
         {pivot_columns}\n\
         FROM page_totals t\n\
         JOIN ranked r ON r.page = t.page AND r.rn = 1\n\
         LEFT JOIN previous_period p ON p.page = r.page AND p.query = r.query\n\
         LEFT JOIN previous_totals pt ON pt.page = t.page\n\
         WHERE t.total_clicks >= {min_clicks}\n\
         ORDER BY t.total_clicks DESC, t.page ASC\n\
         LIMIT {limit}",
        current = current,
        previous = previous,
        bucket_case = rank_bucket_case("position"),
        pivot = pivot.join(",\n"),
        pivot_columns = pivot_columns.join(",\n"),
        min_clicks = params.min_clicks,
        limit = limit,
    ))
}

/// Per-query rows for one page with the previous-period metrics attached.
pub fn build_page_queries_query(params: &PageQueriesParams) -> Result<String> {
    let table = sql_identifier(&params.table)?;
    let limit = check_limit(params.limit, MAX_LIST_LIMIT)?;
    let filter = format!(
        "site = {} AND page = {}",
        sql_literal(&params.site)?,
        sql_literal(&params.page)?
    );

    let window = &params.window;
    let current = period_aggregate(table, &filter, window.current_start, window.current_end);
    let previous = period_aggregate(table, &filter, window.previous_start, window.previous_end);

    Ok(format!(
        "WITH current_period AS (\n{current}\n),\n\
         previous_period AS (\n{previous}\n)\n\
         SELECT c.page,\n\
         \x20      c.query,\n\
         \x20      c.clicks,\n\
         \x20      c.impressions,\n\
         \x20      c.position,\n\
         \x20      p.clicks AS prev_clicks,\n\
         \x20      p.position AS prev_position,\n\
         \x20      {bucket_case} AS rank_bucket\n\
         FROM current_period c\n\
         LEFT JOIN previous_period p ON p.query = c.query\n\
         ORDER BY c.clicks DESC, c.impressions DESC, c.query ASC\n\
         LIMIT {limit}",
        current = current,
        previous = previous,
        bucket_case = rank_bucket_case("c.position"),
        limit = limit,
    ))
}
