//! Query-string parsing shared by both endpoints.

use chrono::NaiveDateTime;
use thiserror::Error;
use url::form_urlencoded;

/// Layout for the inbound `fromtime`/`totime` values; the upstream query uses
/// the same layout.
pub const TIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

/// User-supplied constraints controlling the upstream query. Optional fields
/// default to empty, which the fetcher reads as "omit this filter".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFilter {
    pub from_time: NaiveDateTime,
    pub to_time: NaiveDateTime,
    pub within: String,
    pub area: String,
    pub plot_map: String,
    pub plot_chart: String,
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("missing time parameter '{0}'")]
    MissingTime(&'static str),
    #[error("invalid time value for '{name}': {source}")]
    Time {
        name: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

fn parse_time(raw: Option<String>, name: &'static str) -> Result<NaiveDateTime, FilterError> {
    let raw = raw.ok_or(FilterError::MissingTime(name))?;
    NaiveDateTime::parse_from_str(&raw, TIME_LAYOUT)
        .map_err(|source| FilterError::Time { name, source })
}

/// Parse the raw query string into a validated filter.
///
/// `fromtime` and `totime` are required; everything else is optional. For
/// repeated keys the first occurrence wins.
pub fn parse_query(query: &str) -> Result<StudentFilter, FilterError> {
    let mut from_time = None;
    let mut to_time = None;
    let mut within = None;
    let mut area = None;
    let mut plot_map = None;
    let mut plot_chart = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let slot = match key.as_ref() {
            "fromtime" => &mut from_time,
            "totime" => &mut to_time,
            "within" => &mut within,
            "area" => &mut area,
            "plotmap" => &mut plot_map,
            "plotchart" => &mut plot_chart,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    Ok(StudentFilter {
        from_time: parse_time(from_time, "fromtime")?,
        to_time: parse_time(to_time, "totime")?,
        within: within.unwrap_or_default(),
        area: area.unwrap_or_default(),
        plot_map: plot_map.unwrap_or_default(),
        plot_chart: plot_chart.unwrap_or_default(),
    })
}
