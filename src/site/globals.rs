//! Global template data computed once per build.

use chrono::{DateTime, Datelike, Local, Utc};
use serde::Serialize;

/// Values visible to every template without explicit passing.
///
/// Both fields derive from one clock instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteGlobals {
    /// Year according to the local clock.
    pub current_year: i32,
    /// `YYYY-MM-DD` in UTC.
    pub build_date: String,
}

impl SiteGlobals {
    /// Read the system clock now.
    pub fn compute() -> Self {
        Self::at(Utc::now())
    }

    /// Globals as of `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            current_year: now.with_timezone(&Local).year(),
            build_date: now.format("%Y-%m-%d").to_string(),
        }
    }
}
