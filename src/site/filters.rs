//! Date filters callable from templates.
//!
//! | Filter         | Output                      |
//! |----------------|-----------------------------|
//! | `dateReadable` | `March 5, 2024`             |
//! | `dateIso`      | `2024-03-05T00:00:00.000Z`  |
//! | `dateYMD`      | `2024-03-05`                |
//!
//! Each formatter returns `None` for missing or unparseable input; the
//! registered tera filter turns that into an empty string so a bad date
//! blanks out instead of failing the build.
//!
//! Tera fails on an undefined variable before any filter runs, so template
//! sources pass through [`guard_undefined`] before registration. It rewrites
//! `post.data.date | dateReadable` into
//! `post.data.date | default(value="") | dateReadable`, which makes a missing
//! key reach the filter as `""`.

use crate::utils::date;
use chrono::SecondsFormat;
use regex::{Captures, Regex};
use std::{borrow::Cow, collections::HashMap, sync::OnceLock};
use tera::{Tera, Value};

pub const DATE_READABLE: &str = "dateReadable";
pub const DATE_ISO: &str = "dateIso";
pub const DATE_YMD: &str = "dateYMD";

/// Long-form English date in UTC: `Month D, YYYY`.
pub fn format_date_readable(value: &Value) -> Option<String> {
    date::parse_value(value).map(|dt| dt.format("%B %-d, %Y").to_string())
}

/// Full ISO-8601 timestamp with millisecond precision, always ending in `Z`.
pub fn format_date_iso(value: &Value) -> Option<String> {
    date::parse_value(value).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Calendar-date prefix of [`format_date_iso`].
pub fn format_date_ymd(value: &Value) -> Option<String> {
    date::parse_value(value).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Register all date filters on a tera instance.
pub fn register(tera: &mut Tera) {
    tera.register_filter(DATE_READABLE, date_readable_filter);
    tera.register_filter(DATE_ISO, date_iso_filter);
    tera.register_filter(DATE_YMD, date_ymd_filter);
}

fn date_readable_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(blank_on_none(format_date_readable(value)))
}

fn date_iso_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(blank_on_none(format_date_iso(value)))
}

fn date_ymd_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(blank_on_none(format_date_ymd(value)))
}

#[inline]
fn blank_on_none(formatted: Option<String>) -> Value {
    Value::String(formatted.unwrap_or_default())
}

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static DATE_CALL_REGEX: OnceLock<Regex> = OnceLock::new();

/// Tags, with raw blocks and comments captured as `keep`.
fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| {
        Regex::new(
            r"(?s)(?P<keep>\{%-?[ \t]*raw[ \t]*-?%\}.*?\{%-?[ \t]*endraw[ \t]*-?%\}|\{#.*?#\})|\{\{.*?\}\}|\{%.*?%\}",
        )
        .expect("tag pattern is valid")
    })
}

/// A variable path piped straight into a date filter.
fn date_call_regex() -> &'static Regex {
    DATE_CALL_REGEX.get_or_init(|| {
        Regex::new(
            r"([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+|\[[^\]]*\])*)([ \t]*\|[ \t]*)(dateReadable|dateIso|dateYMD)(?-u:\b)",
        )
        .expect("date call pattern is valid")
    })
}

/// Make undefined values piped into a date filter render as `""`.
///
/// Only code inside `{{ }}` and `{% %}` is touched; text, comments and
/// `raw` blocks are left as written.
pub fn guard_undefined(source: &str) -> Cow<'_, str> {
    if !source.contains("date") {
        return Cow::Borrowed(source);
    }
    tag_regex().replace_all(source, |caps: &Captures| {
        if caps.name("keep").is_some() {
            return caps[0].to_string();
        }
        date_call_regex()
            .replace_all(&caps[0], r#"${1}${2}default(value="") | ${3}"#)
            .into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tera::Context;

    fn render(template: &str, context: &Context) -> String {
        let mut tera = Tera::default();
        register(&mut tera);
        tera.add_raw_template("t", &guard_undefined(template)).unwrap();
        tera.render("t", context).unwrap()
    }

    #[test]
    fn test_scenario_calendar_date() {
        let value = json!("2024-03-05");
        assert_eq!(format_date_readable(&value).as_deref(), Some("March 5, 2024"));
        assert_eq!(format_date_ymd(&value).as_deref(), Some("2024-03-05"));
        assert_eq!(
            format_date_iso(&value).as_deref(),
            Some("2024-03-05T00:00:00.000Z")
        );
    }

    #[test]
    fn test_scenario_not_a_date() {
        let value = json!("not-a-date");
        assert!(format_date_readable(&value).is_none());
        assert!(format_date_iso(&value).is_none());
        assert!(format_date_ymd(&value).is_none());
    }

    #[test]
    fn test_missing_values_are_none() {
        for value in [json!(null), json!(""), json!(false), json!(0)] {
            assert!(format_date_readable(&value).is_none(), "{value}");
            assert!(format_date_iso(&value).is_none(), "{value}");
            assert!(format_date_ymd(&value).is_none(), "{value}");
        }
    }

    #[test]
    fn test_iso_ends_in_z_and_prefixes_ymd() {
        let inputs = [
            json!("2024-03-05"),
            json!("2024-03-05T23:30:00-02:00"),
            json!("2000-02-29T12:00:00.999Z"),
            json!("0001-01-01"),
            json!(1_709_596_800_123_i64),
            json!("Tue, 5 Mar 2024 08:00:00 +0000"),
        ];
        for value in inputs {
            let iso = format_date_iso(&value).unwrap();
            let ymd = format_date_ymd(&value).unwrap();
            assert!(iso.ends_with('Z'), "{iso}");
            assert_eq!(&iso[..10], ymd, "{value}");
        }
    }

    #[test]
    fn test_offset_crosses_day_boundary() {
        let value = json!("2024-03-05T23:30:00-02:00");
        assert_eq!(format_date_readable(&value).as_deref(), Some("March 6, 2024"));
        assert_eq!(
            format_date_iso(&value).as_deref(),
            Some("2024-03-06T01:30:00.000Z")
        );
    }

    #[test]
    fn test_readable_day_is_not_padded() {
        let value = json!("2024-12-01");
        assert_eq!(format_date_readable(&value).as_deref(), Some("December 1, 2024"));
    }

    #[test]
    fn test_filters_in_template() {
        let mut context = Context::new();
        context.insert("date", "2024-03-05");
        let out = render(
            "{{ date | dateReadable }}|{{ date | dateIso }}|{{ date | dateYMD }}",
            &context,
        );
        assert_eq!(out, "March 5, 2024|2024-03-05T00:00:00.000Z|2024-03-05");
    }

    #[test]
    fn test_filters_blank_in_template() {
        let mut context = Context::new();
        context.insert("bad", "not-a-date");
        context.insert("empty", &Value::Null);
        let out = render(
            "[{{ bad | dateReadable }}][{{ bad | dateIso }}][{{ empty | dateYMD }}]",
            &context,
        );
        assert_eq!(out, "[][][]");
    }

    #[test]
    fn test_filters_on_undefined_with_default() {
        let out = render(
            "[{{ missing | default(value=\"\") | dateReadable }}]",
            &Context::new(),
        );
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_undefined_variable_renders_blank() {
        let out = render(
            "[{{ missing | dateReadable }}][{{ missing|dateIso }}][{{ missing | dateYMD }}]",
            &Context::new(),
        );
        assert_eq!(out, "[][][]");
    }

    #[test]
    fn test_missing_key_on_object_renders_blank() {
        let mut context = Context::new();
        context.insert("posts", &json!([{"data": {"title": "A"}}, {"data": {"date": "2024-03-05"}}]));
        let out = render(
            "{% for p in posts %}[{{ p.data.date | dateReadable }}]{% endfor %}[{{ nope.deep.date | dateIso }}]",
            &context,
        );
        assert_eq!(out, "[][March 5, 2024][]");
    }

    #[test]
    fn test_defined_values_unchanged_by_guard() {
        let mut context = Context::new();
        context.insert("date", "2024-03-05");
        let out = render(
            "{% set d = date | dateYMD %}{{ d }}|{{ \"2024-01-02\" | dateReadable }}",
            &context,
        );
        assert_eq!(out, "2024-03-05|January 2, 2024");
    }

    #[test]
    fn test_guard_leaves_text_comments_and_raw_alone() {
        let source = "date | dateIso {# x | dateIso #}{% raw %}{{ y | dateIso }}{% endraw %}{{ z | dateIso }}";
        assert_eq!(
            guard_undefined(source),
            "date | dateIso {# x | dateIso #}{% raw %}{{ y | dateIso }}{% endraw %}{{ z | default(value=\"\") | dateIso }}"
        );
        assert!(matches!(guard_undefined("{{ title }}"), Cow::Borrowed(_)));
    }
}
