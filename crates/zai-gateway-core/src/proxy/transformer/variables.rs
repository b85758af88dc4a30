//! Template variables resolved once per logical request.

use chrono::{DateTime, TimeZone};
use std::collections::BTreeMap;

pub fn template_variables<Tz>(now: &DateTime<Tz>, timezone: &str, language: &str) -> BTreeMap<String, String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut vars = BTreeMap::new();
    vars.insert("{{USER_NAME}}".to_string(), "Guest".to_string());
    vars.insert("{{USER_LOCATION}}".to_string(), "Unknown".to_string());
    vars.insert("{{CURRENT_DATETIME}}".to_string(), now.format("%Y-%m-%d %H:%M:%S").to_string());
    vars.insert("{{CURRENT_DATE}}".to_string(), now.format("%Y-%m-%d").to_string());
    vars.insert("{{CURRENT_TIME}}".to_string(), now.format("%H:%M:%S").to_string());
    vars.insert("{{CURRENT_WEEKDAY}}".to_string(), now.format("%A").to_string());
    vars.insert("{{CURRENT_TIMEZONE}}".to_string(), timezone.to_string());
    vars.insert("{{USER_LANGUAGE}}".to_string(), language.to_string());
    vars
}
