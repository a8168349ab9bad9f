//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone};

const PT_BR_MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Format a publication date as `dd MMM yyyy` in the site language.
///
/// # Examples
/// ```ignore
/// display_date(&date, "pt-BR") // -> "15 mar 2021"
/// display_date(&date, "en")    // -> "15 Mar 2021"
/// ```
pub fn display_date<Tz: TimeZone>(date: &DateTime<Tz>, language: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if is_portuguese(language) {
        let month = PT_BR_MONTHS[date.month0() as usize];
        format!("{:02} {} {}", date.day(), month, date.year())
    } else {
        date.format("%d %b %Y").to_string()
    }
}

/// Format a date in ISO 8601 for `<time datetime>` attributes
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

fn is_portuguese(language: &str) -> bool {
    let language = language.to_ascii_lowercase();
    language == "pt" || language.starts_with("pt-") || language.starts_with("pt_")
}
