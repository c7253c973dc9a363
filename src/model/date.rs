//! Dates, date-times and date ranges.
//!
//! Sources publish dates in every shape imaginable. [`Date::parse`] accepts
//! the ISO forms, the German `DD.MM.YYYY` form and ISO intervals; year and
//! year-month values become ranges covering the whole period. Anything it
//! cannot read is kept verbatim as a [`Label`] instead of failing.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use oxrdf::vocab::xsd;
use oxrdf::{Literal, Term};

use super::label::Label;
use super::{Canonical, push_unique};

/// One normalized date value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Date {
    #[default]
    Empty,
    /// A calendar day.
    Day(NaiveDate),
    /// A point in time.
    Instant(DateTime<FixedOffset>),
    /// An inclusive span of time.
    Range {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },
    /// Text that could not be read as a date.
    Text(Label),
}

impl Date {
    /// Parses a date string; never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return Self::Empty;
        }
        if let Some((start, end)) = text.split_once('/') {
            return Self::range(start, end);
        }
        match parse_single(text) {
            Some(Single::Instant(instant)) => Self::Instant(instant),
            Some(Single::Day(day)) => Self::Day(day),
            Some(Single::Period(start, end)) => Self::Range { start, end },
            None => Self::Text(Label::new(text)),
        }
    }

    /// Builds a range from two date strings.
    ///
    /// Each side may be any form [`Date::parse`] accepts; the range runs
    /// from the beginning of `start` to the end of `end`. Unreadable or
    /// reversed bounds fall back to a text label.
    #[must_use]
    pub fn range(start: &str, end: &str) -> Self {
        let (start, end) = (start.trim(), end.trim());
        let bounds = parse_single(start)
            .map(|s| s.bounds().0)
            .zip(parse_single(end).map(|e| e.bounds().1));
        match bounds {
            Some((from, to)) if from <= to => Self::Range {
                start: from,
                end: to,
            },
            _ => Self::Text(Label::new(&format!("{start}/{end}"))),
        }
    }

    /// First instant covered by the value.
    #[must_use]
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Day(day) => Some(Single::Day(*day).bounds().0),
            Self::Instant(instant) => Some(*instant),
            Self::Range { start, .. } => Some(*start),
            Self::Empty | Self::Text(_) => None,
        }
    }
}

impl Canonical for Date {
    fn has_content(&self) -> bool {
        !matches!(self, Self::Empty)
    }

    fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Day(day) => day.format("%Y-%m-%d").to_string(),
            Self::Instant(instant) => instant.to_rfc3339(),
            Self::Range { start, end } => format!("{}/{}", start.to_rfc3339(), end.to_rfc3339()),
            Self::Text(label) => label.to_text(),
        }
    }

    fn to_terms(&self) -> Vec<Term> {
        match self {
            Self::Empty => Vec::new(),
            Self::Day(day) => vec![
                Literal::new_typed_literal(day.format("%Y-%m-%d").to_string(), xsd::DATE).into(),
            ],
            Self::Instant(instant) => vec![date_time_literal(instant).into()],
            Self::Range { start, end } => {
                vec![date_time_literal(start).into(), date_time_literal(end).into()]
            }
            Self::Text(label) => label.to_terms(),
        }
    }
}

fn date_time_literal(value: &DateTime<FixedOffset>) -> Literal {
    Literal::new_typed_literal(value.to_rfc3339(), xsd::DATE_TIME)
}

/// A single (non-interval) parsed value.
enum Single {
    Instant(DateTime<FixedOffset>),
    Day(NaiveDate),
    Period(DateTime<FixedOffset>, DateTime<FixedOffset>),
}

impl Single {
    /// The first and last instant covered.
    fn bounds(&self) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        match self {
            Self::Instant(instant) => (*instant, *instant),
            Self::Day(day) => (start_of(*day), end_of(*day)),
            Self::Period(start, end) => (*start, *end),
        }
    }
}

fn parse_single(text: &str) -> Option<Single> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(Single::Instant(instant));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Single::Instant(naive.and_utc().fixed_offset()));
        }
    }
    for format in ["%Y-%m-%d", "%d.%m.%Y"] {
        if let Ok(day) = NaiveDate::parse_from_str(text, format) {
            return Some(Single::Day(day));
        }
    }
    parse_month(text).or_else(|| parse_year(text))
}

fn parse_month(text: &str) -> Option<Single> {
    let (year, month) = text.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next.pred_opt()?;
    Some(Single::Period(start_of(first), end_of(last)))
}

fn parse_year(text: &str) -> Option<Single> {
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = text.parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
    Some(Single::Period(start_of(first), end_of(last)))
}

fn start_of(day: NaiveDate) -> DateTime<FixedOffset> {
    day.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset()
}

fn end_of(day: NaiveDate) -> DateTime<FixedOffset> {
    let end = chrono::NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(chrono::NaiveTime::MIN);
    day.and_time(end).and_utc().fixed_offset()
}

/// Collection of dates with empties and duplicates dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateList {
    items: Vec<Date>,
}

impl DateList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, date: Date) -> bool {
        push_unique(&mut self.items, date)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Date> {
        self.items.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Date> {
        self.items.first()
    }
}

impl FromIterator<Date> for DateList {
    fn from_iter<I: IntoIterator<Item = Date>>(iter: I) -> Self {
        let mut list = Self::new();
        for date in iter {
            list.push(date);
        }
        list
    }
}

impl<'a> IntoIterator for &'a DateList {
    type Item = &'a Date;
    type IntoIter = std::slice::Iter<'a, Date>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Canonical for DateList {
    fn has_content(&self) -> bool {
        !self.items.is_empty()
    }

    fn to_text(&self) -> String {
        self.items
            .iter()
            .map(Date::to_text)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn to_terms(&self) -> Vec<Term> {
        self.items.iter().flat_map(Date::to_terms).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[test]
    fn test_parse_calendar_date() {
        assert_eq!(Date::parse("1799-03-14"), Date::Day(ymd(1799, 3, 14)));
        assert_eq!(Date::parse("14.03.1799"), Date::Day(ymd(1799, 3, 14)));
    }

    #[test]
    fn test_parse_date_time() {
        let date = Date::parse("2024-05-01T12:30:00+02:00");
        assert!(matches!(date, Date::Instant(_)));
        assert_eq!(date.to_text(), "2024-05-01T12:30:00+02:00");

        let naive = Date::parse("2024-05-01T12:30:00");
        assert_eq!(naive.to_text(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn test_parse_year_becomes_range() {
        let Date::Range { start, end } = Date::parse("1800") else {
            panic!("year should parse as range");
        };
        assert_eq!(start.date_naive(), ymd(1800, 1, 1));
        assert_eq!(end.date_naive(), ymd(1800, 12, 31));
    }

    #[test]
    fn test_parse_month_becomes_range() {
        let Date::Range { end, .. } = Date::parse("1800-02") else {
            panic!("year-month should parse as range");
        };
        assert_eq!(end.date_naive(), ymd(1800, 2, 28));
    }

    #[test]
    fn test_parse_interval() {
        let Date::Range { start, end } = Date::parse("1799/1801-06") else {
            panic!("interval should parse as range");
        };
        assert_eq!(start.date_naive(), ymd(1799, 1, 1));
        assert_eq!(end.date_naive(), ymd(1801, 6, 30));
    }

    #[test]
    fn test_unparseable_falls_back_to_label() {
        let date = Date::parse("um 1800");
        assert_eq!(date, Date::Text(Label::new("um 1800")));
        assert!(date.has_content());
        assert_eq!(date.to_text(), "um 1800");
    }

    #[test]
    fn test_reversed_range_falls_back_to_label() {
        assert!(matches!(Date::range("1900", "1800"), Date::Text(_)));
    }

    #[test]
    fn test_empty_date() {
        assert_eq!(Date::parse("  "), Date::Empty);
        assert!(!Date::Empty.has_content());
        assert!(Date::Empty.to_terms().is_empty());
    }

    #[test]
    fn test_date_terms_carry_datatypes() {
        let terms = Date::parse("1799-03-14").to_terms();
        let Some(Term::Literal(literal)) = terms.first() else {
            panic!("expected literal");
        };
        assert_eq!(literal.datatype(), xsd::DATE);
        assert_eq!(Date::parse("1800").to_terms().len(), 2);
    }

    #[test]
    fn test_date_list_drops_empty_and_duplicates() {
        let list: DateList = ["1800", "", "1800", "1801-01-01"]
            .into_iter()
            .map(Date::parse)
            .collect();
        assert_eq!(list.len(), 2);
    }
}
