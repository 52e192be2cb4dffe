use crate::parser::{Rule, ValueParser};
use crate::{GnucashError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use pest::iterators::Pair;
use pest::Parser;

/// Decodes a GnuCash timestamp into a timezone-aware point in time.
///
/// Accepts `2019-03-04 10:59:00 +0000` (what GnuCash writes in `ts:date`),
/// ISO-8601 with a `T` separator, and bare dates (`gdate`). A missing offset
/// is taken as UTC, a missing time as midnight.
pub fn parse_date(s: &str) -> Result<DateTime<FixedOffset>> {
    let malformed = || GnucashError::MalformedDate(s.to_string());

    let timestamp = ValueParser::parse(Rule::timestamp, s.trim())
        .map_err(|_| malformed())?
        .next()
        .ok_or_else(malformed)?;

    let mut date = None;
    let mut time = NaiveTime::MIN;
    let mut offset = 0;
    for part in timestamp.into_inner() {
        match part.as_rule() {
            Rule::date => date = Some(naive_date(part).ok_or_else(malformed)?),
            Rule::time => time = naive_time(part).ok_or_else(malformed)?,
            Rule::offset => offset = offset_seconds(part).ok_or_else(malformed)?,
            _ => {}
        }
    }

    let naive = date.ok_or_else(malformed)?.and_time(time);
    FixedOffset::east_opt(offset)
        .and_then(|tz| tz.from_local_datetime(&naive).single())
        .ok_or_else(malformed)
}

fn number<T: std::str::FromStr>(pair: Option<Pair<'_, Rule>>) -> Option<T> {
    pair?.as_str().parse().ok()
}

fn naive_date(pair: Pair<'_, Rule>) -> Option<NaiveDate> {
    let mut parts = pair.into_inner();
    NaiveDate::from_ymd_opt(
        number(parts.next())?,
        number(parts.next())?,
        number(parts.next())?,
    )
}

fn naive_time(pair: Pair<'_, Rule>) -> Option<NaiveTime> {
    let mut hour = 0;
    let mut minute = 0;
    let mut second = 0;
    let mut nano = 0;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::hour => hour = number(Some(part))?,
            Rule::minute => minute = number(Some(part))?,
            Rule::second => second = number(Some(part))?,
            Rule::fraction => {
                // right-pad to nanoseconds, drop anything finer
                let digits: String = part
                    .as_str()
                    .chars()
                    .chain("000000000".chars())
                    .take(9)
                    .collect();
                nano = digits.parse().ok()?;
            }
            _ => {}
        }
    }
    NaiveTime::from_hms_nano_opt(hour, minute, second, nano)
}

fn offset_seconds(pair: Pair<'_, Rule>) -> Option<i32> {
    let mut sign = 1;
    let mut hours = 0;
    let mut minutes = 0;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::utc => return Some(0),
            Rule::sign if part.as_str() == "-" => sign = -1,
            Rule::offset_hour => hours = number::<i32>(Some(part))?,
            Rule::offset_minute => minutes = number::<i32>(Some(part))?,
            _ => {}
        }
    }
    Some(sign * (hours * 3600 + minutes * 60))
}
