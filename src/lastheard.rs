use crate::errors::RowRejected;
use crate::model::LastHeardRecord;
use chrono::{DateTime, Datelike, Local, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use log::trace;

pub const COLUMN_COUNT: usize = 8;

/// Duration text shown while a transmission is still running.
const IN_PROGRESS: &str = "TX";
/// BER text shown when the hotspot could not measure it.
const UNKNOWN_BER: &str = "??";

/// Inputs the dashboard table does not carry itself: the year (the table only
/// shows day and month) and the zone its clock runs in.
///
/// The year is taken as-is, so an entry from late December read in early
/// January lands in the wrong year. Nothing here tries to correct that.
#[derive(Clone, Copy, Debug)]
pub struct ParseContext {
    pub year: i32,
    pub tz: Tz,
}

impl ParseContext {
    pub fn new(year: i32, tz: Tz) -> Self {
        Self { year, tz }
    }

    /// Context using the current calendar year of the local clock.
    pub fn current(tz: Tz) -> Self {
        Self::new(Local::now().year(), tz)
    }
}

#[inline]
fn drop_last_two_chars(s: &str) -> Option<&str> {
    let mut it = s.char_indices().rev();
    it.next()?;
    let (i, _) = it.next()?;
    Some(&s[..i])
}

#[inline]
fn apply_tz(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        // Fall-back hour: take standard time, the later instant.
        LocalResult::Ambiguous(_, later) => Some(later.with_timezone(&Utc)),
        // Spring-forward gap: read it with the offset in force the day before.
        LocalResult::None => {
            let before = naive.checked_sub_signed(TimeDelta::days(1))?;
            let offset = tz.offset_from_utc_datetime(&before).fix();
            let utc = naive.checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
            Some(Utc.from_utc_datetime(&utc))
        }
    }
}

/// Source format: "15:10:34 Mar 25th".
pub fn parse_timestamp(text: &str, ctx: &ParseContext) -> Result<DateTime<Utc>, RowRejected> {
    let bad = || RowRejected::Timestamp(text.to_string());
    let without_ordinal = drop_last_two_chars(text.trim()).ok_or_else(bad)?;
    let full = format!("{} {}", without_ordinal, ctx.year);
    let naive = NaiveDateTime::parse_from_str(&full, "%H:%M:%S %b %d %Y").map_err(|_| bad())?;
    apply_tz(naive, ctx.tz).ok_or_else(bad)
}

#[inline]
fn parse_f64(field: &'static str, text: &str) -> Result<f64, RowRejected> {
    let v = text.trim().parse::<f64>().map_err(|_| RowRejected::Number {
        field,
        text: text.to_string(),
    })?;
    if !v.is_finite() || v < 0.0 {
        return Err(RowRejected::OutOfRange { field, text: text.to_string() });
    }
    // "-0" passes the range check; store it as plain zero.
    Ok(v + 0.0)
}

#[inline]
fn strip_percent<'a>(field: &'static str, text: &'a str) -> Result<&'a str, RowRejected> {
    text.trim().strip_suffix('%').ok_or_else(|| RowRejected::Number {
        field,
        text: text.to_string(),
    })
}

fn parse_duration(text: &str) -> Result<f64, RowRejected> {
    if text.trim() == IN_PROGRESS {
        return Err(RowRejected::InProgress);
    }
    parse_f64("duration", text)
}

fn parse_loss(text: &str) -> Result<u8, RowRejected> {
    let digits = strip_percent("loss", text)?;
    let v = digits.trim().parse::<i64>().map_err(|_| RowRejected::Number {
        field: "loss",
        text: text.to_string(),
    })?;
    if !(0..=100).contains(&v) {
        return Err(RowRejected::OutOfRange { field: "loss", text: text.to_string() });
    }
    Ok(v as u8)
}

fn parse_ber(text: &str) -> Result<Option<f64>, RowRejected> {
    let value = strip_percent("ber", text)?.trim();
    if value == UNKNOWN_BER {
        return Ok(None);
    }
    parse_f64("ber", value).map(Some)
}

/// Turn the cell texts of one table row into a record.
///
/// Every field is validated before the record is built, so a rejected row
/// never leaves a half-filled record behind.
pub fn parse_row<S: AsRef<str>>(cells: &[S], ctx: &ParseContext) -> Result<LastHeardRecord, RowRejected> {
    if cells.len() != COLUMN_COUNT {
        return Err(RowRejected::ColumnCount(cells.len()));
    }
    let cell = |i: usize| cells[i].as_ref();

    // Cheap rejection first: most skipped data rows are live transmissions.
    let duration = parse_duration(cell(5))?;
    let timestamp = parse_timestamp(cell(0), ctx)?;
    let loss = parse_loss(cell(6))?;
    let ber = parse_ber(cell(7))?;

    let rec = LastHeardRecord {
        timestamp,
        mode: cell(1).to_string(),
        callsign: cell(2).to_string(),
        target: cell(3).replace('\u{a0}', " "),
        source: cell(4).to_string(),
        duration,
        loss,
        ber,
    };
    trace!("parsed row -> {:?}", rec);
    Ok(rec)
}
