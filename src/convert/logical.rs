//! Logical-type codecs
//!
//! A [`LogicalCodecs`] table maps logical type names to [`LogicalCodec`]
//! implementations. The structural converter consults the table for every
//! logical schema node; names with no registered codec are converted against
//! the physical type instead.
//!
//! Built-in codecs:
//! - `decimal`: rounds half-to-even to the declared scale
//! - `uuid`
//! - `date`: integers are days since the epoch
//! - `time-millis`, `time-micros`
//! - `timestamp-*`, `local-timestamp-*`: integers are epoch millis or micros;
//!   zone-less text is resolved in the configured time zone

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use super::context::ConversionContext;
use super::error::ConversionError;
use crate::models::{GenericValue, TypedValue};
use crate::schema::LogicalKind;

/// Largest scale a decimal value can carry
const MAX_DECIMAL_SCALE: u32 = 28;

const DEFAULT_TIME_PATTERNS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
const DEFAULT_DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Decodes generic values into one logical type
pub trait LogicalCodec: Send + Sync {
    fn decode(
        &self,
        kind: &LogicalKind,
        value: &GenericValue,
        ctx: &ConversionContext,
    ) -> Result<TypedValue, ConversionError>;
}

/// Logical type name to codec table
#[derive(Clone, Default)]
pub struct LogicalCodecs {
    codecs: BTreeMap<String, Arc<dyn LogicalCodec>>,
}

impl LogicalCodecs {
    /// An empty table; every logical type falls back to its physical type
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table of built-in codecs
    pub fn builtin() -> Self {
        let mut codecs = Self::empty();
        let builtin: Arc<dyn LogicalCodec> = Arc::new(BuiltinCodec);
        for name in [
            "decimal",
            "uuid",
            "date",
            "time-millis",
            "time-micros",
            "timestamp-millis",
            "timestamp-micros",
            "local-timestamp-millis",
            "local-timestamp-micros",
        ] {
            codecs.register(name, Arc::clone(&builtin));
        }
        codecs
    }

    /// Register or replace the codec for a logical type name
    pub fn register(&mut self, name: impl Into<String>, codec: Arc<dyn LogicalCodec>) {
        self.codecs.insert(name.into(), codec);
    }

    /// Remove the codec for a logical type name
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn LogicalCodec>> {
        self.codecs.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn LogicalCodec>> {
        self.codecs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }
}

impl fmt::Debug for LogicalCodecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.codecs.keys()).finish()
    }
}

/// The built-in decoding rules, dispatched on the logical kind
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCodec;

impl LogicalCodec for BuiltinCodec {
    fn decode(
        &self,
        kind: &LogicalKind,
        value: &GenericValue,
        ctx: &ConversionContext,
    ) -> Result<TypedValue, ConversionError> {
        decode(kind, value, ctx)
    }
}

/// Decode `value` as the logical type `kind`
pub fn decode(
    kind: &LogicalKind,
    value: &GenericValue,
    ctx: &ConversionContext,
) -> Result<TypedValue, ConversionError> {
    let result = match kind {
        LogicalKind::Decimal { precision, scale } => {
            decode_decimal(*precision, *scale, value, ctx).map(TypedValue::Decimal)
        }
        LogicalKind::Uuid => decode_uuid(value).map(TypedValue::Uuid),
        LogicalKind::Date => decode_date(value, ctx).map(TypedValue::Date),
        LogicalKind::TimeMillis => decode_time(value, ctx)
            .map(|t| TypedValue::TimeMillis(truncate_time(t, 1_000_000))),
        LogicalKind::TimeMicros => {
            decode_time(value, ctx).map(|t| TypedValue::TimeMicros(truncate_time(t, 1_000)))
        }
        LogicalKind::TimestampMillis => decode_instant(value, ctx, Precision::Millis)
            .map(TypedValue::TimestampMillis),
        LogicalKind::TimestampMicros => decode_instant(value, ctx, Precision::Micros)
            .map(TypedValue::TimestampMicros),
        LogicalKind::LocalTimestampMillis => decode_instant(value, ctx, Precision::Millis)
            .map(|ts| TypedValue::LocalTimestampMillis(to_local(ts, ctx))),
        LogicalKind::LocalTimestampMicros => decode_instant(value, ctx, Precision::Micros)
            .map(|ts| TypedValue::LocalTimestampMicros(to_local(ts, ctx))),
    };
    result.map_err(|reason| ConversionError::cell(kind.name(), value, reason))
}

fn decode_decimal(
    precision: u32,
    scale: u32,
    value: &GenericValue,
    ctx: &ConversionContext,
) -> Result<Decimal, String> {
    if scale > MAX_DECIMAL_SCALE {
        return Err(format!("scale {scale} exceeds {MAX_DECIMAL_SCALE}"));
    }
    let raw = match value {
        GenericValue::Decimal(d) => *d,
        GenericValue::Text(s) => {
            let normalized = ctx.normalize_decimal(s);
            Decimal::from_str(&normalized)
                .or_else(|_| Decimal::from_scientific(&normalized))
                .map_err(|e| e.to_string())?
        }
        GenericValue::Int(i) => scale_integer(i128::from(*i), precision, scale)?,
        GenericValue::Long(i) => scale_integer(i128::from(*i), precision, scale)?,
        GenericValue::BigInt(i) => scale_integer(*i, precision, scale)?,
        GenericValue::Float(f) => {
            Decimal::from_f32(*f).ok_or_else(|| format!("{f} is not representable"))?
        }
        GenericValue::Double(f) => {
            Decimal::from_f64(*f).ok_or_else(|| format!("{f} is not representable"))?
        }
        other => return Err(format!("{} is not numeric", other.type_name())),
    };
    let mut rounded = raw.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(scale);
    let digits = rounded
        .mantissa()
        .unsigned_abs()
        .checked_ilog10()
        .map_or(1, |d| d + 1);
    if digits > precision {
        return Err(format!(
            "{rounded} has {digits} digits, more than precision {precision}"
        ));
    }
    Ok(rounded)
}

/// Integer input: unscaled = value * 10^(precision - scale), carrying `scale`
fn scale_integer(value: i128, precision: u32, scale: u32) -> Result<Decimal, String> {
    let exponent = precision.saturating_sub(scale);
    let unscaled = 10i128
        .checked_pow(exponent)
        .and_then(|factor| value.checked_mul(factor))
        .ok_or_else(|| format!("{value} overflows decimal({precision}, {scale})"))?;
    Decimal::try_from_i128_with_scale(unscaled, scale).map_err(|e| e.to_string())
}

fn decode_uuid(value: &GenericValue) -> Result<Uuid, String> {
    match value {
        GenericValue::Uuid(u) => Ok(*u),
        GenericValue::Text(s) => Uuid::parse_str(s.trim()).map_err(|e| e.to_string()),
        GenericValue::Bytes(b) => Uuid::from_slice(b).map_err(|e| e.to_string()),
        other => Err(format!("{} is not a uuid", other.type_name())),
    }
}

fn epoch_date() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

fn decode_date(value: &GenericValue, ctx: &ConversionContext) -> Result<NaiveDate, String> {
    match value {
        GenericValue::Date(d) => Ok(*d),
        GenericValue::LocalDateTime(dt) => Ok(dt.date()),
        GenericValue::DateTime(dt) => Ok(dt.with_timezone(&ctx.time_zone()).date_naive()),
        GenericValue::Int(i) => days_from_epoch(i64::from(*i)),
        GenericValue::Long(i) => days_from_epoch(*i),
        GenericValue::Text(s) => parse_date(s.trim(), ctx),
        other => Err(format!("{} is not a date", other.type_name())),
    }
}

fn days_from_epoch(days: i64) -> Result<NaiveDate, String> {
    let epoch = epoch_date();
    let date = if days >= 0 {
        epoch.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        epoch.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    date.ok_or_else(|| format!("{days} days from epoch is out of range"))
}

fn parse_date(text: &str, ctx: &ConversionContext) -> Result<NaiveDate, String> {
    if let Some(format) = ctx.date_format() {
        return NaiveDate::parse_from_str(text, format).map_err(|e| e.to_string());
    }
    // ISO date, optionally followed by an offset which is ignored
    let (date, rest) =
        NaiveDate::parse_and_remainder(text, "%Y-%m-%d").map_err(|e| e.to_string())?;
    if rest.is_empty() || is_offset(rest) {
        Ok(date)
    } else {
        Err(format!("unexpected trailing input '{rest}'"))
    }
}

fn is_offset(text: &str) -> bool {
    text == "Z"
        || DateTime::parse_from_str(&format!("2000-01-01T00:00:00{text}"), "%Y-%m-%dT%H:%M:%S%:z")
            .is_ok()
}

fn decode_time(value: &GenericValue, ctx: &ConversionContext) -> Result<NaiveTime, String> {
    match value {
        GenericValue::Time(t) | GenericValue::OffsetTime(t, _) => Ok(*t),
        GenericValue::LocalDateTime(dt) => Ok(dt.time()),
        GenericValue::DateTime(dt) => Ok(dt.time()),
        GenericValue::Text(s) => parse_time(s.trim(), ctx),
        other => Err(format!("{} is not a time", other.type_name())),
    }
}

fn parse_time(text: &str, ctx: &ConversionContext) -> Result<NaiveTime, String> {
    if let Some(format) = ctx.time_format() {
        return NaiveTime::parse_from_str(text, format).map_err(|e| e.to_string());
    }
    let mut last_error = String::from("empty input");
    for pattern in DEFAULT_TIME_PATTERNS {
        match NaiveTime::parse_and_remainder(text, pattern) {
            Ok((time, rest)) if rest.is_empty() || is_offset(rest) => return Ok(time),
            Ok((_, rest)) => last_error = format!("unexpected trailing input '{rest}'"),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(last_error)
}

/// Drop sub-second digits below `nanos` resolution
fn truncate_time(time: NaiveTime, nanos: u32) -> NaiveTime {
    use chrono::Timelike;
    let truncated = time.nanosecond() - time.nanosecond() % nanos;
    time.with_nanosecond(truncated).unwrap_or(time)
}

#[derive(Debug, Clone, Copy)]
enum Precision {
    Millis,
    Micros,
}

fn decode_instant(
    value: &GenericValue,
    ctx: &ConversionContext,
    precision: Precision,
) -> Result<DateTime<Utc>, String> {
    let instant = match value {
        GenericValue::DateTime(dt) => dt.with_timezone(&Utc),
        GenericValue::LocalDateTime(dt) => resolve_local(dt, ctx)?,
        GenericValue::Date(d) => resolve_local(&d.and_time(NaiveTime::MIN), ctx)?,
        GenericValue::Int(i) => from_epoch(i64::from(*i), precision)?,
        GenericValue::Long(i) => from_epoch(*i, precision)?,
        GenericValue::BigInt(i) => {
            let i = i64::try_from(*i).map_err(|e| e.to_string())?;
            from_epoch(i, precision)?
        }
        GenericValue::Text(s) => {
            let text = s.trim();
            match text.parse::<i64>() {
                Ok(n) => from_epoch(n, precision)?,
                Err(_) => parse_datetime(text, ctx)?,
            }
        }
        other => return Err(format!("{} is not a timestamp", other.type_name())),
    };
    Ok(truncate_instant(instant, precision))
}

fn from_epoch(n: i64, precision: Precision) -> Result<DateTime<Utc>, String> {
    let instant = match precision {
        Precision::Millis => DateTime::from_timestamp_millis(n),
        Precision::Micros => DateTime::from_timestamp_micros(n),
    };
    instant.ok_or_else(|| format!("{n} is out of range for an epoch timestamp"))
}

fn truncate_instant(instant: DateTime<Utc>, precision: Precision) -> DateTime<Utc> {
    use chrono::Timelike;
    let step = match precision {
        Precision::Millis => 1_000_000,
        Precision::Micros => 1_000,
    };
    let nanos = instant.nanosecond();
    instant.with_nanosecond(nanos - nanos % step).unwrap_or(instant)
}

fn parse_datetime(text: &str, ctx: &ConversionContext) -> Result<DateTime<Utc>, String> {
    if let Some(format) = ctx.datetime_format() {
        // Patterns with an offset specifier yield an instant directly
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Ok(dt.with_timezone(&Utc));
        }
        let local = NaiveDateTime::parse_from_str(text, format).map_err(|e| e.to_string())?;
        return resolve_local(&local, ctx);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    let mut last_error = String::from("empty input");
    for pattern in DEFAULT_DATETIME_PATTERNS {
        match NaiveDateTime::parse_from_str(text, pattern) {
            Ok(local) => return resolve_local(&local, ctx),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(last_error)
}

fn resolve_local(local: &NaiveDateTime, ctx: &ConversionContext) -> Result<DateTime<Utc>, String> {
    ctx.time_zone()
        .from_local_datetime(local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("{local} does not exist in {}", ctx.time_zone().name()))
}

fn to_local(instant: DateTime<Utc>, ctx: &ConversionContext) -> NaiveDateTime {
    instant.with_timezone(&ctx.time_zone()).naive_local()
}
