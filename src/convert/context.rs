//! Conversion options and the resolved conversion context

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::error::ContextError;
use super::logical::LogicalCodecs;
use crate::models::GenericValue;

/// What to do when a cell or row fails to convert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadRowPolicy {
    /// Abort on the first failure
    #[default]
    #[serde(alias = "error")]
    Fail,
    /// Log the failure and substitute null (or drop the row)
    Warn,
    /// Silently substitute null (or drop the row)
    Skip,
}

impl fmt::Display for BadRowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadRowPolicy::Fail => write!(f, "fail"),
            BadRowPolicy::Warn => write!(f, "warn"),
            BadRowPolicy::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for BadRowPolicy {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" | "error" => Ok(BadRowPolicy::Fail),
            "warn" => Ok(BadRowPolicy::Warn),
            "skip" => Ok(BadRowPolicy::Skip),
            _ => Err(ContextError::InvalidPolicy(s.to_string())),
        }
    }
}

const DEFAULT_TRUE_VALUES: &[&str] = &["t", "true", "enabled", "1", "on", "yes"];
const DEFAULT_FALSE_VALUES: &[&str] = &["f", "false", "disabled", "0", "off", "no", ""];
const DEFAULT_NULL_VALUES: &[&str] = &[
    "",
    "#N/A",
    "#N/A N/A",
    "#NA",
    "-1.#IND",
    "-1.#QNAN",
    "-NaN",
    "1.#IND",
    "1.#QNAN",
    "NA",
    "n/a",
    "nan",
    "null",
];

fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// User-facing conversion options
///
/// Format patterns use strftime syntax (`%Y-%m-%d`). When a pattern is unset
/// the coercer accepts ISO-8601 text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionOptions {
    /// Text tokens recognised as `true` (case-insensitive)
    pub true_values: Vec<String>,

    /// Text tokens recognised as `false` (case-insensitive)
    pub false_values: Vec<String>,

    /// Text tokens recognised as null (case-insensitive)
    pub null_values: Vec<String>,

    /// Pattern for date text
    pub date_format: Option<String>,

    /// Pattern for time text
    pub time_format: Option<String>,

    /// Pattern for timestamp text
    pub datetime_format: Option<String>,

    /// Character used as decimal point in numeric text
    pub decimal_separator: char,

    /// IANA zone used to resolve zone-less timestamps (UTC when unset)
    pub time_zone: Option<String>,

    /// Reject rows with more fields than the schema declares
    pub strict_schema: bool,

    /// Apply null/boolean tokens to every field regardless of declared type
    pub infer_all_fields: bool,

    /// Failure policy
    pub on_bad_row: BadRowPolicy,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            true_values: tokens(DEFAULT_TRUE_VALUES),
            false_values: tokens(DEFAULT_FALSE_VALUES),
            null_values: tokens(DEFAULT_NULL_VALUES),
            date_format: None,
            time_format: None,
            datetime_format: None,
            decimal_separator: '.',
            time_zone: None,
            strict_schema: false,
            infer_all_fields: false,
            on_bad_row: BadRowPolicy::Fail,
        }
    }
}

impl ConversionOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom options
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder::default()
    }
}

/// Builder for ConversionOptions
#[derive(Debug, Default)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
}

impl ConversionOptionsBuilder {
    /// Replace the true tokens
    pub fn true_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.true_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the false tokens
    pub fn false_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.false_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the null tokens
    pub fn null_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.null_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.options.date_format = Some(format.into());
        self
    }

    pub fn time_format(mut self, format: impl Into<String>) -> Self {
        self.options.time_format = Some(format.into());
        self
    }

    pub fn datetime_format(mut self, format: impl Into<String>) -> Self {
        self.options.datetime_format = Some(format.into());
        self
    }

    pub fn decimal_separator(mut self, separator: char) -> Self {
        self.options.decimal_separator = separator;
        self
    }

    /// Set the IANA zone name, e.g. `Europe/Paris`
    pub fn time_zone(mut self, zone: impl Into<String>) -> Self {
        self.options.time_zone = Some(zone.into());
        self
    }

    pub fn strict_schema(mut self, strict: bool) -> Self {
        self.options.strict_schema = strict;
        self
    }

    pub fn infer_all_fields(mut self, infer: bool) -> Self {
        self.options.infer_all_fields = infer;
        self
    }

    pub fn on_bad_row(mut self, policy: BadRowPolicy) -> Self {
        self.options.on_bad_row = policy;
        self
    }

    /// Build the options
    pub fn build(self) -> ConversionOptions {
        self.options
    }
}

/// Resolved, read-only conversion settings
///
/// Built once per conversion task from [`ConversionOptions`] and shared by
/// every row; tokens are pre-lowercased and the time zone is resolved.
pub struct ConversionContext {
    true_values: HashSet<String>,
    false_values: HashSet<String>,
    null_values: HashSet<String>,
    date_format: Option<String>,
    time_format: Option<String>,
    datetime_format: Option<String>,
    decimal_separator: char,
    time_zone: Tz,
    strict_schema: bool,
    infer_all_fields: bool,
    on_bad_row: BadRowPolicy,
    codecs: LogicalCodecs,
}

impl ConversionContext {
    /// Resolve options into a context with the built-in logical codecs
    pub fn new(options: ConversionOptions) -> Result<Self, ContextError> {
        let time_zone = match options.time_zone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ContextError::InvalidTimeZone(name.to_string()))?,
            None => Tz::UTC,
        };

        check_format("date", options.date_format.as_deref())?;
        check_format("time", options.time_format.as_deref())?;
        check_format("datetime", options.datetime_format.as_deref())?;

        if options.decimal_separator.is_ascii_digit()
            || matches!(options.decimal_separator, '-' | '+')
        {
            return Err(ContextError::InvalidDecimalSeparator(
                options.decimal_separator,
            ));
        }

        Ok(Self {
            true_values: lowercase_set(&options.true_values),
            false_values: lowercase_set(&options.false_values),
            null_values: lowercase_set(&options.null_values),
            date_format: options.date_format,
            time_format: options.time_format,
            datetime_format: options.datetime_format,
            decimal_separator: options.decimal_separator,
            time_zone,
            strict_schema: options.strict_schema,
            infer_all_fields: options.infer_all_fields,
            on_bad_row: options.on_bad_row,
            codecs: LogicalCodecs::builtin(),
        })
    }

    /// Replace the logical codec table
    pub fn with_codecs(mut self, codecs: LogicalCodecs) -> Self {
        self.codecs = codecs;
        self
    }

    /// True for an actual null or a text null token
    pub fn is_null(&self, value: &GenericValue) -> bool {
        match value {
            GenericValue::Null => true,
            GenericValue::Text(s) => self.is_null_token(s),
            _ => false,
        }
    }

    pub fn is_null_token(&self, text: &str) -> bool {
        self.null_values.contains(&text.to_lowercase())
    }

    pub fn is_true_token(&self, text: &str) -> bool {
        self.true_values.contains(&text.to_lowercase())
    }

    pub fn is_false_token(&self, text: &str) -> bool {
        self.false_values.contains(&text.to_lowercase())
    }

    /// Rewrite numeric text so that `.` is the decimal point
    pub fn normalize_decimal<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        let trimmed = text.trim();
        if self.decimal_separator == '.' {
            std::borrow::Cow::Borrowed(trimmed)
        } else {
            std::borrow::Cow::Owned(trimmed.replace(self.decimal_separator, "."))
        }
    }

    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn time_format(&self) -> Option<&str> {
        self.time_format.as_deref()
    }

    pub fn datetime_format(&self) -> Option<&str> {
        self.datetime_format.as_deref()
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn strict_schema(&self) -> bool {
        self.strict_schema
    }

    pub fn infer_all_fields(&self) -> bool {
        self.infer_all_fields
    }

    pub fn on_bad_row(&self) -> BadRowPolicy {
        self.on_bad_row
    }

    pub fn codecs(&self) -> &LogicalCodecs {
        &self.codecs
    }
}

impl Default for ConversionContext {
    fn default() -> Self {
        let options = ConversionOptions::default();
        Self {
            true_values: lowercase_set(&options.true_values),
            false_values: lowercase_set(&options.false_values),
            null_values: lowercase_set(&options.null_values),
            date_format: None,
            time_format: None,
            datetime_format: None,
            decimal_separator: '.',
            time_zone: Tz::UTC,
            strict_schema: false,
            infer_all_fields: false,
            on_bad_row: BadRowPolicy::Fail,
            codecs: LogicalCodecs::builtin(),
        }
    }
}

impl fmt::Debug for ConversionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionContext")
            .field("time_zone", &self.time_zone.name())
            .field("decimal_separator", &self.decimal_separator)
            .field("strict_schema", &self.strict_schema)
            .field("infer_all_fields", &self.infer_all_fields)
            .field("on_bad_row", &self.on_bad_row)
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

fn lowercase_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

fn check_format(kind: &'static str, format: Option<&str>) -> Result<(), ContextError> {
    match format {
        Some(f) if StrftimeItems::new(f).any(|item| matches!(item, Item::Error)) => {
            Err(ContextError::InvalidFormat {
                kind,
                format: f.to_string(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConversionOptions::default();
        assert_eq!(options.on_bad_row, BadRowPolicy::Fail);
        assert_eq!(options.decimal_separator, '.');
        assert!(options.true_values.contains(&"yes".to_string()));
        assert!(options.null_values.contains(&"#N/A".to_string()));
        assert!(!options.strict_schema);
    }

    #[test]
    fn test_builder() {
        let options = ConversionOptions::builder()
            .true_values(["Y"])
            .decimal_separator(',')
            .time_zone("Europe/Paris")
            .strict_schema(true)
            .on_bad_row(BadRowPolicy::Skip)
            .build();
        assert_eq!(options.true_values, vec!["Y".to_string()]);
        assert_eq!(options.decimal_separator, ',');
        assert_eq!(options.time_zone.as_deref(), Some("Europe/Paris"));
        assert!(options.strict_schema);
        assert_eq!(options.on_bad_row, BadRowPolicy::Skip);
    }

    #[test]
    fn test_tokens_are_case_insensitive() {
        let ctx = ConversionContext::default();
        assert!(ctx.is_true_token("TRUE"));
        assert!(ctx.is_true_token("Yes"));
        assert!(ctx.is_false_token("OFF"));
        assert!(ctx.is_null_token("NULL"));
        assert!(ctx.is_null_token("#n/a"));
        assert!(ctx.is_null(&GenericValue::Null));
        assert!(!ctx.is_null(&GenericValue::text("hello")));
        assert!(!ctx.is_null(&GenericValue::Long(0)));
    }

    #[test]
    fn test_context_resolves_time_zone() {
        let ctx = ConversionContext::new(
            ConversionOptions::builder().time_zone("Asia/Tokyo").build(),
        )
        .unwrap();
        assert_eq!(ctx.time_zone(), chrono_tz::Asia::Tokyo);
        assert_eq!(ConversionContext::default().time_zone(), Tz::UTC);
    }

    #[test]
    fn test_context_rejects_bad_options() {
        let result =
            ConversionContext::new(ConversionOptions::builder().time_zone("Mars/Base").build());
        assert!(matches!(result, Err(ContextError::InvalidTimeZone(_))));

        let result =
            ConversionContext::new(ConversionOptions::builder().date_format("%Y-%").build());
        assert!(matches!(result, Err(ContextError::InvalidFormat { .. })));

        let result =
            ConversionContext::new(ConversionOptions::builder().decimal_separator('5').build());
        assert!(matches!(
            result,
            Err(ContextError::InvalidDecimalSeparator('5'))
        ));
    }

    #[test]
    fn test_normalize_decimal() {
        let ctx =
            ConversionContext::new(ConversionOptions::builder().decimal_separator(',').build())
                .unwrap();
        assert_eq!(ctx.normalize_decimal(" 2,5 "), "2.5");
        assert_eq!(ConversionContext::default().normalize_decimal("2.5"), "2.5");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("fail".parse::<BadRowPolicy>().unwrap(), BadRowPolicy::Fail);
        assert_eq!("ERROR".parse::<BadRowPolicy>().unwrap(), BadRowPolicy::Fail);
        assert_eq!("warn".parse::<BadRowPolicy>().unwrap(), BadRowPolicy::Warn);
        assert_eq!("skip".parse::<BadRowPolicy>().unwrap(), BadRowPolicy::Skip);
        assert!("ignore".parse::<BadRowPolicy>().is_err());
    }

    #[test]
    fn test_options_serde_camel_case() {
        let options: ConversionOptions = serde_json::from_str(
            r#"{"strictSchema": true, "onBadRow": "error", "decimalSeparator": ","}"#,
        )
        .unwrap();
        assert!(options.strict_schema);
        assert_eq!(options.on_bad_row, BadRowPolicy::Fail);
        assert_eq!(options.decimal_separator, ',');
        // Unspecified fields keep their defaults
        assert!(options.true_values.contains(&"t".to_string()));
    }
}
