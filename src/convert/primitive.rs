//! Primitive coercion
//!
//! Maps a single generic value to one of the seven primitive kinds. Null
//! handling happens in the structural converter; an actual null reaching the
//! coercer is always a failure.

use rust_decimal::prelude::ToPrimitive;

use super::context::ConversionContext;
use super::error::ConversionError;
use crate::models::{GenericValue, TypedValue};
use crate::schema::PrimitiveKind;

/// Coerce `value` into `kind`
pub fn coerce(
    kind: PrimitiveKind,
    value: &GenericValue,
    ctx: &ConversionContext,
) -> Result<TypedValue, ConversionError> {
    if value.is_null() {
        return Err(ConversionError::cell(kind, value, "null is not allowed"));
    }

    let fail = |reason: &str| ConversionError::cell(kind, value, reason);

    match kind {
        PrimitiveKind::Boolean => coerce_boolean(value, ctx)
            .map(TypedValue::Boolean)
            .ok_or_else(|| fail("not a recognised boolean token")),
        PrimitiveKind::Int => coerce_int(value).map(TypedValue::Int).map_err(|e| fail(&e)),
        PrimitiveKind::Long => coerce_long(value)
            .map(TypedValue::Long)
            .map_err(|e| fail(&e)),
        PrimitiveKind::Float => coerce_float(value, ctx)
            .map(TypedValue::Float)
            .map_err(|e| fail(&e)),
        PrimitiveKind::Double => coerce_double(value, ctx)
            .map(TypedValue::Double)
            .map_err(|e| fail(&e)),
        PrimitiveKind::String => Ok(TypedValue::String(match value {
            GenericValue::Text(s) => s.clone(),
            other => other.to_string(),
        })),
        PrimitiveKind::Bytes => Ok(TypedValue::Bytes(match value {
            GenericValue::Bytes(b) => b.clone(),
            other => other.to_string().into_bytes(),
        })),
    }
}

fn coerce_boolean(value: &GenericValue, ctx: &ConversionContext) -> Option<bool> {
    match value {
        GenericValue::Boolean(b) => Some(*b),
        GenericValue::Text(s) if ctx.is_true_token(s) => Some(true),
        GenericValue::Text(s) if ctx.is_false_token(s) => Some(false),
        GenericValue::Int(i) => int_flag(i64::from(*i)),
        GenericValue::Long(i) => int_flag(*i),
        GenericValue::BigInt(i) => i64::try_from(*i).ok().and_then(int_flag),
        _ => None,
    }
}

fn int_flag(i: i64) -> Option<bool> {
    match i {
        1 => Some(true),
        0 => Some(false),
        _ => None,
    }
}

fn coerce_int(value: &GenericValue) -> Result<i32, String> {
    match value {
        GenericValue::Int(i) => Ok(*i),
        GenericValue::Long(i) => i32::try_from(*i).map_err(|e| e.to_string()),
        // Wider than 64 bits: truncate to 64 before narrowing
        GenericValue::BigInt(i) => i32::try_from(*i as i64).map_err(|e| e.to_string()),
        GenericValue::Text(s) => s.trim().parse::<i32>().map_err(|e| e.to_string()),
        _ => whole_number(value)
            .ok_or_else(|| format!("{} is not an integer", value.type_name()))
            .and_then(|n| i32::try_from(n).map_err(|e| e.to_string())),
    }
}

fn coerce_long(value: &GenericValue) -> Result<i64, String> {
    match value {
        GenericValue::Int(i) => Ok(i64::from(*i)),
        GenericValue::Long(i) => Ok(*i),
        GenericValue::BigInt(i) => Ok(*i as i64),
        GenericValue::Text(s) => s.trim().parse::<i64>().map_err(|e| e.to_string()),
        _ => whole_number(value)
            .ok_or_else(|| format!("{} is not an integer", value.type_name())),
    }
}

/// Decimal values without a fractional part are accepted as integers
fn whole_number(value: &GenericValue) -> Option<i64> {
    match value {
        GenericValue::Decimal(d) if d.fract().is_zero() => d.to_i64(),
        _ => None,
    }
}

fn coerce_float(value: &GenericValue, ctx: &ConversionContext) -> Result<f32, String> {
    match value {
        GenericValue::Float(f) => Ok(*f),
        GenericValue::Double(f) => Ok(*f as f32),
        GenericValue::Int(i) => Ok(*i as f32),
        GenericValue::Long(i) => Ok(*i as f32),
        GenericValue::BigInt(i) => Ok(*i as f32),
        GenericValue::Decimal(d) => d.to_f32().ok_or_else(|| "decimal out of range".to_string()),
        GenericValue::Text(s) => ctx
            .normalize_decimal(s)
            .parse::<f32>()
            .map_err(|e| e.to_string()),
        _ => Err(format!("{} is not a number", value.type_name())),
    }
}

fn coerce_double(value: &GenericValue, ctx: &ConversionContext) -> Result<f64, String> {
    match value {
        GenericValue::Float(f) => Ok(f64::from(*f)),
        GenericValue::Double(f) => Ok(*f),
        GenericValue::Int(i) => Ok(f64::from(*i)),
        GenericValue::Long(i) => Ok(*i as f64),
        GenericValue::BigInt(i) => Ok(*i as f64),
        GenericValue::Decimal(d) => d.to_f64().ok_or_else(|| "decimal out of range".to_string()),
        GenericValue::Text(s) => ctx
            .normalize_decimal(s)
            .parse::<f64>()
            .map_err(|e| e.to_string()),
        _ => Err(format!("{} is not a number", value.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConversionErrorKind, ConversionOptions};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ctx() -> ConversionContext {
        ConversionContext::default()
    }

    #[test]
    fn test_boolean_tokens() {
        let ctx = ctx();
        for input in ["true", "TRUE", "1", "Yes", "on", "t"] {
            assert_eq!(
                coerce(PrimitiveKind::Boolean, &GenericValue::text(input), &ctx).unwrap(),
                TypedValue::Boolean(true),
                "input {input}"
            );
        }
        for input in ["false", "OFF", "0", "no", ""] {
            assert_eq!(
                coerce(PrimitiveKind::Boolean, &GenericValue::text(input), &ctx).unwrap(),
                TypedValue::Boolean(false),
                "input {input}"
            );
        }
        assert_eq!(
            coerce(PrimitiveKind::Boolean, &GenericValue::Long(1), &ctx).unwrap(),
            TypedValue::Boolean(true)
        );
    }

    #[test]
    fn test_boolean_rejects_unknown_token() {
        let err = coerce(PrimitiveKind::Boolean, &GenericValue::text("maybe"), &ctx()).unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::Cell);
        assert!(err.to_string().contains("maybe"));

        assert!(coerce(PrimitiveKind::Boolean, &GenericValue::Long(2), &ctx()).is_err());
    }

    #[test]
    fn test_custom_boolean_tokens() {
        let ctx = ConversionContext::new(
            ConversionOptions::builder()
                .true_values(["oui"])
                .false_values(["non"])
                .build(),
        )
        .unwrap();
        assert_eq!(
            coerce(PrimitiveKind::Boolean, &GenericValue::text("OUI"), &ctx).unwrap(),
            TypedValue::Boolean(true)
        );
        assert!(coerce(PrimitiveKind::Boolean, &GenericValue::text("true"), &ctx).is_err());
    }

    #[test]
    fn test_int_and_long() {
        let ctx = ctx();
        assert_eq!(
            coerce(PrimitiveKind::Int, &GenericValue::text(" 42 "), &ctx).unwrap(),
            TypedValue::Int(42)
        );
        assert_eq!(
            coerce(PrimitiveKind::Int, &GenericValue::Long(-7), &ctx).unwrap(),
            TypedValue::Int(-7)
        );
        assert!(coerce(PrimitiveKind::Int, &GenericValue::Long(i64::MAX), &ctx).is_err());
        assert!(coerce(PrimitiveKind::Int, &GenericValue::text("4.2"), &ctx).is_err());
        assert_eq!(
            coerce(PrimitiveKind::Long, &GenericValue::Int(3), &ctx).unwrap(),
            TypedValue::Long(3)
        );
        assert_eq!(
            coerce(
                PrimitiveKind::Long,
                &GenericValue::Decimal(Decimal::from_str("12.00").unwrap()),
                &ctx
            )
            .unwrap(),
            TypedValue::Long(12)
        );
    }

    #[test]
    fn test_big_integer_truncates_to_long() {
        let wide = (1i128 << 64) + 5;
        assert_eq!(
            coerce(PrimitiveKind::Long, &GenericValue::BigInt(wide), &ctx()).unwrap(),
            TypedValue::Long(5)
        );
    }

    #[test]
    fn test_floating_point() {
        let ctx = ctx();
        assert_eq!(
            coerce(PrimitiveKind::Double, &GenericValue::text("2.5"), &ctx).unwrap(),
            TypedValue::Double(2.5)
        );
        assert_eq!(
            coerce(PrimitiveKind::Float, &GenericValue::Int(2), &ctx).unwrap(),
            TypedValue::Float(2.0)
        );
        assert_eq!(
            coerce(PrimitiveKind::Double, &GenericValue::Float(0.5), &ctx).unwrap(),
            TypedValue::Double(0.5)
        );
        assert!(coerce(PrimitiveKind::Double, &GenericValue::text("abc"), &ctx).is_err());
    }

    #[test]
    fn test_float_from_json_number() {
        let ctx = ctx();
        let price = GenericValue::from_json(serde_json::json!(1.5));
        assert_eq!(
            coerce(PrimitiveKind::Float, &price, &ctx).unwrap(),
            TypedValue::Float(1.5)
        );
        assert_eq!(
            coerce(PrimitiveKind::Float, &GenericValue::Double(-0.25), &ctx).unwrap(),
            TypedValue::Float(-0.25)
        );
    }

    #[test]
    fn test_decimal_separator() {
        let ctx =
            ConversionContext::new(ConversionOptions::builder().decimal_separator(',').build())
                .unwrap();
        assert_eq!(
            coerce(PrimitiveKind::Double, &GenericValue::text("3,25"), &ctx).unwrap(),
            TypedValue::Double(3.25)
        );
    }

    #[test]
    fn test_string_and_bytes_never_fail() {
        let ctx = ctx();
        assert_eq!(
            coerce(PrimitiveKind::String, &GenericValue::Long(12), &ctx).unwrap(),
            TypedValue::String("12".to_string())
        );
        assert_eq!(
            coerce(PrimitiveKind::String, &GenericValue::Boolean(false), &ctx).unwrap(),
            TypedValue::String("false".to_string())
        );
        assert_eq!(
            coerce(PrimitiveKind::Bytes, &GenericValue::text("hi"), &ctx).unwrap(),
            TypedValue::Bytes(b"hi".to_vec())
        );
    }

    #[test]
    fn test_null_is_rejected() {
        for kind in [PrimitiveKind::String, PrimitiveKind::Int, PrimitiveKind::Boolean] {
            assert!(coerce(kind, &GenericValue::Null, &ctx()).is_err());
        }
    }
}
