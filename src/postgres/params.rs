use std::error::Error;

use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::types::RowValues;

/// Borrowed Postgres parameters for one statement.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    #[must_use]
    pub fn convert(params: &'a [RowValues]) -> Params<'a> {
        let references = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Params { references }
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

fn unsupported(value: &RowValues, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot encode {} parameter as postgres type {ty}", value.kind()).into()
}

impl ToSql for RowValues {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => (*i).to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            RowValues::Float(f) => match *ty {
                #[allow(clippy::cast_possible_truncation)]
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => (*f).to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            RowValues::Text(s) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => s.to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            RowValues::Bool(b) => match *ty {
                Type::BOOL => (*b).to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            RowValues::Timestamp(dt) => match *ty {
                Type::TIMESTAMP => dt.to_sql(ty, out),
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            RowValues::JSON(jsval) => match *ty {
                Type::JSON | Type::JSONB => jsval.to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
            RowValues::Blob(bytes) => match *ty {
                Type::BYTEA => bytes.to_sql(ty, out),
                _ => Err(unsupported(self, ty)),
            },
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn encode(value: &RowValues, ty: &Type) -> Result<Vec<u8>, Box<dyn Error + Sync + Send>> {
        let mut out = bytes::BytesMut::new();
        value.to_sql(ty, &mut out)?;
        Ok(out.to_vec())
    }

    #[test]
    fn integers_widen_for_float_parameters() {
        assert_eq!(
            encode(&RowValues::Int(3), &Type::FLOAT8).unwrap(),
            3.0_f64.to_be_bytes()
        );
        assert_eq!(
            encode(&RowValues::Int(3), &Type::FLOAT4).unwrap(),
            3.0_f32.to_be_bytes()
        );
        assert_eq!(encode(&RowValues::Int(7), &Type::INT4).unwrap(), 7_i32.to_be_bytes());
    }

    #[test]
    fn mismatched_parameter_types_are_rejected() {
        assert!(encode(&RowValues::Int(3), &Type::TEXT).is_err());
        assert!(encode(&RowValues::Float(1.5), &Type::INT4).is_err());
        assert!(encode(&RowValues::Text("x".into()), &Type::INT8).is_err());
        assert!(encode(&RowValues::Bool(true), &Type::INT2).is_err());
        assert!(encode(&RowValues::Int(i64::MAX), &Type::INT4).is_err());
    }

    #[test]
    fn timestamps_bind_to_both_timestamp_types() {
        let dt = NaiveDateTime::parse_from_str("2024-01-01 08:00:01", "%Y-%m-%d %H:%M:%S").unwrap();
        assert!(<RowValues as ToSql>::accepts(&Type::TIMESTAMPTZ));
        let naive = encode(&RowValues::Timestamp(dt), &Type::TIMESTAMP).unwrap();
        let zoned = encode(&RowValues::Timestamp(dt), &Type::TIMESTAMPTZ).unwrap();
        assert_eq!(naive, zoned);
    }

    #[test]
    fn null_binds_to_anything() {
        let mut out = bytes::BytesMut::new();
        assert!(matches!(
            RowValues::Null.to_sql(&Type::BYTEA, &mut out).unwrap(),
            IsNull::Yes
        ));
    }
}
