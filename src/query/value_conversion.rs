//! SeaQuery values to `may_postgres` parameters.
//!
//! Built statements carry `sea_query::Values`; executors take `&[&dyn ToSql]`.
//! Values are first converted into owned parameters, then borrowed for the
//! duration of the closure.

use crate::executor::LifeError;
use may_postgres::types::ToSql;
use sea_query::Value;

type OwnedParam = Box<dyn ToSql + Sync>;

fn to_param(value: &Value) -> Result<OwnedParam, LifeError> {
    let param: OwnedParam = match value {
        Value::Bool(v) => Box::new(*v),
        Value::TinyInt(v) => Box::new(v.map(i16::from)),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
        Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
        Value::Unsigned(v) => Box::new(v.map(i64::from)),
        Value::BigUnsigned(v) => {
            let converted = match v {
                Some(u) => Some(i64::try_from(*u).map_err(|_| {
                    LifeError::Other(format!(
                        "BigUnsigned value {} exceeds i64::MAX ({}), cannot be safely cast to i64",
                        u,
                        i64::MAX
                    ))
                })?),
                None => None,
            };
            Box::new(converted)
        }
        Value::Float(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(v) => Box::new(v.clone()),
        Value::Char(v) => Box::new(v.map(|c| c.to_string())),
        Value::Bytes(v) => Box::new(v.clone()),
        Value::Json(v) => {
            let text = match v {
                Some(j) => Some(serde_json::to_string(&**j).map_err(|e| {
                    LifeError::Other(format!("Failed to serialize JSON: {}", e))
                })?),
                None => None,
            };
            Box::new(text)
        }
        _ => {
            return Err(LifeError::Other(format!(
                "Unsupported value type in query: {:?}",
                value
            )));
        }
    };
    Ok(param)
}

/// Convert `values` to `ToSql` parameters and run `f` with them.
///
/// # Errors
///
/// Returns `LifeError::Other` if a value has no PostgreSQL mapping, otherwise
/// whatever `f` returns.
pub fn with_converted_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, LifeError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, LifeError>,
{
    let owned = values
        .iter()
        .map(to_param)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref() as &dyn ToSql).collect();
    f(&params)
}
