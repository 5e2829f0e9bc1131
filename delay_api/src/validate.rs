//! Field-by-field validation of `/predict` bodies.
//!
//! Unlike a plain serde decode, which stops at the first problem, this walks
//! the whole document and reports every failure in field-path order.

use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::types::{FieldError, FlightData, PredictRequest};

pub fn predict_request(body: &[u8]) -> Result<PredictRequest, ApiError> {
    let doc: Value = serde_json::from_slice(body).map_err(|e| {
        ApiError::Validation(vec![FieldError {
            loc: vec![json!("body"), json!(e.column())],
            msg: format!("JSON decode error: {}", e),
            kind: "value_error.jsondecode".into(),
        }])
    })?;

    let mut errors = Vec::new();
    let flights = request_flights(&doc, &mut errors);

    if errors.is_empty() {
        Ok(PredictRequest { flights })
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn request_flights(doc: &Value, errors: &mut Vec<FieldError>) -> Vec<FlightData> {
    let body = vec![json!("body")];
    let Some(obj) = doc.as_object() else {
        errors.push(failure(body, "value is not a valid dict", "type_error.dict"));
        return Vec::new();
    };

    let loc = path(&body, json!("flights"));
    match obj.get("flights") {
        None => {
            errors.push(failure(loc, "field required", "value_error.missing"));
            Vec::new()
        }
        Some(Value::Null) => {
            errors.push(failure(loc, "none is not an allowed value", "type_error.none.not_allowed"));
            Vec::new()
        }
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| flight(item, path(&loc, json!(i)), errors))
            .collect(),
        Some(_) => {
            errors.push(failure(loc, "value is not a valid list", "type_error.list"));
            Vec::new()
        }
    }
}

fn flight(item: &Value, loc: Vec<Value>, errors: &mut Vec<FieldError>) -> Option<FlightData> {
    let Some(obj) = item.as_object() else {
        errors.push(failure(loc, "value is not a valid dict", "type_error.dict"));
        return None;
    };

    let opera = string_field(obj, "OPERA", &loc, errors);
    let tipo_vuelo = string_field(obj, "TIPOVUELO", &loc, errors);
    let mes = int_field(obj, "MES", &loc, errors);

    Some(FlightData {
        opera: opera?,
        tipo_vuelo: tipo_vuelo?,
        mes: mes?,
    })
}

fn string_field(
    obj: &Map<String, Value>,
    name: &str,
    parent: &[Value],
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let loc = path(parent, json!(name));
    match required(obj, name, &loc, errors)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => {
            errors.push(failure(loc, "str type expected", "type_error.str"));
            None
        }
    }
}

fn int_field(
    obj: &Map<String, Value>,
    name: &str,
    parent: &[Value],
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let loc = path(parent, json!(name));
    let value = required(obj, name, &loc, errors)?;
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.push(failure(loc, "value is not a valid integer", "type_error.integer"));
    }
    parsed
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    name: &str,
    loc: &[Value],
    errors: &mut Vec<FieldError>,
) -> Option<&'a Value> {
    match obj.get(name) {
        None => {
            errors.push(failure(loc.to_vec(), "field required", "value_error.missing"));
            None
        }
        Some(Value::Null) => {
            errors.push(failure(loc.to_vec(), "none is not an allowed value", "type_error.none.not_allowed"));
            None
        }
        Some(v) => Some(v),
    }
}

fn path(parent: &[Value], next: Value) -> Vec<Value> {
    let mut loc = parent.to_vec();
    loc.push(next);
    loc
}

fn failure(loc: Vec<Value>, msg: &str, kind: &str) -> FieldError {
    FieldError {
        loc,
        msg: msg.to_string(),
        kind: kind.to_string(),
    }
}
