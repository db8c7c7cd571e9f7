//! Cell value normalization
//!
//! Turns one BSON property value into the flat text stored in a worksheet
//! cell. Nested arrays and documents are kept as compact JSON text so nothing
//! is dropped. Rendering never fails: when JSON serialization is impossible
//! the value's `Display` form is used instead.

use mongodb::bson::{Binary, Bson, DateTime, Regex, Timestamp};

/// Strategy for rendering BSON values into cell text
pub trait CellConverter: Send + Sync {
    /// Convert a present value
    fn convert(&self, value: &Bson) -> String;

    /// Convert an optional value; absent properties become empty text
    fn convert_optional(&self, value: Option<&Bson>) -> String {
        value.map(|v| self.convert(v)).unwrap_or_default()
    }
}

/// Default converter used by the sheet writer
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCellConverter;

impl PlainCellConverter {
    pub fn new() -> Self {
        Self
    }
}

impl CellConverter for PlainCellConverter {
    fn convert(&self, value: &Bson) -> String {
        normalize(value)
    }
}

/// Normalize a single value into spreadsheet-safe text
pub fn normalize(value: &Bson) -> String {
    match value {
        Bson::Null | Bson::Undefined => String::new(),
        Bson::Boolean(b) => b.to_string(),
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Double(f) => format_double(*f),
        Bson::Decimal128(d) => d.to_string(),
        Bson::Array(_) | Bson::Document(_) => to_compact_json(value),
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::DateTime(dt) => format_datetime(dt),
        Bson::Binary(bin) => format_binary(bin),
        Bson::RegularExpression(regex) => format_regex(regex),
        Bson::Timestamp(ts) => format_timestamp(ts),
        Bson::Symbol(s) => s.clone(),
        Bson::JavaScriptCode(code) => code.clone(),
        Bson::MinKey => String::from("MinKey"),
        Bson::MaxKey => String::from("MaxKey"),
        other => to_compact_json(other),
    }
}

/// Normalize a possibly absent value; absent properties become empty text
pub fn normalize_optional(value: Option<&Bson>) -> String {
    value.map(normalize).unwrap_or_default()
}

fn to_compact_json(value: &Bson) -> String {
    let json = value.clone().into_relaxed_extjson();
    serde_json::to_string(&json).unwrap_or_else(|_| value.to_string())
}

/// JSON number text, matching doubles inside nested values; non-finite
/// values by their Extended JSON names
fn format_double(value: f64) -> String {
    if value.is_nan() {
        return String::from("NaN");
    }
    if value.is_infinite() {
        let name = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return String::from(name);
    }

    serde_json::Number::from_f64(value)
        .map(|n| n.to_string())
        .unwrap_or_else(|| value.to_string())
}

fn format_datetime(dt: &DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_else(|_| dt.to_string())
}

fn format_binary(bin: &Binary) -> String {
    hex::encode(&bin.bytes)
}

fn format_regex(regex: &Regex) -> String {
    format!("/{}/{}", regex.pattern, regex.options)
}

fn format_timestamp(ts: &Timestamp) -> String {
    format!("Timestamp({}, {})", ts.time, ts.increment)
}
