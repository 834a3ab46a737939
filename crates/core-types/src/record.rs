use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single cell as returned by the database, mirroring SQLite's storage classes.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Integer view of the cell. Reals are truncated, text is parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(f) => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Floating point view of the cell, used for aggregate results such as `SUM(pnl)`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null | Value::Blob(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interprets a URL path segment as a key value: integers bind as integers,
    /// everything else as text.
    pub fn from_param(param: &str) -> Self {
        match param.parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Text(param.to_string()),
        }
    }
}

/// Renders the cell for terminal output. Nulls print as an empty string.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One result row keyed by column name.
///
/// Columns keep the order the database returned them in. A repeated column
/// name overwrites the earlier value but keeps the earlier position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zips column names with a positional row. Missing trailing cells become `Null`.
    pub fn from_row(columns: &[String], values: Vec<Value>) -> Self {
        let mut record = Record { fields: Vec::with_capacity(columns.len()) };
        let mut values = values.into_iter();
        for column in columns {
            record.insert(column.clone(), values.next().unwrap_or(Value::Null));
        }
        record
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A raw, row-oriented result set as produced by an executor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| Record::from_row(&columns, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_display_for_terminal_cells() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Real(1.5).to_string(), "1.5");
        assert_eq!(Value::from("buy").to_string(), "buy");
        assert_eq!(Value::Blob(vec![0, 1, 2]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_rows_shape_into_column_keyed_records() {
        let rows = Rows::new(
            columns(&["id", "title", "sentiment"]),
            vec![
                vec![Value::Integer(1), "Fed holds rates".into(), Value::Real(0.2)],
                vec![Value::Integer(2), "BTC ETF inflows".into(), Value::Null],
            ],
        );

        let records = rows.into_records();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("title"), Some(&Value::Text("Fed holds rates".into())));
        assert_eq!(records[1].get("sentiment"), Some(&Value::Null));
        assert_eq!(records[1].columns().collect::<Vec<_>>(), vec!["id", "title", "sentiment"]);
    }

    #[test]
    fn test_short_row_fills_null() {
        let record = Record::from_row(&columns(&["id", "pnl"]), vec![Value::Integer(7)]);
        assert_eq!(record.get("pnl"), Some(&Value::Null));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_duplicate_column_keeps_last_value() {
        let record = Record::from_row(
            &columns(&["id", "timestamp", "id"]),
            vec![Value::Integer(1), "2026-01-01".into(), Value::Integer(9)],
        );
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("id"), Some(&Value::Integer(9)));
    }

    #[test]
    fn test_record_serializes_in_column_order() {
        let record = Record::from_row(
            &columns(&["symbol", "side", "qty", "note"]),
            vec!["BTCUSDT".into(), "buy".into(), Value::Real(0.5), Value::Null],
        );
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"symbol":"BTCUSDT","side":"buy","qty":0.5,"note":null}"#);
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Real(2.9).as_i64(), Some(2));
        assert_eq!(Value::Text("12".into()).as_i64(), Some(12));
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_from_param_and_dates() {
        assert_eq!(Value::from_param("42"), Value::Integer(42));
        assert_eq!(Value::from_param("abc-1"), Value::Text("abc-1".into()));
        let date = NaiveDate::from_ymd_opt(2026, 2, 21).unwrap();
        assert_eq!(Value::from(date), Value::Text("2026-02-21".into()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }
}
