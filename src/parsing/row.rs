//! Key-based access to loosely typed Asset API rows
//!
//! Rows come back as protobuf `Struct` values rendered to JSON. Nested
//! columns use the same BigQuery envelope as the row itself:
//! `{"f": [{"v": ...}, ...]}`. Nothing here assumes a fixed record shape;
//! every accessor returns `Option` and each field is extracted independently.

use serde_json::Value;

/// Borrowed cursor over one JSON value inside a row
#[derive(Debug, Clone, Copy)]
pub struct RowValue<'a> {
    value: &'a Value,
}

impl<'a> RowValue<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn raw(&self) -> &'a Value {
        self.value
    }

    /// Look up a key if this value is a map
    pub fn get(&self, key: &str) -> Option<RowValue<'a>> {
        self.value.as_object()?.get(key).map(RowValue::new)
    }

    /// Strip any number of `{"v": ...}` wrappers
    pub fn unwrap_v(self) -> RowValue<'a> {
        let mut current = self;
        while let Some(inner) = current.single_v() {
            current = inner;
        }
        current
    }

    fn single_v(&self) -> Option<RowValue<'a>> {
        let map = self.value.as_object()?;
        if map.len() == 1 {
            map.get("v").map(RowValue::new)
        } else {
            None
        }
    }

    /// Positional cell of an `{"f": [...]}` envelope, with its `v` stripped
    pub fn cell(&self, index: usize) -> Option<RowValue<'a>> {
        let cells = self.unwrap_v().get("f")?.value.as_array()?;
        cells.get(index).map(|c| RowValue::new(c).unwrap_v())
    }

    /// Number of cells in an `{"f": [...]}` envelope
    pub fn cell_count(&self) -> Option<usize> {
        self.unwrap_v()
            .get("f")
            .and_then(|f| f.value.as_array())
            .map(Vec::len)
    }

    pub fn is_null(&self) -> bool {
        self.unwrap_v().value.is_null()
    }

    /// Non-empty string value
    pub fn as_str(&self) -> Option<&'a str> {
        self.unwrap_v().value.as_str().filter(|s| !s.is_empty())
    }

    /// Integer given either as a JSON number or as a decimal string
    pub fn as_u64(&self) -> Option<u64> {
        let inner = self.unwrap_v();
        match inner.value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// List items, each with its `v` wrapper stripped
    pub fn as_list(&self) -> Option<Vec<RowValue<'a>>> {
        let items = self.unwrap_v().value.as_array()?;
        Some(items.iter().map(|i| RowValue::new(i).unwrap_v()).collect())
    }

    /// Treat the value as a struct: positional cells when enveloped,
    /// named keys otherwise.
    pub fn field(&self, index: usize, keys: &[&str]) -> Option<RowValue<'a>> {
        let inner = self.unwrap_v();
        if inner.cell_count().is_some() {
            return inner.cell(index);
        }
        keys.iter()
            .find_map(|key| inner.get(key))
            .map(RowValue::unwrap_v)
    }
}
