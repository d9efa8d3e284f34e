use std::fmt;

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Value – a single typed cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell. Numeric cells are either finite or `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Interpret the value as an `f64`. `None` for text and nulls.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn conforms_to(&self, dtype: DataType) -> bool {
        matches!(
            (self, dtype),
            (Value::Null, _)
                | (Value::Integer(_), DataType::Integer)
                | (Value::Float(_), DataType::Float)
                | (Value::Text(_), DataType::Text)
        )
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    Text,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub dtype: DataType,
}

impl Field {
    pub fn new(name: &str, dtype: DataType) -> Self {
        Field {
            name: name.to_string(),
            dtype,
        }
    }
}

/// Ordered list of typed columns. Column order is significant: it drives the
/// layout of assembled feature vectors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Index of a column a stage cannot work without.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| PipelineError::missing_column(name))
    }

    /// Like [`Schema::require`], additionally checking the column is numeric.
    pub fn require_numeric(&self, name: &str) -> Result<usize> {
        let idx = self.require(name)?;
        if !self.fields[idx].dtype.is_numeric() {
            return Err(PipelineError::SchemaMismatch {
                column: name.to_string(),
                reason: format!("expected a numeric column, found {:?}", self.fields[idx].dtype),
            });
        }
        Ok(idx)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Dataset – an immutable table of rows
// ---------------------------------------------------------------------------

/// One record, positionally aligned with the owning dataset's schema.
pub type Row = Vec<Value>;

/// A table of rows sharing one schema. Stages consume a dataset and return a
/// new one; nothing is mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset, checking every row against the schema.
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(PipelineError::SchemaMismatch {
                    column: "<row>".to_string(),
                    reason: format!(
                        "row {i} has {} values but the schema has {} columns",
                        row.len(),
                        schema.len()
                    ),
                });
            }
            for (value, field) in row.iter().zip(schema.fields()) {
                if !value.conforms_to(field.dtype) {
                    return Err(PipelineError::SchemaMismatch {
                        column: field.name.clone(),
                        reason: format!("row {i} holds {value:?}, expected {:?}", field.dtype),
                    });
                }
            }
        }
        Ok(Dataset { schema, rows })
    }

    pub fn empty(schema: Schema) -> Self {
        Dataset {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of the named column, in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>> {
        let idx = self.schema.require(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// A new dataset containing only the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Dataset {
        Dataset {
            schema: self.schema.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Append a column. Replaces an existing column of the same name.
    pub fn with_column(self, field: Field, values: Vec<Value>) -> Result<Dataset> {
        if values.len() != self.rows.len() {
            return Err(PipelineError::SchemaMismatch {
                column: field.name,
                reason: format!(
                    "{} values supplied for {} rows",
                    values.len(),
                    self.rows.len()
                ),
            });
        }
        let Dataset { schema, mut rows } = self;
        let mut fields = schema.fields;
        let existing = fields.iter().position(|f| f.name == field.name);
        match existing {
            Some(idx) => {
                fields[idx] = field;
                for (row, value) in rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                fields.push(field);
                for (row, value) in rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Dataset::new(Schema::new(fields), rows)
    }

    /// Stack datasets with identical schemas.
    pub fn concat(parts: Vec<Dataset>) -> Result<Dataset> {
        let mut iter = parts.into_iter();
        let Some(first) = iter.next() else {
            return Err(PipelineError::EmptyDataset { stage: "concatenation" });
        };
        let Dataset { schema, mut rows } = first;
        for part in iter {
            if part.schema != schema {
                return Err(PipelineError::SchemaMismatch {
                    column: "<schema>".to_string(),
                    reason: "cannot concatenate datasets with different schemas".to_string(),
                });
            }
            rows.extend(part.rows);
        }
        Ok(Dataset { schema, rows })
    }
}
