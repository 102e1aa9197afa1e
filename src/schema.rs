use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Default read capacity units for new tables.
pub const DEFAULT_READ_CAPACITY: i64 = 100;

/// Default write capacity units for new tables.
pub const DEFAULT_WRITE_CAPACITY: i64 = 20;

/// Scalar attribute type of a key attribute.
///
/// Serializes to the single-letter codes the store's schema format uses
/// (`"S"`, `"N"`, `"B"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    /// String attribute (`"S"`)
    #[serde(rename = "S")]
    String,
    /// Number attribute (`"N"`)
    #[serde(rename = "N")]
    Number,
    /// Binary attribute (`"B"`)
    #[serde(rename = "B")]
    Binary,
}

impl ScalarType {
    /// Parse a caller-supplied type name for the given key role.
    ///
    /// Accepts `string`, `number` or `binary`; anything else fails with
    /// [`Error::InvalidKeyType`] naming the role and the offending value.
    pub fn parse(role: KeyRole, value: &str) -> Result<Self, Error> {
        match value {
            "string" => Ok(ScalarType::String),
            "number" => Ok(ScalarType::Number),
            "binary" => Ok(ScalarType::Binary),
            _ => Err(Error::InvalidKeyType {
                role,
                value: value.to_string(),
            }),
        }
    }

    /// Single-letter code used in attribute definitions.
    pub fn code(self) -> &'static str {
        match self {
            ScalarType::String => "S",
            ScalarType::Number => "N",
            ScalarType::Binary => "B",
        }
    }
}

/// Role a key attribute plays in the table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRole {
    /// Partition (hash) key (`"HASH"`)
    #[serde(rename = "HASH")]
    Hash,
    /// Sort (range) key (`"RANGE"`)
    #[serde(rename = "RANGE")]
    Range,
}

impl KeyRole {
    /// Upper-cased code used in key schema elements.
    pub fn code(self) -> &'static str {
        match self {
            KeyRole::Hash => "HASH",
            KeyRole::Range => "RANGE",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Hash => write!(f, "hash"),
            KeyRole::Range => write!(f, "range"),
        }
    }
}

/// One attribute definition of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Attribute name
    pub attribute_name: String,
    /// Attribute scalar type
    pub attribute_type: ScalarType,
}

/// One key schema element of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchemaElement {
    /// Attribute name
    pub attribute_name: String,
    /// Key role of the attribute
    pub key_type: KeyRole,
}

/// Physical table schema descriptor, ready to hand to a store's
/// create-table primitive.
///
/// `attribute_definitions` and `key_schema` always reference the same
/// attributes in the same order, hash key first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub table_name: String,
    /// Key attribute definitions, hash first
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// Key schema elements, hash first
    pub key_schema: Vec<KeySchemaElement>,
    /// Provisioned read capacity units
    pub read_capacity: i64,
    /// Provisioned write capacity units
    pub write_capacity: i64,
}

impl TableSchema {
    /// Name of the hash key attribute.
    pub fn hash_attribute(&self) -> Option<&str> {
        self.key_schema
            .iter()
            .find(|element| element.key_type == KeyRole::Hash)
            .map(|element| element.attribute_name.as_str())
    }

    /// Name of the range key attribute, if the table has one.
    pub fn range_attribute(&self) -> Option<&str> {
        self.key_schema
            .iter()
            .find(|element| element.key_type == KeyRole::Range)
            .map(|element| element.attribute_name.as_str())
    }
}

/// Builder turning a declarative key description into a [`TableSchema`].
///
/// Defaults: hash key `("id", string)`, no range key, read capacity 100,
/// write capacity 20.
///
/// # Example
///
/// ```rust
/// use dynamo_shard::TableSchemaBuilder;
///
/// let schema = TableSchemaBuilder::new("events")
///     .hash_key("id", "string")
///     .range_key("created_at", "number")
///     .read_capacity(50)
///     .build()
///     .unwrap();
/// assert_eq!(schema.key_schema.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    table_name: String,
    hash_key: Option<(String, String)>,
    range_key: Option<(String, String)>,
    read_capacity: i64,
    write_capacity: i64,
}

impl TableSchemaBuilder {
    /// Start a schema description for `table_name`.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            hash_key: None,
            range_key: None,
            read_capacity: DEFAULT_READ_CAPACITY,
            write_capacity: DEFAULT_WRITE_CAPACITY,
        }
    }

    /// Set the hash key attribute; `scalar_type` is one of `string`,
    /// `number` or `binary`.
    pub fn hash_key(mut self, name: &str, scalar_type: &str) -> Self {
        self.hash_key = Some((name.to_string(), scalar_type.to_string()));
        self
    }

    /// Set the range key attribute; `scalar_type` is one of `string`,
    /// `number` or `binary`.
    pub fn range_key(mut self, name: &str, scalar_type: &str) -> Self {
        self.range_key = Some((name.to_string(), scalar_type.to_string()));
        self
    }

    /// Set provisioned read capacity units.
    pub fn read_capacity(mut self, units: i64) -> Self {
        self.read_capacity = units;
        self
    }

    /// Set provisioned write capacity units.
    pub fn write_capacity(mut self, units: i64) -> Self {
        self.write_capacity = units;
        self
    }

    /// Validate the key description and produce the schema.
    ///
    /// Key types are validated before any schema element is emitted; an
    /// unknown type fails with [`Error::InvalidKeyType`].
    pub fn build(self) -> Result<TableSchema, Error> {
        let (hash_name, hash_type) = self
            .hash_key
            .unwrap_or_else(|| ("id".to_string(), "string".to_string()));
        let hash_type = ScalarType::parse(KeyRole::Hash, &hash_type)?;

        let range = match self.range_key {
            Some((name, range_type)) => {
                Some((name, ScalarType::parse(KeyRole::Range, &range_type)?))
            }
            None => None,
        };

        let mut attribute_definitions = vec![AttributeDefinition {
            attribute_name: hash_name.clone(),
            attribute_type: hash_type,
        }];
        let mut key_schema = vec![KeySchemaElement {
            attribute_name: hash_name,
            key_type: KeyRole::Hash,
        }];

        if let Some((range_name, range_type)) = range {
            attribute_definitions.push(AttributeDefinition {
                attribute_name: range_name.clone(),
                attribute_type: range_type,
            });
            key_schema.push(KeySchemaElement {
                attribute_name: range_name,
                key_type: KeyRole::Range,
            });
        }

        Ok(TableSchema {
            table_name: self.table_name,
            attribute_definitions,
            key_schema,
            read_capacity: self.read_capacity,
            write_capacity: self.write_capacity,
        })
    }
}
