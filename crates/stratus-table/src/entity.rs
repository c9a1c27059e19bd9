//! Table entities and their properties.

use std::collections::BTreeMap;

use bytes::Bytes;
use derive_more::From;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use stratus_core::{Error, ErrorKind, Result};
use uuid::Uuid;

/// A typed property value of a table entity.
#[derive(Debug, Clone, PartialEq, From, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EntityProperty {
    /// UTF-8 string.
    String(String),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point number.
    Double(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Point in time, stored in UTC.
    DateTime(Timestamp),
    /// Globally unique identifier.
    Guid(Uuid),
    /// Raw bytes.
    Binary(Bytes),
}

impl EntityProperty {
    /// Returns the wire type name of this property, e.g. `Edm.Int64`.
    pub fn edm_type(&self) -> &'static str {
        match self {
            Self::String(_) => "Edm.String",
            Self::Int32(_) => "Edm.Int32",
            Self::Int64(_) => "Edm.Int64",
            Self::Double(_) => "Edm.Double",
            Self::Boolean(_) => "Edm.Boolean",
            Self::DateTime(_) => "Edm.DateTime",
            Self::Guid(_) => "Edm.Guid",
            Self::Binary(_) => "Edm.Binary",
        }
    }

    /// Returns the value of a `String` property.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value as `i64`, widening `Int32`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(value) => Some(i64::from(*value)),
            Self::Int64(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value of a `Double` property.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value of a `Boolean` property.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value of a `DateTime` property.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value of a `Guid` property.
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Self::Guid(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the bytes of a `Binary` property.
    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            Self::Binary(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for EntityProperty {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// An entity with an open set of named properties.
///
/// Query results are always read in this shape and then converted with
/// [`TableEntity::read_entity`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicTableEntity {
    /// Partition the entity is stored in.
    pub partition_key: String,
    /// Key of the entity within its partition.
    pub row_key: String,
    /// Server-assigned modification time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Concurrency tag, absent until the entity has been stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Named properties, excluding the key columns.
    #[serde(default)]
    pub properties: BTreeMap<String, EntityProperty>,
}

impl DynamicTableEntity {
    /// Creates an entity without properties.
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            ..Self::default()
        }
    }

    /// Adds or replaces a property.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<EntityProperty>,
    ) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a property, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<EntityProperty>,
    ) -> Option<EntityProperty> {
        self.properties.insert(name.into(), value.into())
    }

    /// Returns a property by name.
    /// 
    /// Key columns are not properties; see [`field`](Self::field).
    pub fn property(&self, name: &str) -> Option<&EntityProperty> {
        self.properties.get(name)
    }

    /// Returns a property, failing with a conversion error if it is missing.
    pub fn require(&self, name: &str) -> Result<&EntityProperty> {
        self.property(name).ok_or_else(|| {
            Error::conversion(format!(
                "entity {}/{} has no property `{name}`",
                self.partition_key, self.row_key
            ))
        })
    }

    /// Returns a string property, failing if it is missing or not a string.
    pub fn require_str(&self, name: &str) -> Result<&str> {
        let property = self.require(name)?;
        property
            .as_str()
            .ok_or_else(|| mismatch(name, "Edm.String", property))
    }

    /// Returns an integer property, failing if it is missing or not an integer.
    pub fn require_i64(&self, name: &str) -> Result<i64> {
        let property = self.require(name)?;
        property
            .as_i64()
            .ok_or_else(|| mismatch(name, "Edm.Int64", property))
    }

    /// Looks up a property by name, including the key columns.
    ///
    /// Used to evaluate query filters against an entity.
    pub fn field(&self, name: &str) -> Option<EntityProperty> {
        match name {
            "PartitionKey" => Some(EntityProperty::String(self.partition_key.clone())),
            "RowKey" => Some(EntityProperty::String(self.row_key.clone())),
            "Timestamp" => self.timestamp.map(EntityProperty::DateTime),
            _ => self.properties.get(name).cloned(),
        }
    }
}

fn mismatch(name: &str, expected: &str, found: &EntityProperty) -> Error {
    Error::conversion(format!(
        "property `{name}` is {}, expected {expected}",
        found.edm_type()
    ))
}

/// Conversion between a typed record and a [`DynamicTableEntity`].
pub trait TableEntity: Sized {
    /// Builds the record from a fetched entity.
    ///
    /// Failures should use [`ErrorKind::Conversion`]; other kinds are wrapped
    /// into one by the query adapters.
    fn read_entity(entity: DynamicTableEntity) -> Result<Self>;

    /// Converts the record back into an entity.
    fn write_entity(&self) -> DynamicTableEntity;
}

impl TableEntity for DynamicTableEntity {
    #[inline]
    fn read_entity(entity: DynamicTableEntity) -> Result<Self> {
        Ok(entity)
    }

    #[inline]
    fn write_entity(&self) -> DynamicTableEntity {
        self.clone()
    }
}

/// Reads `entity` as `T`, classifying any failure as a conversion error.
pub(crate) fn convert<T: TableEntity>(entity: DynamicTableEntity) -> Result<T> {
    T::read_entity(entity).map_err(|error| match error.kind {
        ErrorKind::Conversion => error,
        _ => Error::from_source(ErrorKind::Conversion, error)
            .with_message("entity conversion failed"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Reading {
        sensor: String,
        value: i64,
    }

    impl TableEntity for Reading {
        fn read_entity(entity: DynamicTableEntity) -> Result<Self> {
            Ok(Self {
                sensor: entity.require_str("Sensor")?.to_owned(),
                value: entity.require_i64("Value")?,
            })
        }

        fn write_entity(&self) -> DynamicTableEntity {
            DynamicTableEntity::new("readings", &self.sensor)
                .with_property("Sensor", self.sensor.as_str())
                .with_property("Value", self.value)
        }
    }

    #[test]
    fn property_accessors() {
        assert_eq!(EntityProperty::from(7i32).as_i64(), Some(7));
        assert_eq!(EntityProperty::from("x").as_str(), Some("x"));
        assert_eq!(EntityProperty::from(true).as_bool(), Some(true));
        assert_eq!(EntityProperty::from(1.5).as_f64(), Some(1.5));
        assert_eq!(EntityProperty::from("x").as_i64(), None);
        assert_eq!(EntityProperty::from(3i64).edm_type(), "Edm.Int64");

        let id = Uuid::nil();
        assert_eq!(EntityProperty::from(id).as_guid(), Some(id));
        let epoch = Timestamp::UNIX_EPOCH;
        assert_eq!(EntityProperty::from(epoch).as_timestamp(), Some(epoch));
        assert_eq!(
            EntityProperty::from(Bytes::from_static(b"\x01")).as_binary(),
            Some(&Bytes::from_static(b"\x01"))
        );
        assert_eq!(EntityProperty::from(true).as_binary(), None);
    }

    #[test]
    fn typed_entity_roundtrip() {
        let reading = Reading {
            sensor: "t-1".into(),
            value: 21,
        };

        let entity = reading.write_entity();
        assert_eq!(entity.row_key, "t-1");
        assert_eq!(Reading::read_entity(entity).unwrap(), reading);
    }

    #[test]
    fn missing_property_is_conversion_error() {
        let entity = DynamicTableEntity::new("readings", "t-1").with_property("Sensor", "t-1");
        let error = Reading::read_entity(entity).unwrap_err();

        assert_eq!(error.kind, ErrorKind::Conversion);
    }

    #[test]
    fn mistyped_property_is_conversion_error() {
        let entity = DynamicTableEntity::new("readings", "t-1")
            .with_property("Sensor", "t-1")
            .with_property("Value", "high");
        let error = Reading::read_entity(entity).unwrap_err();

        assert_eq!(error.kind, ErrorKind::Conversion);
        assert!(error.to_string().contains("Edm.String"));
    }

    #[test]
    fn convert_wraps_other_kinds() {
        struct Strict;

        impl TableEntity for Strict {
            fn read_entity(_: DynamicTableEntity) -> Result<Self> {
                Err(Error::invalid_input("rejected"))
            }

            fn write_entity(&self) -> DynamicTableEntity {
                DynamicTableEntity::default()
            }
        }

        let error = convert::<Strict>(DynamicTableEntity::default()).err().unwrap();
        assert_eq!(error.kind, ErrorKind::Conversion);
    }

    #[test]
    fn key_columns_are_fields() {
        let entity = DynamicTableEntity::new("p", "r").with_property("Name", "n");

        assert_eq!(entity.field("PartitionKey"), Some("p".into()));
        assert_eq!(entity.field("RowKey"), Some("r".into()));
        assert_eq!(entity.field("Name"), Some("n".into()));
        assert_eq!(entity.field("Timestamp"), None);
    }

    #[test]
    fn property_serializes_with_type_tag() {
        let json = serde_json::to_value(EntityProperty::Int64(5)).unwrap();

        assert_eq!(json["type"], "int64");
        assert_eq!(json["value"], 5);
    }
}
