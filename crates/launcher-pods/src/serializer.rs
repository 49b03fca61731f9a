//! Serialization of init-file payloads

use serde::Serialize;

use launcher_common::{Error, Result};

/// Turns structured values into init-file contents.
///
/// Implementations must be deterministic: the same value always yields the
/// same string.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectSerializer: Send + Sync {
    /// Serialize a JSON value into file contents
    fn serialize(&self, value: &serde_json::Value) -> Result<String>;
}

/// Compact JSON serializer
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl ObjectSerializer for JsonSerializer {
    fn serialize(&self, value: &serde_json::Value) -> Result<String> {
        serde_json::to_string(value).map_err(|e| Error::serialization(e.to_string()))
    }
}

/// Serialize any `Serialize` value through an `ObjectSerializer`.
///
/// `kind` names the object in the error when conversion fails.
pub fn serialize_as<T: Serialize + ?Sized>(
    serializer: &dyn ObjectSerializer,
    kind: &str,
    value: &T,
) -> Result<String> {
    let json = serde_json::to_value(value)
        .map_err(|e| Error::serialization_for_kind(kind, e.to_string()))?;
    serializer.serialize(&json).map_err(|e| match e {
        Error::Serialization { message, kind: None } => Error::Serialization {
            message,
            kind: Some(kind.to_string()),
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn json_serializer_is_deterministic() {
        let map = BTreeMap::from([("b", 2), ("a", 1)]);
        let first = serialize_as(&JsonSerializer, "map", &map).unwrap();
        let second = serialize_as(&JsonSerializer, "map", &map).unwrap();
        assert_eq!(first, r#"{"a":1,"b":2}"#);
        assert_eq!(first, second);
    }

    #[test]
    fn failures_carry_the_object_kind() {
        let mut mock = MockObjectSerializer::new();
        mock.expect_serialize()
            .returning(|_| Err(Error::serialization("disk full")));

        let err = serialize_as(&mock, "JobRunConfig", &1).unwrap_err();
        match err {
            Error::Serialization { kind, message } => {
                assert_eq!(kind.as_deref(), Some("JobRunConfig"));
                assert_eq!(message, "disk full");
            }
            other => panic!("Expected Serialization variant, got {:?}", other),
        }
    }

    #[test]
    fn non_string_map_keys_fail_conversion() {
        let map = BTreeMap::from([((1, 2), "tuple key")]);
        let err = serialize_as(&JsonSerializer, "TupleMap", &map).unwrap_err();
        assert!(matches!(err, Error::Serialization { kind: Some(k), .. } if k == "TupleMap"));
    }
}
