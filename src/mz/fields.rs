//! Key-order preserving documents.
//!
//! MZ data files carry many fields this crate never touches. A document is
//! read as a whole JSON object; the typed fields are taken out of it (leaving
//! `null` in their slot so the key keeps its position) and put back in the
//! same slot on write. Everything else round-trips untouched.

use serde::de::{self, DeserializeOwned};
use serde::{ser, Serialize};
use serde_json::{Map, Value};

/// Remaining (opaque) fields of a document, in file order.
pub type Rest = Map<String, Value>;

/// Take the typed value of `key` out of `doc`, leaving a placeholder.
pub fn take<T: DeserializeOwned, E: de::Error>(doc: &mut Rest, key: &str) -> Result<T, E> {
    let slot = doc
        .get_mut(key)
        .ok_or_else(|| E::custom(format!("missing field `{key}`")))?;
    serde_json::from_value(slot.take()).map_err(|e| E::custom(format!("field `{key}`: {e}")))
}

/// Write `value` into `key`. An existing key keeps its position; a new key is
/// appended.
pub fn put<T: Serialize + ?Sized, E: ser::Error>(
    doc: &mut Rest,
    key: &str,
    value: &T,
) -> Result<(), E> {
    let value = serde_json::to_value(value).map_err(E::custom)?;
    doc.insert(key.to_string(), value);
    Ok(())
}

/// Implements `Serialize`/`Deserialize` for a struct with a `rest: Rest`
/// field and a list of typed fields stored under the given JSON keys.
macro_rules! document {
    ($ty:ident { $($field:ident => $key:literal),+ $(,)? }) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut doc = self.rest.clone();
                $( $crate::mz::fields::put::<_, S::Error>(&mut doc, $key, &self.$field)?; )+
                serde::Serialize::serialize(&doc, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let mut rest = <$crate::mz::fields::Rest as serde::Deserialize>::deserialize(deserializer)?;
                $( let $field = $crate::mz::fields::take::<_, D::Error>(&mut rest, $key)?; )+
                Ok(Self { $($field,)+ rest })
            }
        }
    };
}

pub(crate) use document;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Doc {
        count: u32,
        rest: Rest,
    }

    document!(Doc { count => "count" });

    #[test]
    fn typed_field_keeps_its_slot() {
        let src = r#"{"a":1,"count":2,"z":[null,{"k":"v"}]}"#;
        let mut doc: Doc = serde_json::from_str(src).unwrap();
        assert_eq!(doc.count, 2);
        doc.count = 9;
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"a":1,"count":9,"z":[null,{"k":"v"}]}"#
        );
    }

    #[test]
    fn missing_typed_field_is_an_error() {
        let err = serde_json::from_str::<Doc>(r#"{"a":1}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `count`"));
    }
}
