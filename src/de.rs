//! Deserialization of serde types from canonical [`Value`] trees.

use serde::de::{self, Deserialize, DeserializeOwned, Deserializer as _, IntoDeserializer};
use serde::forward_to_deserialize_any;

use crate::decode::decode_value;
use crate::error::{Error, Result};
use crate::value::Value;

/// Deserialize a type from a [`Value`] tree.
pub fn from_value<'de, T: Deserialize<'de>>(value: &'de Value) -> Result<T> {
    T::deserialize(ValueDeserializer { value })
}

/// Decode canonical CBOR bytes and deserialize a type from the result.
pub fn from_slice<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
    let value = decode_value(buf)?;
    from_value(&value)
}

#[derive(Clone, Copy)]
struct ValueDeserializer<'de> {
    value: &'de Value,
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Boolean(v) => visitor.visit_bool(*v),
            Value::Integer(n) => match (n.as_u64(), n.as_i64()) {
                (Some(v), _) => visitor.visit_u64(v),
                (None, Some(v)) => visitor.visit_i64(v),
                (None, None) => visitor.visit_i128(n.as_i128()),
            },
            Value::Float(v) => visitor.visit_f64(*v),
            Value::Bytes(v) => visitor.visit_borrowed_bytes(v),
            Value::Text(v) => visitor.visit_borrowed_str(v),
            Value::Array(v) => visitor.visit_seq(SeqAccess { iter: v.iter() }),
            Value::Map(m) => visitor.visit_map(MapAccess {
                iter: m.iter(),
                value: None,
            }),
            Value::Tagged(_, payload) => ValueDeserializer { value: payload }.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Value::Text(variant) => visitor.visit_enum(variant.as_str().into_deserializer()),
            Value::Map(m) if m.len() == 1 => {
                let (key, value) = m.iter().next().expect("len checked");
                let variant = key.try_text()?;
                visitor.visit_enum(EnumAccess { variant, value })
            }
            _ => Err(Error::WrongType {
                expected: "enum",
                actual: self.value.kind(),
            }),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

struct SeqAccess<'de> {
    iter: std::slice::Iter<'de, Value>,
}

impl<'de> de::SeqAccess<'de> for SeqAccess<'de> {
    type Error = Error;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer { value }).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapAccess<'de, I: Iterator<Item = (&'de Value, &'de Value)>> {
    iter: I,
    value: Option<&'de Value>,
}

impl<'de, I: Iterator<Item = (&'de Value, &'de Value)>> de::MapAccess<'de> for MapAccess<'de, I> {
    type Error = Error;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer { value: key }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self.value.take().expect("next_value before next_key");
        seed.deserialize(ValueDeserializer { value })
    }
}

struct EnumAccess<'de> {
    variant: &'de str,
    value: &'de Value,
}

impl<'de> de::EnumAccess<'de> for EnumAccess<'de> {
    type Error = Error;
    type Variant = VariantAccess<'de>;

    fn variant_seed<V: de::DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, VariantAccess<'de>)> {
        let variant = seed.deserialize(self.variant.into_deserializer())?;
        Ok((variant, VariantAccess { value: self.value }))
    }
}

struct VariantAccess<'de> {
    value: &'de Value,
}

impl<'de> de::VariantAccess<'de> for VariantAccess<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            _ => Err(Error::WrongType {
                expected: "null",
                actual: self.value.kind(),
            }),
        }
    }

    fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(ValueDeserializer { value: self.value })
    }

    fn tuple_variant<V: de::Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        ValueDeserializer { value: self.value }.deserialize_any(visitor)
    }

    fn struct_variant<V: de::Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        ValueDeserializer { value: self.value }.deserialize_any(visitor)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                fmt.write_str("any CBOR-representable value")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
                Ok(Value::Boolean(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E> {
                Ok(Value::Bytes(v.to_vec()))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
                Value::deserialize(deserializer)
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::Array(items))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
                let mut map = crate::map::CborMap::new();
                while let Some((key, value)) = access.next_entry::<Value, Value>()? {
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ser::{to_value, to_vec};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: u32,
        name: String,
        scores: Vec<i64>,
        active: bool,
        note: Option<String>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Point,
        Circle(f64),
        Rect { w: u32, h: u32 },
    }

    #[test]
    fn struct_roundtrip() {
        let record = Record {
            id: 7,
            name: "ada".to_string(),
            scores: vec![-1, 0, 300],
            active: true,
            note: None,
        };
        let bytes = to_vec(&record).unwrap();
        let back: Record = from_slice(&bytes).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn struct_keys_are_canonical() {
        let record = Record {
            id: 1,
            name: String::new(),
            scores: vec![],
            active: false,
            note: None,
        };
        let value = to_value(&record).unwrap();
        let map = value.as_map().unwrap();
        let keys: Vec<&str> = map.keys().map(|k| k.as_str().unwrap()).collect();
        // Ordered by encoded key bytes: length first, then content
        assert_eq!(keys, vec!["id", "name", "note", "active", "scores"]);
    }

    #[test]
    fn enum_roundtrip() {
        for shape in [
            Shape::Point,
            Shape::Circle(1.5),
            Shape::Rect { w: 3, h: 4 },
        ] {
            let bytes = to_vec(&shape).unwrap();
            let back: Shape = from_slice(&bytes).unwrap();
            assert_eq!(shape, back);
        }
    }

    #[test]
    fn unit_variant_is_text() {
        assert_eq!(to_value(&Shape::Point).unwrap(), Value::from("Point"));
    }

    #[test]
    fn value_self_roundtrip() {
        let value = to_value(&Record {
            id: 9,
            name: "x".into(),
            scores: vec![2],
            active: true,
            note: Some("y".into()),
        })
        .unwrap();
        let back: Value = from_value(&value).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn tags_are_transparent_to_extraction() {
        let value = Value::tagged(1, 1700000000u64);
        let ts: u64 = from_value(&value).unwrap();
        assert_eq!(ts, 1700000000);
    }

    #[test]
    fn extraction_failures() {
        let value = to_value(&vec![1u8, 2]).unwrap();
        assert!(from_value::<String>(&value).is_err());
        assert!(from_value::<Vec<u8>>(&Value::from("nope")).is_err());
    }

    #[test]
    fn floats_canonicalize_through_serde() {
        let value = to_value(&vec![42.0f64, 1.5]).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![Value::from(42), Value::from(1.5)])
        );
    }
}
