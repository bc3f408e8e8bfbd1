use crate::element::{Element, Parser};
use crate::error::{Error, Result};
use crate::integer::Integer;
use crate::map::CborMap;
use crate::value::Value;

/// Decode a single canonical CBOR value, consuming the entire input.
///
/// Decoding fails if the input isn't in canonical form. That is:
/// - All heads use the fewest bytes that hold their argument
/// - Floats use the narrowest exact width, and integral floats don't exist
/// - Strings are valid UTF-8 in Unicode NFC
/// - Map keys are unique and ordered by their encodings
/// - No indefinite-length items or reserved header bytes appear
pub fn decode_value(buf: &[u8]) -> Result<Value> {
    let mut parser = Parser::new(buf);
    let value = read_value(&mut parser)?;
    match parser.remaining() {
        0 => Ok(value),
        n => Err(Error::UnusedData(n)),
    }
}

fn next_element<'a>(parser: &mut Parser<'a>) -> Result<Element<'a>> {
    parser.next().unwrap_or(Err(Error::Underrun {
        step: "get next item",
        actual: 0,
        expected: 1,
    }))
}

pub(crate) fn read_value(parser: &mut Parser) -> Result<Value> {
    let elem = next_element(parser)?;
    read_rest(parser, elem)
}

fn read_rest(parser: &mut Parser, elem: Element) -> Result<Value> {
    Ok(match elem {
        Element::Unsigned(v) => Value::Integer(Integer::from(v)),
        Element::Negative(v) => Value::Integer(Integer::negative(v)),
        Element::Bytes(v) => Value::Bytes(v.to_vec()),
        Element::Text(v) => Value::Text(v.to_string()),
        Element::Bool(v) => Value::Boolean(v),
        Element::Null => Value::Null,
        // From<f64> renormalizes NaN payloads; everything else was already
        // checked canonical by the parser
        Element::Float(v) => Value::from(v),
        Element::Tag(tag) => Value::Tagged(tag, Box::new(read_value(parser)?)),
        Element::Array(len) => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(read_value(parser)?);
            }
            Value::Array(v)
        }
        Element::Map(len) => {
            let mut map = CborMap::new();
            for _ in 0..len {
                let key = read_value(parser)?;
                // Re-deriving the canonical encoding is exact because the
                // parser already proved the input canonical
                let key_bytes = key.to_vec();
                let value = read_value(parser)?;
                map.push_decoded(key_bytes, key, value)?;
            }
            Value::Map(map)
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn roundtrip(hex_str: &str) -> Value {
        let bytes = hex::decode(hex_str).unwrap();
        let value = decode_value(&bytes).unwrap();
        assert_eq!(value.to_vec(), bytes, "re-encode mismatch for {}", hex_str);
        value
    }

    #[test]
    fn spec_vectors() {
        assert_eq!(roundtrip("00"), Value::from(0));
        assert_eq!(roundtrip("17"), Value::from(23));
        assert_eq!(roundtrip("1818"), Value::from(24));
        assert_eq!(roundtrip("19ffff"), Value::from(65535));
        assert_eq!(roundtrip("20"), Value::from(-1));
        assert_eq!(roundtrip("387f"), Value::from(-128));
        assert_eq!(roundtrip("6548656c6c6f"), Value::from("Hello"));
        assert_eq!(
            roundtrip("4400112233"),
            Value::from(vec![0x00u8, 0x11, 0x22, 0x33])
        );
        assert_eq!(
            roundtrip("83010203"),
            Value::Array(vec![Value::from(1), Value::from(2), Value::from(3)])
        );
        assert_eq!(roundtrip("c16548656c6c6f"), Value::tagged(1, "Hello"));
        assert_eq!(roundtrip("f93e00"), Value::from(1.5));
        assert_eq!(roundtrip("fb3ff3333333333333"), Value::from(1.2));
        assert_eq!(roundtrip("182a"), Value::from(42));
        assert_eq!(roundtrip("f97c00"), Value::from(f64::INFINITY));

        let nan = roundtrip("f97e00");
        assert!(matches!(nan, Value::Float(v) if v.is_nan()));
    }

    #[test]
    fn spec_map_vector() {
        let value = roundtrip("a80a011864022003617a046261610581186406812007f408");
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 8);
        assert_eq!(map.get(&Value::from(10)), Some(&Value::from(1)));
        assert_eq!(map.get(&Value::from(100)), Some(&Value::from(2)));
        assert_eq!(map.get(&Value::from(-1)), Some(&Value::from(3)));
        assert_eq!(map.get(&Value::from("z")), Some(&Value::from(4)));
        assert_eq!(map.get(&Value::from("aa")), Some(&Value::from(5)));
        assert_eq!(
            map.get(&Value::Array(vec![Value::from(100)])),
            Some(&Value::from(6))
        );
        assert_eq!(
            map.get(&Value::Array(vec![Value::from(-1)])),
            Some(&Value::from(7))
        );
        assert_eq!(map.get(&Value::from(false)), Some(&Value::from(8)));
    }

    #[test]
    fn spec_rejections() {
        let cases: Vec<(&str, Error)> = vec![
            ("1817", Error::NonCanonicalNumeric),
            ("a2026141016142", Error::MisorderedMapKey),
            ("6365cc81", Error::NonCanonicalString),
            ("f97e01", Error::NonCanonicalNumeric),
            ("fb3ff8000000000000", Error::NonCanonicalNumeric),
            ("0001", Error::UnusedData(1)),
        ];
        for (hex_str, expected) in cases {
            let bytes = hex::decode(hex_str).unwrap();
            assert_eq!(decode_value(&bytes), Err(expected), "input {}", hex_str);
        }
    }

    #[test]
    fn duplicate_map_key() {
        // {1: "a", 1: "b"}
        let bytes = hex::decode("a2016161016162").unwrap();
        assert_eq!(decode_value(&bytes), Err(Error::DuplicateMapKey));
    }

    #[test]
    fn truncated_input() {
        assert!(matches!(decode_value(&[]), Err(Error::Underrun { .. })));
        assert!(matches!(
            decode_value(&[0x82, 0x01]),
            Err(Error::Underrun { .. })
        ));
        assert!(matches!(
            decode_value(&[0xc1]),
            Err(Error::Underrun { .. })
        ));
        assert!(matches!(
            decode_value(&[0xa1, 0x01]),
            Err(Error::Underrun { .. })
        ));
    }

    #[test]
    fn indefinite_rejected() {
        // Indefinite-length array [_ 1] and indefinite string
        assert_eq!(
            decode_value(&[0x9f, 0x01, 0xff]),
            Err(Error::UnsupportedHeaderValue(0x9f))
        );
        assert_eq!(
            decode_value(&[0x5f, 0x41, 0x00, 0xff]),
            Err(Error::UnsupportedHeaderValue(0x5f))
        );
    }

    #[test]
    fn canonicalisation_idempotent() {
        // encode(decode(encode(v))) == encode(v) over assorted values
        let values = vec![
            Value::Null,
            Value::from(true),
            Value::from(u64::MAX),
            Value::Integer(Integer::min_value()),
            Value::from(1.2),
            Value::from("héllo"),
            Value::Array(vec![Value::from(1), Value::from("two"), Value::Null]),
            Value::tagged(200, vec![0xaau8, 0xbb].as_slice()),
        ];
        for v in values {
            let first = v.to_vec();
            let second = decode_value(&first).unwrap().to_vec();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn nested_structures() {
        // {"a": [1, {2: h'00'}], "b": 1(["x"])}
        let mut inner = crate::map::CborMap::new();
        inner.insert(2, vec![0u8].as_slice());
        let mut outer = crate::map::CborMap::new();
        outer.insert("a", Value::Array(vec![Value::from(1), Value::Map(inner)]));
        outer.insert("b", Value::tagged(1, Value::Array(vec![Value::from("x")])));
        let value = Value::Map(outer);
        assert_eq!(decode_value(&value.to_vec()).unwrap(), value);
    }

    #[test]
    fn decode_depth_limit() {
        let mut enc = vec![0x81; crate::MAX_DEPTH + 4];
        enc.push(0x01);
        assert_eq!(decode_value(&enc), Err(Error::DepthLimit));

        // Tag chains count toward depth too
        let mut enc = vec![0xc1; crate::MAX_DEPTH + 4];
        enc.push(0x01);
        assert_eq!(decode_value(&enc), Err(Error::DepthLimit));
    }

    #[test]
    fn bulk_bytes_roundtrip() {
        use rand::prelude::*;
        let mut rng = rand::thread_rng();
        for len in [0usize, 1, 23, 24, 255, 256, 65535, 65536] {
            let mut data = vec![0u8; len];
            rng.fill_bytes(&mut data);
            let v = Value::from(data.clone());
            let decoded = decode_value(&v.to_vec()).unwrap();
            assert_eq!(decoded.as_bytes(), Some(&data[..]));
        }
    }
}
