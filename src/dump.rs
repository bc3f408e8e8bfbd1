//! Annotated hex dump rendering.
//!
//! Each line pairs one CBOR head or primitive payload with a tree-indented
//! description of what those bytes are, e.g.
//!
//! ```text
//! 83        # array(3)
//!    01     #   unsigned(1)
//! ```

use crate::element::{serialize_elem, Element};
use crate::integer;
use crate::registry::{with_tags, TagRegistry};
use crate::value::Value;

/// Render an annotated hex dump of a value's canonical encoding, resolving
/// tag names through the process-wide registry.
pub fn hex_dump(value: &Value) -> String {
    with_tags(|tags| hex_dump_with(value, tags))
}

/// Render an annotated hex dump against an explicit registry.
pub fn hex_dump_with(value: &Value, tags: &TagRegistry) -> String {
    let mut rows = Vec::new();
    dump_rows(value, tags, 0, &mut rows);
    let width = rows.iter().map(|r| r.hex.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.hex);
        for _ in row.hex.len()..width {
            out.push(' ');
        }
        out.push_str("  # ");
        for _ in 0..row.depth {
            out.push_str("  ");
        }
        out.push_str(&row.desc);
        out.push('\n');
    }
    out
}

struct Row {
    hex: String,
    depth: usize,
    desc: String,
}

fn head_hex(elem: Element) -> String {
    let mut buf = Vec::new();
    serialize_elem(&mut buf, elem);
    hex::encode(buf)
}

fn dump_rows(value: &Value, tags: &TagRegistry, depth: usize, rows: &mut Vec<Row>) {
    match value {
        Value::Null => rows.push(Row {
            hex: head_hex(Element::Null),
            depth,
            desc: "null".to_string(),
        }),
        Value::Boolean(v) => rows.push(Row {
            hex: head_hex(Element::Bool(*v)),
            depth,
            desc: v.to_string(),
        }),
        Value::Integer(n) => {
            let elem = match integer::get_int_internal(n) {
                integer::IntPriv::PosInt(v) => Element::Unsigned(v),
                integer::IntPriv::NegInt(v) => Element::Negative(v),
            };
            let name = if n.is_negative() { "negative" } else { "unsigned" };
            rows.push(Row {
                hex: head_hex(elem),
                depth,
                desc: format!("{}({})", name, n),
            });
        }
        Value::Float(v) => rows.push(Row {
            hex: head_hex(Element::Float(*v)),
            depth,
            desc: format!("float({})", v),
        }),
        Value::Bytes(v) => {
            let mut full = Vec::new();
            serialize_elem(&mut full, Element::Bytes(v));
            let head_len = full.len() - v.len();
            rows.push(Row {
                hex: hex::encode(&full[..head_len]),
                depth,
                desc: format!("bytes({})", v.len()),
            });
            for chunk in v.chunks(16) {
                rows.push(Row {
                    hex: hex::encode(chunk),
                    depth: depth + 1,
                    desc: String::new(),
                });
            }
        }
        Value::Text(v) => {
            let mut full = Vec::new();
            serialize_elem(&mut full, Element::Text(v));
            let head_len = full.len() - v.len();
            rows.push(Row {
                hex: hex::encode(&full[..head_len]),
                depth,
                desc: format!("text({})", v.len()),
            });
            for chunk in v.as_bytes().chunks(16) {
                rows.push(Row {
                    hex: hex::encode(chunk),
                    depth: depth + 1,
                    desc: format!("\"{}\"", String::from_utf8_lossy(chunk)),
                });
            }
        }
        Value::Array(v) => {
            rows.push(Row {
                hex: head_hex(Element::Array(v.len())),
                depth,
                desc: format!("array({})", v.len()),
            });
            for item in v {
                dump_rows(item, tags, depth + 1, rows);
            }
        }
        Value::Map(m) => {
            rows.push(Row {
                hex: head_hex(Element::Map(m.len())),
                depth,
                desc: format!("map({})", m.len()),
            });
            for (key, val) in m.iter() {
                dump_rows(key, tags, depth + 1, rows);
                dump_rows(val, tags, depth + 2, rows);
            }
        }
        Value::Tagged(tag, payload) => {
            let desc = match tags.name(*tag) {
                Some(name) => format!("tag({})   {}", tag, name),
                None => format!("tag({})", tag),
            };
            rows.push(Row {
                hex: head_hex(Element::Tag(*tag)),
                depth,
                desc,
            });
            dump_rows(payload, tags, depth + 1, rows);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::decode_value;

    // The concatenated hex column must always reproduce the canonical encoding
    fn check_bytes(value: &Value) {
        let dump = hex_dump(value);
        let mut hex_bytes = String::new();
        for line in dump.lines() {
            hex_bytes.push_str(line.split_whitespace().next().unwrap_or(""));
        }
        assert_eq!(hex_bytes, hex::encode(value.to_vec()), "dump:\n{}", dump);
    }

    #[test]
    fn bytes_reassemble() {
        check_bytes(&Value::from(24));
        check_bytes(&Value::from(-100));
        check_bytes(&Value::from(1.5));
        check_bytes(&Value::from("Hello, world, this is more than sixteen bytes"));
        check_bytes(&Value::from(vec![0u8; 40]));
        let value =
            decode_value(&hex::decode("a80a011864022003617a046261610581186406812007f408").unwrap())
                .unwrap();
        check_bytes(&value);
        check_bytes(&Value::tagged(200, Value::tagged(24, "leaf")));
    }

    #[test]
    fn annotations() {
        let dump = hex_dump(&Value::Array(vec![Value::from(1), Value::from("a")]));
        let lines: Vec<&str> = dump.lines().collect();
        assert!(lines[0].contains("array(2)"));
        assert!(lines[1].contains("unsigned(1)"));
        assert!(lines[2].contains("text(1)"));

        let dump = hex_dump(&Value::tagged(200, 1));
        assert!(dump.lines().next().unwrap().contains("envelope"));
    }
}
