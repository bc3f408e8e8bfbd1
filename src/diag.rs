//! Diagnostic notation rendering (RFC 8949 §8 with extensions).
//!
//! Output is deterministic given the value and registry, and is meant for
//! humans; it is not designed to be parsed back.

use crate::registry::{with_tags, TagRegistry};
use crate::value::Value;

/// Render a value in single-line diagnostic notation using the process-wide
/// tag registry.
pub fn diagnostic(value: &Value) -> String {
    with_tags(|tags| diagnostic_with(value, tags, false))
}

/// Render a value in multi-line diagnostic notation using the process-wide
/// tag registry.
pub fn diagnostic_pretty(value: &Value) -> String {
    with_tags(|tags| diagnostic_with(value, tags, true))
}

/// Render a value in diagnostic notation against an explicit registry.
pub fn diagnostic_with(value: &Value, tags: &TagRegistry, pretty: bool) -> String {
    let mut out = String::new();
    render(value, tags, pretty, 0, &mut out);
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn render(value: &Value, tags: &TagRegistry, pretty: bool, level: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Boolean(true) => out.push_str("true"),
        Value::Boolean(false) => out.push_str("false"),
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Float(v) => render_float(*v, out),
        Value::Bytes(v) => {
            out.push_str("h'");
            out.push_str(&hex::encode(v));
            out.push('\'');
        }
        Value::Text(v) => render_text(v, out),
        Value::Array(v) => {
            if v.is_empty() {
                out.push_str("[]");
            } else if pretty {
                out.push_str("[\n");
                for (i, item) in v.iter().enumerate() {
                    indent(out, level + 1);
                    render(item, tags, pretty, level + 1, out);
                    if i + 1 < v.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                indent(out, level);
                out.push(']');
            } else {
                out.push('[');
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    render(item, tags, pretty, level, out);
                }
                out.push(']');
            }
        }
        Value::Map(m) => {
            if m.is_empty() {
                out.push_str("{}");
            } else if pretty {
                out.push_str("{\n");
                let len = m.len();
                for (i, (key, val)) in m.iter().enumerate() {
                    indent(out, level + 1);
                    render(key, tags, pretty, level + 1, out);
                    out.push_str(": ");
                    render(val, tags, pretty, level + 1, out);
                    if i + 1 < len {
                        out.push(',');
                    }
                    out.push('\n');
                }
                indent(out, level);
                out.push('}');
            } else {
                out.push('{');
                for (i, (key, val)) in m.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    render(key, tags, pretty, level, out);
                    out.push_str(": ");
                    render(val, tags, pretty, level, out);
                }
                out.push('}');
            }
        }
        Value::Tagged(tag, payload) => {
            out.push_str(&tags.label(*tag));
            out.push('(');
            match tags.summarize(*tag, payload) {
                Some(summary) => out.push_str(&summary),
                None => render(payload, tags, pretty, level, out),
            }
            out.push(')');
        }
    }
}

fn render_float(v: f64, out: &mut String) {
    if v.is_nan() {
        out.push_str("NaN");
    } else if v == f64::INFINITY {
        out.push_str("Infinity");
    } else if v == f64::NEG_INFINITY {
        out.push_str("-Infinity");
    } else {
        out.push_str(&v.to_string());
    }
}

fn render_text(v: &str, out: &mut String) {
    out.push('"');
    for c in v.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::CborMap;

    #[test]
    fn flat() {
        assert_eq!(diagnostic(&Value::Null), "null");
        assert_eq!(diagnostic(&Value::from(true)), "true");
        assert_eq!(diagnostic(&Value::from(-42)), "-42");
        assert_eq!(diagnostic(&Value::from(1.5)), "1.5");
        assert_eq!(diagnostic(&Value::from(f64::NAN)), "NaN");
        assert_eq!(diagnostic(&Value::from(f64::NEG_INFINITY)), "-Infinity");
        assert_eq!(
            diagnostic(&Value::from(vec![0x00u8, 0x11, 0x22, 0x33])),
            "h'00112233'"
        );
        assert_eq!(diagnostic(&Value::from("say \"hi\"")), "\"say \\\"hi\\\"\"");
        assert_eq!(
            diagnostic(&Value::Array(vec![
                Value::from(1),
                Value::from(2),
                Value::from(3)
            ])),
            "[1, 2, 3]"
        );

        let mut map = CborMap::new();
        map.insert(1, "one");
        map.insert(2, "two");
        assert_eq!(diagnostic(&Value::Map(map)), "{1: \"one\", 2: \"two\"}");
    }

    #[test]
    fn tags_by_name_and_number() {
        assert_eq!(diagnostic(&Value::tagged(1, "x")), "date(\"x\")");
        assert_eq!(diagnostic(&Value::tagged(77, 5)), "77(5)");
    }

    #[test]
    fn summarizer_replaces_rendering() {
        let mut tags = TagRegistry::new();
        tags.insert(100, "thing");
        tags.set_summarizer(100, |v| format!("#{}", v.as_i64().unwrap_or(-1)));
        assert_eq!(
            diagnostic_with(&Value::tagged(100, 7), &tags, false),
            "thing(#7)"
        );
    }

    #[test]
    fn pretty() {
        let mut map = CborMap::new();
        map.insert(1, Value::Array(vec![Value::from(2), Value::from(3)]));
        map.insert("b", "c");
        let rendered = diagnostic_pretty(&Value::Map(map));
        assert_eq!(
            rendered,
            "{\n  1: [\n    2,\n    3\n  ],\n  \"b\": \"c\"\n}"
        );
    }

    #[test]
    fn empty_containers() {
        assert_eq!(diagnostic_pretty(&Value::Array(vec![])), "[]");
        assert_eq!(diagnostic_pretty(&Value::Map(CborMap::new())), "{}");
    }
}
