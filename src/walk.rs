//! A cooperative depth-first visitor over CBOR values.
//!
//! The walker calls the visitor once per element, handing it the current
//! depth, the edge taken from the parent, and a caller-supplied state value.
//! The visitor returns the state its descendants should see, plus a flag that
//! skips descent into the element's children while continuing with siblings.

use crate::value::Value;

/// One step of a walk: either a plain value, or a map entry seen as a pair
/// before the walker visits the key and value individually.
#[derive(Clone, Copy, Debug)]
pub enum WalkElement<'a> {
    Single(&'a Value),
    KeyValue { key: &'a Value, value: &'a Value },
}

impl<'a> WalkElement<'a> {
    /// The underlying value for `Single` elements.
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            WalkElement::Single(v) => Some(v),
            WalkElement::KeyValue { .. } => None,
        }
    }
}

/// The edge the walker took from the parent element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// The root of the walk.
    None,
    /// Array element at this index.
    ArrayElement(usize),
    /// A map entry, visited as a pair.
    MapKeyValue,
    /// The key side of a map entry.
    MapKey,
    /// The value side of a map entry.
    MapValue,
    /// The payload of a tagged value.
    TaggedContent,
}

/// Walk a value depth-first, threading `state` down through descents.
///
/// The visitor signature is `(element, depth, incoming edge, state)` to
/// `(state for descendants, stop descent)`. Siblings receive clones of their
/// parent's outgoing state; the visitor cannot abort the whole walk directly,
/// but can record a flag in its own state and keep returning stop-descent.
pub fn walk<'a, S, F>(value: &'a Value, state: S, visit: &mut F)
where
    S: Clone,
    F: FnMut(&WalkElement<'a>, usize, Edge, S) -> (S, bool),
{
    walk_element(&WalkElement::Single(value), 0, Edge::None, state, visit);
}

fn walk_element<'a, S, F>(
    element: &WalkElement<'a>,
    depth: usize,
    edge: Edge,
    state: S,
    visit: &mut F,
) where
    S: Clone,
    F: FnMut(&WalkElement<'a>, usize, Edge, S) -> (S, bool),
{
    let (state, stop) = visit(element, depth, edge, state);
    if stop {
        return;
    }
    match *element {
        WalkElement::Single(value) => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    walk_element(
                        &WalkElement::Single(item),
                        depth + 1,
                        Edge::ArrayElement(i),
                        state.clone(),
                        visit,
                    );
                }
            }
            Value::Map(map) => {
                for (key, val) in map.iter() {
                    walk_element(
                        &WalkElement::KeyValue { key, value: val },
                        depth + 1,
                        Edge::MapKeyValue,
                        state.clone(),
                        visit,
                    );
                }
            }
            Value::Tagged(_, payload) => {
                walk_element(
                    &WalkElement::Single(payload),
                    depth + 1,
                    Edge::TaggedContent,
                    state,
                    visit,
                );
            }
            _ => (),
        },
        WalkElement::KeyValue { key, value } => {
            walk_element(
                &WalkElement::Single(key),
                depth + 1,
                Edge::MapKey,
                state.clone(),
                visit,
            );
            walk_element(
                &WalkElement::Single(value),
                depth + 1,
                Edge::MapValue,
                state,
                visit,
            );
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::CborMap;

    fn log_walk(value: &Value) -> Vec<(usize, Edge, String)> {
        let log = std::cell::RefCell::new(Vec::new());
        walk(value, (), &mut |elem, depth, edge, state| {
            let desc = match elem {
                WalkElement::Single(v) => format!("{}", v),
                WalkElement::KeyValue { key, value } => format!("{}: {}", key, value),
            };
            log.borrow_mut().push((depth, edge, desc));
            (state, false)
        });
        log.into_inner()
    }

    #[test]
    fn array_walk() {
        let value = Value::Array(vec![
            Value::from(1),
            Value::Array(vec![Value::from(2)]),
            Value::from(3),
        ]);
        let log = log_walk(&value);
        assert_eq!(
            log,
            vec![
                (0, Edge::None, "[1, [2], 3]".to_string()),
                (1, Edge::ArrayElement(0), "1".to_string()),
                (1, Edge::ArrayElement(1), "[2]".to_string()),
                (2, Edge::ArrayElement(0), "2".to_string()),
                (1, Edge::ArrayElement(2), "3".to_string()),
            ]
        );
    }

    #[test]
    fn map_walk_emits_pairs_then_sides() {
        let mut map = CborMap::new();
        map.insert(1, "a");
        let value = Value::Map(map);
        let log = log_walk(&value);
        assert_eq!(
            log,
            vec![
                (0, Edge::None, "{1: \"a\"}".to_string()),
                (1, Edge::MapKeyValue, "1: \"a\"".to_string()),
                (2, Edge::MapKey, "1".to_string()),
                (2, Edge::MapValue, "\"a\"".to_string()),
            ]
        );
    }

    #[test]
    fn tagged_walk() {
        let value = Value::tagged(7, "x");
        let log = log_walk(&value);
        assert_eq!(log[1], (1, Edge::TaggedContent, "\"x\"".to_string()));
    }

    #[test]
    fn stop_descent_skips_children_not_siblings() {
        let value = Value::Array(vec![
            Value::Array(vec![Value::from(1)]),
            Value::from(2),
        ]);
        let visited = std::cell::RefCell::new(Vec::new());
        walk(&value, (), &mut |elem, depth, _edge, state| {
            if let WalkElement::Single(v) = elem {
                visited.borrow_mut().push(format!("{}", v));
                // Skip descending into the inner array
                if depth == 1 && v.is_array() {
                    return (state, true);
                }
            }
            (state, false)
        });
        assert_eq!(visited.into_inner(), vec!["[[1], 2]", "[1]", "2"]);
    }

    #[test]
    fn whole_walk_abort_via_state() {
        // The visitor can't abort outright, but an "aborted" flag in its own
        // state plus stop-descent skips all remaining subtrees
        let value = Value::Array(vec![
            Value::from("stop here"),
            Value::Array(vec![Value::from(1), Value::from(2)]),
        ]);
        let seen = std::cell::RefCell::new(0usize);
        let aborted = std::cell::RefCell::new(false);
        walk(&value, (), &mut |elem, _depth, _edge, state| {
            if *aborted.borrow() {
                return (state, true);
            }
            *seen.borrow_mut() += 1;
            if let WalkElement::Single(Value::Text(t)) = elem {
                if t == "stop here" {
                    *aborted.borrow_mut() = true;
                }
            }
            (state, false)
        });
        // Root and the text leaf; the sibling array arrives but is pruned
        assert_eq!(seen.into_inner(), 2);
    }

    #[test]
    fn state_threads_down_descents() {
        // Count each element's ancestor-array depth through the state value
        let value = Value::Array(vec![Value::Array(vec![Value::from(5)])]);
        let deepest = std::cell::RefCell::new(0usize);
        walk(&value, 0usize, &mut |elem, _depth, _edge, state| {
            let state = match elem {
                WalkElement::Single(Value::Array(_)) => state + 1,
                _ => state,
            };
            *deepest.borrow_mut() = (*deepest.borrow()).max(state);
            (state, false)
        });
        assert_eq!(deepest.into_inner(), 2);
    }
}
