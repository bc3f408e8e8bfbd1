use crate::{
    element::Element,
    error::{Error, Result},
    MAX_DEPTH,
};

#[derive(Clone, Debug, Default)]
pub struct DepthTracker {
    tracking: Vec<u64>,
}

impl DepthTracker {
    /// Create a new depth tracker
    pub fn new() -> Self {
        Self {
            tracking: Vec::new(),
        }
    }

    /// Update the depth tracker on each new element parsed or serialized.
    pub fn update_elem(&mut self, elem: &Element) -> Result<()> {
        // Subtract from count for next element
        if let Some(v) = self.tracking.last_mut() {
            *v -= 1;
        }

        // Increase nest depth if this is a nesting element
        match elem {
            Element::Map(len) => self.tracking.push(2 * (*len as u64)), // 2 elements per map item
            Element::Array(len) => self.tracking.push(*len as u64),
            Element::Tag(_) => self.tracking.push(1), // a tag defers exactly one child
            _ => (),
        }

        // Check to see if we hit the nesting limit
        if self.tracking.len() > MAX_DEPTH {
            return Err(Error::DepthLimit);
        }

        self.purge_zeros();
        Ok(())
    }

    /// Drop any depth tracking elements that have hit zero
    pub fn purge_zeros(&mut self) {
        loop {
            match self.tracking.last() {
                Some(v) if *v == 0 => {
                    self.tracking.pop();
                }
                _ => break,
            }
        }
    }
}
