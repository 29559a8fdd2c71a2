use crate::error::{Error, Result};

/// Which kind of container an open nesting level belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    Array,
    Object,
}

/// Stack of containers entered but not yet closed while walking a buffer.
///
/// Skipping walks nested containers with this stack instead of recursing. The depth limit is
/// checked on every push.
#[derive(Clone, Debug)]
pub struct DepthTracker {
    tracking: Vec<Frame>,
    max_depth: usize,
}

impl DepthTracker {
    /// Create a new depth tracker
    pub fn new(max_depth: usize) -> Self {
        Self {
            tracking: Vec::new(),
            max_depth,
        }
    }

    /// Enter a container, failing if that goes past the depth limit.
    pub fn push(&mut self, frame: Frame) -> Result<()> {
        self.tracking.push(frame);
        if self.tracking.len() > self.max_depth {
            return Err(Error::ParseLimit(format!(
                "Depth limit of {} exceeded",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Leave the innermost container.
    pub fn pop(&mut self) -> Option<Frame> {
        self.tracking.pop()
    }

    pub fn top(&self) -> Option<Frame> {
        self.tracking.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.tracking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracking.is_empty()
    }
}

/// Fails if a container opened at `depth` would go past `max_depth`.
pub fn check_depth(depth: usize, max_depth: usize) -> Result<()> {
    if depth > max_depth {
        Err(Error::ParseLimit(format!(
            "Depth limit of {} exceeded",
            max_depth
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn limit() {
        let mut tracker = DepthTracker::new(2);
        tracker.push(Frame::Array).unwrap();
        tracker.push(Frame::Object).unwrap();
        assert!(tracker.push(Frame::Array).is_err());
        assert_eq!(tracker.pop(), Some(Frame::Array));
        assert_eq!(tracker.top(), Some(Frame::Object));
        assert_eq!(tracker.depth(), 2);
    }

    #[test]
    fn check() {
        assert!(check_depth(3, 3).is_ok());
        assert!(check_depth(4, 3).is_err());
    }
}
