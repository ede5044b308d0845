//! Depth-keyed stack of open folders
//!
//! Both the parser (which folder does this line belong to?) and the same-pass
//! flattener (which order is this item's parent?) answer the same question:
//! the nearest open folder strictly shallower than the current entry. This
//! stack is that question, without recursion.

/// Stack of `(value, depth)` pairs with strictly increasing depths.
#[derive(Debug, Clone)]
pub struct DepthStack<T> {
    entries: Vec<(T, usize)>,
}

impl<T> Default for DepthStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DepthStack<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Pop the top entry if it sits at `depth` or deeper.
    ///
    /// Equal depth means sibling, so it is closed too.
    pub fn pop_at_or_below(&mut self, depth: usize) -> Option<(T, usize)> {
        match self.entries.last() {
            Some((_, top)) if *top >= depth => self.entries.pop(),
            _ => None,
        }
    }

    /// Close every entry at `depth` or deeper, discarding them.
    pub fn unwind_to(&mut self, depth: usize) {
        while self.pop_at_or_below(depth).is_some() {}
    }

    pub fn push(&mut self, value: T, depth: usize) {
        debug_assert!(
            self.entries.last().map_or(true, |(_, top)| *top < depth),
            "depth stack must stay strictly increasing"
        );
        self.entries.push((value, depth));
    }

    pub fn top(&self) -> Option<(&T, usize)> {
        self.entries.last().map(|(value, depth)| (value, *depth))
    }

    pub fn top_mut(&mut self) -> Option<&mut T> {
        self.entries.last_mut().map(|(value, _)| value)
    }

    pub fn pop(&mut self) -> Option<(T, usize)> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
