use serde::Deserialize;
use serde::Serialize;

/// A byte range within a template string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    start: u32,
    length: u32,
}

impl Span {
    #[must_use]
    pub fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    #[must_use]
    pub fn from_parts(start: usize, length: usize) -> Self {
        let start_u32 = u32::try_from(start).unwrap_or(u32::MAX);
        let length_u32 = u32::try_from(length).unwrap_or(u32::MAX.saturating_sub(start_u32));
        Span::new(start_u32, length_u32)
    }

    /// Construct a span from integer bounds expressed as byte offsets.
    #[must_use]
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self::from_parts(start, end.saturating_sub(start))
    }

    #[must_use]
    pub fn start(self) -> u32 {
        self.start
    }

    #[must_use]
    pub fn start_usize(self) -> usize {
        self.start as usize
    }

    #[must_use]
    pub fn end(self) -> u32 {
        self.start.saturating_add(self.length)
    }

    #[must_use]
    pub fn end_usize(self) -> usize {
        self.end() as usize
    }

    #[must_use]
    pub fn length(self) -> u32 {
        self.length
    }

    #[must_use]
    pub fn length_usize(self) -> usize {
        self.length as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.length == 0
    }

    /// Shift the span right by `offset` bytes.
    #[must_use]
    pub fn shift(self, offset: u32) -> Self {
        Self::new(self.start.saturating_add(offset), self.length)
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn cover(self, other: Span) -> Self {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Self::new(start, end - start)
    }
}
