//! Last/current snapshot pairs per metric timeline.
//!
//! A pair starts uninitialized, is seeded by its first observation and then
//! shifts on every tick: the old current becomes the baseline and the fresh
//! reading becomes the new current.

/// Generation state of one timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPair<T> {
    Uninitialized,
    Seeded { last: T },
    Steady { last: T, current: T, ticks: u64 },
}

impl<T: Clone> GenerationPair<T> {
    pub fn new() -> Self {
        GenerationPair::Uninitialized
    }

    /// Records a fresh snapshot.
    pub fn observe(&mut self, fresh: T) {
        *self = match std::mem::take(self) {
            GenerationPair::Uninitialized => GenerationPair::Seeded { last: fresh },
            GenerationPair::Seeded { last } => GenerationPair::Steady {
                last,
                current: fresh,
                ticks: 1,
            },
            GenerationPair::Steady { current, ticks, .. } => GenerationPair::Steady {
                last: current,
                current: fresh,
                ticks: ticks + 1,
            },
        };
    }

    /// Baseline snapshot, if any.
    pub fn last(&self) -> Option<&T> {
        match self {
            GenerationPair::Uninitialized => None,
            GenerationPair::Seeded { last } | GenerationPair::Steady { last, .. } => Some(last),
        }
    }

    /// Most recent snapshot; the seed until a second observation arrives.
    pub fn latest(&self) -> Option<&T> {
        match self {
            GenerationPair::Uninitialized => None,
            GenerationPair::Seeded { last } => Some(last),
            GenerationPair::Steady { current, .. } => Some(current),
        }
    }

    /// Both snapshots, only once the pair is steady.
    pub fn pair(&self) -> Option<(&T, &T)> {
        match self {
            GenerationPair::Steady { last, current, .. } => Some((last, current)),
            _ => None,
        }
    }

    /// Applies `f` to `(last, current)`; `None` until the pair is steady.
    pub fn delta<R>(&self, f: impl FnOnce(&T, &T) -> R) -> Option<R> {
        self.pair().map(|(last, current)| f(last, current))
    }

    /// Number of shifts since seeding.
    pub fn ticks(&self) -> u64 {
        match self {
            GenerationPair::Steady { ticks, .. } => *ticks,
            _ => 0,
        }
    }

    pub fn is_steady(&self) -> bool {
        matches!(self, GenerationPair::Steady { .. })
    }
}

impl<T> Default for GenerationPair<T> {
    fn default() -> Self {
        GenerationPair::Uninitialized
    }
}
