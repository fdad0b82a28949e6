/// Monotonic animation time, in ticks since the last restart.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimeCounter(u64);

impl TimeCounter {
    #[inline]
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Advances by one tick and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> u64 {
        self.0 = self.0.saturating_add(1);
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_reset() {
        let mut t = TimeCounter::new();
        assert_eq!(t.advance(), 1);
        assert_eq!(t.advance(), 2);
        t.reset();
        assert_eq!(t.get(), 0);
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        let mut t = TimeCounter(u64::MAX);
        assert_eq!(t.advance(), u64::MAX);
    }
}
