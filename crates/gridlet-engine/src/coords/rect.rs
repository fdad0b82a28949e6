/// Axis-aligned pixel rectangle (top-left origin, half-open extent).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    #[inline]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// The rectangle covering a whole `width` × `height` surface.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(self) -> u64 {
        u64::from(self.x) + u64::from(self.w)
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(self) -> u64 {
        u64::from(self.y) + u64::from(self.h)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    #[inline]
    pub fn area(self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, px: u32, py: u32) -> bool {
        px >= self.x
            && py >= self.y
            && u64::from(px) < self.right()
            && u64::from(py) < self.bottom()
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());

        if x1 <= u64::from(x0) || y1 <= u64::from(y0) {
            None
        } else {
            // Both extents are bounded by an input's u32 width/height.
            Some(Rect::new(x0, y0, (x1 - u64::from(x0)) as u32, (y1 - u64::from(y0)) as u32))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: u32, y: u32, w: u32, h: u32) -> Rect { Rect::new(x, y, w, h) }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_interior_point() {
        assert!(r(0, 0, 10, 10).contains(5, 5));
    }

    #[test]
    fn contains_top_left_inclusive() {
        assert!(r(2, 3, 10, 10).contains(2, 3));
    }

    #[test]
    fn contains_bottom_right_exclusive() {
        assert!(!r(0, 0, 10, 10).contains(10, 10));
        assert!(r(0, 0, 10, 10).contains(9, 9));
    }

    // ── intersect ─────────────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        assert_eq!(r(0, 0, 10, 10).intersect(r(5, 5, 10, 10)), Some(r(5, 5, 5, 5)));
    }

    #[test]
    fn intersect_clips_to_surface() {
        let surface = Rect::from_size(400, 400);
        assert_eq!(surface.intersect(r(380, 390, 19, 19)), Some(r(380, 390, 19, 10)));
    }

    #[test]
    fn intersect_touching_edge_returns_none() {
        assert!(r(0, 0, 10, 10).intersect(r(10, 0, 10, 10)).is_none());
    }

    #[test]
    fn intersect_near_u32_max_does_not_overflow() {
        let far = r(u32::MAX - 1, u32::MAX - 1, u32::MAX, u32::MAX);
        assert!(Rect::from_size(100, 100).intersect(far).is_none());
    }

    // ── is_empty ──────────────────────────────────────────────────────────

    #[test]
    fn is_empty_zero_size() {
        assert!(r(0, 0, 0, 5).is_empty());
        assert!(r(0, 0, 5, 0).is_empty());
        assert!(!r(0, 0, 1, 1).is_empty());
    }
}
