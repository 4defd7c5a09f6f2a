//! Ring-buffer index arithmetic shared by the PIT and content store.
//!
//! Both tables back their bucket arena with a flat array sized
//! `max_elements + 1`: one slot is always left empty so `top == bottom`
//! unambiguously means "empty" and never collides with "full". This is
//! the same convention `original_source/src/lib/pit.c` and `cs.c` use.

pub fn is_empty(top: usize, bottom: usize) -> bool {
    top == bottom
}

pub fn is_full(top: usize, bottom: usize, capacity: usize) -> bool {
    advance(top, capacity) == bottom
}

pub fn occupancy(top: usize, bottom: usize, capacity: usize) -> usize {
    (top + capacity - bottom) % capacity
}

pub fn advance(idx: usize, capacity: usize) -> usize {
    (idx + 1) % capacity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_and_empty_are_distinguishable() {
        let cap = 4; // max_elements = 3
        assert!(is_empty(0, 0));
        assert!(!is_full(0, 0, cap));
        assert!(is_full(3, 0, cap));
        assert_eq!(occupancy(3, 0, cap), 3);
    }

    #[test]
    fn advance_wraps() {
        assert_eq!(advance(3, 4), 0);
    }
}
