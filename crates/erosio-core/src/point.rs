use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A 2D sample point, the identity of a stream node.
///
/// Equality and hashing go through the raw coordinate bits so that `Point`
/// can key hash maps coherently (`-0.0` and `0.0` are distinct, NaN equals
/// itself — though no finite-input pipeline ever produces one).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Squared Euclidean distance to `other`.
    #[inline]
    pub fn distance_sq(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.x.to_bits());
        state.write_u64(self.y.to_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn equal_coordinates_hash_equal() {
        let mut set = HashSet::new();
        set.insert(Point::new(1.5, -2.25));
        assert!(set.contains(&Point::new(1.5, -2.25)));
        assert!(!set.contains(&Point::new(1.5, 2.25)));
    }
}
