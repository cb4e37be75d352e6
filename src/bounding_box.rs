/// An inclusive axis-aligned integer box in schematic (absolute) space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min: (i32, i32, i32),
    pub max: (i32, i32, i32),
}

impl BoundingBox {
    pub fn new(min: (i32, i32, i32), max: (i32, i32, i32)) -> Self {
        BoundingBox {
            min: (min.0.min(max.0), min.1.min(max.1), min.2.min(max.2)),
            max: (min.0.max(max.0), min.1.max(max.1), min.2.max(max.2)),
        }
    }

    /// A region's `size` may be negative on any axis, meaning the region
    /// extends in the negative direction from `position`. The resulting
    /// box is always normalized so `min <= max`.
    pub fn from_position_and_size(position: (i32, i32, i32), size: (i32, i32, i32)) -> Self {
        let corner = |p: i32, s: i32| -> (i32, i32) {
            if s >= 0 {
                (p, p + s - 1)
            } else {
                (p + s + 1, p)
            }
        };
        let (min_x, max_x) = corner(position.0, size.0);
        let (min_y, max_y) = corner(position.1, size.1);
        let (min_z, max_z) = corner(position.2, size.2);
        BoundingBox {
            min: (min_x, min_y, min_z),
            max: (max_x, max_y, max_z),
        }
    }

    pub fn get_dimensions(&self) -> (i32, i32, i32) {
        (
            self.max.0 - self.min.0 + 1,
            self.max.1 - self.min.1 + 1,
            self.max.2 - self.min.2 + 1,
        )
    }

    pub fn volume(&self) -> i64 {
        let (w, h, l) = self.get_dimensions();
        w as i64 * h as i64 * l as i64
    }

    pub fn contains(&self, pos: (i32, i32, i32)) -> bool {
        pos.0 >= self.min.0
            && pos.0 <= self.max.0
            && pos.1 >= self.min.1
            && pos.1 <= self.max.1
            && pos.2 >= self.min.2
            && pos.2 <= self.max.2
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (
                self.min.0.min(other.min.0),
                self.min.1.min(other.min.1),
                self.min.2.min(other.min.2),
            ),
            (
                self.max.0.max(other.max.0),
                self.max.1.max(other.max.1),
                self.max.2.max(other.max.2),
            ),
        )
    }
}
