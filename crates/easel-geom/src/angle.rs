use std::cmp::Ordering;

use crate::num::{compare_frac, CoordExt};
use crate::point::Point;

/// The direction of a 2-D vector, compared as a position on the unit
/// circle.
///
/// Two values are equal iff they point the same way (cross product zero,
/// dot product positive); the length of the carrier vector is
/// irrelevant. The total order starts at the positive-x axis and sweeps
/// counter-clockwise.
///
/// Components are carried in the extension type so that squared
/// ("extended") angles produced while ray casting order exactly through
/// [`compare_frac`] without overflow; identity products use 128 bits.
#[derive(Debug, Clone, Copy)]
pub struct DirAngle {
    pub x: CoordExt,
    pub y: CoordExt,
}

impl DirAngle {
    pub const fn new(x: CoordExt, y: CoordExt) -> Self {
        DirAngle { x, y }
    }

    pub fn from_vector(v: Point) -> Self {
        DirAngle::new(v.x as CoordExt, v.y as CoordExt)
    }

    pub const fn angle_0() -> Self {
        DirAngle::new(1, 0)
    }
    pub const fn angle_90() -> Self {
        DirAngle::new(0, 1)
    }
    pub const fn angle_180() -> Self {
        DirAngle::new(-1, 0)
    }
    pub const fn angle_270() -> Self {
        DirAngle::new(0, -1)
    }

    /// Square both components, keeping their signs. Squared crossing
    /// candidates from the ray caster compare against squared range
    /// endpoints in the same coordinate system.
    pub fn extended(self) -> DirAngle {
        let v1 = self.x * self.x;
        let v2 = self.y * self.y;
        DirAngle::new(
            if self.x > 0 { v1 } else { -v1 },
            if self.y > 0 { v2 } else { -v2 },
        )
    }

    fn cross_i128(self, oth: DirAngle) -> i128 {
        self.x as i128 * oth.y as i128 - self.y as i128 * oth.x as i128
    }

    fn dot_i128(self, oth: DirAngle) -> i128 {
        self.x as i128 * oth.x as i128 + self.y as i128 * oth.y as i128
    }

    /// Strict counter-clockwise order from the positive-x axis.
    ///
    /// The half-plane of the y component decides first; the cardinal rows
    /// (`y == 0`) break ties so that a range endpoint equal to a queried
    /// angle is always found contained. Within a half-plane, `x/y` is a
    /// strictly decreasing function of the sweep, compared exactly.
    fn sweeps_before(&self, oth: &DirAngle) -> bool {
        if self.y >= 0 && oth.y < 0 {
            true
        } else if self.y < 0 && oth.y >= 0 {
            false
        } else if self.y == 0 && oth.y == 0 {
            self.x >= 0 && oth.x < 0
        } else if self.y == 0 && oth.y > 0 {
            self.x >= 0
        } else if self.y > 0 && oth.y == 0 {
            oth.x < 0
        } else {
            compare_frac(oth.x, oth.y, self.x, self.y)
        }
    }
}

impl PartialEq for DirAngle {
    fn eq(&self, oth: &DirAngle) -> bool {
        (self.x == oth.x && self.y == oth.y)
            || (self.cross_i128(*oth) == 0 && self.dot_i128(*oth) > 0)
    }
}

impl Eq for DirAngle {}

impl PartialOrd for DirAngle {
    fn partial_cmp(&self, oth: &DirAngle) -> Option<Ordering> {
        Some(self.cmp(oth))
    }
}

impl Ord for DirAngle {
    fn cmp(&self, oth: &DirAngle) -> Ordering {
        if self == oth {
            Ordering::Equal
        } else if self.sweeps_before(oth) {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

/// An angular interval swept from `from` to `to`, clockwise or
/// counter-clockwise. `from == to` denotes the full circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleRange {
    pub from: DirAngle,
    pub to: DirAngle,
    pub ccw: bool,
}

impl AngleRange {
    pub const fn new(from: DirAngle, to: DirAngle, ccw: bool) -> Self {
        AngleRange { from, to, ccw }
    }

    /// Is `angle` on the swept arc? Both endpoints are contained.
    pub fn contains(&self, angle: &DirAngle) -> bool {
        if self.from == self.to {
            true
        } else if self.from < self.to {
            if self.ccw {
                self.from <= *angle && *angle <= self.to
            } else {
                *angle >= self.to || *angle <= self.from
            }
        } else if self.ccw {
            *angle >= self.from || *angle <= self.to
        } else {
            self.to <= *angle && *angle <= self.from
        }
    }

    pub fn extended(&self) -> AngleRange {
        AngleRange::new(self.from.extended(), self.to.extended(), self.ccw)
    }
}
