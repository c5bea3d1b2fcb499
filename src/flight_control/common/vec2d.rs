use num::traits::{Num, NumCast, real::Real};
use std::ops::{Add, Mul, Neg, Sub};

/// A 2D vector generic over any numeric type.
///
/// Within this crate the vector lives in a local east/north plane measured in metres:
/// `x` points east, `y` points north.
///
/// # Type Parameters
/// * `T` - The functionality for the vector depends on traits implemented by `T`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct Vec2D<T> {
    /// The x-component (east) of the vector.
    x: T,
    /// The y-component (north) of the vector.
    y: T,
}

impl<T> Vec2D<T>
where T: Real + NumCast
{
    /// Computes the magnitude (absolute value) of the vector.
    ///
    /// # Returns
    /// The magnitude of the vector as a scalar of type `T`.
    pub fn abs(&self) -> T { (self.x.powi(2) + self.y.powi(2)).sqrt() }

    /// Creates a vector pointing from the current vector (`self`) to another vector (`other`).
    ///
    /// # Arguments
    /// * `other` - The target vector.
    ///
    /// # Returns
    /// A new vector representing the direction from `self` to `other`.
    pub fn to(&self, other: &Vec2D<T>) -> Vec2D<T> { Vec2D::new(other.x - self.x, other.y - self.y) }

    /// Computes the Euclidean distance between the current vector and another vector.
    ///
    /// # Arguments
    /// * `other` - The other vector to compute the distance to.
    ///
    /// # Returns
    /// The Euclidean distance as a scalar of type `T`.
    pub fn euclid_distance(&self, other: &Self) -> T {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Creates a vector of the given length pointing along a compass direction.
    ///
    /// # Arguments
    /// * `bearing_deg` - The compass bearing in degrees (0 = north, 90 = east).
    /// * `length` - The magnitude of the resulting vector.
    pub fn from_bearing(bearing_deg: T, length: T) -> Self {
        let rad = bearing_deg.to_radians();
        Self::new(rad.sin() * length, rad.cos() * length)
    }

    /// Compass bearing in degrees within `[0, 360)` of this vector.
    pub fn bearing(&self) -> T {
        let full = T::from(360.0).unwrap_or_else(T::zero);
        let deg = self.x.atan2(self.y).to_degrees();
        if deg < T::zero() { deg + full } else { deg }
    }

    /// Shortest distance from `self` to the segment between `a` and `b`.
    pub fn distance_to_segment(&self, a: &Self, b: &Self) -> T {
        let ab = a.to(b);
        let len_sq = ab.abs_sq();
        if len_sq.is_zero() {
            return self.euclid_distance(a);
        }
        let t = (a.to(self).dot(ab) / len_sq).max(T::zero()).min(T::one());
        self.euclid_distance(&(*a + ab * t))
    }
}

impl<T: Copy> Vec2D<T> {
    /// Creates a new vector with the given x and y components.
    pub const fn new(x: T, y: T) -> Self { Self { x, y } }

    /// Returns the x-component (east) of the vector.
    pub const fn x(&self) -> T { self.x }

    /// Returns the y-component (north) of the vector.
    pub const fn y(&self) -> T { self.y }
}

impl<T: Num + NumCast + Copy> Vec2D<T> {
    /// Computes the dot product of the current vector with another vector.
    ///
    /// ```text
    /// dot_product = (x1 * x2) + (y1 * y2)
    /// ```
    pub fn dot(self, other: Vec2D<T>) -> T { self.x * other.x + self.y * other.y }

    /// Computes the scalar cross product (perp-dot product) with another vector.
    ///
    /// ```text
    /// cross = (x1 * y2) - (y1 * x2)
    /// ```
    pub fn cross(self, other: Vec2D<T>) -> T { self.x * other.y - self.y * other.x }

    /// Squared magnitude of the vector.
    pub fn abs_sq(self) -> T { self.dot(self) }

    /// Creates a zero vector (x = 0, y = 0).
    pub fn zero() -> Self { Self::new(T::zero(), T::zero()) }
}

impl<T: Num + Copy> Add for Vec2D<T> {
    type Output = Vec2D<T>;

    fn add(self, rhs: Self) -> Self::Output { Self::new(self.x + rhs.x, self.y + rhs.y) }
}

impl<T: Num + Copy> Sub for Vec2D<T> {
    type Output = Vec2D<T>;

    fn sub(self, rhs: Self) -> Self::Output { Self::new(self.x - rhs.x, self.y - rhs.y) }
}

impl<T: Num + Copy> Mul<T> for Vec2D<T> {
    type Output = Vec2D<T>;

    fn mul(self, rhs: T) -> Self::Output { Self::new(self.x * rhs, self.y * rhs) }
}

impl<T: Num + Copy + Neg<Output = T>> Neg for Vec2D<T> {
    type Output = Vec2D<T>;

    fn neg(self) -> Self::Output { Self::new(-self.x, -self.y) }
}
