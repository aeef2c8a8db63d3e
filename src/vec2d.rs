use std::ops::{Add, Mul, Neg, Sub};

/// Immutable 2D vector in map units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2d {
    pub x: f64,
    pub y: f64,
}

impl Vec2d {
    pub const ZERO: Vec2d = Vec2d { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians (counter-clockwise from +X).
    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    #[inline]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    #[inline]
    pub fn dot(self, other: Vec2d) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Returns the zero vector unchanged.
    #[inline]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 { self } else { self * (1.0 / len) }
    }

    /// Right-hand perpendicular: (0, 1) becomes (1, 0).
    #[inline]
    pub fn perp(self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// Counter-clockwise rotation by `theta` radians.
    #[inline]
    pub fn rotate(self, theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2d {
    type Output = Vec2d;

    #[inline]
    fn add(self, rhs: Vec2d) -> Vec2d {
        Vec2d::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2d {
    type Output = Vec2d;

    #[inline]
    fn sub(self, rhs: Vec2d) -> Vec2d {
        Vec2d::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2d {
    type Output = Vec2d;

    #[inline]
    fn mul(self, k: f64) -> Vec2d {
        Vec2d::new(self.x * k, self.y * k)
    }
}

impl Neg for Vec2d {
    type Output = Vec2d;

    #[inline]
    fn neg(self) -> Vec2d {
        Vec2d::new(-self.x, -self.y)
    }
}
