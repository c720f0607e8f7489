#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All values are logical pixels. Client coordinates are relative to the
//! viewport; page coordinates add the window scroll offset.

use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point or a displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Apply `f` to both components.
    #[inline]
    pub fn map(self, f: impl Fn(f32) -> f32) -> Point {
        Point::new(f(self.x), f(self.y))
    }

    #[inline]
    pub fn is_origin(self) -> bool {
        self == Self::ORIGIN
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// An axis-aligned rectangle. Right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub const fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub const fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Translate by an offset.
    #[inline]
    pub fn shift(&self, by: Point) -> Rect {
        Rect::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }

    /// Grow outwards by the given spacing.
    pub fn expand(&self, spacing: Spacing) -> Rect {
        Rect::new(
            self.x - spacing.left,
            self.y - spacing.top,
            self.width + spacing.horizontal_sum(),
            self.height + spacing.vertical_sum(),
        )
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }
}

/// Margins around a border box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spacing {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Spacing {
    pub const ZERO: Self = Self::all(0.0);

    pub const fn all(val: f32) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    #[inline]
    pub fn horizontal_sum(&self) -> f32 {
        self.left + self.right
    }

    #[inline]
    pub fn vertical_sum(&self) -> f32 {
        self.top + self.bottom
    }
}

/// A measured border box plus the margin that separates it from siblings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxModel {
    pub border_box: Rect,
    pub margin: Spacing,
}

impl BoxModel {
    pub const fn new(border_box: Rect, margin: Spacing) -> Self {
        Self { border_box, margin }
    }

    /// Box without margins.
    pub const fn from_rect(border_box: Rect) -> Self {
        Self::new(border_box, Spacing::ZERO)
    }

    /// The border box grown by its margin.
    pub fn margin_box(&self) -> Rect {
        self.border_box.expand(self.margin)
    }

    pub fn shift(&self, by: Point) -> BoxModel {
        BoxModel::new(self.border_box.shift(by), self.margin)
    }
}

/// The direction a droppable lays out its items along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    /// Component of `point` along this axis.
    #[inline]
    pub fn main(self, point: Point) -> f32 {
        match self {
            Self::Vertical => point.y,
            Self::Horizontal => point.x,
        }
    }

    /// Component of `point` across this axis.
    #[inline]
    pub fn cross(self, point: Point) -> f32 {
        match self {
            Self::Vertical => point.x,
            Self::Horizontal => point.y,
        }
    }

    /// Build a point from main/cross components.
    #[inline]
    pub fn point(self, main: f32, cross: f32) -> Point {
        match self {
            Self::Vertical => Point::new(cross, main),
            Self::Horizontal => Point::new(main, cross),
        }
    }

    #[inline]
    pub fn start(self, rect: &Rect) -> f32 {
        match self {
            Self::Vertical => rect.top(),
            Self::Horizontal => rect.left(),
        }
    }

    #[inline]
    pub fn end(self, rect: &Rect) -> f32 {
        match self {
            Self::Vertical => rect.bottom(),
            Self::Horizontal => rect.right(),
        }
    }

    #[inline]
    pub fn size(self, rect: &Rect) -> f32 {
        match self {
            Self::Vertical => rect.height,
            Self::Horizontal => rect.width,
        }
    }

    #[inline]
    pub fn cross_start(self, rect: &Rect) -> f32 {
        self.flip().start(rect)
    }

    #[inline]
    pub fn cross_end(self, rect: &Rect) -> f32 {
        self.flip().end(rect)
    }

    #[inline]
    pub const fn flip(self) -> Axis {
        match self {
            Self::Vertical => Self::Horizontal,
            Self::Horizontal => Self::Vertical,
        }
    }
}
