//! Geometry and kinematics primitives shared by the agent models.
//!
//! # Collision model
//! The vehicle is an axis-aligned rectangle centred on its position, the
//! pedestrian a circle. The closest rectangle point to the circle centre is
//! found by clamping the relative offset to the half-extents on each axis;
//! the shapes touch iff that point lies within the circle radius.

use crate::types::Point2D;

/// Clamp `value` into the interval spanned by `a` and `b`, in either order.
pub fn clamp(value: f64, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point2D, b: Point2D) -> f64 {
    (a.to_vector() - b.to_vector()).norm()
}

/// Axis-aligned rectangle described by its centre and full extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub center: Point2D,
    /// Extent along the longitudinal axis
    pub length: f64,
    /// Extent along the horizontal axis
    pub width: f64,
}

/// Circle described by its centre and radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Point2D,
    pub radius: f64,
}

/// Point of `rect` closest to `p`.
pub fn closest_point_on_rect(rect: &Rect, p: Point2D) -> Point2D {
    let half_l = rect.length / 2.0;
    let half_w = rect.width / 2.0;
    Point2D::new(
        clamp(p.longit, rect.center.longit - half_l, rect.center.longit + half_l),
        clamp(p.hoz, rect.center.hoz - half_w, rect.center.hoz + half_w),
    )
}

/// True iff the circle touches or overlaps the rectangle.
pub fn rect_circle_collide(rect: &Rect, circle: &Circle) -> bool {
    let closest = closest_point_on_rect(rect, circle.center);
    distance(closest, circle.center) <= circle.radius
}

/// `n` evenly spaced points from `a` to `b`, both endpoints included.
///
/// `n == 1` yields just `a`; `n == 0` yields nothing.
pub fn linspace(a: Point2D, b: Point2D, n: usize) -> Vec<Point2D> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let last = (n - 1) as f64;
            (0..n).map(|i| a.lerp(b, i as f64 / last)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn car_at_origin() -> Rect {
        Rect {
            center: Point2D::new(0.0, 0.0),
            length: 4.0,
            width: 2.0,
        }
    }

    #[test]
    fn clamp_accepts_reversed_bounds() {
        assert_eq!(clamp(5.0, 3.0, 1.0), 3.0);
        assert_eq!(clamp(-5.0, 3.0, 1.0), 1.0);
        assert_eq!(clamp(2.0, 3.0, 1.0), 2.0);
    }

    #[test]
    fn distance_is_euclidean() {
        assert_abs_diff_eq!(
            distance(Point2D::new(0.0, 0.0), Point2D::new(3.0, 4.0)),
            5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn closest_point_inside_is_itself() {
        let p = Point2D::new(0.5, -0.25);
        assert_eq!(closest_point_on_rect(&car_at_origin(), p), p);
    }

    #[test]
    fn circle_touching_corner_collides() {
        // Corner at (2, 1); circle centre on the diagonal at exactly r away.
        let r = 0.5;
        let off = r / 2f64.sqrt();
        let touching = Circle {
            center: Point2D::new(2.0 + off, 1.0 + off),
            radius: r + 1e-12,
        };
        assert!(rect_circle_collide(&car_at_origin(), &touching));

        let clear = Circle {
            center: Point2D::new(2.0 + off + 1e-6, 1.0 + off + 1e-6),
            radius: r,
        };
        assert!(!rect_circle_collide(&car_at_origin(), &clear));
    }

    #[test]
    fn circle_on_edge_boundary() {
        // Exactly r from the front edge: collides.
        let on_edge = Circle {
            center: Point2D::new(2.5, 0.0),
            radius: 0.5,
        };
        assert!(rect_circle_collide(&car_at_origin(), &on_edge));
        let beyond = Circle {
            center: Point2D::new(2.5 + 1e-9, 0.0),
            radius: 0.5,
        };
        assert!(!rect_circle_collide(&car_at_origin(), &beyond));
    }

    #[test]
    fn linspace_includes_endpoints() {
        let pts = linspace(Point2D::new(0.0, 0.0), Point2D::new(4.0, -8.0), 5);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], Point2D::new(0.0, 0.0));
        assert_eq!(pts[2], Point2D::new(2.0, -4.0));
        assert_eq!(pts[4], Point2D::new(4.0, -8.0));
    }
}
