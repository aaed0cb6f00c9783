//! # View Frustum
//!
//! Extracts the six clipping planes from a combined view-projection matrix
//! (Gribb/Hartmann) and tests chunk bounding boxes against them, so chunks
//! behind the camera or off to the side never reach the GPU.
//!
//! The extraction assumes the matrix maps clip-space depth to `[0, 1]`,
//! which is what the projection produces after the wgpu depth-range
//! correction: the near plane is row 2 alone, not `row3 + row2` as it would
//! be for a `[-1, 1]` depth range.

use cgmath::{InnerSpace, Matrix, Matrix4, Point3, Vector4};

/// One clipping plane in `ax + by + cz + d = 0` form, normal pointing into
/// the visible half-space.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: [f32; 3],
    d: f32,
}

impl Plane {
    fn from_row(row: Vector4<f32>) -> Self {
        let length = row.truncate().magnitude();
        Self {
            normal: [row.x / length, row.y / length, row.z / length],
            d: row.w / length,
        }
    }

    /// Signed distance from the plane to the point.
    fn distance(&self, point: Point3<f32>) -> f32 {
        self.normal[0] * point.x + self.normal[1] * point.y + self.normal[2] * point.z + self.d
    }
}

/// The camera's view frustum as six inward-facing planes.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Builds the frustum for a view-projection matrix.
    pub fn from_view_proj(view_proj: &Matrix4<f32>) -> Self {
        let row0 = view_proj.row(0);
        let row1 = view_proj.row(1);
        let row2 = view_proj.row(2);
        let row3 = view_proj.row(3);

        Self {
            planes: [
                Plane::from_row(row3 + row0), // left
                Plane::from_row(row3 - row0), // right
                Plane::from_row(row3 + row1), // bottom
                Plane::from_row(row3 - row1), // top
                Plane::from_row(row2),        // near, [0, 1] depth
                Plane::from_row(row3 - row2), // far
            ],
        }
    }

    /// Whether an axis-aligned box touches the frustum.
    ///
    /// Positive-vertex test: for each plane, only the box corner furthest
    /// along the plane normal matters; the box is outside only if even that
    /// corner is behind the plane. Conservative -- a box near a frustum
    /// corner can pass all six plane tests while intersecting none of the
    /// volume, which costs a wasted draw, never a missing one.
    pub fn intersects_aabb(&self, min: Point3<f32>, max: Point3<f32>) -> bool {
        for plane in &self.planes {
            let positive = Point3::new(
                if plane.normal[0] >= 0.0 { max.x } else { min.x },
                if plane.normal[1] >= 0.0 { max.y } else { min.y },
                if plane.normal[2] >= 0.0 { max.z } else { min.z },
            );
            if plane.distance(positive) < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::camera_state::camera::OPENGL_TO_WGPU_MATRIX;
    use cgmath::{perspective, Deg, Vector3};

    /// Camera at the origin looking down -Z, 90 degree FOV, far plane 100.
    fn test_frustum() -> Frustum {
        let projection = OPENGL_TO_WGPU_MATRIX * perspective(Deg(90.0), 1.0, 0.1, 100.0);
        let view = Matrix4::look_to_rh(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::unit_y(),
        );
        Frustum::from_view_proj(&(projection * view))
    }

    fn cube_at(center: Point3<f32>, half: f32) -> (Point3<f32>, Point3<f32>) {
        (
            Point3::new(center.x - half, center.y - half, center.z - half),
            Point3::new(center.x + half, center.y + half, center.z + half),
        )
    }

    #[test]
    fn box_in_front_is_visible() {
        let frustum = test_frustum();
        let (min, max) = cube_at(Point3::new(0.0, 0.0, -10.0), 1.0);
        assert!(frustum.intersects_aabb(min, max));
    }

    #[test]
    fn box_behind_the_camera_is_culled() {
        let frustum = test_frustum();
        let (min, max) = cube_at(Point3::new(0.0, 0.0, 10.0), 1.0);
        assert!(!frustum.intersects_aabb(min, max));
    }

    #[test]
    fn box_far_to_the_side_is_culled() {
        let frustum = test_frustum();
        let (min, max) = cube_at(Point3::new(-1000.0, 0.0, -10.0), 1.0);
        assert!(!frustum.intersects_aabb(min, max));
        let (min, max) = cube_at(Point3::new(0.0, 1000.0, -10.0), 1.0);
        assert!(!frustum.intersects_aabb(min, max));
    }

    #[test]
    fn box_beyond_the_far_plane_is_culled() {
        let frustum = test_frustum();
        let (min, max) = cube_at(Point3::new(0.0, 0.0, -500.0), 1.0);
        assert!(!frustum.intersects_aabb(min, max));
    }

    #[test]
    fn box_enclosing_the_camera_is_visible() {
        let frustum = test_frustum();
        let (min, max) = cube_at(Point3::new(0.0, 0.0, 0.0), 64.0);
        assert!(frustum.intersects_aabb(min, max));
    }

    #[test]
    fn box_straddling_a_side_plane_is_visible() {
        let frustum = test_frustum();
        // At z = -10 with a 90 degree FOV the right plane sits at x = 10;
        // this box pokes across it.
        let (min, max) = cube_at(Point3::new(10.0, 0.0, -10.0), 2.0);
        assert!(frustum.intersects_aabb(min, max));
    }
}
