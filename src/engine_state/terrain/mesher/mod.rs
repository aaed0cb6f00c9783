//! # Marching-Cubes Isosurface Extraction
//!
//! Converts a sampled density field into a triangle mesh approximating the
//! isolevel surface, using the count-then-emit layout:
//!
//! * **Count pass**: every cell classifies its 8 corners against the
//!   isolevel, looks up its triangle count, adds `triangles * 3` to a global
//!   atomic and records its exclusive prefix as the cell's output offset.
//! * **Readback**: the single CPU-visible readback per chunk -- the global
//!   vertex count -- sizes the output buffer exactly. A worst-case
//!   allocation would be 5 triangles per cell; measured chunks sit far
//!   below that.
//! * **Emit pass**: every cell re-derives its classification, interpolates
//!   the active edge crossings and writes its vertices at
//!   `offset + local_index`. No atomics; the offsets are already exclusive.
//!
//! The passes run as WGSL compute shaders (see `pipelines`). The functions
//! in this module are the scalar reference for one cell of that algorithm:
//! the shaders mirror them exactly, and the unit tests pin the behavior the
//! shaders must match (sign convention, interpolation, degeneracy
//! fallback). They exist for the tests, so they are only compiled with
//! them.

#[cfg(test)]
use cgmath::Point3;

pub mod pipelines;
pub mod tables;

/// Corner-density deltas below this are treated as degenerate to avoid the
/// division blowing up in edge interpolation.
#[cfg(test)]
pub const INTERPOLATION_EPSILON: f32 = 1e-5;

/// Upper bound on vertices a single cell can emit (5 triangles).
#[cfg(test)]
pub const MAX_VERTICES_PER_CELL: u32 = 15;

/// Classifies one cell: bit `i` is set when corner `i`'s density is below
/// the isolevel. The same convention is baked into the lookup tables and
/// both compute passes; it must never diverge between count and emit.
#[cfg(test)]
pub fn cell_pattern(corner_values: &[f32; 8], isolevel: f32) -> u8 {
    let mut pattern = 0u8;
    for (i, value) in corner_values.iter().enumerate() {
        if *value < isolevel {
            pattern |= 1 << i;
        }
    }
    pattern
}

/// Vertices the emit pass will produce for a corner pattern: three per
/// triangle-table entry up to the -1 sentinel.
#[cfg(test)]
pub fn pattern_vertex_count(pattern: u8) -> u32 {
    let row = &tables::TRI_TABLE[pattern as usize];
    row.iter().take_while(|edge| **edge >= 0).count() as u32
}

/// Interpolates the surface crossing along one cell edge.
///
/// Solves `v1 + t * (v2 - v1) = isolevel` and walks `t` of the way from
/// `p1` to `p2`. When the corner densities are indistinguishable the
/// crossing is ill-defined and `p1` is returned unchanged rather than
/// dividing by a vanishing delta.
#[cfg(test)]
pub fn interpolate_edge(
    isolevel: f32,
    p1: Point3<f32>,
    p2: Point3<f32>,
    v1: f32,
    v2: f32,
) -> Point3<f32> {
    if (v1 - v2).abs() < INTERPOLATION_EPSILON {
        return p1;
    }
    let t = (isolevel - v1) / (v2 - v1);
    p1 + (p2 - p1) * t
}

/// CPU mirror of the count pass over a full density grid.
///
/// `density` is laid out `x + y * points_x + z * points_x * points_y`, one
/// `f32` per grid point, exactly as the density pass writes it. Returns the
/// total vertex count the emit pass would produce.
#[cfg(test)]
pub fn count_grid_vertices(
    density: &[f32],
    points: (usize, usize, usize),
    isolevel: f32,
) -> u32 {
    let (px, py, pz) = points;
    debug_assert_eq!(density.len(), px * py * pz);

    let sample = |x: usize, y: usize, z: usize| density[x + y * px + z * px * py];

    let mut total = 0u32;
    for z in 0..pz - 1 {
        for y in 0..py - 1 {
            for x in 0..px - 1 {
                let mut corners = [0.0f32; 8];
                for (i, offset) in tables::CORNER_OFFSETS.iter().enumerate() {
                    corners[i] = sample(
                        x + offset[0] as usize,
                        y + offset[1] as usize,
                        z + offset[2] as usize,
                    );
                }
                total += pattern_vertex_count(cell_pattern(&corners, isolevel));
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_fields_have_no_crossings() {
        let above = [1.0f32; 8];
        let below = [-1.0f32; 8];
        assert_eq!(pattern_vertex_count(cell_pattern(&above, 0.0)), 0);
        assert_eq!(pattern_vertex_count(cell_pattern(&below, 0.0)), 0);
    }

    #[test]
    fn uniform_grid_counts_zero_vertices() {
        let grid = vec![0.5f32; 5 * 5 * 5];
        assert_eq!(count_grid_vertices(&grid, (5, 5, 5), 0.0), 0);

        let grid = vec![-0.5f32; 5 * 5 * 5];
        assert_eq!(count_grid_vertices(&grid, (5, 5, 5), 0.0), 0);
    }

    #[test]
    fn symmetric_edge_interpolates_to_midpoint() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(2.0, 0.0, 0.0);
        let crossing = interpolate_edge(0.0, p1, p2, -1.0, 1.0);
        assert_eq!(crossing, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn degenerate_edge_falls_back_to_first_corner() {
        let p1 = Point3::new(3.0, 4.0, 5.0);
        let p2 = Point3::new(6.0, 7.0, 8.0);
        let crossing = interpolate_edge(0.0, p1, p2, 0.25, 0.25);
        assert_eq!(crossing, p1);
        assert!(crossing.x.is_finite() && crossing.y.is_finite() && crossing.z.is_finite());

        // Just inside the epsilon window counts as degenerate too.
        let crossing = interpolate_edge(0.0, p1, p2, 0.25, 0.25 + 0.5e-5);
        assert_eq!(crossing, p1);
    }

    #[test]
    fn every_pattern_has_whole_triangles() {
        for pattern in 0u16..=255 {
            let count = pattern_vertex_count(pattern as u8);
            assert_eq!(count % 3, 0, "pattern {pattern} emits partial triangle");
            assert!(count <= MAX_VERTICES_PER_CELL);
        }
    }

    #[test]
    fn complementary_patterns_emit_equal_counts() {
        // Flipping inside/outside mirrors the surface but crosses the same
        // edges.
        for pattern in 0u16..=255 {
            assert_eq!(
                pattern_vertex_count(pattern as u8),
                pattern_vertex_count(!(pattern as u8)),
            );
            assert_eq!(
                tables::EDGE_TABLE[pattern as usize],
                tables::EDGE_TABLE[!(pattern as u8) as usize],
            );
        }
    }

    /// A flat horizontal cut: `density(p) = -(p.y + 1)` over a grid whose
    /// y range straddles -1. Exactly one layer of cells crosses the
    /// surface, and a planar cut through a cell is always two triangles.
    #[test]
    fn flat_field_produces_one_planar_sheet() {
        let (px, py, pz) = (9usize, 5usize, 9usize);
        let y_origin = -3.0f32;

        let mut grid = vec![0.0f32; px * py * pz];
        for z in 0..pz {
            for y in 0..py {
                for x in 0..px {
                    let world_y = y_origin + y as f32;
                    grid[x + y * px + z * px * py] = -(world_y + 1.0);
                }
            }
        }

        let cells_per_layer = (px - 1) * (pz - 1);
        let expected = (cells_per_layer * 6) as u32;
        assert_eq!(count_grid_vertices(&grid, (px, py, pz), 0.0), expected);

        // Each crossing cell individually contributes two triangles, and
        // the wholly-above and wholly-below slabs contribute nothing.
        for y in 0..py - 1 {
            let mut corners = [0.0f32; 8];
            for (i, offset) in tables::CORNER_OFFSETS.iter().enumerate() {
                let world_y = y_origin + (y + offset[1] as usize) as f32;
                corners[i] = -(world_y + 1.0);
            }
            let count = pattern_vertex_count(cell_pattern(&corners, 0.0));
            let crosses = y_origin + y as f32 <= -1.0 && -1.0 < y_origin + (y + 1) as f32;
            assert_eq!(count, if crosses { 6 } else { 0 }, "cell layer {y}");
        }
    }

    /// The interpolated sheet from the flat field sits exactly at y = -1.
    #[test]
    fn flat_field_crossings_sit_on_the_surface() {
        let density = |p: Point3<f32>| -(p.y + 1.0);
        let base = Point3::new(0.0, -1.5, 0.0);

        let mut corners = [0.0f32; 8];
        let mut positions = [Point3::new(0.0, 0.0, 0.0); 8];
        for (i, offset) in tables::CORNER_OFFSETS.iter().enumerate() {
            positions[i] = Point3::new(
                base.x + offset[0] as f32,
                base.y + offset[1] as f32,
                base.z + offset[2] as f32,
            );
            corners[i] = density(positions[i]);
        }

        let pattern = cell_pattern(&corners, 0.0);
        let edges = tables::EDGE_TABLE[pattern as usize];
        assert_ne!(edges, 0);

        for (edge, [a, b]) in tables::EDGE_CONNECTIONS.iter().enumerate() {
            if edges & (1 << edge) == 0 {
                continue;
            }
            let crossing = interpolate_edge(
                0.0,
                positions[*a],
                positions[*b],
                corners[*a],
                corners[*b],
            );
            assert!((crossing.y - -1.0).abs() < 1e-6, "edge {edge}: {crossing:?}");
        }
    }
}
