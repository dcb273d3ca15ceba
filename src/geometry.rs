//! Page geometry and the render transform
//!
//! A page has an intrinsic size at scale 1.0 plus a rotation the document
//! itself declares. The viewer applies its own rotation and zoom on top.
//! `render_box` folds all of that into the final on-screen box.

use serde::{Deserialize, Serialize};

/// Intrinsic page geometry, as reported by the backend at scale 1.0
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Untransformed page width
    pub width: f32,
    /// Untransformed page height
    pub height: f32,
    /// Rotation baked into the page by the document, in degrees
    pub intrinsic_rotation: i32,
}

/// Final on-screen box for a page after scale and rotation are applied
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderBox {
    pub width: f32,
    pub height: f32,
    /// Effective rotation (viewer + intrinsic), normalized to `[0, 360)`
    pub rotation: i32,
}

/// Viewer rotation plus page-intrinsic rotation, normalized to `[0, 360)`.
///
/// `rem_euclid` keeps negative viewer rotations in range.
#[must_use]
pub fn effective_rotation(rotation: i32, intrinsic_rotation: i32) -> i32 {
    (rotation + intrinsic_rotation).rem_euclid(360)
}

/// A page rotated by 90 or 270 degrees occupies a transposed bounding box.
#[must_use]
pub fn is_axis_aligned(effective_rotation: i32) -> bool {
    effective_rotation % 180 == 0
}

/// Compute the final render box for a page.
///
/// Scale and rotation are taken as given: a non-positive scale or a rotation
/// that is not a multiple of 90 produces degenerate geometry rather than an
/// error. Callers validate before construction if they care.
#[must_use]
pub fn render_box(
    width: f32,
    height: f32,
    scale: f32,
    rotation: i32,
    intrinsic_rotation: i32,
) -> RenderBox {
    let effective = effective_rotation(rotation, intrinsic_rotation);
    let scaled_width = width * scale;
    let scaled_height = height * scale;

    if is_axis_aligned(effective) {
        RenderBox {
            width: scaled_width,
            height: scaled_height,
            rotation: effective,
        }
    } else {
        RenderBox {
            width: scaled_height,
            height: scaled_width,
            rotation: effective,
        }
    }
}

impl PageGeometry {
    /// Render box for this geometry under the given viewer scale and rotation
    #[must_use]
    pub fn render_box(&self, scale: f32, rotation: i32) -> RenderBox {
        render_box(
            self.width,
            self.height,
            scale,
            rotation,
            self.intrinsic_rotation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_swaps_and_scales() {
        let bounds = render_box(200.0, 100.0, 2.0, 90, 0);
        assert_eq!(bounds.width, 200.0);
        assert_eq!(bounds.height, 400.0);
        assert_eq!(bounds.rotation, 90);
    }

    #[test]
    fn half_turn_scales_without_swapping() {
        let bounds = render_box(200.0, 100.0, 2.0, 180, 0);
        assert_eq!(bounds.width, 400.0);
        assert_eq!(bounds.height, 200.0);
        assert_eq!(bounds.rotation, 180);
    }

    #[test]
    fn effective_rotation_wraps() {
        assert_eq!(effective_rotation(270, 180), 90);
        assert_eq!(effective_rotation(0, 0), 0);
        assert_eq!(effective_rotation(180, 180), 0);
    }

    #[test]
    fn negative_viewer_rotation_normalizes() {
        assert_eq!(effective_rotation(-90, 0), 270);

        let bounds = render_box(200.0, 100.0, 1.0, -90, 0);
        assert_eq!(bounds.width, 100.0);
        assert_eq!(bounds.height, 200.0);
        assert_eq!(bounds.rotation, 270);
    }

    #[test]
    fn intrinsic_rotation_contributes_to_swap() {
        let bounds = render_box(200.0, 100.0, 1.0, 0, 90);
        assert_eq!(bounds.width, 100.0);
        assert_eq!(bounds.height, 200.0);
    }

    #[test]
    fn degenerate_scale_is_accepted() {
        let bounds = render_box(200.0, 100.0, 0.0, 0, 0);
        assert_eq!(bounds.width, 0.0);
        assert_eq!(bounds.height, 0.0);
    }
}
