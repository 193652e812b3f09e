//! Affine frame changes between simulator and field coordinates.
//!
//! The neuron model and the EM export rarely agree on a frame out of the
//! box: the fibre is usually laid out along a convenient axis while the
//! field was solved over an anatomical mesh. A [`Frame`] carries the
//! affine map `q = M p + t` that moves model coordinates into the frame
//! the field samples live in, composed from the elementary pieces a
//! coupling setup actually uses.

use nalgebra::{Matrix3, Rotation3, Vector3};

/// An affine change of frame: `q = matrix * p + translation`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Linear part (rotation and scaling).
    pub matrix: Matrix3<f64>,
    /// Offset applied after the linear part.
    pub translation: Vector3<f64>,
}

impl Frame {
    /// The identity frame.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Pure translation by `offset`.
    pub fn translation(offset: [f64; 3]) -> Self {
        Self {
            matrix: Matrix3::identity(),
            translation: Vector3::new(offset[0], offset[1], offset[2]),
        }
    }

    /// Uniform scaling about the origin, the usual unit-change step.
    pub fn uniform_scale(factor: f64) -> Self {
        Self {
            matrix: Matrix3::from_diagonal_element(factor),
            translation: Vector3::zeros(),
        }
    }

    /// Rotation about the x axis, anticlockwise looking down +x.
    pub fn rotation_x_deg(degrees: f64) -> Self {
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), degrees.to_radians());
        Self {
            matrix: rotation.into_inner(),
            translation: Vector3::zeros(),
        }
    }

    /// Apply the frame change to a point.
    pub fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = Vector3::new(point[0], point[1], point[2]);
        let q = self.matrix * p + self.translation;
        [q.x, q.y, q.z]
    }

    /// This frame change followed by `next`.
    pub fn then(&self, next: &Frame) -> Frame {
        Frame {
            matrix: next.matrix * self.matrix,
            translation: next.matrix * self.translation + next.translation,
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_point_eq(got: [f64; 3], want: [f64; 3]) {
        for axis in 0..3 {
            assert_abs_diff_eq!(got[axis], want[axis], epsilon = 1.0e-12);
        }
    }

    #[test]
    fn identity_leaves_points_alone() {
        let p = [1.0, -2.0, 3.5];
        assert_point_eq(Frame::identity().apply(&p), p);
        assert_point_eq(Frame::default().apply(&p), p);
    }

    #[test]
    fn translation_offsets_points() {
        let frame = Frame::translation([10.0, 0.0, -5.0]);
        assert_point_eq(frame.apply(&[1.0, 2.0, 3.0]), [11.0, 2.0, -2.0]);
    }

    #[test]
    fn uniform_scale_scales_about_the_origin() {
        let frame = Frame::uniform_scale(1.0e-6);
        assert_point_eq(frame.apply(&[2.0e6, 0.0, -4.0e6]), [2.0, 0.0, -4.0]);
    }

    #[test]
    fn x_rotation_sends_y_to_z() {
        let frame = Frame::rotation_x_deg(90.0);
        assert_point_eq(frame.apply(&[0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
        assert_point_eq(frame.apply(&[0.0, 0.0, 1.0]), [0.0, -1.0, 0.0]);
        assert_point_eq(frame.apply(&[3.0, 0.0, 0.0]), [3.0, 0.0, 0.0]);
    }

    #[test]
    fn composition_applies_left_to_right() {
        let scale_then_shift = Frame::uniform_scale(2.0).then(&Frame::translation([1.0, 0.0, 0.0]));
        assert_point_eq(scale_then_shift.apply(&[1.0, 1.0, 1.0]), [3.0, 2.0, 2.0]);

        let shift_then_scale = Frame::translation([1.0, 0.0, 0.0]).then(&Frame::uniform_scale(2.0));
        assert_point_eq(shift_then_scale.apply(&[1.0, 1.0, 1.0]), [4.0, 2.0, 2.0]);
    }

    #[test]
    fn rotation_composes_with_translation() {
        // Rotate the fibre frame upright, then slide it into the nerve.
        let frame = Frame::rotation_x_deg(90.0).then(&Frame::translation([0.0, 0.0, 50.0]));
        assert_point_eq(frame.apply(&[0.0, 10.0, 0.0]), [0.0, 0.0, 60.0]);
    }
}
