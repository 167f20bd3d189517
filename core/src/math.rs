//! Math type aliases and helper functions.
//!
//! All rendering math is f32 and backed by nalgebra. Matrices are handed to
//! the GPU in column-major order, which is nalgebra's storage order.

pub use nalgebra;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 3x3 matrix (f32).
pub type Mat3 = nalgebra::Matrix3<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Build a non-uniform scale 4x4 matrix.
pub fn mat4_from_scale(s: Vec3) -> Mat4 {
    Mat4::new_nonuniform_scaling(&s)
}

/// Right-handed look-at view matrix.
pub fn look_at_rh(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
    let eye_point = nalgebra::Point3::from(*eye);
    let target_point = nalgebra::Point3::from(*target);
    nalgebra::Isometry3::look_at_rh(&eye_point, &target_point, up).to_homogeneous()
}

/// Build a right-handed perspective projection with depth range [-1, 1] (OpenGL convention).
pub fn perspective_gl(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    nalgebra::Perspective3::new(aspect, yfov, znear, zfar).to_homogeneous()
}

/// Normal matrix for a model matrix: inverse-transpose of the upper 3x3.
///
/// Returns `None` when the upper 3x3 is singular (zero scale on some axis).
pub fn normal_matrix(model: &Mat4) -> Option<Mat3> {
    let upper: Mat3 = model.fixed_view::<3, 3>(0, 0).into_owned();
    upper.try_inverse().map(|inv| inv.transpose())
}

/// Flatten a 4x4 matrix to a column-major array.
pub fn mat4_to_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

/// Flatten a 3x3 matrix to a column-major array.
pub fn mat3_to_array(m: &Mat3) -> [f32; 9] {
    let mut out = [0.0; 9];
    out.copy_from_slice(m.as_slice());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_matrix() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let m = mat4_from_translation(t);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn normal_matrix_of_translation_is_identity() {
        let m = mat4_from_translation(Vec3::new(4.0, -2.0, 9.0));
        let n = normal_matrix(&m).unwrap();
        assert!((n - Mat3::identity()).norm() < 1e-6);
    }

    #[test]
    fn normal_matrix_inverts_scale() {
        let m = mat4_from_scale(Vec3::new(2.0, 4.0, 1.0));
        let n = normal_matrix(&m).unwrap();
        assert!((n[(0, 0)] - 0.5).abs() < 1e-6);
        assert!((n[(1, 1)] - 0.25).abs() < 1e-6);
        assert!((n[(2, 2)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normal_matrix_of_degenerate_scale_is_none() {
        let m = mat4_from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(normal_matrix(&m).is_none());
    }

    #[test]
    fn flatten_is_column_major() {
        let m = mat4_from_translation(Vec3::new(1.0, 2.0, 3.0));
        let a = mat4_to_array(&m);
        assert_eq!(&a[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(a[15], 1.0);
    }
}
