/// 3D transformation matrices.
///
/// Matrices are column-major `nalgebra` values acting on column vectors, with
/// a right-handed view space and an OpenGL-style clip volume (z in [-1, 1]).
/// None of the builders validate their input: a zero-length axis, an `up`
/// parallel to the view direction or coincident clip planes yield non-finite
/// entries.
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Right-handed view matrix looking from `eye` towards `target`
    #[rustfmt::skip]
    pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let z_axis = (eye - target).normalize();
        let x_axis = up.normalize().cross(&z_axis).normalize();
        let y_axis = z_axis.cross(&x_axis);

        Matrix4::new(
            x_axis.x, x_axis.y, x_axis.z, -x_axis.dot(&eye.coords),
            y_axis.x, y_axis.y, y_axis.z, -y_axis.dot(&eye.coords),
            z_axis.x, z_axis.y, z_axis.z, -z_axis.dot(&eye.coords),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Symmetric perspective projection; `fov` is the vertical field of view in radians
    #[rustfmt::skip]
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov / 2.0).tan();

        Matrix4::new(
            f / aspect, 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, (far + near) / (near - far), (2.0 * far * near) / (near - far),
            0.0, 0.0, -1.0, 0.0,
        )
    }

    /// Box projection of `[left, right] x [bottom, top] x [-near, -far]`
    #[rustfmt::skip]
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Matrix4<f32> {
        Matrix4::new(
            2.0 / (right - left), 0.0, 0.0, (right + left) / (left - right),
            0.0, 2.0 / (top - bottom), 0.0, (top + bottom) / (bottom - top),
            0.0, 0.0, 2.0 / (near - far), (far + near) / (near - far),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation of `angle` radians around `axis` (Rodrigues form)
    #[rustfmt::skip]
    pub fn rotation(angle: f32, axis: &Vector3<f32>) -> Matrix4<f32> {
        let a = axis.normalize();
        let (s, c) = angle.sin_cos();
        let ci = 1.0 - c;

        let xy = a.x * a.y * ci;
        let xz = a.x * a.z * ci;
        let yz = a.y * a.z * ci;
        let xs = a.x * s;
        let ys = a.y * s;
        let zs = a.z * s;

        Matrix4::new(
            a.x * a.x * ci + c, xy - zs, xz + ys, 0.0,
            xy + zs, a.y * a.y * ci + c, yz - xs, 0.0,
            xz - ys, yz + xs, a.z * a.z * ci + c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Uniform scale matrix
    pub fn scaling(scale: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(scale)
    }

    /// Create a translation matrix
    pub fn translation(t: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(t)
    }

    /// Model matrix `T * R * S`: scale, then rotate, then translate
    pub fn model(
        scale: f32,
        translation: &Vector3<f32>,
        angle: f32,
        axis: &Vector3<f32>,
    ) -> Matrix4<f32> {
        Self::translation(translation) * Self::rotation(angle, axis) * Self::scaling(scale)
    }

    /// Model matrix `T * S` without rotation
    pub fn model_unrotated(scale: f32, translation: &Vector3<f32>) -> Matrix4<f32> {
        Self::translation(translation) * Self::scaling(scale)
    }

    /// Upper-left 3x3 block (the linear part of an affine transform)
    pub fn block3x3(m: &Matrix4<f32>) -> Matrix3<f32> {
        m.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Inverse transpose, for carrying normals through non-uniform scale.
    /// `None` if `m` is singular.
    pub fn inverse_transpose(m: &Matrix4<f32>) -> Option<Matrix4<f32>> {
        m.try_inverse().map(|inverse| inverse.transpose())
    }

    pub fn inverse_transpose3(m: &Matrix3<f32>) -> Option<Matrix3<f32>> {
        m.try_inverse().map(|inverse| inverse.transpose())
    }

    /// Normal matrix for a model-view transform
    pub fn normal_matrix(model_view: &Matrix4<f32>) -> Option<Matrix3<f32>> {
        Self::inverse_transpose3(&Self::block3x3(model_view))
    }

    /// Create a model-view-projection matrix
    pub fn mvp(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
