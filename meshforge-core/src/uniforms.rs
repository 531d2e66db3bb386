/// Per-frame constant blocks handed to shaders
use bytemuck::{Pod, Zeroable};
use log::warn;
use nalgebra::{Matrix4, Vector3};

use crate::transform::Transform;

/// Transformation matrices specific to one object
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub mvp: [[f32; 4]; 4],
    /// Inverse transpose of `mv`, for normals
    pub invmv: [[f32; 4]; 4],
    pub mv: [[f32; 4]; 4],
    pub mvp_light: [[f32; 4]; 4],
}

impl ObjectConstants {
    pub fn compute(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
        view_projection_light: &Matrix4<f32>,
    ) -> Self {
        let mv = view * model;
        let invmv = Transform::inverse_transpose(&mv).unwrap_or_else(|| {
            warn!("model-view matrix is singular, normals will not be transformed");
            Matrix4::zeros()
        });

        Self {
            mvp: (projection * mv).into(),
            invmv: invmv.into(),
            mv: mv.into(),
            mvp_light: (view_projection_light * model).into(),
        }
    }
}

impl Default for ObjectConstants {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        Self {
            mvp: identity,
            invmv: identity,
            mv: identity,
            mvp_light: identity,
        }
    }
}

/// Material parameters
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct MaterialConstants {
    pub shininess: i32,
}

/// Scene parameters
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct GlobalConstants {
    pub light_dir: [f32; 4],
}

impl GlobalConstants {
    /// Directional light; `direction` points from the surface towards the light
    pub fn with_light(direction: &Vector3<f32>) -> Self {
        let d = direction.normalize();
        Self {
            light_dir: [d.x, d.y, d.z, 0.0],
        }
    }

    pub fn light_direction(&self) -> Vector3<f32> {
        Vector3::new(self.light_dir[0], self.light_dir[1], self.light_dir[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_identity() {
        let constants = ObjectConstants::default();
        assert_eq!(Matrix4::from(constants.mvp), Matrix4::identity());
    }

    #[test]
    fn test_compute_composes_matrices() {
        let model = Transform::model_unrotated(2.0, &Vector3::new(1.0, 0.0, 0.0));
        let view = Transform::translation(&Vector3::new(0.0, 0.0, -5.0));
        let projection = Transform::perspective(1.0, 1.0, 0.1, 10.0);
        let light = Transform::orthographic(-1.0, 1.0, -1.0, 1.0, 0.1, 10.0);

        let constants = ObjectConstants::compute(&model, &view, &projection, &light);
        let mv = view * model;

        assert_relative_eq!(Matrix4::from(constants.mv), mv, epsilon = 1e-6);
        assert_relative_eq!(Matrix4::from(constants.mvp), projection * mv, epsilon = 1e-6);
        assert_relative_eq!(Matrix4::from(constants.mvp_light), light * model, epsilon = 1e-6);
        assert_relative_eq!(
            Matrix4::from(constants.invmv) * mv.transpose(),
            Matrix4::identity(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_singular_model_view_zeroes_normal_matrix() {
        let model = Transform::scaling(0.0);
        let identity = Matrix4::identity();
        let constants = ObjectConstants::compute(&model, &identity, &identity, &identity);
        assert_eq!(Matrix4::from(constants.invmv), Matrix4::zeros());
    }

    #[test]
    fn test_light_direction_is_normalized() {
        let globals = GlobalConstants::with_light(&Vector3::new(0.0, 3.0, 4.0));
        assert_relative_eq!(globals.light_direction().norm(), 1.0, epsilon = 1e-6);
        assert_eq!(globals.light_dir[3], 0.0);
    }
}
