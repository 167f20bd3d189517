//! Light sources.

use chroma_core::math::Vec3;
use parking_lot::RwLock;

use crate::backend::UniformValue;
use crate::materials::ProgramUniforms;

/// Kind of light. Fixed at creation because it changes the composed shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Parallel rays along a direction.
    Directional,
    /// Omnidirectional with distance attenuation.
    Point,
    /// Cone of light with attenuation, cutoff and falloff.
    Spot,
}

/// Per-frame light parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Intensity multiplier.
    pub power: f32,
    /// World-space position (point and spot).
    pub position: Vec3,
    /// World-space direction (directional and spot).
    pub direction: Vec3,
    /// Range, constant, linear and quadratic attenuation terms.
    pub attenuation: [f32; 4],
    /// Spot cone half-angle in degrees.
    pub cutoff_angle: f32,
    /// Spot edge softness in `[0, 1]`.
    pub falloff: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            power: 0.5,
            position: Vec3::zeros(),
            direction: Vec3::new(0.0, 0.0, -1.0),
            attenuation: [50.0, 1.0, 0.09, 0.032],
            cutoff_angle: 40.0,
            falloff: 0.4,
        }
    }
}

/// A light shared with materials via `Arc`.
///
/// Parameters may change every frame; the kind may not. Replacing a light
/// with one of a different kind must go through `Material::set_lights` so
/// the material recomposes.
#[derive(Debug)]
pub struct Light {
    kind: LightKind,
    params: RwLock<LightParams>,
}

impl Light {
    fn with_params(kind: LightKind, params: LightParams) -> Self {
        Self {
            kind,
            params: RwLock::new(params),
        }
    }

    /// A directional light pointing along `direction`.
    pub fn directional(direction: Vec3) -> Self {
        Self::with_params(
            LightKind::Directional,
            LightParams {
                direction: direction.normalize(),
                ..Default::default()
            },
        )
    }

    /// A point light at `position`.
    pub fn point(position: Vec3) -> Self {
        Self::with_params(
            LightKind::Point,
            LightParams {
                position,
                ..Default::default()
            },
        )
    }

    /// A spot light at `position` pointing along `direction`.
    pub fn spot(position: Vec3, direction: Vec3) -> Self {
        Self::with_params(
            LightKind::Spot,
            LightParams {
                position,
                direction: direction.normalize(),
                ..Default::default()
            },
        )
    }

    /// The light kind.
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// Snapshot of the current parameters.
    pub fn params(&self) -> LightParams {
        *self.params.read()
    }

    /// Set the color.
    pub fn set_color(&self, color: [f32; 3]) {
        self.params.write().color = color;
    }

    /// Set the intensity.
    pub fn set_power(&self, power: f32) {
        self.params.write().power = power;
    }

    /// Move the light.
    pub fn set_position(&self, position: Vec3) {
        self.params.write().position = position;
    }

    /// Re-aim the light.
    pub fn set_direction(&self, direction: Vec3) {
        self.params.write().direction = direction.normalize();
    }

    /// Set range and attenuation coefficients.
    pub fn set_attenuation(&self, range: f32, constant: f32, linear: f32, quadratic: f32) {
        self.params.write().attenuation = [range, constant, linear, quadratic];
    }

    /// Set the spot cone.
    pub fn set_spot(&self, cutoff_angle: f32, falloff: f32) {
        let mut params = self.params.write();
        params.cutoff_angle = cutoff_angle;
        params.falloff = falloff.clamp(0.0, 1.0);
    }

    /// Push this light's uniforms as light number `index`.
    pub fn apply_params(&self, index: usize, uniforms: &mut ProgramUniforms<'_>) {
        let params = self.params();
        uniforms.set(&format!("uLightColor{index}"), UniformValue::Vec3(params.color));
        uniforms.set(&format!("uLightPower{index}"), UniformValue::Float(params.power));
        let position = UniformValue::Vec3([params.position.x, params.position.y, params.position.z]);
        let direction =
            UniformValue::Vec3([params.direction.x, params.direction.y, params.direction.z]);
        match self.kind {
            LightKind::Directional => {
                uniforms.set(&format!("uLightDirection{index}"), direction);
            }
            LightKind::Point => {
                uniforms.set(&format!("uLightPosition{index}"), position);
                uniforms.set(
                    &format!("uLightAttenuation{index}"),
                    UniformValue::Vec4(params.attenuation),
                );
            }
            LightKind::Spot => {
                uniforms.set(&format!("uLightPosition{index}"), position);
                uniforms.set(&format!("uLightDirection{index}"), direction);
                uniforms.set(
                    &format!("uLightAttenuation{index}"),
                    UniformValue::Vec4(params.attenuation),
                );
                uniforms.set(
                    &format!("uSpotCutoffAngle{index}"),
                    UniformValue::Float(params.cutoff_angle),
                );
                uniforms.set(
                    &format!("uSpotFalloff{index}"),
                    UniformValue::Float(params.falloff),
                );
            }
        }
    }
}

static_assertions::assert_impl_all!(Light: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_is_normalized() {
        let light = Light::directional(Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(light.kind(), LightKind::Directional);
        assert!((light.params().direction - Vec3::new(0.0, -1.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_params_update_through_shared_reference() {
        let light = std::sync::Arc::new(Light::point(Vec3::new(1.0, 2.0, 3.0)));
        let scene_side = light.clone();
        scene_side.set_power(2.0);
        scene_side.set_spot(30.0, 4.0);
        assert_eq!(light.params().power, 2.0);
        assert_eq!(light.params().falloff, 1.0);
    }
}
