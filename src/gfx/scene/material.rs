//! Material model with OBJ-style alias defaulting.
//!
//! Source assets may name material fields either descriptively (`diffuse`,
//! `ambient`, `specular`, `specularExponent`, `transparency`) or with their
//! OBJ counterparts (`Kd`, `Ka`, `Ks`, `Ns`, `d`). Resolution picks the
//! descriptive name when both are present and fills defaults otherwise, so
//! both conventions always agree afterwards and resolving twice changes
//! nothing.

use super::asset::RawModel;

/// GPU uniform data for a material, including the object-level render
/// flags the shader branches on.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub picking_color: [f32; 4],
    /// x = specular exponent, y = opacity, z/w unused.
    pub params: [f32; 4],
    /// x = wireframe, y = illumination model, z/w unused.
    pub flags: [u32; 4],
}

/// Resolved material properties attached to every scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub specular_exponent: f32,
    pub opacity: f32,
    pub illum: i32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [1.0, 1.0, 1.0, 1.0],
            ambient: [0.2, 0.2, 0.2, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
            specular_exponent: 0.0,
            opacity: 1.0,
            illum: 1,
        }
    }
}

impl Material {
    /// Resolves a raw asset's material fields against the defaulting rules.
    pub fn from_raw(raw: &RawModel) -> Self {
        let defaults = Material::default();
        Self {
            diffuse: resolve_color(&raw.diffuse, &raw.kd, defaults.diffuse),
            ambient: resolve_color(&raw.ambient, &raw.ka, defaults.ambient),
            specular: resolve_color(&raw.specular, &raw.ks, defaults.specular),
            specular_exponent: raw
                .specular_exponent
                .or(raw.ns)
                .unwrap_or(defaults.specular_exponent),
            opacity: raw.transparency.or(raw.d).unwrap_or(defaults.opacity),
            illum: raw.illum.unwrap_or(defaults.illum),
        }
    }
}

/// Descriptive name wins over the OBJ alias; absent both, the default.
fn resolve_color(
    descriptive: &Option<Vec<f32>>,
    legacy: &Option<Vec<f32>>,
    default: [f32; 4],
) -> [f32; 4] {
    match descriptive.as_deref().or(legacy.as_deref()) {
        Some(values) => rgba(values, default),
        None => default,
    }
}

/// Pads an RGB triple to RGBA with alpha 1; short inputs fall back to the
/// default.
fn rgba(values: &[f32], default: [f32; 4]) -> [f32; 4] {
    match values {
        [r, g, b, a, ..] => [*r, *g, *b, *a],
        [r, g, b] => [*r, *g, *b, 1.0],
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with<F: FnOnce(&mut RawModel)>(f: F) -> RawModel {
        let mut raw = RawModel::default();
        f(&mut raw);
        raw
    }

    #[test]
    fn absent_fields_take_defaults() {
        let material = Material::from_raw(&RawModel::default());
        assert_eq!(material, Material::default());
        assert_eq!(material.ambient, [0.2, 0.2, 0.2, 1.0]);
        assert_eq!(material.illum, 1);
    }

    #[test]
    fn legacy_aliases_fill_descriptive_values() {
        let raw = raw_with(|r| {
            r.kd = Some(vec![0.3, 0.4, 0.5]);
            r.ns = Some(8.0);
            r.d = Some(0.25);
        });
        let material = Material::from_raw(&raw);
        assert_eq!(material.diffuse, [0.3, 0.4, 0.5, 1.0]);
        assert_eq!(material.specular_exponent, 8.0);
        assert_eq!(material.opacity, 0.25);
    }

    #[test]
    fn descriptive_names_win_over_aliases() {
        let raw = raw_with(|r| {
            r.diffuse = Some(vec![1.0, 0.0, 0.0, 1.0]);
            r.kd = Some(vec![0.0, 1.0, 0.0]);
        });
        let material = Material::from_raw(&raw);
        assert_eq!(material.diffuse, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn scalar_descriptive_names_win_over_aliases() {
        let raw = raw_with(|r| {
            r.transparency = Some(0.75);
            r.d = Some(0.1);
            r.specular_exponent = Some(32.0);
            r.ns = Some(2.0);
        });
        let material = Material::from_raw(&raw);
        assert_eq!(material.opacity, 0.75);
        assert_eq!(material.specular_exponent, 32.0);
    }

    #[test]
    fn resolution_is_idempotent() {
        let raw = raw_with(|r| {
            r.kd = Some(vec![0.3, 0.4, 0.5]);
            r.ambient = Some(vec![0.1, 0.1, 0.1, 1.0]);
            r.ns = Some(16.0);
        });
        let once = Material::from_raw(&raw);

        // Feed the resolved values back through both naming conventions:
        // nothing further changes.
        let again = raw_with(|r| {
            r.diffuse = Some(once.diffuse.to_vec());
            r.kd = Some(once.diffuse.to_vec());
            r.ambient = Some(once.ambient.to_vec());
            r.ka = Some(once.ambient.to_vec());
            r.specular = Some(once.specular.to_vec());
            r.ks = Some(once.specular.to_vec());
            r.specular_exponent = Some(once.specular_exponent);
            r.ns = Some(once.specular_exponent);
            r.d = Some(once.opacity);
            r.transparency = Some(once.opacity);
            r.illum = Some(once.illum);
        });
        assert_eq!(Material::from_raw(&again), once);
    }
}
