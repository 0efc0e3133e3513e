//! Scene objects and their GPU resources.
//!
//! Geometry is fixed once an object enters the scene: vertex and index
//! buffers are created exactly once and only rebound afterwards. Material,
//! render flags, and the position/scale offsets stay mutable; the lighting
//! and drag-move demos rely on editing them per frame.

use std::fmt;

use cgmath::Vector3;
use wgpu::{util::DeviceExt, Device};

use crate::{
    gfx::{
        geometry::GeometryData,
        transforms::MatrixUniform,
    },
    wgpu_utils::UniformBuffer,
};

use super::{
    material::{Material, MaterialUniform},
    vertex::Vertex3D,
};

/// Closed set of per-object overrides accepted at load/add time.
///
/// Unrecognized settings simply do not exist here; there is no dynamic
/// attribute bag to merge arbitrary keys from.
#[derive(Debug, Clone)]
pub struct ObjectOptions {
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
    /// Overrides the asset's diffuse color when set.
    pub diffuse: Option<[f32; 4]>,
    /// A unique flat color identifying this object to the picker. Objects
    /// without one are not pickable.
    pub picking_color: Option<[f32; 4]>,
    pub wireframe: Option<bool>,
    pub visible: bool,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            diffuse: None,
            picking_color: None,
            wireframe: None,
            visible: true,
        }
    }
}

// GPU resources created once per object on first upload.
pub struct ObjectGpuResources {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub matrix_ubo: UniformBuffer<MatrixUniform>,
    pub material_ubo: UniformBuffer<MaterialUniform>,
    pub bind_group: wgpu::BindGroup,
}

pub struct SceneObject {
    /// Human-assigned lookup name; uniqueness is by convention only.
    pub alias: Option<String>,

    // Geometry, immutable after the object joins a scene.
    positions: Vec<[f32; 3]>,
    indices: Vec<u16>,
    normals: Vec<[f32; 3]>,

    // Per-vertex attributes some model files carry. The built-in vertex
    // stream is position + normal only, so these are never uploaded; they
    // are kept for callers that read them back (see `scalars()` /
    // `texture_coords()`).
    scalars: Option<Vec<f32>>,
    texture_coords: Option<Vec<[f32; 2]>>,

    pub material: Material,
    pub wireframe: bool,
    pub visible: bool,

    /// Flat color-id for the off-screen picking pass; must be distinct
    /// across the scene.
    pub picking_color: Option<[f32; 4]>,
    /// World-space offset applied during traversal.
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
    /// Diffuse color saved when a hit highlights the object, restored when
    /// the hit is cleared.
    pub previous_diffuse: Option<[f32; 4]>,

    pub(crate) gpu: Option<ObjectGpuResources>,
}

impl SceneObject {
    pub fn new(geometry: GeometryData) -> Self {
        Self::from_parts(geometry.positions, geometry.indices, None, None, Material::default())
    }

    pub fn from_parts(
        positions: Vec<[f32; 3]>,
        indices: Vec<u16>,
        scalars: Option<Vec<f32>>,
        texture_coords: Option<Vec<[f32; 2]>>,
        material: Material,
    ) -> Self {
        Self {
            alias: None,
            positions,
            indices,
            normals: Vec::new(),
            scalars,
            texture_coords,
            material,
            wireframe: false,
            visible: true,
            picking_color: None,
            position: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            previous_diffuse: None,
            gpu: None,
        }
    }

    /// The non-pickable wireframe ground grid the demos use.
    pub fn floor(dimension: f32, lines: u32) -> Self {
        let mut object = Self::new(crate::gfx::geometry::floor(dimension, lines));
        object.alias = Some("floor".into());
        object.wireframe = true;
        object.material.diffuse = [0.7, 0.7, 0.7, 1.0];
        object
    }

    /// Coordinate axis helper, wireframe and non-pickable.
    pub fn axis(dimension: f32) -> Self {
        let mut object = Self::new(crate::gfx::geometry::axis(dimension));
        object.alias = Some("axis".into());
        object.wireframe = true;
        object
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Applies the closed override set.
    pub fn with_options(mut self, options: &ObjectOptions) -> Self {
        self.position = options.position;
        self.scale = options.scale;
        if let Some(diffuse) = options.diffuse {
            self.material.diffuse = diffuse;
        }
        if let Some(wireframe) = options.wireframe {
            self.wireframe = wireframe;
        }
        self.picking_color = options.picking_color;
        self.visible = options.visible;
        self
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Per-vertex scalars from the source asset, if it had any. Not part
    /// of the GPU vertex stream; exposed for application-side use.
    pub fn scalars(&self) -> Option<&[f32]> {
        self.scalars.as_deref()
    }

    /// Per-vertex texture coordinates from the source asset, if it had
    /// any. Not part of the GPU vertex stream; exposed for
    /// application-side use.
    pub fn texture_coords(&self) -> Option<&[[f32; 2]]> {
        self.texture_coords.as_deref()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu.is_some()
    }

    /// Fills in vertex normals for solid geometry. Wireframe line lists
    /// keep zeroed normals; the flat shading path never reads them.
    pub(crate) fn ensure_normals(&mut self) {
        if !self.normals.is_empty() {
            return;
        }
        if self.wireframe {
            self.normals = vec![[0.0; 3]; self.positions.len()];
        } else {
            self.normals = crate::gfx::geometry::vertex_normals(&self.positions, &self.indices);
        }
    }

    pub(crate) fn material_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            diffuse: self.material.diffuse,
            ambient: self.material.ambient,
            specular: self.material.specular,
            picking_color: self.picking_color.unwrap_or([0.0, 0.0, 0.0, 0.0]),
            params: [self.material.specular_exponent, self.material.opacity, 0.0, 0.0],
            flags: [self.wireframe as u32, self.material.illum as u32, 0, 0],
        }
    }

    /// Creates the object's vertex/index/uniform buffers. Called once; the
    /// buffers are never recreated, only rebound during traversal.
    pub(crate) fn init_gpu_resources(&mut self, device: &Device, layout: &wgpu::BindGroupLayout) {
        if self.gpu.is_some() {
            return;
        }

        let vertices: Vec<Vertex3D> = self
            .positions
            .iter()
            .zip(self.normals.iter())
            .map(|(&position, &normal)| Vertex3D { position, normal })
            .collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let matrix_ubo = UniformBuffer::new_with_data(device, &MatrixUniform::default());
        let material_ubo = UniformBuffer::new_with_data(device, &self.material_uniform());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: matrix_ubo.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: material_ubo.binding_resource(),
                },
            ],
        });

        self.gpu = Some(ObjectGpuResources {
            vertex_buffer,
            index_buffer,
            matrix_ubo,
            material_ubo,
            bind_group,
        });
    }

    /// Syncs the material uniform to the GPU if the object has resources.
    /// Cheap when nothing changed; the buffer wrapper skips identical
    /// writes.
    pub(crate) fn update_material(&mut self, queue: &wgpu::Queue) {
        let uniform = self.material_uniform();
        if let Some(gpu) = &mut self.gpu {
            gpu.material_ubo.update_content(queue, uniform);
        }
    }
}

// Manual impl: GPU resources have no useful Debug output, and full vertex
// dumps drown the interesting fields.
impl fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneObject")
            .field("alias", &self.alias)
            .field("positions", &self.positions.len())
            .field("indices", &self.indices.len())
            .field("material", &self.material)
            .field("wireframe", &self.wireframe)
            .field("visible", &self.visible)
            .field("picking_color", &self.picking_color)
            .field("position", &self.position)
            .field("scale", &self.scale)
            .field("has_gpu_resources", &self.gpu.is_some())
            .finish_non_exhaustive()
    }
}

/// Draw helpers binding an object's buffers into a render pass.
pub trait DrawObject<'a> {
    fn draw_object(&mut self, object: &'a SceneObject);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_object(&mut self, object: &'b SceneObject) {
        let gpu = match &object.gpu {
            Some(gpu) => gpu,
            None => return, // Not uploaded yet
        };

        self.set_bind_group(1, &gpu.bind_group, &[]);
        self.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        self.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        self.draw_indexed(0..object.index_count(), 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry;

    #[test]
    fn options_apply_only_recognized_overrides() {
        let options = ObjectOptions {
            position: Vector3::new(1.0, 2.0, 3.0),
            diffuse: Some([0.5, 0.5, 0.5, 1.0]),
            picking_color: Some([0.1, 0.2, 0.3, 1.0]),
            ..Default::default()
        };

        let object = SceneObject::new(geometry::cube(1.0)).with_options(&options);
        assert_eq!(object.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(object.material.diffuse, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(object.picking_color, Some([0.1, 0.2, 0.3, 1.0]));
        // Untouched fields keep their defaults.
        assert_eq!(object.material.ambient, [0.2, 0.2, 0.2, 1.0]);
        assert!(object.visible);
        assert!(!object.wireframe);
    }

    #[test]
    fn debug_output_summarizes_buffers() {
        let object = SceneObject::new(geometry::cube(1.0)).with_alias("box");
        let debug = format!("{:?}", object);
        assert!(debug.contains("box"));
        assert!(debug.contains("positions: 8"));
        assert!(debug.contains("has_gpu_resources: false"));
    }

    #[test]
    fn floor_is_wireframe_and_unpickable() {
        let floor = SceneObject::floor(80.0, 20);
        assert_eq!(floor.alias.as_deref(), Some("floor"));
        assert!(floor.wireframe);
        assert!(floor.picking_color.is_none());
    }

    #[test]
    fn wireframe_objects_skip_normal_computation() {
        let mut floor = SceneObject::floor(10.0, 2);
        floor.ensure_normals();
        assert_eq!(floor.normals().len(), floor.positions().len());
        assert!(floor.normals().iter().all(|n| *n == [0.0; 3]));
    }

    #[test]
    fn solid_objects_get_unit_normals() {
        let mut object = SceneObject::new(geometry::cube(2.0));
        object.ensure_normals();
        for n in object.normals() {
            let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }
}
