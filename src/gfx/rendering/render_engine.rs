//! WGPU-based rendering engine
//!
//! Owns the surface, device, and pipelines, and renders each frame in two
//! passes: an off-screen flat color-id pass into the picker's target, then
//! the shaded on-screen pass. Writing a uniform buffer mid-submission is
//! not possible, so the pass flag lives in two separate global uniform
//! buffers with their own bind groups.

use std::sync::Arc;

use cgmath::Matrix4;
use wgpu::TextureFormat;

use crate::{
    gfx::{
        camera::Camera,
        picking::Picker,
        resources::TextureResource,
        scene::{object::DrawObject, Scene, Vertex3D},
        transforms::Transforms,
    },
    wgpu_utils::UniformBuffer,
};

/// Scene-wide uniform data shared by every object in a pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub light_position: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    /// x = 1 for the off-screen color-id pass.
    pub flags: [u32; 4],
}

impl Default for GlobalUniform {
    fn default() -> Self {
        Self {
            light_position: [0.0, 5.0, 20.0, 1.0],
            light_ambient: [0.0, 0.0, 0.0, 1.0],
            light_diffuse: [1.0, 1.0, 1.0, 1.0],
            flags: [0, 0, 0, 0],
        }
    }
}

/// Light settings applied to the shaded pass.
#[derive(Debug, Clone, Copy)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 20.0],
            ambient: [0.0, 0.0, 0.0, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    depth_texture: TextureResource,

    object_layout: wgpu::BindGroupLayout,

    shaded_ubo: UniformBuffer<GlobalUniform>,
    shaded_bind_group: wgpu::BindGroup,
    flat_bind_group: wgpu::BindGroup,

    triangle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    flat_pipeline: wgpu::RenderPipeline,

    light_config: LightConfig,
}

impl Renderer {
    /// Creates a renderer for the given window surface.
    ///
    /// # Panics
    /// Panics if no wgpu adapter or device is available.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Renderer {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = {
            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("WGPU Device"),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: 4096,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                    memory_hints: wgpu::MemoryHints::default(),
                    trace: wgpu::Trace::Off,
                })
                .await
                .expect("Failed to request a device!")
        };

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, width, height, "depth_texture");

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let light_config = LightConfig::default();
        let shaded_ubo =
            UniformBuffer::new_with_data(&device, &global_uniform(&light_config, false));
        let flat_ubo = UniformBuffer::new_with_data(&device, &global_uniform(&light_config, true));

        let shaded_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shaded_ubo.binding_resource(),
            }],
        });
        let flat_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Flat Global Bind Group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: flat_ubo.binding_resource(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let triangle_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::TriangleList,
            "Triangle Pipeline",
        );
        let line_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            format,
            wgpu::PrimitiveTopology::LineList,
            "Line Pipeline",
        );
        let flat_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            TextureResource::PICKING_FORMAT,
            wgpu::PrimitiveTopology::TriangleList,
            "Flat Pipeline",
        );

        Renderer {
            surface,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            format,
            depth_texture,
            object_layout,
            shaded_ubo,
            shaded_bind_group,
            flat_bind_group,
            triangle_pipeline,
            line_pipeline,
            flat_pipeline,
            light_config,
        }
    }

    /// Renders one frame: the off-screen color-id pass, then the shaded
    /// pass. A lost or outdated surface reconfigures and skips the frame,
    /// matching how a recoverable context loss is handled.
    pub fn render_frame(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        transforms: &mut Transforms,
        picker: &mut Picker,
    ) {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => return,
            Err(err) => {
                log::error!("failed to acquire surface texture: {}", err);
                return;
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        picker.configure(&self.device, self.config.width, self.config.height);
        scene.init_gpu_resources(&self.device, &self.object_layout);
        scene.update_materials(&self.queue);
        self.shaded_ubo
            .update_content(&self.queue, global_uniform(&self.light_config, false));

        self.update_object_matrices(scene, camera, transforms);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: flat color-ids into the picker's off-screen target.
        if let Some(target) = picker.target() {
            let mut flat_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Picking Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            flat_pass.set_bind_group(0, &self.flat_bind_group, &[]);
            flat_pass.set_pipeline(&self.flat_pipeline);
            for object in scene.objects() {
                // Only solid pickable objects leave a color-id; the floor
                // and other wireframes stay out of the pick buffer.
                if object.visible && !object.wireframe && object.picking_color.is_some() {
                    flat_pass.draw_object(object);
                }
            }
        }

        // PASS 2: shaded scene to the window.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.9,
                            g: 0.9,
                            b: 0.9,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.shaded_bind_group, &[]);
            for object in scene.objects() {
                if !object.visible {
                    continue;
                }
                if object.wireframe {
                    render_pass.set_pipeline(&self.line_pipeline);
                } else {
                    render_pass.set_pipeline(&self.triangle_pipeline);
                }
                render_pass.draw_object(object);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Walks the scene applying each object's position and scale on top of
    /// the camera's view transform, pushing the result into the object's
    /// matrix uniform.
    fn update_object_matrices(
        &self,
        scene: &mut Scene,
        camera: &Camera,
        transforms: &mut Transforms,
    ) {
        transforms.calculate_model_view(camera);
        transforms.update_perspective(camera, self.config.width, self.config.height);

        let queue = &self.queue;
        scene.traverse(|_, object| {
            transforms.push();
            transforms.model_view = transforms.model_view
                * Matrix4::from_translation(object.position)
                * Matrix4::from_nonuniform_scale(
                    object.scale.x,
                    object.scale.y,
                    object.scale.z,
                );
            if let Some(gpu) = &mut object.gpu {
                transforms.set_matrix_uniforms(queue, &mut gpu.matrix_ubo);
            }
            transforms.pop();
            std::ops::ControlFlow::Continue(())
        });
    }

    /// Reconfigures the surface and depth buffer for a new window size and
    /// reallocates the picker's off-screen target to match.
    pub fn resize(&mut self, width: u32, height: u32, picker: &mut Picker) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
        picker.resize(&self.device, width, height);
    }

    pub fn set_light(&mut self, light_config: LightConfig) {
        self.light_config = light_config;
    }

    pub fn light(&self) -> LightConfig {
        self.light_config
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

fn global_uniform(light: &LightConfig, offscreen: bool) -> GlobalUniform {
    GlobalUniform {
        light_position: [light.position[0], light.position[1], light.position[2], 1.0],
        light_ambient: light.ambient,
        light_diffuse: light.diffuse,
        flags: [offscreen as u32, 0, 0, 0],
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: TextureFormat,
    topology: wgpu::PrimitiveTopology,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex3D::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: TextureResource::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
