//! # Color-Id Object Picking
//!
//! Picking works by rendering the scene a second time into an off-screen
//! target where every pickable object is drawn in its flat `picking_color`.
//! A click reads back the single pixel under the cursor and compares it
//! against each object's color-id with a one-step-per-channel tolerance to
//! absorb 8-bit quantization.
//!
//! Picked objects form a toggle set: hitting an object adds it, hitting it
//! again removes it and restores its saved diffuse color. `stop()` commits
//! the current set through the process callback and clears it.

use cgmath::Vector3;

use crate::gfx::{
    camera::Camera,
    resources::TextureResource,
    scene::{Scene, SceneObject},
};

/// Off-screen render target for the flat color-id pass.
pub struct PickingTarget {
    pub color: TextureResource,
    pub depth: TextureResource,
    pub width: u32,
    pub height: u32,
}

/// Hooks invoked as the picked set changes.
#[derive(Default)]
pub struct PickerCallbacks {
    pub on_add: Option<Box<dyn FnMut(usize, &mut SceneObject)>>,
    pub on_remove: Option<Box<dyn FnMut(usize, &mut SceneObject)>>,
    pub on_process: Option<Box<dyn FnMut(&[usize], &mut Scene)>>,
}

#[derive(Default)]
pub struct Picker {
    target: Option<PickingTarget>,
    /// Indices into the scene's object list, in pick order.
    hits: Vec<usize>,
    pub callbacks: PickerCallbacks,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)creates the off-screen target at the given size. Call on
    /// startup and whenever the window resizes so the target tracks the
    /// main framebuffer.
    pub fn configure(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if let Some(target) = &self.target {
            if target.width == width && target.height == height {
                return;
            }
        }
        log::debug!("picking target {}x{}", width, height);
        self.target = Some(PickingTarget {
            color: TextureResource::create_picking_target(device, width, height),
            depth: TextureResource::create_depth_texture(device, width, height, "Picking Depth"),
            width,
            height,
        });
    }

    /// Tracks a surface resize by reallocating the off-screen target.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.configure(device, width, height);
    }

    pub fn target(&self) -> Option<&PickingTarget> {
        self.target.as_ref()
    }

    pub fn hits(&self) -> &[usize] {
        &self.hits
    }

    /// Reads the color-id pixel under `coords` and toggles the matching
    /// object. Coordinates use a bottom-left origin like the rest of the
    /// camera math. Returns the toggled object's index.
    pub fn find(
        &mut self,
        coords: (u32, u32),
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &mut Scene,
    ) -> Option<usize> {
        let pixel = self.read_pixel(device, queue, coords)?;
        self.resolve(pixel, scene)
    }

    /// Matches a readback pixel against the scene's color-ids and toggles
    /// the hit. Pure scene-side half of [`find`].
    pub fn resolve(&mut self, pixel: [u8; 4], scene: &mut Scene) -> Option<usize> {
        let mut found = None;
        scene.traverse(|index, object| {
            match object.picking_color {
                Some(color) if matches_picking_color(pixel, color) => {
                    found = Some((index, color));
                    std::ops::ControlFlow::Break(())
                }
                _ => std::ops::ControlFlow::Continue(()),
            }
        });

        let (index, color) = found?;
        if let Some(position) = self.hits.iter().position(|&hit| hit == index) {
            self.hits.remove(position);
            if let Some(object) = scene.object_mut(index) {
                if let Some(previous) = object.previous_diffuse.take() {
                    object.material.diffuse = previous;
                }
                if let Some(on_remove) = &mut self.callbacks.on_remove {
                    on_remove(index, object);
                }
            }
            log::debug!("unpicked object {}", index);
        } else {
            self.hits.push(index);
            if let Some(object) = scene.object_mut(index) {
                // Highlight by showing the color-id; the saved diffuse
                // comes back when the hit is removed or committed.
                object.previous_diffuse = Some(object.material.diffuse);
                object.material.diffuse = color;
                if let Some(on_add) = &mut self.callbacks.on_add {
                    on_add(index, object);
                }
            }
            log::debug!("picked object {}", index);
        }
        Some(index)
    }

    /// Commits the current picked set through the process callback,
    /// restores every hit's saved diffuse color, then clears the set.
    pub fn stop(&mut self, scene: &mut Scene) {
        if !self.hits.is_empty() {
            if let Some(on_process) = &mut self.callbacks.on_process {
                on_process(&self.hits, scene);
            }
        }
        for &hit in &self.hits {
            if let Some(object) = scene.object_mut(hit) {
                if let Some(previous) = object.previous_diffuse.take() {
                    object.material.diffuse = previous;
                }
            }
        }
        self.hits.clear();
    }

    /// Drags every picked object in the camera's screen plane. The step
    /// scales with camera distance so far-away scenes move usefully.
    pub fn move_hits(&self, dx: f32, dy: f32, camera: &Camera, scene: &mut Scene) {
        let position = camera.position();
        let factor = position.x.max(position.y).max(position.z) / 2000.0;
        let step: Vector3<f32> = camera.right() * (dx * factor) + camera.up() * (-dy * factor);
        for &hit in &self.hits {
            if let Some(object) = scene.object_mut(hit) {
                object.position += step;
            }
        }
    }

    /// Copies the target row under the cursor to a staging buffer and
    /// returns the pixel at `x`. Blocks until the copy completes.
    fn read_pixel(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        coords: (u32, u32),
    ) -> Option<[u8; 4]> {
        let target = self.target.as_ref()?;
        let (x, y) = coords;
        if x >= target.width || y >= target.height {
            return None;
        }
        // Texture rows run top to bottom; pick coords run bottom to top.
        let row = target.height - 1 - y;

        // Row copies must pad bytes_per_row to 256; read the whole row and
        // index the pixel out of it.
        let unpadded = target.width * 4;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Picking Readback"),
            size: padded as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Picking Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.color.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: row, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: target.width,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = device.poll(wgpu::PollType::Wait);
        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                log::warn!("picking readback failed: {}", err);
                return None;
            }
            Err(_) => return None,
        }

        let data = slice.get_mapped_range();
        let offset = (x * 4) as usize;
        let pixel = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        drop(data);
        staging.unmap();
        Some(pixel)
    }
}

/// Channel-wise comparison between an 8-bit readback pixel and a float
/// color-id. Quantizing to bytes can land one step off, so each of R, G
/// and B may differ by at most one. Alpha is ignored.
pub fn matches_picking_color(pixel: [u8; 4], color: [f32; 4]) -> bool {
    pixel[..3]
        .iter()
        .zip(color[..3].iter())
        .all(|(&byte, &channel)| ((channel * 255.0).round() - byte as f32).abs() <= 1.0)
}
