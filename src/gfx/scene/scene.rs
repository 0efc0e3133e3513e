//! Scene container and traversal.

use std::ops::ControlFlow;
use std::path::Path;

use wgpu::Device;

use super::{
    asset,
    object::{ObjectOptions, SceneObject},
};

/// Ordered list of renderable objects. Render order is insertion order;
/// there is no spatial structure behind it.
#[derive(Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object, computing vertex normals for solid geometry.
    /// Returns the object's index, stable for the scene's lifetime.
    pub fn add(&mut self, mut object: SceneObject) -> usize {
        object.ensure_normals();
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Loads one JSON model file into the scene, with `alias` overriding
    /// whatever name the asset carries. Failures are logged and swallowed
    /// so one broken asset cannot take down a batch load.
    pub fn load(
        &mut self,
        path: impl AsRef<Path>,
        alias: Option<&str>,
        options: &ObjectOptions,
    ) -> Option<usize> {
        let path = path.as_ref();
        match asset::load_model(path) {
            Ok(mut object) => {
                if let Some(alias) = alias {
                    object.alias = Some(alias.to_string());
                }
                let index = self.add(object.with_options(options));
                log::debug!("loaded {} as object {}", path.display(), index);
                Some(index)
            }
            Err(err) => {
                log::warn!("skipping asset: {}", err);
                None
            }
        }
    }

    /// Loads a numbered series `{prefix}1.json .. {prefix}{count}.json`,
    /// aliasing each part `{alias}{n}` when an alias is given. Each part
    /// loads independently; a missing part does not stop the rest.
    /// Returns how many parts loaded.
    pub fn load_by_parts(
        &mut self,
        prefix: impl AsRef<Path>,
        count: u32,
        alias: Option<&str>,
        options: &ObjectOptions,
    ) -> usize {
        let prefix = prefix.as_ref();
        let stem = prefix
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut loaded = 0;
        for part in 1..=count {
            let path = prefix.with_file_name(format!("{}{}.json", stem, part));
            let part_alias = alias.map(|a| format!("{}{}", a, part));
            if self.load(&path, part_alias.as_deref(), options).is_some() {
                loaded += 1;
            }
        }
        loaded
    }

    /// Visits every object in insertion order. Returning
    /// `ControlFlow::Break` stops the walk; the index where it stopped is
    /// returned.
    pub fn traverse<F>(&mut self, mut visit: F) -> Option<usize>
    where
        F: FnMut(usize, &mut SceneObject) -> ControlFlow<()>,
    {
        for (index, object) in self.objects.iter_mut().enumerate() {
            if let ControlFlow::Break(()) = visit(index, object) {
                return Some(index);
            }
        }
        None
    }

    /// First object whose alias matches, if any.
    pub fn get(&self, alias: &str) -> Option<&SceneObject> {
        self.objects
            .iter()
            .find(|o| o.alias.as_deref() == Some(alias))
    }

    pub fn get_mut(&mut self, alias: &str) -> Option<&mut SceneObject> {
        self.objects
            .iter_mut()
            .find(|o| o.alias.as_deref() == Some(alias))
    }

    pub fn object(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut SceneObject> {
        self.objects.get_mut(index)
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Creates GPU buffers for any object that does not have them yet.
    /// Safe to call every frame.
    pub(crate) fn init_gpu_resources(&mut self, device: &Device, layout: &wgpu::BindGroupLayout) {
        for object in &mut self.objects {
            object.init_gpu_resources(device, layout);
        }
    }

    /// Pushes dirty material uniforms to the GPU.
    pub(crate) fn update_materials(&mut self, queue: &wgpu::Queue) {
        for object in &mut self.objects {
            object.update_material(queue);
        }
    }
}
