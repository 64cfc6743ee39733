//! Resource Manager
//!
//! Groups of cached, handle-addressed assets. A [`ResourceId`] carries its
//! owning group, a kind tag, a dense index, and the group's generation at
//! push time; it is opaque to consumers and only dereferenced here.
//!
//! Resources live exactly as long as their group: `push_*` appends into the
//! group's typed arena, `destroy_group` releases every GPU object the group
//! owns and bumps the group generation so surviving ids go stale. Group 0
//! is the engine-owned default cache ([`RESOURCE_CACHE`]), created at
//! manager init and destroyed at shutdown.

pub mod font;
pub mod material;
pub mod mesh;
pub mod nbr;
pub mod shader_context;

pub use font::{Font, Glyph};
pub use material::{Material, MaterialDesc};
pub use mesh::{GeometryType, Mesh, Model, Skybox, load_geometry};
pub use shader_context::{ShaderContext, UniformValue};

use crate::animation::{AnimationClip, Skeleton};
use crate::errors::Result;
use crate::gfx::{
    CUBEMAP_FACES_MAX, GfxBufferDesc, GfxBufferHandle, GfxBufferKind, GfxContext, GfxCubemapDesc,
    GfxCubemapHandle, GfxShaderDesc, GfxShaderHandle, GfxTextureDesc, GfxTextureHandle,
};

// ============================================================================
// Identifiers
// ============================================================================

/// A resource group namespace (a level, the engine cache, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceGroupId(pub u16);

/// The engine-owned default cache group.
pub const RESOURCE_CACHE: ResourceGroupId = ResourceGroupId(0);

/// The kind tag carried by every [`ResourceId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Cubemap,
    Shader,
    ShaderContext,
    Buffer,
    Material,
    Mesh,
    Model,
    Skybox,
    Font,
    Animation,
    Skeleton,
    AudioBuffer,
}

/// An opaque handle to a resource. Dereferenced only through [`Resources`];
/// `Resources::is_valid` is the sanctioned existence test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId {
    group: ResourceGroupId,
    kind: ResourceKind,
    index: u32,
    generation: u32,
}

impl ResourceId {
    #[inline]
    #[must_use]
    pub fn group(&self) -> ResourceGroupId {
        self.group
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

// ============================================================================
// Resource payloads
// ============================================================================

/// A pushed texture: the GPU handle, its cached bindless id (0 when the
/// backend has no bindless path), and the creation descriptor.
#[derive(Debug, Clone, Copy)]
pub struct TextureResource {
    pub handle: GfxTextureHandle,
    pub bindless_id: u64,
    pub desc: GfxTextureDesc,
}

#[derive(Debug, Clone, Copy)]
pub struct CubemapResource {
    pub handle: GfxCubemapHandle,
    pub desc: GfxCubemapDesc,
}

#[derive(Debug, Clone, Copy)]
pub struct ShaderResource {
    pub handle: GfxShaderHandle,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferResource {
    pub handle: GfxBufferHandle,
    pub kind: GfxBufferKind,
    pub size: usize,
}

/// PCM audio data consumed by the audio collaborator.
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer {
    pub channels: u8,
    pub sample_rate: u32,
    pub bits_per_sample: u8,
    pub data: Vec<u8>,
}

/// The five default material maps the engine substitutes for unset ones.
#[derive(Debug, Clone, Copy)]
pub struct MaterialMaps {
    pub albedo: ResourceId,
    pub roughness: ResourceId,
    pub metallic: ResourceId,
    pub normal: ResourceId,
    pub emissive: ResourceId,
}

// ============================================================================
// Groups
// ============================================================================

struct ResourceGroup {
    name: String,
    textures: Vec<TextureResource>,
    cubemaps: Vec<CubemapResource>,
    shaders: Vec<ShaderResource>,
    shader_contexts: Vec<ShaderContext>,
    buffers: Vec<BufferResource>,
    materials: Vec<Material>,
    meshes: Vec<Mesh>,
    models: Vec<Model>,
    skyboxes: Vec<Skybox>,
    fonts: Vec<Font>,
    animations: Vec<AnimationClip>,
    skeletons: Vec<Skeleton>,
    audio_buffers: Vec<AudioBuffer>,
}

impl ResourceGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            textures: Vec::new(),
            cubemaps: Vec::new(),
            shaders: Vec::new(),
            shader_contexts: Vec::new(),
            buffers: Vec::new(),
            materials: Vec::new(),
            meshes: Vec::new(),
            models: Vec::new(),
            skyboxes: Vec::new(),
            fonts: Vec::new(),
            animations: Vec::new(),
            skeletons: Vec::new(),
            audio_buffers: Vec::new(),
        }
    }

    fn len_of(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Texture => self.textures.len(),
            ResourceKind::Cubemap => self.cubemaps.len(),
            ResourceKind::Shader => self.shaders.len(),
            ResourceKind::ShaderContext => self.shader_contexts.len(),
            ResourceKind::Buffer => self.buffers.len(),
            ResourceKind::Material => self.materials.len(),
            ResourceKind::Mesh => self.meshes.len(),
            ResourceKind::Model => self.models.len(),
            ResourceKind::Skybox => self.skyboxes.len(),
            ResourceKind::Font => self.fonts.len(),
            ResourceKind::Animation => self.animations.len(),
            ResourceKind::Skeleton => self.skeletons.len(),
            ResourceKind::AudioBuffer => self.audio_buffers.len(),
        }
    }
}

struct GroupSlot {
    generation: u32,
    group: Option<ResourceGroup>,
}

// ============================================================================
// Resources
// ============================================================================

pub struct Resources {
    groups: Vec<GroupSlot>,
    default_maps: Option<MaterialMaps>,
}

impl Resources {
    /// Creates the manager with the engine cache group in place.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: vec![GroupSlot {
                generation: 0,
                group: Some(ResourceGroup::new("cache")),
            }],
            default_maps: None,
        }
    }

    /// Creates a new group namespace.
    pub fn create_group(&mut self, name: &str) -> ResourceGroupId {
        for (i, slot) in self.groups.iter_mut().enumerate() {
            if slot.group.is_none() {
                slot.group = Some(ResourceGroup::new(name));
                log::trace!("Created resource group '{name}' at slot {i}");
                return ResourceGroupId(i as u16);
            }
        }

        self.groups.push(GroupSlot {
            generation: 0,
            group: Some(ResourceGroup::new(name)),
        });
        log::trace!("Created resource group '{name}'");
        ResourceGroupId((self.groups.len() - 1) as u16)
    }

    /// Destroys a group and every GPU object its resources own. Surviving
    /// ids into the group become stale.
    pub fn destroy_group(&mut self, ctx: &mut dyn GfxContext, group_id: ResourceGroupId) {
        let slot = &mut self.groups[group_id.0 as usize];
        let Some(mut group) = slot.group.take() else {
            log::warn!("Destroying an already-destroyed resource group");
            return;
        };
        slot.generation += 1;

        for texture in &group.textures {
            ctx.texture_destroy(texture.handle);
        }
        for cubemap in &group.cubemaps {
            ctx.cubemap_destroy(cubemap.handle);
        }
        for context in &mut group.shader_contexts {
            context.release(ctx);
        }
        for shader in &group.shaders {
            ctx.shader_destroy(shader.handle);
        }
        for buffer in &group.buffers {
            ctx.buffer_destroy(buffer.handle);
        }

        log::trace!("Destroyed resource group '{}'", group.name);
    }

    /// Registers the default material maps substituted for unset ones.
    pub fn set_default_maps(&mut self, maps: MaterialMaps) {
        self.default_maps = Some(maps);
    }

    /// The sanctioned existence test for a handle.
    #[must_use]
    pub fn is_valid(&self, id: ResourceId) -> bool {
        let Some(slot) = self.groups.get(id.group.0 as usize) else {
            return false;
        };
        if slot.generation != id.generation {
            return false;
        }
        slot.group
            .as_ref()
            .is_some_and(|group| (id.index as usize) < group.len_of(id.kind))
    }

    fn group(&self, id: ResourceGroupId) -> &ResourceGroup {
        self.groups
            .get(id.0 as usize)
            .and_then(|slot| slot.group.as_ref())
            .unwrap_or_else(|| panic!("Invalid resource group {}", id.0))
    }

    fn group_mut(&mut self, id: ResourceGroupId) -> &mut ResourceGroup {
        self.groups
            .get_mut(id.0 as usize)
            .and_then(|slot| slot.group.as_mut())
            .unwrap_or_else(|| panic!("Invalid resource group {}", id.0))
    }

    fn make_id(&self, group: ResourceGroupId, kind: ResourceKind, index: usize) -> ResourceId {
        ResourceId {
            group,
            kind,
            index: index as u32,
            generation: self.groups[group.0 as usize].generation,
        }
    }

    fn check(&self, id: ResourceId, kind: ResourceKind) -> &ResourceGroup {
        assert!(
            id.kind == kind,
            "Resource kind mismatch: wanted {kind:?}, id is {:?}",
            id.kind
        );
        let slot = &self.groups[id.group.0 as usize];
        assert!(
            slot.generation == id.generation,
            "Stale resource id into destroyed group {}",
            id.group.0
        );
        slot.group
            .as_ref()
            .unwrap_or_else(|| panic!("Resource id into destroyed group {}", id.group.0))
    }

    // ------------------------------------------------------------------
    // Push
    // ------------------------------------------------------------------

    /// Creates a texture and caches its bindless id.
    pub fn push_texture(
        &mut self,
        ctx: &mut dyn GfxContext,
        group: ResourceGroupId,
        desc: &GfxTextureDesc,
        pixels: Option<&[u8]>,
    ) -> ResourceId {
        let handle = ctx.texture_create(desc, pixels);
        let bindless_id = ctx.texture_bindless_id(handle);

        let resource = TextureResource {
            handle,
            bindless_id,
            desc: *desc,
        };
        let arena = &mut self.group_mut(group).textures;
        arena.push(resource);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Texture, last_index)
    }

    pub fn push_cubemap(
        &mut self,
        ctx: &mut dyn GfxContext,
        group: ResourceGroupId,
        desc: &GfxCubemapDesc,
        faces: Option<&[&[u8]; CUBEMAP_FACES_MAX]>,
    ) -> ResourceId {
        let handle = ctx.cubemap_create(desc, faces);
        let arena = &mut self.group_mut(group).cubemaps;
        arena.push(CubemapResource {
            handle,
            desc: *desc,
        });
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Cubemap, last_index)
    }

    /// Compiles and caches a shader. Compile failures surface to the caller.
    pub fn push_shader(
        &mut self,
        ctx: &mut dyn GfxContext,
        group: ResourceGroupId,
        desc: &GfxShaderDesc,
    ) -> Result<ResourceId> {
        let handle = ctx.shader_create(desc)?;
        let arena = &mut self.group_mut(group).shaders;
        arena.push(ShaderResource { handle });
        let last_index = arena.len() - 1;
        Ok(self.make_id(group, ResourceKind::Shader, last_index))
    }

    /// Wraps a pushed shader in a context with its cached uniform table.
    pub fn push_shader_context(
        &mut self,
        ctx: &mut dyn GfxContext,
        group: ResourceGroupId,
        shader: ResourceId,
    ) -> ResourceId {
        let gfx_shader = self.get_shader(shader).handle;
        let context = ShaderContext::new(ctx, shader, gfx_shader);

        let arena = &mut self.group_mut(group).shader_contexts;
        arena.push(context);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::ShaderContext, last_index)
    }

    pub fn push_buffer(
        &mut self,
        ctx: &mut dyn GfxContext,
        group: ResourceGroupId,
        desc: &GfxBufferDesc,
    ) -> ResourceId {
        let handle = ctx.buffer_create(desc);
        let size = desc.data.map_or(desc.size, <[u8]>::len);

        let arena = &mut self.group_mut(group).buffers;
        arena.push(BufferResource {
            handle,
            kind: desc.kind,
            size,
        });
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Buffer, last_index)
    }

    /// Creates a material, substituting the engine default for every unset
    /// map so no consumer ever branches on a missing texture.
    pub fn push_material(&mut self, group: ResourceGroupId, desc: &MaterialDesc) -> ResourceId {
        let defaults = self
            .default_maps
            .expect("Default material maps must be registered before pushing materials");

        let material = Material {
            albedo_map: desc.albedo_id.unwrap_or(defaults.albedo),
            roughness_map: desc.roughness_id.unwrap_or(defaults.roughness),
            metallic_map: desc.metallic_id.unwrap_or(defaults.metallic),
            normal_map: desc.normal_id.unwrap_or(defaults.normal),
            emissive_map: desc.emissive_id.unwrap_or(defaults.emissive),
            metallic: desc.metallic,
            roughness: desc.roughness,
            emissive: desc.emissive,
            transparency: desc.transparency,
            color: desc.color,
            blend_factor: desc.blend_factor,
            stencil_ref: desc.stencil_ref,
            depth_mask: desc.depth_mask,
        };

        let arena = &mut self.group_mut(group).materials;
        arena.push(material);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Material, last_index)
    }

    pub fn push_mesh(&mut self, group: ResourceGroupId, mesh: Mesh) -> ResourceId {
        let arena = &mut self.group_mut(group).meshes;
        arena.push(mesh);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Mesh, last_index)
    }

    /// Generates and pushes one of the engine's primitive meshes.
    pub fn push_geometry(&mut self, group: ResourceGroupId, ty: GeometryType) -> ResourceId {
        self.push_mesh(group, Mesh::from_geometry(ty))
    }

    pub fn push_model(&mut self, group: ResourceGroupId, model: Model) -> ResourceId {
        let arena = &mut self.group_mut(group).models;
        arena.push(model);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Model, last_index)
    }

    pub fn push_skybox(&mut self, group: ResourceGroupId, cubemap: ResourceId) -> ResourceId {
        let arena = &mut self.group_mut(group).skyboxes;
        arena.push(Skybox { cubemap });
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Skybox, last_index)
    }

    pub fn push_font(&mut self, group: ResourceGroupId, font: Font) -> ResourceId {
        let arena = &mut self.group_mut(group).fonts;
        arena.push(font);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Font, last_index)
    }

    pub fn push_animation(&mut self, group: ResourceGroupId, clip: AnimationClip) -> ResourceId {
        let arena = &mut self.group_mut(group).animations;
        arena.push(clip);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Animation, last_index)
    }

    pub fn push_skeleton(&mut self, group: ResourceGroupId, skeleton: Skeleton) -> ResourceId {
        let arena = &mut self.group_mut(group).skeletons;
        arena.push(skeleton);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::Skeleton, last_index)
    }

    pub fn push_audio_buffer(&mut self, group: ResourceGroupId, buffer: AudioBuffer) -> ResourceId {
        let arena = &mut self.group_mut(group).audio_buffers;
        arena.push(buffer);
        let last_index = arena.len() - 1;
        self.make_id(group, ResourceKind::AudioBuffer, last_index)
    }

    // ------------------------------------------------------------------
    // Get
    // ------------------------------------------------------------------

    #[must_use]
    pub fn get_texture(&self, id: ResourceId) -> &TextureResource {
        &self.check(id, ResourceKind::Texture).textures[id.index as usize]
    }

    #[must_use]
    pub fn get_cubemap(&self, id: ResourceId) -> &CubemapResource {
        &self.check(id, ResourceKind::Cubemap).cubemaps[id.index as usize]
    }

    #[must_use]
    pub fn get_shader(&self, id: ResourceId) -> &ShaderResource {
        &self.check(id, ResourceKind::Shader).shaders[id.index as usize]
    }

    #[must_use]
    pub fn get_shader_context(&self, id: ResourceId) -> &ShaderContext {
        &self.check(id, ResourceKind::ShaderContext).shader_contexts[id.index as usize]
    }

    #[must_use]
    pub fn get_shader_context_mut(&mut self, id: ResourceId) -> &mut ShaderContext {
        self.check(id, ResourceKind::ShaderContext);
        &mut self.group_mut(id.group).shader_contexts[id.index as usize]
    }

    #[must_use]
    pub fn get_buffer(&self, id: ResourceId) -> &BufferResource {
        &self.check(id, ResourceKind::Buffer).buffers[id.index as usize]
    }

    #[must_use]
    pub fn get_material(&self, id: ResourceId) -> &Material {
        &self.check(id, ResourceKind::Material).materials[id.index as usize]
    }

    #[must_use]
    pub fn get_material_mut(&mut self, id: ResourceId) -> &mut Material {
        self.check(id, ResourceKind::Material);
        &mut self.group_mut(id.group).materials[id.index as usize]
    }

    #[must_use]
    pub fn get_mesh(&self, id: ResourceId) -> &Mesh {
        &self.check(id, ResourceKind::Mesh).meshes[id.index as usize]
    }

    #[must_use]
    pub fn get_model(&self, id: ResourceId) -> &Model {
        &self.check(id, ResourceKind::Model).models[id.index as usize]
    }

    #[must_use]
    pub fn get_skybox(&self, id: ResourceId) -> &Skybox {
        &self.check(id, ResourceKind::Skybox).skyboxes[id.index as usize]
    }

    #[must_use]
    pub fn get_font(&self, id: ResourceId) -> &Font {
        &self.check(id, ResourceKind::Font).fonts[id.index as usize]
    }

    #[must_use]
    pub fn get_animation(&self, id: ResourceId) -> &AnimationClip {
        &self.check(id, ResourceKind::Animation).animations[id.index as usize]
    }

    #[must_use]
    pub fn get_skeleton(&self, id: ResourceId) -> &Skeleton {
        &self.check(id, ResourceKind::Skeleton).skeletons[id.index as usize]
    }

    #[must_use]
    pub fn get_audio_buffer(&self, id: ResourceId) -> &AudioBuffer {
        &self.check(id, ResourceKind::AudioBuffer).audio_buffers[id.index as usize]
    }

    /// The display name of a group.
    #[must_use]
    pub fn group_name(&self, id: ResourceGroupId) -> &str {
        &self.group(id).name
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}
