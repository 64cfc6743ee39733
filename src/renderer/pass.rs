//! Render Pass Graph
//!
//! Passes live in a fixed pool of slots and are chained into an ordered
//! doubly-linked list through slot indices, so chain mutation never
//! invalidates a reference to a pass. The head pass only relies on the
//! frame data; every later pass may read its predecessor's outputs, and
//! every pass must leave its own outputs set when `submit` returns. The
//! tail's outputs feed the final blit to the default framebuffer.

use glam::IVec2;
use smallvec::SmallVec;

use crate::gfx::{
    GfxClearFlags, GfxContext, GfxFramebufferDesc, GfxFramebufferHandle, GfxTextureHandle,
    RENDER_TARGETS_MAX,
};
use crate::renderer::queue::{RenderQueueEntry, RenderQueueType};
use crate::renderer::{FrameData, PassShared};
use crate::resources::{ResourceId, Resources};

/// The size of the render pass pool.
pub const RENDER_PASSES_MAX: usize = 8;

/// Pool slots of the default pass chain, in creation order. `peek` takes
/// these regardless of the chain position a pass currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum RenderPassId {
    Shadow = 0,
    Light,
    Debug,
    Particle,
    Billboard,
    Hdr,
}

/// How a pass relates to its framebuffer: owners create, resize, and
/// destroy it; borrowers render into another pass's target and must touch
/// neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassFramebuffer {
    /// Renders to the default framebuffer.
    None,
    Owner(GfxFramebufferHandle),
    /// Borrows the framebuffer of the pass at this pool index.
    BorrowerFrom(usize),
}

/// The data slice of a pass; its behavior lives in the
/// [`RenderPassCallbacks`] paired with it.
pub struct PassData {
    pub queue_type: RenderQueueType,

    pub frame_size: IVec2,
    pub framebuffer: PassFramebuffer,
    pub framebuffer_desc: GfxFramebufferDesc,

    /// The shader context used across the render pass.
    pub shader_context: Option<ResourceId>,

    /// The textures handed to the next pass (or the final blit).
    pub outputs: SmallVec<[GfxTextureHandle; RENDER_TARGETS_MAX]>,

    pub previous: Option<usize>,
    pub next: Option<usize>,

    pub debug_name: String,
}

/// Per-pass behavior, invoked by the chain walker each frame.
pub trait RenderPassCallbacks {
    /// Pre-submission setup: uniforms, per-frame buffers, viewport.
    fn prepare(
        &mut self,
        _pass: &mut PassData,
        _ctx: &mut dyn GfxContext,
        _resources: &mut Resources,
        _frame: &FrameData,
        _shared: &mut PassShared,
    ) {
    }

    /// Renders the pass's queue. Must set `pass.outputs`, forwarding
    /// `shared.prev_outputs` when the pass has nothing to draw.
    fn submit(
        &mut self,
        pass: &mut PassData,
        ctx: &mut dyn GfxContext,
        resources: &mut Resources,
        queue: &RenderQueueEntry,
        shared: &mut PassShared,
    );

    /// Recreates size-dependent attachments. Never called on borrowers.
    fn resize(&mut self, _pass: &mut PassData, _ctx: &mut dyn GfxContext, _new_size: IVec2) {}

    /// Releases pass-owned GPU objects. Never called on borrowers.
    fn destroy(&mut self, _pass: &mut PassData, _ctx: &mut dyn GfxContext) {}
}

pub struct RenderPass {
    pub data: PassData,
    pub(crate) callbacks: Option<Box<dyn RenderPassCallbacks>>,
}

// ============================================================================
// PassChain
// ============================================================================

/// The pass pool plus the head/tail of the chained order.
#[derive(Default)]
pub struct PassChain {
    pool: Vec<RenderPass>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl PassChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a pass slot. When `parent` is given, the pass borrows the
    /// parent's framebuffer, descriptor, and frame size instead of owning
    /// its own.
    pub fn alloc(
        &mut self,
        mut data: PassData,
        callbacks: Box<dyn RenderPassCallbacks>,
        parent: Option<usize>,
    ) -> usize {
        assert!(
            self.pool.len() < RENDER_PASSES_MAX,
            "Render pass pool exhausted"
        );

        if let Some(parent_index) = parent {
            let parent_pass = &self.pool[parent_index].data;
            data.framebuffer = PassFramebuffer::BorrowerFrom(parent_index);
            data.framebuffer_desc = parent_pass.framebuffer_desc;
            data.frame_size = parent_pass.frame_size;
        }

        self.pool.push(RenderPass {
            data,
            callbacks: Some(callbacks),
        });
        let index = self.pool.len() - 1;
        log::trace!(
            "Created pass '{}' at index '{}'",
            self.pool[index].data.debug_name,
            index
        );
        index
    }

    #[inline]
    #[must_use]
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    #[inline]
    #[must_use]
    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Returns the pass at a pool slot, regardless of chain position.
    #[must_use]
    pub fn peek(&self, index: usize) -> &RenderPass {
        assert!(index < self.pool.len(), "Out-of-bounds render pass peek");
        &self.pool[index]
    }

    #[must_use]
    pub fn peek_mut(&mut self, index: usize) -> &mut RenderPass {
        assert!(index < self.pool.len(), "Out-of-bounds render pass peek");
        &mut self.pool[index]
    }

    /// Attaches a pass at the end of the chain.
    pub fn append(&mut self, index: usize) {
        assert!(index < self.pool.len(), "Out-of-bounds render pass append");

        match self.tail {
            None => {
                self.head = Some(index);
                self.tail = Some(index);
                self.pool[index].data.previous = None;
                self.pool[index].data.next = None;
            }
            Some(tail) => {
                self.pool[tail].data.next = Some(index);
                self.pool[index].data.previous = Some(tail);
                self.pool[index].data.next = None;
                self.tail = Some(index);
            }
        }

        log::trace!(
            "Appended pass '{}' to the chain",
            self.pool[index].data.debug_name
        );
    }

    /// Attaches a pass before the current head.
    pub fn prepend(&mut self, index: usize) {
        assert!(index < self.pool.len(), "Out-of-bounds render pass prepend");

        match self.head {
            None => {
                self.head = Some(index);
                self.tail = Some(index);
                self.pool[index].data.previous = None;
                self.pool[index].data.next = None;
            }
            Some(head) => {
                self.pool[head].data.previous = Some(index);
                self.pool[index].data.next = Some(head);
                self.pool[index].data.previous = None;
                self.head = Some(index);
            }
        }

        log::trace!(
            "Prepended pass '{}' to the chain",
            self.pool[index].data.debug_name
        );
    }

    /// Splices a pass into the chain right after the pass at pool slot
    /// `after`. Splicing after the tail is an append.
    pub fn insert(&mut self, index: usize, after: usize) {
        assert!(
            index < self.pool.len() && after < self.pool.len(),
            "Out-of-bounds render pass insertion"
        );

        let Some(next) = self.pool[after].data.next else {
            self.append(index);
            return;
        };

        self.pool[next].data.previous = Some(index);
        self.pool[index].data.next = Some(next);
        self.pool[index].data.previous = Some(after);
        self.pool[after].data.next = Some(index);

        log::trace!(
            "Inserted pass '{}' after index '{}'",
            self.pool[index].data.debug_name,
            after
        );
    }

    /// Unlinks the pass at pool slot `index` from the chain. The slot
    /// itself stays allocated.
    pub fn remove(&mut self, index: usize) {
        assert!(index < self.pool.len(), "Out-of-bounds render pass removal");

        let previous = self.pool[index].data.previous;
        let next = self.pool[index].data.next;

        if let Some(previous) = previous {
            self.pool[previous].data.next = next;
        }
        if let Some(next) = next {
            self.pool[next].data.previous = previous;
        }
        if self.head == Some(index) {
            self.head = next;
        }
        if self.tail == Some(index) {
            self.tail = previous;
        }

        self.pool[index].data.previous = None;
        self.pool[index].data.next = None;

        log::trace!("Removed pass '{}'", self.pool[index].data.debug_name);
    }

    /// The chained execution order, head to tail.
    #[must_use]
    pub fn order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.pool.len());
        let mut current = self.head;
        while let Some(index) = current {
            order.push(index);
            current = self.pool[index].data.next;
        }
        order
    }

    /// Resolves a pass's framebuffer, following borrow links.
    #[must_use]
    pub fn resolve_framebuffer(&self, index: usize) -> Option<GfxFramebufferHandle> {
        let mut current = index;
        loop {
            match self.pool[current].data.framebuffer {
                PassFramebuffer::None => return None,
                PassFramebuffer::Owner(handle) => return Some(handle),
                PassFramebuffer::BorrowerFrom(parent) => current = parent,
            }
        }
    }

    /// Resolves the pool index that owns a pass's framebuffer.
    #[must_use]
    pub fn resolve_owner(&self, index: usize) -> usize {
        let mut current = index;
        while let PassFramebuffer::BorrowerFrom(parent) = self.pool[current].data.framebuffer {
            current = parent;
        }
        current
    }
}

/// Builds a blank [`PassData`].
#[must_use]
pub fn pass_data(queue_type: RenderQueueType, debug_name: &str) -> PassData {
    PassData {
        queue_type,
        frame_size: IVec2::ZERO,
        framebuffer: PassFramebuffer::None,
        framebuffer_desc: GfxFramebufferDesc {
            clear_flags: GfxClearFlags::empty(),
            ..Default::default()
        },
        shader_context: None,
        outputs: SmallVec::new(),
        previous: None,
        next: None,
        debug_name: debug_name.to_string(),
    }
}
