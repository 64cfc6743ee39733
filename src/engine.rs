//! Engine Core
//!
//! [`Engine`] is the central coordinator: it owns the resource manager,
//! the renderer, the entity world, the event bus, and the 2D batch
//! renderer, and drives them through the frame loop. It carries no window
//! management of its own, so any windowing frontend can drive it.

use glam::IVec2;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::errors::Result;
use crate::events::{Event, Events};
use crate::gfx::wgpu_backend::WgpuContext;
use crate::gfx::{GfxContext, GfxContextDesc};
use crate::renderer::{BatchRenderer, FrameData, Renderer};
use crate::resources::{RESOURCE_CACHE, Resources};
use crate::world::EntityWorld;

pub struct Engine {
    pub resources: Resources,
    pub renderer: Renderer,
    pub world: EntityWorld,
    pub events: Events,
    pub batch: BatchRenderer,

    time: f32,
    frame_count: u64,
    fps: f32,
}

impl Engine {
    /// Initializes the engine over a window's surface.
    pub fn new<W>(window: W, width: u32, height: u32) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let ctx = WgpuContext::new_blocking(window, width, height, GfxContextDesc::default())?;
        Self::from_context(Box::new(ctx))
    }

    /// Initializes the engine over an already-built graphics context.
    pub fn from_context(ctx: Box<dyn GfxContext>) -> Result<Self> {
        let mut resources = Resources::new();
        let mut renderer = Renderer::new(ctx, &mut resources)?;

        let white = resources
            .get_texture(renderer.defaults().albedo_texture)
            .handle;
        let batch = BatchRenderer::new(renderer.context(), white)?;

        Ok(Self {
            resources,
            renderer,
            world: EntityWorld::new(),
            events: Events::new(),
            batch,
            time: 0.0,
            frame_count: 0,
            fps: 0.0,
        })
    }

    /// Total elapsed time in seconds since the engine started.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Total frames rendered since startup.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Smoothed frames-per-second estimate.
    #[inline]
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[must_use]
    pub fn size(&self) -> IVec2 {
        self.renderer.viewport_size()
    }

    /// Steps the world by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        self.frame_count += 1;
        if dt > 0.0 {
            let instant = 1.0 / dt;
            self.fps = if self.fps <= 0.0 {
                instant
            } else {
                self.fps * 0.9 + instant * 0.1
            };
        }

        self.world.update(&self.resources, dt);
    }

    /// Renders one frame: begins with `frame`, sweeps the world into the
    /// render queues, and runs the pass chain. Presenting stays with the
    /// windowing frontend (or [`Engine::present`]).
    pub fn render(&mut self, frame: FrameData) {
        self.renderer.begin(frame);
        self.world.render(&mut self.renderer, &mut self.resources);
        self.renderer.end(&mut self.resources);
    }

    /// Submits the frame's recorded GPU work and presents it.
    pub fn present(&mut self) {
        self.renderer.context().present();
    }

    /// Routes an event into the engine: window geometry reaches the
    /// renderer, everything is forwarded to the listeners.
    pub fn handle_event(&mut self, event: &Event) {
        if let Event::WindowFramebufferResized { width, height } = *event {
            self.renderer
                .resize(IVec2::new(width as i32, height as i32));
        }

        self.events.dispatch(event);
    }

    /// Tears the engine down in dependency order.
    pub fn shutdown(&mut self) {
        self.world.clear();
        self.renderer.shutdown();

        // The cache group owns every engine default; releasing it frees
        // the GPU objects behind them.
        let ctx = self.renderer.context();
        self.resources.destroy_group(ctx, RESOURCE_CACHE);
    }
}
