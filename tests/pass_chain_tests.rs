//! Pass chain tests
//!
//! Tests for:
//! - Append / prepend / insert / remove link management
//! - Pool-slot peeking independent of chain position
//! - Framebuffer ownership resolution through borrow links

use kestrel::gfx::{GfxContext, GfxFramebufferDesc, GfxFramebufferHandle};
use kestrel::renderer::pass::{
    PassChain, PassData, PassFramebuffer, RenderPassCallbacks, pass_data,
};
use kestrel::renderer::queue::{RenderQueueEntry, RenderQueueType};
use kestrel::renderer::PassShared;
use kestrel::resources::Resources;

mod common;
use common::NullContext;

// ============================================================================
// Helpers
// ============================================================================

/// A callbacks stub that only forwards outputs.
struct NoopPass;

impl RenderPassCallbacks for NoopPass {
    fn submit(
        &mut self,
        pass: &mut PassData,
        _ctx: &mut dyn GfxContext,
        _resources: &mut Resources,
        _queue: &RenderQueueEntry,
        shared: &mut PassShared,
    ) {
        pass.outputs.clear();
        pass.outputs.extend(shared.prev_outputs.iter().copied());
    }
}

fn alloc_noop(chain: &mut PassChain, name: &str) -> usize {
    chain.alloc(
        pass_data(RenderQueueType::Opaque, name),
        Box::new(NoopPass),
        None,
    )
}

// ============================================================================
// Chain management
// ============================================================================

#[test]
fn append_builds_head_to_tail_order() {
    let mut chain = PassChain::new();
    let a = alloc_noop(&mut chain, "a");
    let b = alloc_noop(&mut chain, "b");
    let c = alloc_noop(&mut chain, "c");

    chain.append(a);
    chain.append(b);
    chain.append(c);

    assert_eq!(chain.head(), Some(a));
    assert_eq!(chain.tail(), Some(c));
    assert_eq!(chain.order(), vec![a, b, c]);
}

#[test]
fn prepend_attaches_before_head() {
    let mut chain = PassChain::new();
    let a = alloc_noop(&mut chain, "a");
    let b = alloc_noop(&mut chain, "b");

    chain.append(a);
    chain.prepend(b);

    assert_eq!(chain.head(), Some(b));
    assert_eq!(chain.order(), vec![b, a]);
    assert_eq!(chain.peek(a).data.previous, Some(b));
}

#[test]
fn insert_splices_after_index() {
    let mut chain = PassChain::new();
    let a = alloc_noop(&mut chain, "a");
    let b = alloc_noop(&mut chain, "b");
    let c = alloc_noop(&mut chain, "c");

    chain.append(a);
    chain.append(b);
    chain.insert(c, a);

    assert_eq!(chain.order(), vec![a, c, b]);
    assert_eq!(chain.peek(b).data.previous, Some(c));
}

#[test]
fn insert_after_tail_appends() {
    let mut chain = PassChain::new();
    let a = alloc_noop(&mut chain, "a");
    let b = alloc_noop(&mut chain, "b");

    chain.append(a);
    chain.insert(b, a);

    assert_eq!(chain.order(), vec![a, b]);
    assert_eq!(chain.tail(), Some(b));
}

#[test]
fn remove_unlinks_but_keeps_slot() {
    let mut chain = PassChain::new();
    let a = alloc_noop(&mut chain, "a");
    let b = alloc_noop(&mut chain, "b");
    let c = alloc_noop(&mut chain, "c");

    chain.append(a);
    chain.append(b);
    chain.append(c);
    chain.remove(b);

    assert_eq!(chain.order(), vec![a, c]);
    assert_eq!(chain.peek(a).data.next, Some(c));
    assert_eq!(chain.peek(c).data.previous, Some(a));

    // The pool slot survives for peeking.
    assert_eq!(chain.peek(b).data.debug_name, "b");
}

#[test]
fn remove_head_and_tail_update_ends() {
    let mut chain = PassChain::new();
    let a = alloc_noop(&mut chain, "a");
    let b = alloc_noop(&mut chain, "b");

    chain.append(a);
    chain.append(b);

    chain.remove(a);
    assert_eq!(chain.head(), Some(b));

    chain.remove(b);
    assert_eq!(chain.head(), None);
    assert_eq!(chain.tail(), None);
    assert!(chain.order().is_empty());
}

#[test]
#[should_panic(expected = "Out-of-bounds")]
fn peek_out_of_bounds_is_fatal() {
    let chain = PassChain::new();
    let _ = chain.peek(3);
}

// ============================================================================
// Framebuffer ownership
// ============================================================================

#[test]
fn borrower_resolves_to_owner_framebuffer() {
    let mut ctx = NullContext::new(640, 480);
    let framebuffer = ctx.framebuffer_create(&GfxFramebufferDesc::default());

    let mut chain = PassChain::new();
    let mut owner_data = pass_data(RenderQueueType::Opaque, "owner");
    owner_data.framebuffer = PassFramebuffer::Owner(framebuffer);
    let owner = chain.alloc(owner_data, Box::new(NoopPass), None);

    let borrower = chain.alloc(
        pass_data(RenderQueueType::Particle, "borrower"),
        Box::new(NoopPass),
        Some(owner),
    );

    assert_eq!(
        chain.peek(borrower).data.framebuffer,
        PassFramebuffer::BorrowerFrom(owner)
    );
    assert_eq!(chain.resolve_framebuffer(borrower), Some(framebuffer));
    assert_eq!(chain.resolve_owner(borrower), owner);
    assert_eq!(chain.resolve_owner(owner), owner);
}

#[test]
fn chained_borrowers_resolve_transitively() {
    let mut ctx = NullContext::new(640, 480);
    let framebuffer: GfxFramebufferHandle =
        ctx.framebuffer_create(&GfxFramebufferDesc::default());

    let mut chain = PassChain::new();
    let mut owner_data = pass_data(RenderQueueType::Opaque, "owner");
    owner_data.framebuffer = PassFramebuffer::Owner(framebuffer);
    let owner = chain.alloc(owner_data, Box::new(NoopPass), None);
    let middle = chain.alloc(
        pass_data(RenderQueueType::Debug, "middle"),
        Box::new(NoopPass),
        Some(owner),
    );
    let leaf = chain.alloc(
        pass_data(RenderQueueType::Particle, "leaf"),
        Box::new(NoopPass),
        Some(middle),
    );

    assert_eq!(chain.resolve_framebuffer(leaf), Some(framebuffer));
    assert_eq!(chain.resolve_owner(leaf), owner);
}
