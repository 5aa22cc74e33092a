//! Lifetime tests: buffers outliving pools, reconfiguration with buffers
//! still in flight.

use crate::init_tracing;
use crossbeam_channel::bounded;
use hwframe_context::{SurfaceHandle, TextureArrayContext};
use hwframe_core::{HwFrameError, SurfaceDesc, SurfaceFormat};
use hwframe_pool::{AcquireMode, HwFramePool, PooledBuffer};
use std::sync::Arc;
use std::thread;

fn desc(slices: u32) -> SurfaceDesc {
    SurfaceDesc::new(SurfaceFormat::P010, 3840, 2160, slices)
}

#[test]
fn buffers_released_after_pool_drop_return_their_surfaces() {
    init_tracing();
    let ctx = TextureArrayContext::new(desc(4)).into_shared();
    let pool = HwFramePool::new();
    pool.set_frames_context(Some(Arc::clone(&ctx))).unwrap();
    pool.commit().unwrap();

    let (tx, rx) = bounded::<PooledBuffer>(4);
    for _ in 0..4 {
        tx.send(pool.acquire_buffer(AcquireMode::NoWait).unwrap()).unwrap();
    }
    drop(tx);
    drop(pool);

    // Pool state is gone; buffers keep the context alive on their own
    assert_eq!(Arc::strong_count(&ctx), 5);

    let consumer = thread::spawn(move || {
        for buffer in rx {
            assert!(buffer.surface(0).is_ok());
        }
    });
    consumer.join().unwrap();

    assert_eq!(Arc::strong_count(&ctx), 1);
    assert_eq!(ctx.free_count(), Some(4));
}

#[test]
fn reconfiguring_pool_leaves_old_buffers_on_old_context() {
    init_tracing();
    let old_ctx = TextureArrayContext::new(desc(2)).into_shared();
    let new_ctx = TextureArrayContext::new(desc(3)).into_shared();

    let pool = HwFramePool::new();
    pool.set_frames_context(Some(Arc::clone(&old_ctx))).unwrap();
    pool.commit().unwrap();
    let old_buffer = pool.acquire_buffer(AcquireMode::NoWait).unwrap();

    assert!(matches!(
        pool.set_frames_context(Some(Arc::clone(&new_ctx))),
        Err(HwFrameError::AlreadyCommitted)
    ));
    pool.decommit();
    pool.set_frames_context(Some(Arc::clone(&new_ctx))).unwrap();
    pool.commit().unwrap();

    let new_buffer = pool.acquire_buffer(AcquireMode::NoWait).unwrap();
    assert_eq!(pool.outstanding(), 2);
    assert_eq!(pool.stats().free_surfaces, Some(2));

    pool.release_buffer(old_buffer).unwrap();
    assert_eq!(old_ctx.free_count(), Some(2));
    assert_eq!(new_ctx.free_count(), Some(2));

    pool.release_buffer(new_buffer).unwrap();
    assert_eq!(new_ctx.free_count(), Some(3));
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn decoder_selected_surfaces_are_accounted_and_returned() {
    init_tracing();
    let ctx = TextureArrayContext::new(desc(3)).into_shared();
    let pool = HwFramePool::new();
    pool.set_frames_context(Some(Arc::clone(&ctx))).unwrap();

    // Decoder picks its own targets; the pool is never committed
    let buffers: Vec<_> = (0..3)
        .map(|_| {
            let surface = SurfaceHandle::draw(&ctx).unwrap();
            pool.acquire_buffer_for_existing_frame(surface).unwrap()
        })
        .collect();
    assert_eq!(pool.outstanding(), 3);
    assert_eq!(ctx.free_count(), Some(0));
    assert!(matches!(
        pool.acquire_buffer(AcquireMode::NoWait),
        Err(HwFrameError::NotCommitted)
    ));

    for buffer in buffers {
        pool.release_buffer(buffer).unwrap();
    }
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(ctx.free_count(), Some(3));
}
