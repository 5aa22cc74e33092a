//! Decoder/renderer connection flow: surface type negotiation, allocator
//! setup from configuration, reconnect.

use crate::init_tracing;
use hwframe_context::TextureArrayContext;
use hwframe_core::{
    HwFrameError, PoolConfig, RendererMemoryConfig, SurfaceDesc, SurfaceFormat, SurfaceType,
    VideoMemoryConfiguration,
};
use hwframe_pool::{AcquireMode, BufferKind, HwFramePool, PipelineSample};
use std::sync::Arc;

/// What a decoder does when it connects to a renderer.
fn connect(renderer: &dyn VideoMemoryConfiguration, config: PoolConfig) -> (HwFramePool, u32) {
    renderer.set_surface_type(SurfaceType::D3D11Texture).unwrap();
    let adapter = renderer.adapter_index();

    let ctx = TextureArrayContext::new(SurfaceDesc::new(SurfaceFormat::Nv12, 1280, 720, 8))
        .into_shared();
    let pool = HwFramePool::with_config(config).unwrap();
    pool.set_frames_context(Some(ctx)).unwrap();
    (pool, adapter)
}

#[test]
fn connection_negotiates_then_locks_surface_type() {
    init_tracing();
    let renderer = Arc::new(RendererMemoryConfig::new(vec![SurfaceType::D3D11Texture], 1));
    let config = PoolConfig::from_json(r#"{ "label": "dec-hevc" }"#).unwrap();

    let (pool, adapter) = connect(renderer.as_ref(), config);
    assert_eq!(adapter, 1);
    assert_eq!(pool.label(), "dec-hevc");
    assert_eq!(renderer.bind_allocator(), Some(SurfaceType::D3D11Texture));
    pool.commit().unwrap();

    let sample = PipelineSample::from(pool.acquire_buffer(AcquireMode::NoWait).unwrap());
    assert!(matches!(sample.kind(), BufferKind::HardwareSurface { .. }));

    // Renegotiating mid-connection is refused
    assert!(matches!(
        renderer.set_surface_type(SurfaceType::D3D11Texture),
        Err(HwFrameError::SurfaceTypeLocked)
    ));
    drop(sample);
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn adapter_switch_takes_effect_on_reconnect() {
    init_tracing();
    let renderer = RendererMemoryConfig::default();
    let (first, adapter) = connect(&renderer, PoolConfig::default());
    assert_eq!(adapter, 0);
    renderer.bind_allocator();
    first.commit().unwrap();

    renderer.set_adapter_index(2);
    first.decommit();
    drop(first);
    renderer.reconnect();

    let (second, adapter) = connect(&renderer, PoolConfig::default());
    assert_eq!(adapter, 2);
    assert_eq!(renderer.surface_type(), Some(SurfaceType::D3D11Texture));
    second.commit().unwrap();
}

#[test]
fn renderer_without_hardware_support_rejects_surfaces() {
    init_tracing();
    let renderer = RendererMemoryConfig::new(Vec::new(), 0);
    assert!(matches!(
        renderer.set_surface_type(SurfaceType::D3D11Texture),
        Err(HwFrameError::SurfaceTypeRejected(SurfaceType::D3D11Texture))
    ));
    assert_eq!(renderer.surface_type(), None);
}
