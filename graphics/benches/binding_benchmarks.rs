use criterion::{Criterion, black_box, criterion_group, criterion_main};

use glint_graphics::{
    AttachmentPoint, Bindable, BlitMask, ContextParameters, DeviceCapabilities, DummyBackend,
    FilterMode, FramebufferTarget, GraphicsContext, TextureDescriptor, TextureUnit,
};
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Object lifecycle
// ---------------------------------------------------------------------------

fn bench_create_texture(c: &mut Criterion) {
    let context = GraphicsContext::dummy().unwrap();

    c.bench_function("dummy_create_texture_256x256", |b| {
        b.iter(|| {
            black_box(context.create_texture(&TextureDescriptor::new_2d(256, 256)));
        });
    });
}

fn bench_create_framebuffer(c: &mut Criterion) {
    let context = GraphicsContext::dummy().unwrap();
    let color = context.create_texture(&TextureDescriptor::new_2d(256, 256));

    c.bench_function("dummy_create_framebuffer_with_color", |b| {
        b.iter(|| {
            let mut framebuffer = context.create_framebuffer();
            framebuffer
                .attach(AttachmentPoint::COLOR0, color.clone())
                .unwrap();
            black_box(framebuffer);
        });
    });
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

fn bench_texture_bind_unbind(c: &mut Criterion) {
    let context = GraphicsContext::dummy().unwrap();
    let outer = context.create_texture(&TextureDescriptor::new_2d(16, 16));
    let inner = context.create_texture(&TextureDescriptor::new_2d(16, 16));
    outer.bind(TextureUnit(0)).unwrap();

    c.bench_function("texture_bind_unbind_displaced", |b| {
        b.iter(|| {
            inner.bind(black_box(TextureUnit(0))).unwrap();
            inner.unbind(black_box(TextureUnit(0))).unwrap();
        });
    });
}

fn bench_framebuffer_bind_unbind(c: &mut Criterion) {
    let context = GraphicsContext::dummy().unwrap();
    let mut framebuffer = context.create_framebuffer();
    framebuffer
        .attach(
            AttachmentPoint::COLOR0,
            context.create_texture(&TextureDescriptor::new_2d(64, 64)),
        )
        .unwrap();

    c.bench_function("framebuffer_bind_unbind_both", |b| {
        b.iter(|| {
            framebuffer.bind(black_box(FramebufferTarget::Both)).unwrap();
            framebuffer.unbind(black_box(FramebufferTarget::Both)).unwrap();
        });
    });
}

// ---------------------------------------------------------------------------
// Blits
// ---------------------------------------------------------------------------

fn bench_blit(c: &mut Criterion, name: &str, capabilities: DeviceCapabilities) {
    let backend = Rc::new(DummyBackend::with_capabilities(capabilities));
    let context = GraphicsContext::new(backend, ContextParameters::default()).unwrap();
    let mut source = context.create_framebuffer();
    source
        .attach(
            AttachmentPoint::COLOR0,
            context.create_texture(&TextureDescriptor::new_2d(64, 64)),
        )
        .unwrap();
    let mut destination = context.create_framebuffer();
    destination
        .attach(
            AttachmentPoint::COLOR0,
            context.create_texture(&TextureDescriptor::new_2d(128, 128)),
        )
        .unwrap();

    c.bench_function(name, |b| {
        b.iter(|| {
            source
                .blit_to(&destination, BlitMask::COLOR, FilterMode::Nearest)
                .unwrap();
        });
    });
}

fn bench_blit_native(c: &mut Criterion) {
    bench_blit(c, "blit_native_64_to_128", DeviceCapabilities::desktop());
}

fn bench_blit_quad(c: &mut Criterion) {
    bench_blit(c, "blit_quad_64_to_128", DeviceCapabilities::gles2());
}

criterion_group!(
    benches,
    bench_create_texture,
    bench_create_framebuffer,
    bench_texture_bind_unbind,
    bench_framebuffer_bind_unbind,
    bench_blit_native,
    bench_blit_quad,
);
criterion_main!(benches);
