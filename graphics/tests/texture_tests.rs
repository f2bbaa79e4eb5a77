//! Integration tests for 2D textures.
//!
//! Tests run against the dummy backend, parameterized over device classes
//! with `rstest`, and inspect the simulated device state after each call.
//!
//! # Test Categories
//!
//! - **Creation Tests**: valid and invalid construction
//! - **Upload Tests**: raw pixel and image uploads, mip levels
//! - **Binding Tests**: unit binding and displaced restore
//! - **Sampling Tests**: filter and wrap state

mod common;

use rstest::rstest;

use common::{Device, TestContext, generate_test_pattern, get_pixel};
use glint_graphics::{
    AddressMode, Bindable, Changeable, DummyCall, GpuObject, GraphicsError, Image, PixelFormat,
    PixelType, SamplerState, TextureDescriptor, TextureFilter, TextureFormat, TextureUnit,
};

// ============================================================================
// Creation Tests
// ============================================================================

#[rstest]
#[case::desktop(Device::Desktop)]
#[case::gles2(Device::Gles2)]
fn test_create_reserves_level_zero(#[case] device: Device) {
    let ctx = TestContext::new(device);
    let texture = ctx
        .context
        .create_texture(&TextureDescriptor::new_2d(64, 32).with_label("albedo"));

    assert!(texture.is_valid());
    assert!(texture.creation_error().is_none());
    assert_eq!(texture.label(), Some("albedo"));
    assert_eq!(texture.mip_level_count(), 7);
    assert!(texture.is_level_specified(0));
    assert!(!texture.is_level_specified(1));

    let level = ctx.backend.texture_level(texture.id().unwrap(), 0).unwrap();
    assert_eq!((level.width, level.height), (64, 32));
    assert!(level.data.is_none());
    assert_eq!(texture.sampler(), SamplerState::default());
}

#[rstest]
#[case::zero_width(TextureDescriptor::new_2d(0, 16))]
#[case::zero_height(TextureDescriptor::new_2d(16, 0))]
#[case::too_large(TextureDescriptor::new_2d(1 << 20, 4))]
#[case::bad_layout(
    TextureDescriptor::new_2d(4, 4).with_layout(PixelFormat::Rgba, PixelType::Float)
)]
fn test_invalid_descriptor_yields_invalid_texture(#[case] descriptor: TextureDescriptor) {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.context.create_texture(&descriptor);

    assert!(!texture.is_valid());
    assert!(texture.id().is_none());
    assert!(texture.creation_error().is_some());
    assert_eq!(ctx.backend.texture_count(), 0);

    let result = texture.set_pixels(None, 0, None);
    assert!(matches!(result, Err(GraphicsError::InvalidObject(_))));
}

#[test]
fn test_float_texture_unsupported_on_gles2() {
    let ctx = TestContext::new(Device::Gles2);
    let texture = ctx
        .context
        .create_texture(&TextureDescriptor::new_2d(4, 4).with_format(TextureFormat::Rgba32Float));

    assert!(!texture.is_valid());
    assert!(matches!(
        texture.creation_error(),
        Some(GraphicsError::UnsupportedFormat {
            internal_format: TextureFormat::Rgba32Float,
            ..
        })
    ));
}

#[test]
fn test_failed_allocation_yields_invalid_texture() {
    let ctx = TestContext::new(Device::Desktop);
    ctx.backend.set_fail_allocations(true);
    let texture = ctx.context.create_texture(&TextureDescriptor::new_2d(4, 4));

    assert!(!texture.is_valid());
    assert!(texture.ensure_valid().is_err());
    assert_eq!(ctx.context.live_texture_count(), 0);
}

#[test]
fn test_lost_context_yields_invalid_texture() {
    let ctx = TestContext::new(Device::Desktop);
    ctx.context.mark_lost();
    let texture = ctx.context.create_texture(&TextureDescriptor::new_2d(4, 4));

    assert!(matches!(
        texture.creation_error(),
        Some(GraphicsError::ContextLost)
    ));
}

#[test]
fn test_drop_deletes_native_texture() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(8, 8);
    let id = texture.id().unwrap();
    texture.bind(TextureUnit(3)).unwrap();
    assert_eq!(ctx.backend.texture_count(), 1);

    drop(texture);
    assert_eq!(ctx.backend.texture_count(), 0);
    assert_eq!(ctx.context.live_texture_count(), 0);
    assert!(ctx.backend.calls().contains(&DummyCall::DeleteTexture(id)));
    assert_eq!(ctx.context.texture_binding(TextureUnit(3)), None);
}

// ============================================================================
// Upload Tests
// ============================================================================

#[test]
fn test_reserve_level_without_data() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(64, 64);
    ctx.backend.clear_calls();

    texture.set_pixels(None, 0, None).unwrap();

    let calls = ctx.backend.calls();
    assert!(calls.contains(&DummyCall::TexImage {
        level: 0,
        width: 64,
        height: 64,
        initialized: false,
    }));
    let level = ctx.backend.texture_level(texture.id().unwrap(), 0).unwrap();
    assert_eq!((level.width, level.height), (64, 64));
}

#[test]
fn test_full_upload_stores_pixels() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(8, 4);
    let pattern = generate_test_pattern(8, 4);

    texture.set_pixels(Some(&pattern), 0, None).unwrap();

    let level = ctx.backend.texture_level(texture.id().unwrap(), 0).unwrap();
    let data = level.data.unwrap();
    assert_eq!(data, pattern);
    assert_eq!(get_pixel(&data, 8, 5, 3), [5, 3, 0x80, 0xFF]);
}

#[test]
fn test_reserve_mip_level_then_partial_update() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(16, 16);

    // Partial data into an unspecified level is rejected.
    let partial = generate_test_pattern(2, 2);
    let result = texture.set_pixels(Some(&partial), 2, Some((2, 2)));
    assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));

    texture.set_pixels(None, 2, Some((2, 2))).unwrap();
    assert!(texture.is_level_specified(2));
    let level = ctx.backend.texture_level(texture.id().unwrap(), 2).unwrap();
    assert_eq!((level.width, level.height), (4, 4));

    texture.set_pixels(Some(&partial), 2, Some((2, 2))).unwrap();
    let data = ctx
        .backend
        .texture_level(texture.id().unwrap(), 2)
        .unwrap()
        .data
        .unwrap();
    assert_eq!(get_pixel(&data, 4, 1, 1), [1, 1, 0x80, 0xFF]);
    assert_eq!(get_pixel(&data, 4, 3, 3), [0, 0, 0, 0]);
}

#[rstest]
#[case::past_chain(7, None)]
#[case::region_too_wide(0, Some((65, 1)))]
#[case::empty_region(0, Some((0, 4)))]
fn test_upload_rejects_bad_region(#[case] level: u32, #[case] region: Option<(u32, u32)>) {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(64, 64);
    ctx.backend.clear_calls();

    let result = texture.set_pixels(None, level, region);
    assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
    assert!(ctx.backend.calls().is_empty());
}

#[test]
fn test_short_pixel_buffer_rejected() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);

    let result = texture.set_pixels(Some(&[0; 15]), 0, None);
    assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
}

#[test]
fn test_image_upload_updates_lower_left_region() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);
    let image = Image::new(
        2,
        2,
        PixelFormat::Rgba,
        PixelType::UnsignedByte,
        generate_test_pattern(2, 2),
    )
    .unwrap();

    texture.set_pixels_from_image(&image, 0).unwrap();

    let data = ctx
        .backend
        .texture_level(texture.id().unwrap(), 0)
        .unwrap()
        .data
        .unwrap();
    assert_eq!(get_pixel(&data, 4, 1, 0), [1, 0, 0x80, 0xFF]);
    assert_eq!(get_pixel(&data, 4, 2, 0), [0, 0, 0, 0]);
}

#[test]
fn test_image_upload_rejects_oversized_or_mismatched() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);

    let large = Image::zeroed(8, 8, PixelFormat::Rgba, PixelType::UnsignedByte).unwrap();
    assert!(matches!(
        texture.set_pixels_from_image(&large, 0),
        Err(GraphicsError::InvalidParameter(_))
    ));

    let float = Image::zeroed(4, 4, PixelFormat::Rgba, PixelType::Float).unwrap();
    assert!(matches!(
        texture.set_pixels_from_image(&float, 0),
        Err(GraphicsError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_auto_mipmaps_after_level_zero_upload() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(8, 8);
    texture.set_auto_mipmaps(true);
    assert!(texture.has_changes());
    ctx.backend.clear_calls();

    texture
        .set_pixels(Some(&generate_test_pattern(8, 8)), 0, None)
        .unwrap();

    assert!(ctx.backend.calls().contains(&DummyCall::GenerateMipmaps));
    assert!((0..4).all(|level| texture.is_level_specified(level)));
    assert!(!texture.has_changes());
    let last = ctx.backend.texture_level(texture.id().unwrap(), 3).unwrap();
    assert_eq!((last.width, last.height), (1, 1));
}

#[test]
fn test_apply_changes_generates_mipmaps() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);
    texture.set_auto_mipmaps(true);

    texture.apply_changes().unwrap();

    assert!(!texture.has_changes());
    assert!(texture.is_level_specified(2));
    assert!(ctx.backend.texture_level(texture.id().unwrap(), 2).is_some());
}

#[test]
fn test_upload_restores_unit_binding() {
    let ctx = TestContext::new(Device::Desktop);
    let bound = ctx.create_texture(4, 4);
    let other = ctx.create_texture(4, 4);
    bound.bind(TextureUnit(0)).unwrap();

    other.set_pixels(None, 0, None).unwrap();

    assert_eq!(ctx.backend.texture_binding(TextureUnit(0)), bound.id());
    assert!(bound.is_bound(TextureUnit(0)));
}

// ============================================================================
// Binding Tests
// ============================================================================

#[rstest]
#[case::desktop(Device::Desktop)]
#[case::gles2(Device::Gles2)]
fn test_unbind_restores_displaced_texture(#[case] device: Device) {
    let ctx = TestContext::new(device);
    let first = ctx.create_texture(4, 4);
    let second = ctx.create_texture(4, 4);
    let unit = TextureUnit(1);

    first.bind(unit).unwrap();
    second.bind(unit).unwrap();
    assert!(second.is_bound(unit));
    assert!(!first.is_bound(unit));
    assert_eq!(first.bound_unit(), None);

    second.unbind(unit).unwrap();
    assert!(first.is_bound(unit));
    assert_eq!(ctx.backend.texture_binding(unit), first.id());

    first.unbind(unit).unwrap();
    assert_eq!(ctx.backend.texture_binding(unit), None);
}

#[test]
fn test_bind_is_idempotent() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);
    texture.bind(TextureUnit(2)).unwrap();
    ctx.backend.clear_calls();

    texture.bind(TextureUnit(2)).unwrap();
    assert!(ctx.backend.calls().is_empty());

    texture.unbind(TextureUnit(2)).unwrap();
    assert_eq!(ctx.backend.texture_binding(TextureUnit(2)), None);
    texture.unbind(TextureUnit(2)).unwrap();
}

#[test]
fn test_unbind_of_unbound_unit_is_noop() {
    let ctx = TestContext::new(Device::Desktop);
    let bound = ctx.create_texture(4, 4);
    let other = ctx.create_texture(4, 4);
    bound.bind(TextureUnit(0)).unwrap();
    ctx.backend.clear_calls();

    other.unbind(TextureUnit(0)).unwrap();

    assert!(ctx.backend.calls().is_empty());
    assert!(bound.is_bound(TextureUnit(0)));
}

#[test]
fn test_failed_bind_leaves_state_unchanged() {
    let ctx = TestContext::new(Device::Desktop);
    let bound = ctx.create_texture(4, 4);
    bound.bind(TextureUnit(0)).unwrap();
    let invalid = ctx.context.create_texture(&TextureDescriptor::new_2d(0, 0));
    ctx.backend.clear_calls();

    assert!(matches!(
        invalid.bind(TextureUnit(0)),
        Err(GraphicsError::InvalidObject(_))
    ));
    assert!(matches!(
        bound.bind(TextureUnit(1000)),
        Err(GraphicsError::InvalidParameter(_))
    ));

    assert!(ctx.backend.calls().is_empty());
    assert!(bound.is_bound(TextureUnit(0)));
    assert_eq!(ctx.context.active_unit(), TextureUnit(0));
}

#[test]
fn test_displaced_texture_dropped_before_unbind() {
    let ctx = TestContext::new(Device::Desktop);
    let first = ctx.create_texture(4, 4);
    let second = ctx.create_texture(4, 4);
    first.bind(TextureUnit(0)).unwrap();
    second.bind(TextureUnit(0)).unwrap();

    drop(first);
    second.unbind(TextureUnit(0)).unwrap();

    assert_eq!(ctx.backend.texture_binding(TextureUnit(0)), None);
}

#[test]
fn test_bind_to_new_unit_vacates_previous_unit() {
    let ctx = TestContext::new(Device::Desktop);
    let resident = ctx.create_texture(4, 4);
    let texture = ctx.create_texture(4, 4);
    resident.bind(TextureUnit(0)).unwrap();
    texture.bind(TextureUnit(0)).unwrap();

    texture.bind(TextureUnit(1)).unwrap();

    assert_eq!(texture.bound_unit(), Some(TextureUnit(1)));
    assert_eq!(ctx.backend.texture_binding(TextureUnit(0)), resident.id());
    assert!(resident.is_bound(TextureUnit(0)));

    // The old unit is no longer the texture's to release.
    texture.unbind(TextureUnit(0)).unwrap();
    assert_eq!(ctx.backend.texture_binding(TextureUnit(0)), resident.id());

    texture.unbind(TextureUnit(1)).unwrap();
    assert_eq!(ctx.backend.texture_binding(TextureUnit(1)), None);
    assert_eq!(texture.bound_unit(), None);
}

#[test]
fn test_unbind_current() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);
    texture.bind(TextureUnit(5)).unwrap();
    assert_eq!(texture.bound_unit(), Some(TextureUnit(5)));

    texture.unbind_current().unwrap();
    assert_eq!(texture.bound_unit(), None);
    assert_eq!(ctx.context.texture_binding(TextureUnit(5)), None);
}

// ============================================================================
// Sampling Tests
// ============================================================================

#[test]
fn test_filter_requires_binding() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);

    let result = texture.set_mag_min_filter(TextureFilter::Nearest, TextureFilter::Nearest);
    assert!(matches!(result, Err(GraphicsError::NotBound(_))));
    assert_eq!(texture.sampler(), SamplerState::default());
}

#[test]
fn test_filter_and_wrap_on_bound_texture() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);
    texture.bind(TextureUnit(4)).unwrap();

    texture
        .set_mag_min_filter(TextureFilter::Nearest, TextureFilter::LinearMipmapLinear)
        .unwrap();
    texture
        .set_wrap_st(AddressMode::Repeat, AddressMode::MirrorRepeat)
        .unwrap();

    let expected = SamplerState {
        mag_filter: TextureFilter::Nearest,
        min_filter: TextureFilter::LinearMipmapLinear,
        wrap_s: AddressMode::Repeat,
        wrap_t: AddressMode::MirrorRepeat,
    };
    assert_eq!(texture.sampler(), expected);
    assert_eq!(ctx.backend.texture_sampler(texture.id().unwrap()), Some(expected));
    assert_eq!(ctx.backend.active_unit(), TextureUnit(4));
}

#[test]
fn test_mipmap_mag_filter_rejected() {
    let ctx = TestContext::new(Device::Desktop);
    let texture = ctx.create_texture(4, 4);
    texture.bind(TextureUnit(0)).unwrap();

    let result =
        texture.set_mag_min_filter(TextureFilter::LinearMipmapLinear, TextureFilter::Linear);
    assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
}
