//! Off-screen GPU checks of the shader passes against the CPU reference.
//!
//! Each test returns early when the machine has no usable adapter.

use approx::assert_relative_eq;
use glam::{Mat4, Vec3};
use winit::dpi::PhysicalSize;

use crate::assets::{EmbeddedShaders, ImageRgba8};
use crate::scene::{Camera, MaterialImages, MeshData, Vertex};
use crate::shading::brdf::linearize_albedo;
use crate::shading::post::{bright_pass, composite};
use crate::shading::{shade, PointLight, SurfaceSample};

use super::bright::BrightPass;
use super::composite::CompositePass;
use super::fullscreen::post_sampler;
use super::geometry::{FrameUniforms, GeometryPass};
use super::targets::{FramebufferSet, PingPongPair, RenderTarget, HDR_FORMAT};
use super::RenderCtx;

const TOLERANCE: f32 = 2e-3;

fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = match pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    })) {
        Ok(adapter) => adapter,
        Err(err) => {
            eprintln!("skipping: no GPU adapter ({err})");
            return None;
        }
    };
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("lumen test device"),
        required_features: wgpu::Features::empty(),
        required_limits: adapter.limits(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
    .inspect_err(|err| eprintln!("skipping: no GPU device ({err})"))
    .ok()
}

fn f16_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = i32::from((bits >> 10) & 0x1f);
    let mantissa = f32::from(bits & 0x3ff);
    match exponent {
        0 => sign * mantissa * 2f32.powi(-24),
        31 if mantissa == 0.0 => sign * f32::INFINITY,
        31 => f32::NAN,
        _ => sign * (1.0 + mantissa / 1024.0) * 2f32.powi(exponent - 15),
    }
}

// Normal-range values only; extra mantissa bits are truncated.
fn f32_to_f16(value: f32) -> u16 {
    if value == 0.0 {
        return 0;
    }
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32 - 127 + 15;
    let mantissa = ((bits >> 13) & 0x3ff) as u16;
    sign | ((exponent as u16) << 10) | mantissa
}

fn upload_hdr(queue: &wgpu::Queue, target: &RenderTarget, pixels: &[Vec3]) {
    let texels: Vec<u16> = pixels
        .iter()
        .flat_map(|c| [c.x, c.y, c.z, 1.0])
        .map(f32_to_f16)
        .collect();
    queue.write_texture(
        target.texture.as_image_copy(),
        bytemuck::cast_slice(&texels),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(target.width * 8),
            rows_per_image: Some(target.height),
        },
        wgpu::Extent3d {
            width: target.width,
            height: target.height,
            depth_or_array_layers: 1,
        },
    );
}

fn read_hdr(device: &wgpu::Device, queue: &wgpu::Queue, target: &RenderTarget) -> Vec<Vec3> {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let row_bytes = (target.width * 8).div_ceil(align) * align;
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lumen readback"),
        size: u64::from(row_bytes * target.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lumen readback"),
    });
    encoder.copy_texture_to_buffer(
        target.texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row_bytes),
                rows_per_image: Some(target.height),
            },
        },
        wgpu::Extent3d {
            width: target.width,
            height: target.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit([encoder.finish()]);

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .expect("device poll");
    rx.recv().expect("map callback").expect("map readback buffer");

    let data = slice.get_mapped_range();
    let mut pixels = Vec::new();
    for row in data.chunks(row_bytes as usize).take(target.height as usize) {
        for texel in row[..(target.width * 8) as usize].chunks_exact(8) {
            let channel = |i: usize| f16_to_f32(u16::from_le_bytes([texel[i * 2], texel[i * 2 + 1]]));
            pixels.push(Vec3::new(channel(0), channel(1), channel(2)));
        }
    }
    pixels
}

fn texel(rgba: [u8; 4]) -> Option<ImageRgba8> {
    Some(ImageRgba8 {
        width: 1,
        height: 1,
        pixels: rgba.to_vec(),
    })
}

fn facing_triangle() -> MeshData {
    let corner = |x: f32, y: f32| Vertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv: [0.5, 0.5],
    };
    MeshData {
        vertices: vec![corner(-10.0, -10.0), corner(10.0, -10.0), corner(0.0, 10.0)],
        indices: vec![0, 1, 2],
    }
}

fn render_geometry(device: &wgpu::Device, queue: &wgpu::Queue, mesh: &MeshData) -> (FramebufferSet, Vec3, [PointLight; 2]) {
    let ctx = RenderCtx::new(device, queue, HDR_FORMAT, PhysicalSize::new(1, 1));
    let hdr = FramebufferSet::hdr(device, 1, 1).expect("hdr set");
    let material = MaterialImages {
        albedo: texel([255, 255, 255, 255]),
        normal: texel([128, 128, 255, 255]),
        metallic: texel([0, 0, 0, 255]),
        roughness: texel([128, 128, 128, 255]),
        ao: texel([255, 255, 255, 255]),
    }
    .resolve();
    let pass = GeometryPass::new(&ctx, &EmbeddedShaders, &hdr, mesh, &material);
    assert!(pass.is_valid());

    let camera = Camera {
        position: Vec3::new(0.0, 0.0, 3.0),
        yaw: -90.0,
        pitch: 0.0,
        ..Camera::default()
    };
    let lights = [
        PointLight {
            position: Vec3::new(1.0, 1.0, 2.0),
            color: Vec3::splat(5.0),
        },
        PointLight {
            position: Vec3::new(-2.0, 0.5, 1.5),
            color: Vec3::new(1.0, 2.0, 3.0),
        },
    ];
    let uniforms = FrameUniforms::new(Mat4::IDENTITY, &camera, 1.0, &lights);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lumen geometry test"),
    });
    pass.record(&ctx, &mut encoder, &hdr, &uniforms);
    queue.submit([encoder.finish()]);
    (hdr, camera.position, lights)
}

#[test]
fn half_float_helpers_agree() {
    for value in [0.0, 0.25, 1.0, 2.0, 0.5, 3.75] {
        assert_eq!(f16_to_f32(f32_to_f16(value)), value);
    }
}

#[test]
fn pbr_shader_matches_cpu_shading() {
    let Some((device, queue)) = headless_device() else { return };
    let (hdr, camera_pos, lights) = render_geometry(&device, &queue, &facing_triangle());

    let expected = shade(
        &SurfaceSample {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            albedo: linearize_albedo(Vec3::ONE),
            metallic: 0.0,
            roughness: 128.0 / 255.0,
            ao: 1.0,
        },
        camera_pos,
        &lights,
    );

    let scene = read_hdr(&device, &queue, hdr.color("scene").expect("scene"));
    let bright = read_hdr(&device, &queue, hdr.color("bright").expect("bright"));
    assert_relative_eq!(scene[0], expected, max_relative = TOLERANCE);
    assert_eq!(bright[0], scene[0]);
}

#[test]
fn geometry_pass_without_mesh_only_clears() {
    let Some((device, queue)) = headless_device() else { return };
    let (hdr, _, _) = render_geometry(&device, &queue, &MeshData::default());
    let scene = read_hdr(&device, &queue, hdr.color("scene").expect("scene"));
    assert_eq!(scene[0], Vec3::ZERO);
}

#[test]
fn bright_shader_matches_cpu_threshold() {
    let Some((device, queue)) = headless_device() else { return };
    let ctx = RenderCtx::new(&device, &queue, HDR_FORMAT, PhysicalSize::new(2, 1));
    let source = RenderTarget::hdr(&device, "bright source", 2, 1);
    let ping_pong = PingPongPair::new(&device, 2, 1).expect("ping-pong");
    let sampler = post_sampler(&device);
    let colors = [Vec3::new(2.0, 1.5, 0.25), Vec3::new(0.5, 0.5, 0.25)];
    upload_hdr(&queue, &source, &colors);

    let threshold = 1.0;
    let pass = BrightPass::new(&ctx, &EmbeddedShaders, &source, &sampler, ping_pong.format(), threshold);
    assert!(pass.is_valid());
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lumen bright test"),
    });
    pass.record(&mut encoder, &ping_pong);
    queue.submit([encoder.finish()]);

    let out = read_hdr(&device, &queue, ping_pong.get(0));
    for (got, color) in out.iter().zip(colors) {
        assert_eq!(*got, bright_pass(color, threshold));
    }
}

#[test]
fn composite_shader_matches_cpu_composite() {
    let Some((device, queue)) = headless_device() else { return };
    let ctx = RenderCtx::new(&device, &queue, HDR_FORMAT, PhysicalSize::new(1, 1));
    let scene = RenderTarget::hdr(&device, "scene", 1, 1);
    let ping_pong = PingPongPair::new(&device, 1, 1).expect("ping-pong");
    let output = RenderTarget::hdr(&device, "output", 1, 1);
    let sampler = post_sampler(&device);
    let (scene_color, bloom_color) = (Vec3::new(0.25, 0.5, 2.0), Vec3::new(0.125, 0.0, 0.5));
    upload_hdr(&queue, &scene, &[scene_color]);
    upload_hdr(&queue, ping_pong.get(1), &[bloom_color]);

    let (exposure, intensity) = (1.5, 0.75);
    let pass = CompositePass::new(&ctx, &EmbeddedShaders, &scene, &ping_pong, &sampler, exposure, intensity);
    assert!(pass.is_valid());
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lumen composite test"),
    });
    pass.record(&mut encoder, &output.view, 1);
    queue.submit([encoder.finish()]);

    let out = read_hdr(&device, &queue, &output);
    let expected = composite(scene_color, bloom_color, intensity, exposure);
    assert_relative_eq!(out[0], expected, max_relative = TOLERANCE);
}
