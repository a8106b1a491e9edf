//=========================================================================
// wgpu Renderer
//
// `FrameRenderer` implementation: a wgpu surface on the main window with
// egui composited over a solid clear colour.
//
// A frame is split across the trait calls:
//   clear()     → acquire surface texture, encoder, clear pass
//   submit_ui() → upload textures/buffers, egui pass (load, not clear)
//   present()   → submit encoder, present texture
//
// If the surface cannot be acquired the frame is skipped, but texture
// uploads and frees are still applied so egui's atlas stays consistent.
//
//=========================================================================

//=== Standard Library Imports ============================================
use std::sync::Arc;

//=== External Crates =====================================================
use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use winit::window::Window;

//=== Internal Modules ====================================================
use crate::core::platform_bridge::{FrameRenderer, UiDrawData};

//=== PendingFrame ========================================================

struct PendingFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

//=== WgpuRenderer ========================================================

/// GPU context bound to the main window's surface.
pub struct WgpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
    frame: Option<PendingFrame>,
}

impl WgpuRenderer {
    //--- Construction -----------------------------------------------------

    /// Creates the GPU context for `window` with vsync disabled.
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("Failed to find suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Breach Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        }))
        .context("Failed to create GPU device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("Surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_format,
            egui_wgpu::RendererOptions::default(),
        );

        info!(
            target: "platform::graphics",
            "Graphics initialized: {}x{}, format: {:?}, adapter: {}",
            surface_config.width,
            surface_config.height,
            surface_format,
            adapter.get_info().name
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            egui_renderer,
            frame: None,
        })
    }

    //--- Internal Helpers -------------------------------------------------

    fn acquire(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(texture) => Some(texture),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!(target: "platform::graphics", "Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                None
            }
            Err(wgpu::SurfaceError::Timeout) => {
                trace!(target: "platform::graphics", "Surface acquire timed out");
                None
            }
            Err(e) => {
                warn!(target: "platform::graphics", "Surface acquire failed: {}", e);
                None
            }
        }
    }
}

impl FrameRenderer for WgpuRenderer {
    fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) != (self.surface_config.width, self.surface_config.height) {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
            debug!(target: "platform::graphics", "Surface resized to {}x{}", width, height);
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        // A frame left over from a skipped present is dropped unpresented.
        self.frame = None;

        let Some(texture) = self.acquire() else {
            return;
        };

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let [r, g, b, a] = color.map(f64::from);
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        self.frame = Some(PendingFrame {
            texture,
            view,
            encoder,
        });
    }

    fn submit_ui(&mut self, draw: &UiDrawData) {
        for (id, delta) in &draw.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        if let Some(frame) = self.frame.as_mut() {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.surface_config.width, self.surface_config.height],
                pixels_per_point: draw.pixels_per_point,
            };

            self.egui_renderer.update_buffers(
                &self.device,
                &self.queue,
                &mut frame.encoder,
                &draw.primitives,
                &screen_descriptor,
            );

            let render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut pass = render_pass.forget_lifetime();
            self.egui_renderer.render(&mut pass, &draw.primitives, &screen_descriptor);
        }

        for id in &draw.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn present(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };

        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.texture.present();
    }
}
