use std::sync::Arc;

use log::{debug, error, info, warn};
use wgpu::{
    Adapter, BindGroup, BindGroupLayout, Device, Queue, RenderPipeline, Sampler, Surface,
    SurfaceConfiguration, Texture,
};
use winit::dpi::PhysicalSize;
use winit::window::{Fullscreen, Window};

use super::device::{DeviceStatus, DisplayBackend, DisplayMode, PresentInterval, PresentParams};
use super::pixel::PixelFormat;
use super::surface::PixelSurface;
use crate::error::{EngineError, Result};

/// Presents the CPU back buffer through a wgpu surface on a winit window
///
/// Each frame the back buffer is uploaded into a texture and drawn with a single
/// fullscreen triangle. Surface errors are turned into [`DeviceStatus`] values
/// that the next [`DisplayBackend::status`] poll reports.
pub struct WgpuBackend {
    window: Arc<Window>,
    surface: Surface<'static>,
    adapter: Adapter,
    device: Device,
    queue: Queue,
    presenter: Option<Presenter>,
    pending: Option<DeviceStatus>,
}

/// GPU objects that depend on the present parameters
struct Presenter {
    config: SurfaceConfiguration,
    pipeline: RenderPipeline,
    bind_group: BindGroup,
    texture: Texture,
    _depth: Texture,
    size: (u32, u32),
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).map_err(|e| {
            error!("Unable to create window surface: {}", e);
            EngineError::DeviceInit(e.to_string())
        })?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            error!("Failed to find appropriate adapter: {:?}", e);
            EngineError::DeviceInit(format!("no compatible adapter: {:?}", e))
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Display Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            experimental_features: Default::default(),
            trace: Default::default(),
        }))
        .map_err(|e| {
            error!("Failed to create device: {:?}", e);
            EngineError::DeviceInit(format!("device request failed: {:?}", e))
        })?;

        info!("Using adapter {}", adapter.get_info().name);

        Ok(Self {
            window,
            surface,
            adapter,
            device,
            queue,
            presenter: None,
            pending: None,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The window changed size; the next poll asks for a reset
    pub fn notify_resized(&mut self) {
        self.pending = Some(DeviceStatus::NeedsReset);
    }

    fn build_presenter(&self, params: &PresentParams) -> Result<Presenter> {
        let caps = self.surface.get_capabilities(&self.adapter);
        let Some(&first_format) = caps.formats.first() else {
            error!("Surface reports no supported formats");
            return Err(EngineError::DeviceInit("surface is not supported by the adapter".into()));
        };
        let wanted = surface_format_for(params.format);
        let format = if caps.formats.contains(&wanted) {
            wanted
        } else {
            warn!("{:?} not supported by the surface, picking another format", params.format);
            // Linear formats so pixel values reach the screen unchanged
            caps.formats
                .iter()
                .copied()
                .find(|f| matches!(f, wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Rgba8Unorm))
                .unwrap_or(first_format)
        };

        let present_mode = match params.present_interval {
            PresentInterval::Immediate if caps.present_modes.contains(&wgpu::PresentMode::Immediate) => {
                wgpu::PresentMode::Immediate
            }
            PresentInterval::Immediate => {
                warn!("Immediate presentation unsupported, falling back to vsync");
                wgpu::PresentMode::Fifo
            }
            PresentInterval::Vsync => wgpu::PresentMode::Fifo,
        };

        let window_size = self.window.inner_size();
        let (width, height) = if window_size.width == 0 || window_size.height == 0 {
            (params.width, params.height)
        } else {
            (window_size.width, window_size.height)
        };

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: params.back_buffer_count + 1,
        };
        self.surface.configure(&self.device, &config);

        let texture = create_back_buffer_texture(&self.device, params.width, params.height);
        let depth = create_depth_texture(&self.device, params.width, params.height);
        let layout = create_bind_group_layout(&self.device);
        let sampler = create_sampler(&self.device);
        let bind_group = create_bind_group(&self.device, &layout, &texture, &sampler);
        let pipeline = create_render_pipeline(&self.device, &layout, format);

        debug!(
            "Surface configured {}x{} {:?} {:?}",
            width, height, format, present_mode
        );

        Ok(Presenter {
            config,
            pipeline,
            bind_group,
            texture,
            _depth: depth,
            size: (params.width, params.height),
        })
    }
}

impl DisplayBackend for WgpuBackend {
    fn display_mode(&mut self) -> Result<DisplayMode> {
        let size = self
            .window
            .current_monitor()
            .map(|m| m.size())
            .unwrap_or_else(|| self.window.inner_size());
        Ok(DisplayMode {
            width: size.width,
            height: size.height,
            format: PixelFormat::X8R8G8B8,
        })
    }

    fn create(&mut self, params: &PresentParams) -> Result<()> {
        if params.windowed {
            let _ = self
                .window
                .request_inner_size(PhysicalSize::new(params.width, params.height));
        } else {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        self.presenter = Some(self.build_presenter(params)?);
        Ok(())
    }

    fn status(&mut self) -> DeviceStatus {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return DeviceStatus::Lost;
        }
        self.pending.take().unwrap_or(DeviceStatus::Ready)
    }

    fn reset(&mut self, params: &PresentParams) -> Result<()> {
        self.presenter = None;
        let presenter = self.build_presenter(params)?;
        info!(
            "Surface reconfigured at {}x{}",
            presenter.config.width, presenter.config.height
        );
        self.presenter = Some(presenter);
        self.pending = None;
        Ok(())
    }

    fn acquire_back_buffer(&mut self, params: &PresentParams) -> Result<PixelSurface> {
        PixelSurface::with_alignment(params.width, params.height, self.row_alignment())
    }

    fn present(&mut self, back_buffer: &PixelSurface) -> Result<()> {
        let Some(presenter) = self.presenter.as_ref() else {
            return Err(EngineError::DeviceLost);
        };
        let Some(words) = back_buffer.raw_words() else {
            return Err(EngineError::Lock("back buffer is released".into()));
        };
        let (width, height) = back_buffer.dimensions();
        if (width, height) != presenter.size {
            return Err(EngineError::InvalidArgument(format!(
                "back buffer {}x{} does not match the {}x{} presentation texture",
                width, height, presenter.size.0, presenter.size.1
            )));
        }

        self.queue.write_texture(
            presenter.texture.as_image_copy(),
            bytemuck::cast_slice(words),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(back_buffer.pitch() as u32),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("Surface needs reconfiguring: {}", e);
                self.pending = Some(DeviceStatus::NeedsReset);
                return Err(EngineError::DeviceLost);
            }
            Err(e) => {
                warn!("Surface unavailable: {}", e);
                self.pending = Some(DeviceStatus::Lost);
                return Err(EngineError::DeviceLost);
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&presenter.pipeline);
            pass.set_bind_group(0, &presenter.bind_group, &[]);
            pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();

        Ok(())
    }

    fn row_alignment(&self) -> usize {
        wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize
    }
}

fn create_back_buffer_texture(device: &Device, width: u32, height: u32) -> Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Back Buffer Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        // Little-endian X8R8G8B8 words are B, G, R, X in memory
        format: wgpu::TextureFormat::Bgra8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

/// Reserved depth buffer, never attached to a pass
fn create_depth_texture(device: &Device, width: u32, height: u32) -> Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Reserved Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth16Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

fn create_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Back Buffer Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn create_sampler(device: &Device) -> Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Back Buffer Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn create_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    texture: &Texture,
    sampler: &Sampler,
) -> BindGroup {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Back Buffer Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_render_pipeline(
    device: &Device,
    layout: &BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Display Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../display.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Present Pipeline Layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Present Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Swap-chain format with the same channel order as `format`
fn surface_format_for(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::X8R8G8B8 | PixelFormat::A8R8G8B8 => wgpu::TextureFormat::Bgra8Unorm,
        PixelFormat::X8B8G8R8 => wgpu::TextureFormat::Rgba8Unorm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_format_picks_channel_order() {
        assert_eq!(surface_format_for(PixelFormat::X8R8G8B8), wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(surface_format_for(PixelFormat::A8R8G8B8), wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(surface_format_for(PixelFormat::X8B8G8R8), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn back_buffer_rows_meet_copy_alignment() {
        let pitch = crate::core::surface::PixelSurface::with_alignment(
            640,
            480,
            wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize,
        )
        .unwrap()
        .pitch();
        assert_eq!(pitch % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize, 0);
        assert_eq!(pitch, 2560);
    }
}
