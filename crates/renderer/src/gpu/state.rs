use std::sync::Arc;

use tracing::debug;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::SetupError;
use crate::session::{FrameTarget, ProgramHost};
use crate::shader;
use crate::types::RendererConfig;

use super::context::GpuContext;
use super::pipeline::LightningPipeline;
use super::uniforms::LightningUniforms;

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Everything the window needs to put lightning on screen.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: Option<LightningPipeline>,
    multisample_target: Option<MultisampleTarget>,
}

impl GpuState {
    /// Acquires surface, adapter and device without compiling any program.
    pub(crate) fn with_context(
        window: Arc<Window>,
        config: &RendererConfig,
    ) -> Result<Self, SetupError> {
        let initial_size = window.inner_size();
        let context = GpuContext::new(
            window,
            initial_size,
            config.antialiasing,
            config.color_space,
        )?;
        let multisample_target = (context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        });
        Ok(Self {
            context,
            pipeline: None,
            multisample_target,
        })
    }

    /// Compiles, links and uploads the lightning program from scratch.
    ///
    /// The previous pipeline is released first, so a failure leaves the state
    /// with nothing to draw until the next successful rebuild.
    pub(crate) fn rebuild_pipeline(&mut self) -> Result<(), SetupError> {
        self.pipeline = None;
        let program = shader::lightning_program()?;
        let pipeline = LightningPipeline::new(
            &self.context.device,
            self.context.surface_format,
            self.context.sample_count,
            &program,
        )?;
        debug!(
            format = ?self.context.surface_format,
            samples = self.context.sample_count,
            "lightning pipeline ready"
        );
        self.pipeline = Some(pipeline);
        Ok(())
    }

    /// Drops the pipeline and its buffers. The context stays alive.
    pub(crate) fn release_pipeline(&mut self) {
        if self.pipeline.take().is_some() {
            debug!("released lightning pipeline");
        }
    }

    /// Re-applies the surface configuration after `Lost`/`Outdated`.
    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }
}

impl ProgramHost for GpuState {
    fn rebuild_program(&mut self) -> Result<(), SetupError> {
        self.rebuild_pipeline()
    }
}

impl FrameTarget for GpuState {
    type Error = wgpu::SurfaceError;

    fn backing_size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if !self.context.resize(size) {
            return;
        }
        if self.context.sample_count > 1 {
            self.multisample_target = Some(MultisampleTarget::new(
                &self.context.device,
                self.context.surface_format,
                self.context.size,
                self.context.sample_count,
            ));
        }
    }

    fn draw(&mut self, uniforms: &LightningUniforms) -> Result<(), Self::Error> {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return Ok(());
        };

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.context
            .queue
            .write_buffer(&pipeline.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("lightning encoder"),
                });

        let (attachment_view, resolve_target, store) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(&view), wgpu::StoreOp::Discard),
            None => (&view, None, wgpu::StoreOp::Store),
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lightning pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let size = self.context.size;
            pass.set_viewport(0.0, 0.0, size.width as f32, size.height as f32, 0.0, 1.0);
            pass.set_pipeline(&pipeline.pipeline);
            pass.set_bind_group(0, &pipeline.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, pipeline.vertex_buffer.slice(..));
            pass.draw(0..shader::QUAD_VERTICES.len() as u32, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
