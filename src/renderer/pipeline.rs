use super::shader::{CompiledShaders, ShaderError, ShaderStage};
use super::vertex::Vertex;
use gfx_hal::{pass::Subpass, prelude::*, pso, Backend};
use std::iter;
use std::ops::Range;

const ENTRY_NAME: &str = "main";

/// The linked shader program: a graphics pipeline and its (empty) layout.
pub struct Pipeline<B: Backend> {
    pub pipeline: B::GraphicsPipeline,
    pub pipeline_layout: B::PipelineLayout,
}

impl<B: Backend> Pipeline<B> {
    pub fn new(
        device: &B::Device,
        shaders: &CompiledShaders,
        render_pass: &B::RenderPass,
    ) -> Result<Self, ShaderError> {
        let pipeline_layout = unsafe {
            device.create_pipeline_layout(
                iter::empty::<&B::DescriptorSetLayout>(),
                iter::empty::<&(pso::ShaderStageFlags, Range<u32>)>(),
            )
        }
        .map_err(|err| ShaderError::Link(format!("{:?}", err)))?;

        let vs_module = match Self::load_spirv(device, ShaderStage::Vertex, &shaders.vertex) {
            Ok(module) => module,
            Err(err) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout) };
                return Err(err);
            }
        };
        let fs_module = match Self::load_spirv(device, ShaderStage::Fragment, &shaders.fragment) {
            Ok(module) => module,
            Err(err) => {
                unsafe {
                    device.destroy_shader_module(vs_module);
                    device.destroy_pipeline_layout(pipeline_layout);
                }
                return Err(err);
            }
        };

        let linked = Self::link(device, &vs_module, &fs_module, &pipeline_layout, render_pass);

        // Stages are released whatever the link outcome.
        unsafe {
            device.destroy_shader_module(vs_module);
            device.destroy_shader_module(fs_module);
        }

        match linked {
            Ok(pipeline) => Ok(Pipeline {
                pipeline,
                pipeline_layout,
            }),
            Err(err) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout) };
                Err(err)
            }
        }
    }

    fn link(
        device: &B::Device,
        vs_module: &B::ShaderModule,
        fs_module: &B::ShaderModule,
        pipeline_layout: &B::PipelineLayout,
        render_pass: &B::RenderPass,
    ) -> Result<B::GraphicsPipeline, ShaderError> {
        let (vs_entry, fs_entry) = (
            pso::EntryPoint {
                entry: ENTRY_NAME,
                module: vs_module,
                specialization: pso::Specialization::default(),
            },
            pso::EntryPoint {
                entry: ENTRY_NAME,
                module: fs_module,
                specialization: pso::Specialization::default(),
            },
        );

        let shader_entries = pso::GraphicsShaderSet {
            vertex: vs_entry,
            hull: None,
            domain: None,
            geometry: None,
            fragment: Some(fs_entry),
        };

        let subpass = Subpass {
            index: 0,
            main_pass: render_pass,
        };

        let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
            shader_entries,
            pso::Primitive::TriangleList,
            pso::Rasterizer::FILL,
            pipeline_layout,
            subpass,
        );
        pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
            mask: pso::ColorMask::ALL,
            blend: Some(pso::BlendState::ALPHA),
        });

        pipeline_desc.vertex_buffers.push(Vertex::buffer_desc());
        pipeline_desc.attributes.extend_from_slice(&Vertex::attributes());

        unsafe { device.create_graphics_pipeline(&pipeline_desc, None) }
            .map_err(|err| ShaderError::Link(format!("{:?}", err)))
    }

    fn load_spirv(
        device: &B::Device,
        stage: ShaderStage,
        spirv: &[u32],
    ) -> Result<B::ShaderModule, ShaderError> {
        unsafe { device.create_shader_module(spirv) }.map_err(|err| ShaderError::Module {
            stage,
            reason: format!("{:?}", err),
        })
    }

    pub unsafe fn destroy(self, device: &B::Device) {
        device.destroy_graphics_pipeline(self.pipeline);
        device.destroy_pipeline_layout(self.pipeline_layout);
    }
}
