//! A [`GpuContext`] which records every call instead of talking to a GPU.
//!
//! Useful for tests and headless debugging of draw call sequences.

use crate::{
    error::Error,
    render::{
        context::{
            AttributeDescriptor, ClipRect, DrawMode, GpuContext, Quad, TextureDescriptor,
            VaoDescriptor,
        },
        uniform::{Uniform, UniformValue},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedVao {
    pub id: usize,
    pub program: usize,
    pub mode: DrawMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    InitProgram {
        program: usize,
    },
    UseProgram {
        program: usize,
    },
    SetUniform {
        program: usize,
        uniform: Uniform,
        value: UniformValue,
    },
    ConstructVao {
        vao: usize,
        program: usize,
        attributes: Vec<usize>,
        indices: Option<usize>,
        mode: DrawMode,
    },
    InitAttribute {
        attribute: usize,
        name: &'static str,
        count: usize,
        num_components: u32,
        divisor: u32,
    },
    InitIndices {
        indices: usize,
        count: usize,
    },
    InitTexture {
        texture: usize,
        width: u32,
        height: u32,
    },
    BindTexture {
        unit: u32,
        texture: usize,
    },
    Draw {
        vao: usize,
        mode: DrawMode,
    },
    ClipRect(ClipRect),
    Clear {
        color: [f32; 4],
    },
    BindFramebuffer {
        framebuffer: Option<usize>,
    },
}

/// Records calls. Handles are sequential ids.
#[derive(Debug, Default)]
pub struct RecordingContext {
    width: u32,
    height: u32,
    next_id: usize,
    commands: Vec<GpuCommand>,
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Returns the recorded commands and starts a new recording.
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn draws(&self) -> impl Iterator<Item = &GpuCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, GpuCommand::Draw { .. }))
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GpuContext for RecordingContext {
    type Program = usize;
    type Attribute = usize;
    type Indices = usize;
    type Vao = RecordedVao;
    type Texture = usize;
    type Framebuffer = usize;

    fn init_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, Error> {
        for source in [vertex_source, fragment_source] {
            if !source.starts_with("#version 300 es") || !source.contains("void main()") {
                return Err(Error::Program(
                    "shader is not a GLSL ES 3.0 program".to_string(),
                ));
            }
        }
        let program = self.next_id();
        self.commands.push(GpuCommand::InitProgram { program });
        Ok(program)
    }

    fn use_program(&mut self, program: &Self::Program) {
        self.commands.push(GpuCommand::UseProgram { program: *program });
    }

    fn set_uniform(&mut self, program: &Self::Program, uniform: Uniform, value: UniformValue) {
        self.commands.push(GpuCommand::SetUniform {
            program: *program,
            uniform,
            value,
        });
    }

    fn construct_vao(
        &mut self,
        program: &Self::Program,
        descriptor: VaoDescriptor<Self>,
    ) -> Self::Vao {
        let vao = RecordedVao {
            id: self.next_id(),
            program: *program,
            mode: descriptor.mode,
        };
        self.commands.push(GpuCommand::ConstructVao {
            vao: vao.id,
            program: *program,
            attributes: descriptor.attributes,
            indices: descriptor.indices,
            mode: descriptor.mode,
        });
        vao
    }

    fn init_attribute(&mut self, descriptor: AttributeDescriptor<'_>) -> Self::Attribute {
        let attribute = self.next_id();
        self.commands.push(GpuCommand::InitAttribute {
            attribute,
            name: descriptor.name,
            count: descriptor.count(),
            num_components: descriptor.num_components,
            divisor: descriptor.divisor,
        });
        attribute
    }

    fn init_indices(&mut self, data: &[u32]) -> Self::Indices {
        let indices = self.next_id();
        self.commands.push(GpuCommand::InitIndices {
            indices,
            count: data.len(),
        });
        indices
    }

    fn init_quad(&mut self, quad: Quad) -> Self::Attribute {
        let vertices = quad.vertices();
        self.init_attribute(AttributeDescriptor::new("quadPos", &vertices, 2))
    }

    fn init_texture(&mut self, descriptor: TextureDescriptor<'_>) -> Self::Texture {
        let texture = self.next_id();
        self.commands.push(GpuCommand::InitTexture {
            texture,
            width: descriptor.width,
            height: descriptor.height,
        });
        texture
    }

    fn bind_texture(&mut self, unit: u32, texture: &Self::Texture) {
        self.commands.push(GpuCommand::BindTexture {
            unit,
            texture: *texture,
        });
    }

    fn draw(&mut self, vao: &Self::Vao) {
        self.commands.push(GpuCommand::Draw {
            vao: vao.id,
            mode: vao.mode,
        });
    }

    fn clip_rect(&mut self, rect: ClipRect) {
        self.commands.push(GpuCommand::ClipRect(rect));
    }

    fn clear(&mut self, color: [f32; 4]) -> bool {
        self.commands.push(GpuCommand::Clear { color });
        true
    }

    fn bind_framebuffer_and_set_viewport(&mut self, framebuffer: Option<&Self::Framebuffer>) {
        self.commands.push(GpuCommand::BindFramebuffer {
            framebuffer: framebuffer.copied(),
        });
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
