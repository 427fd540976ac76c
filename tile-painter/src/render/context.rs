//! The graphics context the renderer draws with.
//!
//! Shader compilation, buffer and texture allocation and draw invocation are provided by the
//! embedding application through [`GpuContext`]. Handles are opaque to the renderer.

use crate::{
    error::Error,
    render::uniform::{Uniform, UniformValue},
};

/// Layout of one vertex attribute and the data backing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeDescriptor<'a> {
    /// Name of the attribute in the vertex shader.
    pub name: &'static str,
    /// Raw little endian `f32` data.
    pub data: &'a [u8],
    pub num_components: u32,
    /// Bytes between consecutive elements. Zero means tightly packed.
    pub stride: u32,
    /// Bytes before the first element.
    pub offset: u32,
    /// Zero for per-vertex data, one for per-instance data.
    pub divisor: u32,
}

impl<'a> AttributeDescriptor<'a> {
    pub fn new(name: &'static str, data: &'a [f32], num_components: u32) -> Self {
        Self {
            name,
            data: bytemuck::cast_slice(data),
            num_components,
            stride: 0,
            offset: 0,
            divisor: 0,
        }
    }

    pub fn per_instance(mut self) -> Self {
        self.divisor = 1;
        self
    }

    pub fn with_layout(mut self, stride: u32, offset: u32) -> Self {
        self.stride = stride;
        self.offset = offset;
        self
    }

    /// Number of elements available to the shader.
    pub fn count(&self) -> usize {
        let element = self.num_components as usize * std::mem::size_of::<f32>();
        let stride = if self.stride == 0 {
            element
        } else {
            self.stride as usize
        };
        let available = self.data.len().saturating_sub(self.offset as usize);
        if available < element {
            0
        } else {
            (available - element) / stride + 1
        }
    }
}

/// An axis aligned quad, drawn as a triangle strip of four vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Quad {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn vertices(&self) -> [f32; 8] {
        [
            self.x0, self.y0, self.x1, self.y0, self.x0, self.y1, self.x1, self.y1,
        ]
    }
}

pub const QUAD_VERTICES: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// One byte per texel, sampled from the red channel. Used for signed distance fields.
    Gray,
    Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDescriptor<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mips: bool,
}

/// How the vertices of a vertex array are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// A quad triangle strip per instance.
    Instanced { vertices: u32, instances: u32 },
    /// Indexed triangles.
    Indexed { count: u32 },
    /// A plain triangle strip.
    Strip { vertices: u32 },
}

/// Everything bound to a vertex array object.
pub struct VaoDescriptor<G: GpuContext + ?Sized> {
    pub attributes: Vec<G::Attribute>,
    pub indices: Option<G::Indices>,
    pub mode: DrawMode,
}

/// Clip rectangle in framebuffer pixels with the origin in the lower left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub trait GpuContext {
    type Program: Clone;
    type Attribute: Clone;
    type Indices: Clone;
    type Vao: Clone;
    type Texture: Clone;
    type Framebuffer;

    fn init_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, Error>;
    fn use_program(&mut self, program: &Self::Program);
    /// Uniforms the program does not declare are ignored.
    fn set_uniform(&mut self, program: &Self::Program, uniform: Uniform, value: UniformValue);
    fn construct_vao(&mut self, program: &Self::Program, descriptor: VaoDescriptor<Self>)
        -> Self::Vao;

    fn init_attribute(&mut self, descriptor: AttributeDescriptor<'_>) -> Self::Attribute;
    fn init_indices(&mut self, data: &[u32]) -> Self::Indices;
    /// Creates the per-vertex attribute `quadPos` holding the corners of `quad`.
    fn init_quad(&mut self, quad: Quad) -> Self::Attribute;
    fn init_texture(&mut self, descriptor: TextureDescriptor<'_>) -> Self::Texture;
    fn bind_texture(&mut self, unit: u32, texture: &Self::Texture);

    fn draw(&mut self, vao: &Self::Vao);
    fn clip_rect(&mut self, rect: ClipRect);
    /// Clears the bound framebuffer. Returns whether it succeeded.
    fn clear(&mut self, color: [f32; 4]) -> bool;
    /// Binds `framebuffer`, or the default framebuffer for `None`, and fits the viewport to it.
    fn bind_framebuffer_and_set_viewport(&mut self, framebuffer: Option<&Self::Framebuffer>);
    /// Width and height of the bound framebuffer in pixels.
    fn framebuffer_size(&self) -> (u32, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_counts() {
        let data = [0.0f32; 12];
        let packed = AttributeDescriptor::new("tileCoords", &data, 3);
        assert_eq!(packed.data.len(), 48);
        assert_eq!(packed.count(), 4);

        // four overlapping windows over four triples
        let window = AttributeDescriptor::new("pointB", &data, 3).with_layout(12, 12);
        assert_eq!(window.count(), 3);

        let empty = AttributeDescriptor::new("circlePos", &[], 2);
        assert_eq!(empty.count(), 0);
    }

    #[test]
    fn quad_strip() {
        let quad = Quad::new(-1.0, -1.0, 1.0, 1.0);
        assert_eq!(
            quad.vertices(),
            [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0]
        );
    }
}
