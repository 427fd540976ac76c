//! Uniform slots of the tile programs.

/// A uniform understood by at least one program.
///
/// Programs ignore uniforms they do not declare, so painters may set every slot of their
/// layer type unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Uniform {
    ScreenScale,
    MapCoords,
    MapShift,
    Radius,
    Color,
    Opacity,
    LineWidth,
    GapWidth,
    MiterLimit,
    DashPattern,
    Translate,
    HaloColor,
    HaloWidth,
    Sdf,
    SdfDimensions,
}

impl Uniform {
    /// Name of the uniform in the GLSL sources.
    pub const fn name(self) -> &'static str {
        match self {
            Uniform::ScreenScale => "screenScale",
            Uniform::MapCoords => "mapCoords",
            Uniform::MapShift => "mapShift",
            Uniform::Radius => "radius",
            Uniform::Color => "color",
            Uniform::Opacity => "opacity",
            Uniform::LineWidth => "lineWidth",
            Uniform::GapWidth => "gapWidth",
            Uniform::MiterLimit => "miterLimit",
            Uniform::DashPattern => "dashPattern",
            Uniform::Translate => "translate",
            Uniform::HaloColor => "haloColor",
            Uniform::HaloWidth => "haloWidth",
            Uniform::Sdf => "sdf",
            Uniform::SdfDimensions => "sdfDim",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Texture unit of a sampler.
    Sampler(u32),
}

impl UniformValue {
    /// Packs up to four floats into the matching vector type.
    pub fn from_components(components: &[f32]) -> Option<Self> {
        match *components {
            [x] => Some(UniformValue::Float(x)),
            [x, y] => Some(UniformValue::Vec2([x, y])),
            [x, y, z] => Some(UniformValue::Vec3([x, y, z])),
            [x, y, z, w] => Some(UniformValue::Vec4([x, y, z, w])),
            _ => None,
        }
    }
}
