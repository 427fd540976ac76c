//! Static table of the paint and layout properties understood by the painters.
//!
//! Every property maps at compile time to the buffer column it occupies when it depends on
//! feature data and to the uniform slot it is uploaded to when it does not.

use crate::{
    render::uniform::Uniform,
    style::{function::StyleValue, layer::LayerType},
};

/// The shape of the values a property accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Color,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    BackgroundColor,
    BackgroundOpacity,
    CircleRadius,
    CircleColor,
    CircleOpacity,
    LineColor,
    LineOpacity,
    LineWidth,
    LineGapWidth,
    LineDasharray,
    LineMiterLimit,
    FillColor,
    FillOpacity,
    FillTranslate,
    TextColor,
    TextOpacity,
    TextHaloColor,
    TextHaloWidth,
}

impl Property {
    pub const ALL: [Property; 18] = [
        Property::BackgroundColor,
        Property::BackgroundOpacity,
        Property::CircleRadius,
        Property::CircleColor,
        Property::CircleOpacity,
        Property::LineColor,
        Property::LineOpacity,
        Property::LineWidth,
        Property::LineGapWidth,
        Property::LineDasharray,
        Property::LineMiterLimit,
        Property::FillColor,
        Property::FillOpacity,
        Property::FillTranslate,
        Property::TextColor,
        Property::TextOpacity,
        Property::TextHaloColor,
        Property::TextHaloWidth,
    ];

    /// Key of the property within a style declaration.
    pub const fn key(self) -> &'static str {
        match self {
            Property::BackgroundColor => "background-color",
            Property::BackgroundOpacity => "background-opacity",
            Property::CircleRadius => "circle-radius",
            Property::CircleColor => "circle-color",
            Property::CircleOpacity => "circle-opacity",
            Property::LineColor => "line-color",
            Property::LineOpacity => "line-opacity",
            Property::LineWidth => "line-width",
            Property::LineGapWidth => "line-gap-width",
            Property::LineDasharray => "line-dasharray",
            Property::LineMiterLimit => "line-miter-limit",
            Property::FillColor => "fill-color",
            Property::FillOpacity => "fill-opacity",
            Property::FillTranslate => "fill-translate",
            Property::TextColor => "text-color",
            Property::TextOpacity => "text-opacity",
            Property::TextHaloColor => "text-halo-color",
            Property::TextHaloWidth => "text-halo-width",
        }
    }

    pub const fn layer_type(self) -> LayerType {
        match self {
            Property::BackgroundColor | Property::BackgroundOpacity => LayerType::Background,
            Property::CircleRadius | Property::CircleColor | Property::CircleOpacity => {
                LayerType::Circle
            }
            Property::LineColor
            | Property::LineOpacity
            | Property::LineWidth
            | Property::LineGapWidth
            | Property::LineDasharray
            | Property::LineMiterLimit => LayerType::Line,
            Property::FillColor | Property::FillOpacity | Property::FillTranslate => {
                LayerType::Fill
            }
            Property::TextColor
            | Property::TextOpacity
            | Property::TextHaloColor
            | Property::TextHaloWidth => LayerType::Symbol,
        }
    }

    /// Layout properties live in the `layout` object of a style layer, all others in `paint`.
    pub const fn is_layout(self) -> bool {
        matches!(self, Property::LineMiterLimit)
    }

    /// Name of the per-vertex buffer column used when the property depends on feature data.
    pub const fn column(self) -> &'static str {
        match self {
            Property::BackgroundColor
            | Property::CircleColor
            | Property::LineColor
            | Property::FillColor
            | Property::TextColor => "color",
            Property::BackgroundOpacity
            | Property::CircleOpacity
            | Property::LineOpacity
            | Property::FillOpacity
            | Property::TextOpacity => "opacity",
            Property::CircleRadius => "radius",
            Property::LineWidth => "lineWidth",
            Property::LineGapWidth => "gapWidth",
            Property::LineDasharray => "dashPattern",
            Property::LineMiterLimit => "miterLimit",
            Property::FillTranslate => "translate",
            Property::TextHaloColor => "haloColor",
            Property::TextHaloWidth => "haloWidth",
        }
    }

    /// Uniform slot used when the property does not depend on feature data.
    pub const fn uniform(self) -> Uniform {
        match self {
            Property::BackgroundColor
            | Property::CircleColor
            | Property::LineColor
            | Property::FillColor
            | Property::TextColor => Uniform::Color,
            Property::BackgroundOpacity
            | Property::CircleOpacity
            | Property::LineOpacity
            | Property::FillOpacity
            | Property::TextOpacity => Uniform::Opacity,
            Property::CircleRadius => Uniform::Radius,
            Property::LineWidth => Uniform::LineWidth,
            Property::LineGapWidth => Uniform::GapWidth,
            Property::LineDasharray => Uniform::DashPattern,
            Property::LineMiterLimit => Uniform::MiterLimit,
            Property::FillTranslate => Uniform::Translate,
            Property::TextHaloColor => Uniform::HaloColor,
            Property::TextHaloWidth => Uniform::HaloWidth,
        }
    }

    pub const fn value_kind(self) -> ValueKind {
        match self {
            Property::BackgroundColor
            | Property::CircleColor
            | Property::LineColor
            | Property::FillColor
            | Property::TextColor
            | Property::TextHaloColor => ValueKind::Color,
            Property::LineDasharray | Property::FillTranslate => ValueKind::Array,
            _ => ValueKind::Number,
        }
    }

    /// Number of floats one value of this property occupies in a buffer or uniform.
    pub const fn components(self) -> usize {
        match self {
            Property::LineDasharray => 4,
            Property::FillTranslate => 2,
            _ => match self.value_kind() {
                ValueKind::Color => 4,
                _ => 1,
            },
        }
    }

    pub fn default_value(self) -> StyleValue {
        match self {
            Property::BackgroundOpacity
            | Property::CircleOpacity
            | Property::LineOpacity
            | Property::FillOpacity
            | Property::TextOpacity
            | Property::LineWidth => StyleValue::Number(1.0),
            Property::CircleRadius => StyleValue::Number(5.0),
            Property::LineGapWidth | Property::TextHaloWidth => StyleValue::Number(0.0),
            Property::LineMiterLimit => StyleValue::Number(2.0),
            Property::TextHaloColor => StyleValue::Color([0.0, 0.0, 0.0, 0.0]),
            Property::LineDasharray => StyleValue::Array(vec![]),
            Property::FillTranslate => StyleValue::Array(vec![0.0, 0.0]),
            Property::BackgroundColor
            | Property::CircleColor
            | Property::LineColor
            | Property::FillColor
            | Property::TextColor => StyleValue::Color([0.0, 0.0, 0.0, 1.0]),
        }
    }

    /// Looks up a declaration key for the given layer type.
    pub fn from_key(layer_type: LayerType, key: &str) -> Option<Property> {
        Self::ALL
            .into_iter()
            .find(|property| property.layer_type() == layer_type && property.key() == key)
    }

    /// All properties which belong to a layer type.
    pub fn for_layer(layer_type: LayerType) -> impl Iterator<Item = Property> {
        Self::ALL
            .into_iter()
            .filter(move |property| property.layer_type() == layer_type)
    }
}
