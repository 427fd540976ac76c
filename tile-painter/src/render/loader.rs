//! Uploads compiled layers into vertex arrays.

use crate::{
    buffers::{
        BufferShape, RenderBuffers, CIRCLE_POS, GLYPH_POS, GLYPH_RECT, LABEL_POS, LINES,
        POSITION, TILE_COORDS,
    },
    error::Error,
    geometry::flatten::LINE_STRIDE,
    render::{
        context::{AttributeDescriptor, DrawMode, GpuContext, VaoDescriptor, QUAD_VERTICES},
        programs::{ProgramKey, ProgramKind, Programs},
    },
    serialize::CompiledLayer,
    style::{LayerType, Property},
};

/// A compiled layer living on the GPU.
pub struct LoadedLayer<G: GpuContext> {
    pub layer_type: LayerType,
    pub extent: u32,
    /// Instances or vertices drawn.
    pub length: usize,
    pub vao: G::Vao,
    pub program: G::Program,
    pub key: ProgramKey,
}

impl<G: GpuContext> Clone for LoadedLayer<G> {
    fn clone(&self) -> Self {
        Self {
            layer_type: self.layer_type,
            extent: self.extent,
            length: self.length,
            vao: self.vao.clone(),
            program: self.program.clone(),
            key: self.key.clone(),
        }
    }
}

const fn shape_kind(shape: BufferShape) -> ProgramKind {
    match shape {
        BufferShape::Circle => ProgramKind::Circle,
        BufferShape::Line => ProgramKind::Line,
        BufferShape::Fill => ProgramKind::Fill,
        BufferShape::Symbol => ProgramKind::Symbol,
    }
}

/// Static attribute name of a buffer column, if any program reads it.
fn attribute_name(column: &str) -> Option<&'static str> {
    [TILE_COORDS, LABEL_POS, GLYPH_RECT]
        .into_iter()
        .find(|name| *name == column)
        .or_else(|| {
            Property::ALL
                .into_iter()
                .map(Property::column)
                .find(|name| *name == column)
        })
}

fn column_names(buffers: &RenderBuffers) -> String {
    buffers.column_names().join(", ")
}

/// Creates the vertex array of a compiled layer.
///
/// The program variant is chosen from the columns present, so feature dependent properties
/// are read from attributes and all others from uniforms.
#[tracing::instrument(skip_all)]
pub fn load_buffers<G: GpuContext>(
    context: &mut G,
    programs: &mut Programs<G>,
    layer: &CompiledLayer,
) -> Result<LoadedLayer<G>, Error> {
    let buffers = &layer.buffers;
    let shape = buffers
        .shape()
        .ok_or_else(|| Error::UnknownBufferShape(column_names(buffers)))?;
    let kind = shape_kind(shape);
    if ProgramKind::for_layer(layer.layer_type) != Some(kind) {
        return Err(Error::UnknownBufferShape(format!(
            "{} for a {} layer",
            column_names(buffers),
            layer.layer_type
        )));
    }

    let key = ProgramKey::for_columns(kind, buffers.column_names());
    let program = programs.get(context, &key)?;

    let per_instance = shape != BufferShape::Fill;
    let units = buffers.units();
    let mut attributes = Vec::new();
    if let Some(quad) = programs.quad(kind) {
        attributes.push(quad.clone());
    }

    for (column, data) in &buffers.columns {
        let descriptor = match column.as_str() {
            LINES => {
                // four overlapping windows of consecutive points
                let stride = (LINE_STRIDE * std::mem::size_of::<f32>()) as u32;
                for (i, name) in ["pointA", "pointB", "pointC", "pointD"].into_iter().enumerate() {
                    let window = AttributeDescriptor::new(name, data, LINE_STRIDE as u32)
                        .with_layout(stride, stride * i as u32)
                        .per_instance();
                    attributes.push(context.init_attribute(window));
                }
                continue;
            }
            CIRCLE_POS => AttributeDescriptor::new(CIRCLE_POS, data, 2),
            POSITION => AttributeDescriptor::new(POSITION, data, 2),
            GLYPH_POS => AttributeDescriptor::new(GLYPH_POS, data, 4),
            column => {
                let Some(name) = attribute_name(column) else {
                    log::warn!("ignoring buffer column {column} of a {kind:?} layer");
                    continue;
                };
                if units == 0 || data.len() % units != 0 {
                    return Err(Error::UnknownBufferShape(format!(
                        "column {column} of {} floats does not match {units} units",
                        data.len()
                    )));
                }
                AttributeDescriptor::new(name, data, (data.len() / units) as u32)
            }
        };
        let descriptor = if per_instance {
            descriptor.per_instance()
        } else {
            descriptor
        };
        attributes.push(context.init_attribute(descriptor));
    }

    let (indices, mode) = match shape {
        BufferShape::Fill => {
            let indices = buffers.indices.as_deref().unwrap_or_default();
            (
                Some(context.init_indices(indices)),
                DrawMode::Indexed {
                    count: indices.len() as u32,
                },
            )
        }
        _ => (
            None,
            DrawMode::Instanced {
                vertices: QUAD_VERTICES,
                instances: layer.length as u32,
            },
        ),
    };

    let vao = context.construct_vao(
        &program,
        VaoDescriptor {
            attributes,
            indices,
            mode,
        },
    );
    log::trace!("loaded {kind:?} layer with {} units", units);

    Ok(LoadedLayer {
        layer_type: layer.layer_type,
        extent: layer.extent,
        length: layer.length,
        vao,
        program,
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffers::RenderBuffers,
        render::recording::{GpuCommand, RecordingContext},
    };

    fn setup() -> (RecordingContext, Programs<RecordingContext>) {
        let mut context = RecordingContext::new(512, 512);
        let programs = Programs::new(&mut context).unwrap();
        context.take_commands();
        (context, programs)
    }

    fn compiled(layer_type: LayerType, buffers: RenderBuffers) -> CompiledLayer {
        let length = buffers.len();
        CompiledLayer {
            layer_type,
            extent: 512,
            buffers,
            length,
        }
    }

    fn attributes(context: &RecordingContext) -> Vec<(&'static str, usize, u32, u32)> {
        context
            .commands()
            .iter()
            .filter_map(|command| match command {
                GpuCommand::InitAttribute {
                    name,
                    count,
                    num_components,
                    divisor,
                    ..
                } => Some((*name, *count, *num_components, *divisor)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn circle_columns_are_instanced() {
        let (mut context, mut programs) = setup();
        let buffers = RenderBuffers::new()
            .with_column(CIRCLE_POS, vec![1.0, 2.0, 3.0, 4.0])
            .with_column(TILE_COORDS, vec![5.0, 9.0, 4.0, 5.0, 9.0, 4.0])
            .with_column("radius", vec![3.0, 4.0]);
        let layer = compiled(LayerType::Circle, buffers);

        let loaded = load_buffers(&mut context, &mut programs, &layer).unwrap();
        assert_eq!(loaded.key.data_columns(), &["radius"]);
        assert_eq!(
            loaded.vao.mode,
            DrawMode::Instanced {
                vertices: 4,
                instances: 2
            }
        );
        assert_eq!(
            attributes(&context),
            vec![
                ("circlePos", 2, 2, 1),
                ("radius", 2, 1, 1),
                ("tileCoords", 2, 3, 1),
            ]
        );
    }

    #[test]
    fn lines_are_windowed() {
        let (mut context, mut programs) = setup();
        // two points, bracketed by caps
        let lines = vec![
            0.0, 0.0, -999.0, 0.0, 0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, -999.0,
        ];
        let buffers = RenderBuffers::new()
            .with_column(LINES, lines)
            .with_column(TILE_COORDS, vec![0.0; 12]);
        let layer = compiled(LayerType::Line, buffers);

        let loaded = load_buffers(&mut context, &mut programs, &layer).unwrap();
        assert_eq!(loaded.length, 1);
        // every window has at least one element per instance
        assert_eq!(
            attributes(&context),
            vec![
                ("pointA", 4, 3, 1),
                ("pointB", 3, 3, 1),
                ("pointC", 2, 3, 1),
                ("pointD", 1, 3, 1),
                ("tileCoords", 4, 3, 1),
            ]
        );
    }

    #[test]
    fn fills_are_indexed() {
        let (mut context, mut programs) = setup();
        let buffers = RenderBuffers::new()
            .with_column(POSITION, vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0])
            .with_column(TILE_COORDS, vec![0.0; 9])
            .with_indices(vec![0, 1, 2]);
        let layer = compiled(LayerType::Fill, buffers);

        let loaded = load_buffers(&mut context, &mut programs, &layer).unwrap();
        assert_eq!(loaded.vao.mode, DrawMode::Indexed { count: 3 });
        assert_eq!(
            attributes(&context),
            vec![("position", 3, 2, 0), ("tileCoords", 3, 3, 0)]
        );
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        let (mut context, mut programs) = setup();
        let unknown = compiled(
            LayerType::Circle,
            RenderBuffers::new().with_column("heights", vec![1.0]),
        );
        assert!(matches!(
            load_buffers(&mut context, &mut programs, &unknown),
            Err(Error::UnknownBufferShape(_))
        ));

        let mismatched = compiled(
            LayerType::Fill,
            RenderBuffers::new().with_column(CIRCLE_POS, vec![1.0, 2.0]),
        );
        assert!(matches!(
            load_buffers(&mut context, &mut programs, &mismatched),
            Err(Error::UnknownBufferShape(_))
        ));
    }
}
