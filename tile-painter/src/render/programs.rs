//! GLSL programs of the painters.
//!
//! A style property is read from a vertex attribute when it depends on feature data and from
//! a uniform otherwise. Every such combination is a separate variant of a program, selected by
//! `DATA_<column>` defines and compiled on first use.

use std::collections::HashMap;

use crate::{
    error::Error,
    render::context::{GpuContext, Quad},
    style::{LayerType, Property},
};

const VERSION: &str = "#version 300 es\n";
const TILE_FUNCTIONS: &str = include_str!("shaders/tile.glsl");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProgramKind {
    Background,
    Circle,
    Line,
    Fill,
    Symbol,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 5] = [
        ProgramKind::Background,
        ProgramKind::Circle,
        ProgramKind::Line,
        ProgramKind::Fill,
        ProgramKind::Symbol,
    ];

    /// `None` for layer types which are not drawn.
    pub fn for_layer(layer_type: LayerType) -> Option<Self> {
        match layer_type {
            LayerType::Background => Some(ProgramKind::Background),
            LayerType::Circle => Some(ProgramKind::Circle),
            LayerType::Line => Some(ProgramKind::Line),
            LayerType::Fill => Some(ProgramKind::Fill),
            LayerType::Symbol => Some(ProgramKind::Symbol),
            LayerType::Unsupported(_) => None,
        }
    }

    fn shaders(self) -> (&'static str, &'static str) {
        match self {
            ProgramKind::Background => (
                include_str!("shaders/background.vert"),
                include_str!("shaders/background.frag"),
            ),
            ProgramKind::Circle => (
                include_str!("shaders/circle.vert"),
                include_str!("shaders/circle.frag"),
            ),
            ProgramKind::Line => (
                include_str!("shaders/line.vert"),
                include_str!("shaders/line.frag"),
            ),
            ProgramKind::Fill => (
                include_str!("shaders/fill.vert"),
                include_str!("shaders/fill.frag"),
            ),
            ProgramKind::Symbol => (
                include_str!("shaders/symbol.vert"),
                include_str!("shaders/symbol.frag"),
            ),
        }
    }

    /// The quad drawn per instance, or over the whole framebuffer for backgrounds.
    pub fn quad(self) -> Option<Quad> {
        match self {
            ProgramKind::Background | ProgramKind::Circle => Some(Quad::new(-1.0, -1.0, 1.0, 1.0)),
            ProgramKind::Line => Some(Quad::new(0.0, -1.0, 1.0, 1.0)),
            ProgramKind::Symbol => Some(Quad::new(0.0, 0.0, 1.0, 1.0)),
            ProgramKind::Fill => None,
        }
    }
}

/// Identifies one variant of a program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramKey {
    pub kind: ProgramKind,
    /// Sorted, deduplicated columns read from vertex attributes.
    data_columns: Vec<&'static str>,
}

impl ProgramKey {
    pub fn new(kind: ProgramKind, properties: impl IntoIterator<Item = Property>) -> Self {
        let mut data_columns: Vec<_> = properties
            .into_iter()
            .map(|property| property.column())
            .collect();
        data_columns.sort_unstable();
        data_columns.dedup();
        Self { kind, data_columns }
    }

    /// The variant reading the given buffer columns from attributes. Columns which belong to
    /// no style property are ignored.
    pub fn for_columns<'a>(kind: ProgramKind, columns: impl IntoIterator<Item = &'a str>) -> Self {
        let properties = columns.into_iter().filter_map(|column| {
            Property::ALL
                .into_iter()
                .find(|property| property.column() == column)
        });
        Self::new(kind, properties)
    }

    pub fn data_columns(&self) -> &[&'static str] {
        &self.data_columns
    }

    fn defines(&self) -> String {
        self.data_columns
            .iter()
            .map(|column| format!("#define DATA_{column}\n"))
            .collect()
    }

    pub fn vertex_source(&self) -> String {
        let (vertex, _) = self.kind.shaders();
        let tile_functions = if self.kind == ProgramKind::Background {
            ""
        } else {
            TILE_FUNCTIONS
        };
        format!("{VERSION}{}{tile_functions}{vertex}", self.defines())
    }

    pub fn fragment_source(&self) -> String {
        let (_, fragment) = self.kind.shaders();
        format!("{VERSION}{}{fragment}", self.defines())
    }
}

/// Compiled program variants and the quads shared by all vertex arrays.
pub struct Programs<G: GpuContext> {
    compiled: HashMap<ProgramKey, G::Program>,
    quads: HashMap<ProgramKind, G::Attribute>,
}

impl<G: GpuContext> Programs<G> {
    /// Compiles the uniform-only variant of every program.
    pub fn new(context: &mut G) -> Result<Self, Error> {
        let mut programs = Self {
            compiled: HashMap::new(),
            quads: HashMap::new(),
        };
        for kind in ProgramKind::ALL {
            programs.get(context, &ProgramKey::new(kind, []))?;
            if let Some(quad) = kind.quad() {
                programs.quads.insert(kind, context.init_quad(quad));
            }
        }
        Ok(programs)
    }

    /// Returns the variant, compiling it if needed.
    pub fn get(&mut self, context: &mut G, key: &ProgramKey) -> Result<G::Program, Error> {
        if let Some(program) = self.compiled.get(key) {
            return Ok(program.clone());
        }

        log::debug!("compiling {:?} program reading {:?}", key.kind, key.data_columns);
        let program = context
            .init_program(&key.vertex_source(), &key.fragment_source())
            .map_err(|e| {
                log::error!("{:?} program variant {:?} failed: {e}", key.kind, key.data_columns);
                e
            })?;
        self.compiled.insert(key.clone(), program.clone());
        Ok(program)
    }

    pub fn quad(&self, kind: ProgramKind) -> Option<&G::Attribute> {
        self.quads.get(&kind)
    }
}
