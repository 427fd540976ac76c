//! This module implements the painting of compiled tiles. It manages the whole communication
//! with the GPU through a [`GpuContext`].

pub mod context;
pub mod grid;
pub mod loader;
pub mod painter;
pub mod programs;
pub mod recording;
pub mod uniform;

use std::collections::HashMap;

pub use context::GpuContext;
pub use loader::LoadedLayer;
pub use painter::{LoadedAtlas, LoadedTile, PaintParams, PaintTarget, Painter};

use crate::{
    error::Error,
    render::{
        context::{DrawMode, TextureDescriptor, TextureFormat, VaoDescriptor, QUAD_VERTICES},
        programs::{ProgramKey, ProgramKind, Programs},
    },
    serialize::{symbol::GlyphAtlas, CompiledLayer, CompiledTile},
    settings::RendererSettings,
    style::StyleLayer,
};

/// Owns the compiled programs and creates loaders and painters on top of a context.
pub struct Renderer<G: GpuContext> {
    settings: RendererSettings,
    programs: Programs<G>,
}

impl<G: GpuContext> Renderer<G> {
    /// Compiles the base variant of every program.
    pub fn new(context: &mut G, settings: RendererSettings) -> Result<Self, Error> {
        let programs = Programs::new(context)?;
        log::info!("renderer initialized with {settings:?}");
        Ok(Self { settings, programs })
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Binds the framebuffer, or the default one, and clears it.
    pub fn prep(&self, context: &mut G, framebuffer: Option<&G::Framebuffer>) -> bool {
        context.bind_framebuffer_and_set_viewport(framebuffer);
        context.clear(self.settings.clear_color)
    }

    pub fn load_buffers(
        &mut self,
        context: &mut G,
        layer: &CompiledLayer,
    ) -> Result<LoadedLayer<G>, Error> {
        loader::load_buffers(context, &mut self.programs, layer)
    }

    pub fn load_atlas(&mut self, context: &mut G, atlas: &GlyphAtlas) -> LoadedAtlas<G> {
        let (width, height) = atlas.dimensions();
        let texture = context.init_texture(TextureDescriptor {
            data: atlas.image.as_raw(),
            width,
            height,
            format: TextureFormat::Gray,
            mips: false,
        });
        LoadedAtlas {
            texture,
            width,
            height,
        }
    }

    /// Loads every layer and atlas of a tile. Fails on the first layer which cannot be loaded.
    #[tracing::instrument(skip_all, fields(coords = %tile.coords))]
    pub fn load_tile(&mut self, context: &mut G, tile: &CompiledTile) -> Result<LoadedTile<G>, Error> {
        let mut layers = HashMap::with_capacity(tile.layers.len());
        for (id, layer) in &tile.layers {
            layers.insert(id.clone(), self.load_buffers(context, layer)?);
        }
        let atlases = tile
            .atlases
            .iter()
            .map(|(source, atlas)| (source.clone(), self.load_atlas(context, atlas)))
            .collect();
        Ok(LoadedTile {
            coords: tile.coords,
            layers,
            atlases,
        })
    }

    /// Creates the painter of a style layer.
    ///
    /// Layer types which cannot be drawn get a painter which does nothing.
    pub fn init_painter(&mut self, context: &mut G, layer: &StyleLayer) -> Result<Painter<G>, Error> {
        let Some(kind) = ProgramKind::for_layer(layer.layer_type) else {
            log::info!("layer {} of type {} is not drawn", layer.id, layer.layer_type);
            return Ok(Painter::NoOp);
        };

        if kind == ProgramKind::Background {
            let key = ProgramKey::new(kind, []);
            let program = self.programs.get(context, &key)?;
            let quad = self
                .programs
                .quad(kind)
                .cloned()
                .ok_or_else(|| Error::Program("background quad is missing".to_string()))?;
            let vao = context.construct_vao(
                &program,
                VaoDescriptor {
                    attributes: vec![quad],
                    indices: None,
                    mode: DrawMode::Strip {
                        vertices: QUAD_VERTICES,
                    },
                },
            );
            return Ok(Painter::Background {
                layer: layer.clone(),
                program,
                vao,
            });
        }

        let key = ProgramKey::new(kind, layer.feature_dependent().map(|(property, _)| property));
        let program = self.programs.get(context, &key)?;
        Ok(Painter::Tiles {
            layer: layer.clone(),
            key,
            program,
        })
    }
}

#[cfg(test)]
mod tests {
    use image::GrayImage;

    use super::*;
    use crate::{
        buffers::{RenderBuffers, CIRCLE_POS, TILE_COORDS},
        coords::TileCoords,
        render::{
            context::ClipRect,
            recording::{GpuCommand, RecordingContext},
            uniform::{Uniform, UniformValue},
        },
        style::{LayerType, Property, StyleFunction, StyleValue, UnsupportedLayer},
    };

    fn renderer(context: &mut RecordingContext) -> Renderer<RecordingContext> {
        let settings = RendererSettings {
            clear_color: [1.0, 1.0, 1.0, 1.0],
            ..RendererSettings::default()
        };
        Renderer::new(context, settings).unwrap()
    }

    fn circle_tile(coords: TileCoords) -> CompiledTile {
        let buffers = RenderBuffers::new()
            .with_column(CIRCLE_POS, vec![100.0, 200.0])
            .with_column(TILE_COORDS, coords.to_array().to_vec());
        let mut tile = CompiledTile::new(coords);
        tile.layers.insert(
            "pois".to_string(),
            CompiledLayer {
                layer_type: LayerType::Circle,
                extent: 512,
                length: buffers.len(),
                buffers,
            },
        );
        tile
    }

    #[test]
    fn prep_clears_with_settings_color() {
        let mut context = RecordingContext::new(256, 256);
        let renderer = renderer(&mut context);
        context.take_commands();

        assert!(renderer.prep(&mut context, Some(&7)));
        assert_eq!(
            context.commands(),
            &[
                GpuCommand::BindFramebuffer {
                    framebuffer: Some(7)
                },
                GpuCommand::Clear {
                    color: [1.0, 1.0, 1.0, 1.0]
                },
            ]
        );
    }

    #[test]
    fn single_tile_fills_framebuffer() {
        let mut context = RecordingContext::new(512, 512);
        let mut renderer = renderer(&mut context);
        let coords = TileCoords::new(5, 9, 4);
        let tile = renderer.load_tile(&mut context, &circle_tile(coords)).unwrap();

        let layer = StyleLayer::new("pois", LayerType::Circle)
            .with_source("osm", "poi")
            .with_property(
                Property::CircleRadius,
                StyleFunction::Constant(StyleValue::Number(3.0)),
            );
        let painter = renderer.init_painter(&mut context, &layer).unwrap();
        context.take_commands();

        painter
            .paint(
                &mut context,
                &PaintParams {
                    target: PaintTarget::Tile(&tile),
                    zoom: 4.0,
                    pixel_ratio: 1.0,
                    camera_scale: 1.0,
                },
            )
            .unwrap();

        let commands = context.commands();
        assert!(commands.contains(&GpuCommand::ClipRect(ClipRect {
            x: 0.0,
            y: 0.0,
            width: 512.0,
            height: 512.0
        })));
        assert!(commands.iter().any(|command| matches!(
            command,
            GpuCommand::SetUniform {
                uniform: Uniform::Radius,
                value: UniformValue::Float(radius),
                ..
            } if *radius == 3.0
        )));
        assert!(commands.iter().any(|command| matches!(
            command,
            GpuCommand::SetUniform {
                uniform: Uniform::MapShift,
                value: UniformValue::Vec3([0.0, 0.0, 512.0]),
                ..
            }
        )));
        assert_eq!(context.draws().count(), 1);
    }

    #[test]
    fn painting_too_deep_tile_fails() {
        let mut context = RecordingContext::new(512, 512);
        let mut renderer = renderer(&mut context);
        let tile = renderer
            .load_tile(&mut context, &circle_tile(TileCoords::new(0, 0, 31)))
            .unwrap();
        let painter = renderer
            .init_painter(&mut context, &StyleLayer::new("pois", LayerType::Circle))
            .unwrap();
        context.take_commands();

        let result = painter.paint(
            &mut context,
            &PaintParams {
                target: PaintTarget::Tile(&tile),
                zoom: 31.0,
                pixel_ratio: 1.0,
                camera_scale: 1.0,
            },
        );
        assert!(matches!(result, Err(Error::Tileset(_))));
        assert_eq!(context.draws().count(), 0);
    }

    #[test]
    fn background_draws_without_tiles() {
        let mut context = RecordingContext::new(256, 256);
        let mut renderer = renderer(&mut context);
        let layer = StyleLayer::new("bg", LayerType::Background).with_property(
            Property::BackgroundColor,
            StyleFunction::Constant(StyleValue::Color([0.0, 0.0, 1.0, 1.0])),
        );
        let painter = renderer.init_painter(&mut context, &layer).unwrap();
        let tile = renderer
            .load_tile(&mut context, &CompiledTile::new(TileCoords::new(0, 0, 0)))
            .unwrap();
        context.take_commands();

        painter
            .paint(
                &mut context,
                &PaintParams {
                    target: PaintTarget::Tile(&tile),
                    zoom: 0.0,
                    pixel_ratio: 1.0,
                    camera_scale: 1.0,
                },
            )
            .unwrap();

        assert_eq!(
            context.draws().collect::<Vec<_>>(),
            vec![&GpuCommand::Draw {
                vao: match &painter {
                    Painter::Background { vao, .. } => vao.id,
                    _ => unreachable!(),
                },
                mode: DrawMode::Strip { vertices: 4 },
            }]
        );
        assert!(!context
            .commands()
            .iter()
            .any(|command| matches!(command, GpuCommand::ClipRect(_))));
    }

    #[test]
    fn unsupported_layers_paint_nothing() {
        let mut context = RecordingContext::new(256, 256);
        let mut renderer = renderer(&mut context);
        let layer = StyleLayer::new("dem", LayerType::Unsupported(UnsupportedLayer::Hillshade));
        let painter = renderer.init_painter(&mut context, &layer).unwrap();
        assert!(painter.is_noop());
    }

    #[test]
    fn atlases_are_gray_textures() {
        let mut context = RecordingContext::new(256, 256);
        let mut renderer = renderer(&mut context);
        let mut tile = CompiledTile::new(TileCoords::new(0, 0, 1));
        tile.atlases
            .insert("osm".to_string(), GlyphAtlas::new(GrayImage::new(64, 32)));
        context.take_commands();

        let loaded = renderer.load_tile(&mut context, &tile).unwrap();
        let atlas = &loaded.atlases["osm"];
        assert_eq!((atlas.width, atlas.height), (64, 32));
        assert_eq!(
            context.commands(),
            &[GpuCommand::InitTexture {
                texture: atlas.texture,
                width: 64,
                height: 32
            }]
        );
    }
}
