//! Painters draw one style layer over a set of loaded tiles.

use std::collections::HashMap;

use crate::{
    coords::TileCoords,
    error::Error,
    render::{
        context::GpuContext,
        grid::{screen_scale, TileBox, Tileset},
        loader::LoadedLayer,
        programs::ProgramKey,
        uniform::{Uniform, UniformValue},
    },
    style::{LayerType, StyleLayer},
};

/// Texture unit the glyph atlas is bound to.
const SDF_UNIT: u32 = 0;

/// A glyph atlas uploaded as a texture.
pub struct LoadedAtlas<G: GpuContext> {
    pub texture: G::Texture,
    pub width: u32,
    pub height: u32,
}

/// The layers and atlases of one tile living on the GPU.
pub struct LoadedTile<G: GpuContext> {
    pub coords: TileCoords,
    /// Layers by style layer id.
    pub layers: HashMap<String, LoadedLayer<G>>,
    /// Atlases by source name.
    pub atlases: HashMap<String, LoadedAtlas<G>>,
}

impl<G: GpuContext> LoadedTile<G> {
    pub fn layer(&self, id: &str) -> Option<&LoadedLayer<G>> {
        self.layers.get(id)
    }
}

/// What to paint into the bound framebuffer.
pub enum PaintTarget<'a, G: GpuContext> {
    /// A grid of tiles sharing one zoom level.
    Tileset(&'a Tileset<&'a LoadedTile<G>>),
    /// A single tile filling the whole framebuffer.
    Tile(&'a LoadedTile<G>),
}

pub struct PaintParams<'a, G: GpuContext> {
    pub target: PaintTarget<'a, G>,
    /// Zoom level the style functions are evaluated at.
    pub zoom: f64,
    pub pixel_ratio: f32,
    /// Additional scale of pixel sized properties, for example during zoom animations.
    pub camera_scale: f32,
}

/// Paints a single style layer. Created by [`Renderer::init_painter`](crate::render::Renderer::init_painter).
pub enum Painter<G: GpuContext> {
    /// Layers which are not drawn.
    NoOp,
    Background {
        layer: StyleLayer,
        program: G::Program,
        vao: G::Vao,
    },
    Tiles {
        layer: StyleLayer,
        key: ProgramKey,
        program: G::Program,
    },
}

impl<G: GpuContext> Painter<G> {
    pub fn is_noop(&self) -> bool {
        matches!(self, Painter::NoOp)
    }

    #[tracing::instrument(skip_all)]
    pub fn paint(&self, context: &mut G, params: &PaintParams<'_, G>) -> Result<(), Error> {
        match self {
            Painter::NoOp => {}
            Painter::Background {
                layer,
                program,
                vao,
            } => {
                context.use_program(program);
                set_style_uniforms(context, program, layer, params.zoom);
                context.draw(vao);
            }
            Painter::Tiles {
                layer,
                key,
                program,
            } => match params.target {
                PaintTarget::Tileset(tileset) => {
                    paint_tileset(context, layer, key, program, tileset, params);
                }
                PaintTarget::Tile(tile) => {
                    let (width, _) = context.framebuffer_size();
                    let TileCoords { x, y, z } = tile.coords;
                    let tileset = Tileset::new(
                        z,
                        [-(x as f32), -(y as f32)],
                        width as f32 / params.pixel_ratio,
                        vec![TileBox { x, y, tile }],
                    )?;
                    paint_tileset(context, layer, key, program, &tileset, params);
                }
            },
        }
        Ok(())
    }
}

/// Uploads every property which does not depend on feature data.
fn set_style_uniforms<G: GpuContext>(
    context: &mut G,
    program: &G::Program,
    layer: &StyleLayer,
    zoom: f64,
) {
    for (property, function) in layer.uniform_properties() {
        let Some(value) = function.evaluate(zoom, None) else {
            continue;
        };
        match UniformValue::from_components(&value.to_components(property.components())) {
            Some(value) => context.set_uniform(program, property.uniform(), value),
            None => log::warn!("{} of layer {} has no uniform type", property.key(), layer.id),
        }
    }
}

/// Draws the layer of every tile of the set, clipped to the box of the tile.
///
/// Uniforms shared by all tiles are set once. Tiles which lack the layer, or the atlas of a
/// symbol layer, are skipped.
fn paint_tileset<G: GpuContext>(
    context: &mut G,
    layer: &StyleLayer,
    key: &ProgramKey,
    program: &G::Program,
    tileset: &Tileset<&LoadedTile<G>>,
    params: &PaintParams<'_, G>,
) {
    if tileset.is_empty() {
        return;
    }
    let pixel_ratio = params.pixel_ratio;
    let (width, height) = context.framebuffer_size();

    context.use_program(program);
    context.set_uniform(
        program,
        Uniform::ScreenScale,
        UniformValue::Vec4(screen_scale(
            width,
            height,
            pixel_ratio,
            params.camera_scale,
        )),
    );
    set_style_uniforms(context, program, layer, params.zoom);

    let is_symbol = layer.layer_type == LayerType::Symbol;
    if is_symbol {
        context.set_uniform(program, Uniform::Sdf, UniformValue::Sampler(SDF_UNIT));
    }

    let mut extent = None;
    for subset in tileset.antimeridian_split(pixel_ratio) {
        context.set_uniform(program, Uniform::MapShift, UniformValue::Vec3(subset.map_shift));

        for tile_box in subset.boxes {
            let tile = tile_box.tile;
            let Some(loaded) = tile.layer(&layer.id) else {
                continue;
            };
            if &loaded.key != key {
                log::warn!(
                    "layer {} of {} was loaded for another program variant",
                    layer.id,
                    tile.coords
                );
                continue;
            }

            if extent != Some(loaded.extent) {
                if let Some(map_coords) = tileset.map_coords(loaded.extent) {
                    context.set_uniform(program, Uniform::MapCoords, UniformValue::Vec4(map_coords));
                }
                extent = Some(loaded.extent);
            }

            if is_symbol {
                let Some(atlas) = layer
                    .source
                    .as_deref()
                    .and_then(|source| tile.atlases.get(source))
                else {
                    log::trace!("no atlas for layer {} of {}", layer.id, tile.coords);
                    continue;
                };
                context.bind_texture(SDF_UNIT, &atlas.texture);
                context.set_uniform(
                    program,
                    Uniform::SdfDimensions,
                    UniformValue::Vec2([atlas.width as f32, atlas.height as f32]),
                );
            }

            context.clip_rect(tileset.clip_rect(tile_box, pixel_ratio, height));
            tracing::trace!(coords = %tile.coords, layer = %layer.id, "draw");
            context.draw(&loaded.vao);
        }
    }
}
