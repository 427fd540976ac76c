use async_trait::async_trait;
use geo_types::{point, polygon};
use tile_painter::{
    buffers::RenderBuffers,
    coords::TileCoords,
    error::Error,
    geometry::{Feature, TileLayer, VectorTile},
    render::{
        context::ClipRect,
        grid::{TileBox, Tileset},
        recording::{GpuCommand, RecordingContext},
        uniform::Uniform,
        LoadedTile, PaintParams, PaintTarget, Renderer,
    },
    serialize::{
        symbol::{AtlasSource, CollisionIndex, GlyphAtlas, LabelShaper},
        CompiledLayer, TileSerializer,
    },
    settings::RendererSettings,
    style::{LayerType, Style, StyleLayer},
};

const STYLE: &str = r##"{
    "version": 8,
    "sources": {"osm": {"type": "vector"}, "terrain": {"type": "raster-dem"}},
    "layers": [
        {"id": "bg", "type": "background", "paint": {"background-color": "#f8f4f0"}},
        {"id": "water", "type": "fill", "source": "osm", "source-layer": "water",
         "paint": {"fill-color": "#a0c8f0", "fill-opacity": {"stops": [[0, 0.5], [10, 1]]}}},
        {"id": "pois", "type": "circle", "source": "osm", "source-layer": "poi",
         "paint": {
            "circle-radius": 4,
            "circle-color": {"property": "kind", "type": "categorical",
                             "stops": [["park", "#00ff00"]], "default": "#888888"}
         }},
        {"id": "hills", "type": "hillshade", "source": "terrain"}
    ]
}"##;

struct NoLabels;

impl LabelShaper for NoLabels {
    fn shape(
        &self,
        _layer: &StyleLayer,
        _feature: &Feature,
        _coords: TileCoords,
        _atlas: &GlyphAtlas,
        _collisions: &mut CollisionIndex,
    ) -> Option<RenderBuffers> {
        None
    }
}

struct NoAtlases;

#[cfg_attr(not(feature = "thread-safe-futures"), async_trait(?Send))]
#[cfg_attr(feature = "thread-safe-futures", async_trait)]
impl AtlasSource for NoAtlases {
    async fn request_atlas(&self, source: &str, _zoom: u8) -> Result<GlyphAtlas, Error> {
        Err(Error::Atlas {
            source_name: source.to_string(),
            source: "no glyphs in this test".into(),
        })
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn poi_layer(kinds: &[&str]) -> TileLayer {
    TileLayer {
        name: "poi".to_string(),
        extent: None,
        features: kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                Feature::new(point!(x: 64.0 * (i + 1) as f64, y: 128.0)).with_property("kind", *kind)
            })
            .collect(),
    }
}

fn water_layer() -> TileLayer {
    TileLayer {
        name: "water".to_string(),
        extent: Some(4096),
        features: vec![Feature::new(polygon![
            (x: 0.0, y: 0.0),
            (x: 4096.0, y: 0.0),
            (x: 4096.0, y: 4096.0),
            (x: 0.0, y: 4096.0),
        ])],
    }
}

fn uniform_count(commands: &[GpuCommand], uniform: Uniform) -> usize {
    commands
        .iter()
        .filter(|command| matches!(command, GpuCommand::SetUniform { uniform: u, .. } if *u == uniform))
        .count()
}

fn clip_rects(commands: &[GpuCommand]) -> Vec<ClipRect> {
    commands
        .iter()
        .filter_map(|command| match command {
            GpuCommand::ClipRect(rect) => Some(*rect),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn paints_tileset_across_the_antimeridian() {
    init_logger();
    let style = Style::from_json(STYLE).unwrap();
    let serializer = TileSerializer::new(&style.layers, NoLabels, 512);

    let tiles = [
        (
            TileCoords::new(1, 0, 1),
            VectorTile::new().with_layer(poi_layer(&["park", "shop"])),
        ),
        (
            TileCoords::new(0, 0, 1),
            VectorTile::new().with_layer(poi_layer(&["park"])),
        ),
        (
            TileCoords::new(1, 1, 1),
            VectorTile::new().with_layer(water_layer()),
        ),
    ];

    let mut compiled = Vec::new();
    for (coords, tile) in &tiles {
        compiled.push(serializer.serialize_tile(tile, *coords, &NoAtlases).await);
    }
    let pois = compiled[0].layer("pois").unwrap();
    assert_eq!(pois.length, 2);
    assert_eq!(
        pois.buffers.column_names(),
        vec!["circlePos", "color", "tileCoords"]
    );
    assert!(compiled[2].layer("water").is_some());
    assert!(compiled.iter().all(|tile| tile.layer("hills").is_none()));

    let mut context = RecordingContext::new(768, 256);
    let mut renderer = Renderer::new(&mut context, RendererSettings::default()).unwrap();
    let loaded: Vec<LoadedTile<RecordingContext>> = compiled
        .iter()
        .map(|tile| renderer.load_tile(&mut context, tile).unwrap())
        .collect();

    let painters = style
        .layers
        .iter()
        .map(|layer| renderer.init_painter(&mut context, layer).unwrap())
        .collect::<Vec<_>>();
    assert!(painters[3].is_noop());

    // x=2 shows the canonical tile x=0 one world copy to the right
    let tileset = Tileset::new(
        1u8,
        [-1.0, 0.0],
        256.0,
        vec![
            TileBox { x: 1, y: 0, tile: &loaded[0] },
            TileBox { x: 2, y: 0, tile: &loaded[1] },
            TileBox { x: 3, y: 0, tile: &loaded[2] },
        ],
    )
    .unwrap();
    let params = PaintParams {
        target: PaintTarget::Tileset(&tileset),
        zoom: 1.0,
        pixel_ratio: 1.0,
        camera_scale: 1.0,
    };

    assert!(renderer.prep(&mut context, None));
    context.take_commands();
    painters[2].paint(&mut context, &params).unwrap();
    let commands = context.take_commands();

    assert_eq!(
        commands
            .iter()
            .filter(|command| matches!(command, GpuCommand::Draw { .. }))
            .count(),
        2
    );
    assert_eq!(uniform_count(&commands, Uniform::ScreenScale), 1);
    assert_eq!(uniform_count(&commands, Uniform::Radius), 1);
    // two world copies, the second one without any pois
    assert_eq!(uniform_count(&commands, Uniform::MapShift), 2);
    // feature dependent colors are read from the buffers
    assert_eq!(uniform_count(&commands, Uniform::Color), 0);
    assert_eq!(
        clip_rects(&commands),
        vec![
            ClipRect { x: 0.0, y: 0.0, width: 256.0, height: 256.0 },
            ClipRect { x: 256.0, y: 0.0, width: 256.0, height: 256.0 },
        ]
    );

    painters[3].paint(&mut context, &params).unwrap();
    assert!(context.commands().is_empty());

    painters[1].paint(&mut context, &params).unwrap();
    let commands = context.take_commands();
    assert_eq!(clip_rects(&commands).len(), 1);
    assert_eq!(clip_rects(&commands)[0].x, 512.0);
    assert_eq!(uniform_count(&commands, Uniform::Color), 1);
}

#[test]
fn rejects_unknown_buffers() {
    init_logger();
    let mut context = RecordingContext::new(256, 256);
    let mut renderer = Renderer::new(&mut context, RendererSettings::default()).unwrap();

    let layer = CompiledLayer {
        layer_type: LayerType::Fill,
        extent: 512,
        buffers: RenderBuffers::new().with_column("elevation", vec![1.0, 2.0, 3.0]),
        length: 3,
    };
    assert!(matches!(
        renderer.load_buffers(&mut context, &layer),
        Err(Error::UnknownBufferShape(_))
    ));
}

#[test]
fn rejects_tilesets_spanning_too_many_worlds() {
    let boxes = vec![TileBox { x: 0, y: 0, tile: () }, TileBox { x: 12, y: 0, tile: () }];
    assert!(matches!(
        Tileset::new(2u8, [0.0, 0.0], 256.0, boxes),
        Err(Error::Tileset(_))
    ));
}
