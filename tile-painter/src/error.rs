//! Errors which can happen in various parts of the library.

use thiserror::Error;

/// Failures which abort a single operation.
///
/// Data problems such as unsupported geometries or layer types are not errors. They are skipped
/// while serializing or painting.
#[derive(Error, Debug)]
pub enum Error {
    /// A style declaration could not be turned into a layer or a style function.
    #[error("invalid style: {0}")]
    Style(String),
    /// Buffers were handed to the loader which match no known program.
    #[error("unknown buffer shape with columns [{0}]")]
    UnknownBufferShape(String),
    /// The tiles of a tileset break the invariants required for painting.
    #[error("invalid tileset: {0}")]
    Tileset(String),
    /// A shader program failed to compile or link.
    #[error("failed to initialize program: {0}")]
    Program(String),
    /// Fetching or building a glyph atlas failed.
    #[error("atlas request for source {source_name} failed")]
    Atlas {
        source_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A vector tile could not be decoded.
    #[error("failed to decode vector tile: {0}")]
    Decode(String),
}
