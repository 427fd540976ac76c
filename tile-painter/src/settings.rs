//! Settings for the renderer

use serde::{Deserialize, Serialize};

use crate::coords::DEFAULT_EXTENT;

/// Provides configuration for [`Renderer`](crate::render::Renderer) initialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Ratio between physical framebuffer pixels and CSS/logical pixels.
    /// Defaults to 1.0.
    pub pixel_ratio: f32,
    /// Color used by [`Renderer::prep`](crate::render::Renderer::prep) to clear the framebuffer.
    pub clear_color: [f32; 4],
    /// Extent assumed for tile layers which do not state their own.
    pub extent: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            extent: DEFAULT_EXTENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_use_defaults() {
        let settings: RendererSettings = serde_json::from_str(r#"{"pixel_ratio": 2.0}"#).unwrap();
        assert_eq!(settings.pixel_ratio, 2.0);
        assert_eq!(settings.extent, 512);
        assert_eq!(settings.clear_color, [0.0; 4]);
    }
}
