use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest vertex store accepted. At 32 bytes per vertex this stays within
/// the 256 MiB buffer limit GPU backends can rely on by default.
pub const MAX_VERTICES: usize = 1 << 23;

/// Largest light array, in floats, accepted. Together with the camera vec4
/// the packed uniform stays under the 64 KiB uniform binding limit.
pub const MAX_LIGHT_FLOATS: usize = 14_336;

/// Errors from loading or validating a [`RenderConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("texture size must be positive")]
    ZeroTextureSize,
    #[error("tile size {tile_size} must be in 1..={texture_size}")]
    InvalidTileSize { tile_size: u32, texture_size: u32 },
    #[error("max_lights must be positive")]
    ZeroLights,
    #[error("max_vertices must hold at least one quad (6), got {0}")]
    TooFewVertices(usize),
    #[error("max_vertices {0} exceeds the limit of {max}", max = MAX_VERTICES)]
    TooManyVertices(usize),
    #[error("max_lights {0} needs more than {max} light floats", max = MAX_LIGHT_FLOATS)]
    TooManyLights(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Numeric renderer configuration.
///
/// Every field has a default, so a partial JSON document is enough to
/// override a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Width of the square texture atlas in texels.
    pub texture_size: u32,
    /// Width of one atlas tile in texels.
    pub tile_size: u32,
    /// Number of light slots uploaded each frame.
    pub max_lights: usize,
    /// Vertex capacity of the geometry buffer.
    pub max_vertices: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            texture_size: 1024,
            tile_size: 16,
            max_lights: 16,
            max_vertices: 1024 * 64,
        }
    }
}

impl RenderConfig {
    /// Parse a configuration from JSON text and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.texture_size == 0 {
            return Err(ConfigError::ZeroTextureSize);
        }
        if self.tile_size == 0 || self.tile_size > self.texture_size {
            return Err(ConfigError::InvalidTileSize {
                tile_size: self.tile_size,
                texture_size: self.texture_size,
            });
        }
        if self.max_lights == 0 {
            return Err(ConfigError::ZeroLights);
        }
        if self.light_floats() > MAX_LIGHT_FLOATS {
            return Err(ConfigError::TooManyLights(self.max_lights));
        }
        if self.max_vertices < 6 {
            return Err(ConfigError::TooFewVertices(self.max_vertices));
        }
        if self.max_vertices > MAX_VERTICES {
            return Err(ConfigError::TooManyVertices(self.max_vertices));
        }
        Ok(())
    }

    /// Length of the flat light array handed to the shader.
    pub fn light_floats(&self) -> usize {
        self.max_lights.saturating_mul(7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_sizes() {
        let config = RenderConfig::default();
        assert_eq!(config.texture_size, 1024);
        assert_eq!(config.tile_size, 16);
        assert_eq!(config.max_lights, 16);
        assert_eq!(config.max_vertices, 65536);
        assert!(config.validate().is_ok());
        assert_eq!(config.light_floats(), 112);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RenderConfig::from_json(r#"{ "max_lights": 4 }"#).unwrap();
        assert_eq!(config.max_lights, 4);
        assert_eq!(config.texture_size, 1024);
        assert_eq!(config.max_vertices, 65536);
    }

    #[test]
    fn json_round_trip() {
        let config = RenderConfig {
            texture_size: 256,
            tile_size: 8,
            max_lights: 2,
            max_vertices: 600,
        };
        let text = config.to_json().unwrap();
        assert_eq!(RenderConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn rejects_bad_values() {
        let tile_too_big = RenderConfig {
            tile_size: 2048,
            ..RenderConfig::default()
        };
        assert!(matches!(
            tile_too_big.validate(),
            Err(ConfigError::InvalidTileSize { .. })
        ));

        let no_lights = RenderConfig {
            max_lights: 0,
            ..RenderConfig::default()
        };
        assert!(matches!(no_lights.validate(), Err(ConfigError::ZeroLights)));

        let tiny = RenderConfig {
            max_vertices: 5,
            ..RenderConfig::default()
        };
        assert!(matches!(tiny.validate(), Err(ConfigError::TooFewVertices(5))));
    }

    #[test]
    fn rejects_buffers_past_gpu_limits() {
        let at_limit = RenderConfig {
            max_vertices: MAX_VERTICES,
            max_lights: MAX_LIGHT_FLOATS / 7,
            ..RenderConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let huge_store = RenderConfig {
            max_vertices: MAX_VERTICES + 1,
            ..RenderConfig::default()
        };
        assert!(matches!(
            huge_store.validate(),
            Err(ConfigError::TooManyVertices(_))
        ));

        let too_many_lights = RenderConfig {
            max_lights: MAX_LIGHT_FLOATS / 7 + 1,
            ..RenderConfig::default()
        };
        assert!(matches!(
            too_many_lights.validate(),
            Err(ConfigError::TooManyLights(2049))
        ));

        let overflowing = RenderConfig {
            max_lights: usize::MAX,
            ..RenderConfig::default()
        };
        assert!(matches!(
            overflowing.validate(),
            Err(ConfigError::TooManyLights(_))
        ));
        assert!(RenderConfig::from_json(r#"{ "max_vertices": 100000000 }"#).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            RenderConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
