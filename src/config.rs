use crate::error::ConfigError;
use crate::geometry::{Point, Rect, Size};
use serde::Deserialize;

/// Session-level settings for a graph store.
///
/// Every key is optional in JSON; missing keys take the values of `EditorConfig::default()`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// How many emitted events the bus keeps for inspection.
    pub event_history_limit: usize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// The viewport pan offset is clamped into this rectangle.
    pub pan_bounds: Rect,
    /// World units added around the nodes framed by `focus_on`.
    pub focus_padding: f64,
    /// Shift applied to pastes that land on the viewport centre.
    pub paste_offset: Point,
    pub viewport_size: Size,
    /// Prototypes allowed to receive ports at runtime.
    pub dynamic_port_prototypes: Vec<String>,
    /// Subset of the above that may only receive dynamic outputs.
    pub no_dynamic_input_prototypes: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            event_history_limit: 100,
            min_zoom: 0.1,
            max_zoom: 4.0,
            pan_bounds: Rect::from_corners(
                Point::new(-100_000.0, -100_000.0),
                Point::new(100_000.0, 100_000.0),
            ),
            focus_padding: 50.0,
            paste_offset: Point::new(20.0, 20.0),
            viewport_size: Size::new(1280.0, 720.0),
            dynamic_port_prototypes: Vec::new(),
            no_dynamic_input_prototypes: Vec::new(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom.is_nan() || self.min_zoom <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "minZoom must be positive, got {}",
                self.min_zoom
            )));
        }
        if !self.max_zoom.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "maxZoom must be finite, got {}",
                self.max_zoom
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "minZoom ({}) is greater than maxZoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        let bounds = self.pan_bounds;
        if ![bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ConfigError::Invalid(
                "panBounds must have finite corners".to_string(),
            ));
        }
        if bounds.min.x > bounds.max.x || bounds.min.y > bounds.max.y {
            return Err(ConfigError::Invalid(format!(
                "panBounds min {:?} lies beyond max {:?}",
                bounds.min, bounds.max
            )));
        }
        if self.viewport_size.width <= 0.0 || self.viewport_size.height <= 0.0 {
            return Err(ConfigError::Invalid(
                "viewportSize must have a positive width and height".to_string(),
            ));
        }
        if self.focus_padding < 0.0 {
            return Err(ConfigError::Invalid(
                "focusPadding cannot be negative".to_string(),
            ));
        }
        if let Some(name) = self
            .no_dynamic_input_prototypes
            .iter()
            .find(|n| !self.dynamic_port_prototypes.contains(n))
        {
            return Err(ConfigError::Invalid(format!(
                "'{}' is excluded from dynamic inputs but is not on the dynamic port allow-list",
                name
            )));
        }
        Ok(())
    }
}
