use std::{fmt, fs, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    camera::PlayerPose,
    engine::{EngineError, RaycasterEngine},
    renderer::{Rgb, Shading},
    vec2d::Vec2d,
    world::{MapError, WorldMap},
};

/// Simulation and projection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub fov_degrees: f64,
    /// Initial heading, degrees counter-clockwise from +X.
    pub start_heading_degrees: f64,
    pub move_speed: f64,          // tiles/s
    pub turn_speed: f64,          // rad/s
    pub pointer_sensitivity: f64, // rad per pointer pixel
    /// Half-size of the player's collision box, in tiles.
    pub collision_radius: f64,
    pub max_distance: f64,
    pub fog_distance: Option<f64>,
    pub ceiling_color: Rgb,
    pub floor_color: Rgb,
    pub monster_color: Rgb,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pixel_width: 320,
            pixel_height: 200,
            fov_degrees: 80.0,
            start_heading_degrees: 90.0,
            move_speed: 3.0,
            turn_speed: std::f64::consts::PI,
            pointer_sensitivity: std::f64::consts::TAU / 800.0,
            collision_radius: 0.2,
            max_distance: 64.0,
            fog_distance: Some(12.0),
            ceiling_color: Rgb(20, 100, 255),
            floor_color: Rgb(40, 40, 40),
            monster_color: Rgb(255, 200, 0),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.pixel_width == 0 || self.pixel_height == 0 {
            return Err(EngineError::ZeroViewport {
                width: self.pixel_width,
                height: self.pixel_height,
            });
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(EngineError::InvalidFov(self.fov_degrees));
        }
        if !(self.collision_radius >= 0.0 && self.collision_radius < 0.5) {
            return Err(EngineError::InvalidCollisionRadius(self.collision_radius));
        }
        if !(self.max_distance > 0.0) {
            return Err(EngineError::InvalidMaxDistance(self.max_distance));
        }
        Ok(())
    }

    pub fn shading(&self) -> Shading {
        Shading {
            ceiling: self.ceiling_color,
            floor: self.floor_color,
            monster: self.monster_color,
            fog_distance: self.fog_distance,
        }
    }
}

/// Window and pacing settings for the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Initial window size is the engine frame times this.
    pub pixel_scale: u32,
    /// Display refresh is clamped to this.
    pub max_refresh_hz: u32,
    /// Fixed simulation rate, independent of rendering.
    pub physics_hz: f64,
    pub minimap_scale: i32,
    pub minimap_view_distance: f64,
    pub show_minimap: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Grid Raycaster".to_string(),
            pixel_scale: 4,
            max_refresh_hz: 144,
            physics_hz: 120.0,
            minimap_scale: 8,
            minimap_view_distance: 3.0,
            show_minimap: true,
        }
    }
}

const DEMO_MAP: [&str; 10] = [
    "11111111111111111111",
    "1..................1",
    "1..111111222222.2221",
    "1.....1.....2.....t1",
    "1.g...1.gh..2..h...1",
    "1...111t....2222...1",
    "1....t1222..2......1",
    "1....g.222..2.1.2.11",
    "1.h.......s........1",
    "11111111111111111111",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub window: WindowConfig,
    /// ASCII map rows, top row first.
    pub map: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            window: WindowConfig::default(),
            map: DEMO_MAP.iter().map(|row| row.to_string()).collect(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_ron(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(ConfigError::Parse)?;
        config.engine.validate().map_err(ConfigError::Engine)?;
        tracing::debug!(engine = ?config.engine, window = ?config.window, "config parsed");
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Parses the map and places the player at the centre of the `s` cell.
    pub fn build_engine(&self) -> Result<RaycasterEngine, ConfigError> {
        let layout = WorldMap::parse(&self.map.join("\n")).map_err(ConfigError::Map)?;
        let start = layout.start.ok_or(ConfigError::Map(MapError::MissingStart))?;
        let pose = PlayerPose::new(
            Vec2d::new(start.x as f64 + 0.5, start.y as f64 + 0.5),
            self.engine.start_heading_degrees.to_radians(),
            self.engine.fov_degrees,
        );
        RaycasterEngine::new(layout.map, self.engine.clone(), pose).map_err(ConfigError::Engine)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: io::Error },
    Parse(ron::error::SpannedError),
    Map(MapError),
    Engine(EngineError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, .. } => write!(f, "cannot read config {path}"),
            Self::Parse(_) => write!(f, "invalid config file"),
            Self::Map(_) => write!(f, "invalid map"),
            Self::Engine(_) => write!(f, "invalid engine settings"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Map(e) => Some(e),
            Self::Engine(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_an_engine() {
        let engine = AppConfig::default().build_engine().unwrap();
        assert_eq!(engine.map().width(), 20);
        assert_eq!(engine.map().height(), 10);
        let pose = engine.player_pose();
        assert_eq!(pose.position, Vec2d::new(10.5, 1.5));
    }

    #[test]
    fn partial_ron_uses_defaults() {
        let config = AppConfig::from_ron("(engine: (pixel_width: 64, fog_distance: None))").unwrap();
        assert_eq!(config.engine.pixel_width, 64);
        assert_eq!(config.engine.pixel_height, 200);
        assert_eq!(config.engine.fog_distance, None);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.map.len(), 10);
    }

    #[test]
    fn ron_round_trip() {
        let mut config = AppConfig::default();
        config.window.show_minimap = false;
        config.engine.ceiling_color = Rgb(1, 2, 3);
        let text = config.to_ron().unwrap();
        assert_eq!(AppConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            AppConfig::from_ron("(engine: (fov_degrees: 190.0))"),
            Err(ConfigError::Engine(EngineError::InvalidFov(_)))
        ));
        assert!(matches!(
            AppConfig::from_ron("(engine: (pixel_height: 0))"),
            Err(ConfigError::Engine(EngineError::ZeroViewport { .. }))
        ));
        assert!(matches!(AppConfig::from_ron("(engine: 3)"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn map_without_start_is_rejected() {
        let config = AppConfig {
            map: vec!["111".into(), "1.1".into(), "111".into()],
            ..AppConfig::default()
        };
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::Map(MapError::MissingStart))
        ));
    }

    #[test]
    fn shipped_demo_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/demo.ron");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.engine.fog_distance, Some(10.0));
        let engine = config.build_engine().unwrap();
        assert_eq!(engine.player_pose().position, Vec2d::new(4.5, 1.5));
        assert!(engine.map().monster_at(14, 1));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load(Path::new("/nonexistent/raycaster.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
