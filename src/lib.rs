//! Grid raycaster: projects a tile map into a first-person view one column
//! at a time, with a top-down minimap and a fixed-step simulation.

pub mod camera;
pub mod clock;
pub mod config;
pub mod engine;
pub mod input;
pub mod minimap;
pub mod overlay;
pub mod renderer;
pub mod scaler;
pub mod vec2d;
pub mod world;

pub use camera::PlayerPose;
pub use config::{AppConfig, ConfigError, EngineConfig, WindowConfig};
pub use engine::{EngineError, RaycasterEngine};
pub use input::MotionHandle;
pub use renderer::{ColumnCast, FallbackReason, FrameBuffer, Side};
pub use vec2d::Vec2d;
pub use world::{Cell, MapError, TileId, WorldMap};
