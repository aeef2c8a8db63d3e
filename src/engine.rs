use std::fmt;

use crate::{
    camera::PlayerPose,
    config::EngineConfig,
    input::MotionHandle,
    renderer::{self, ColumnCast, FallbackReason, FrameBuffer, Shading},
    vec2d::Vec2d,
    world::WorldMap,
};

/// Longest collision sub-step; shorter than a tile so movement cannot skip one.
pub const MAX_SUBSTEP: f64 = 0.25;

// Gap kept between the player's box and a wall face
const SKIN: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineError {
    ZeroViewport { width: usize, height: usize },
    /// Horizontal FOV must be inside (0, 180) degrees.
    InvalidFov(f64),
    /// Collision half-size must be inside [0, 0.5).
    InvalidCollisionRadius(f64),
    InvalidMaxDistance(f64),
    StartOutsideMap { x: f64, y: f64 },
    StartInsideWall { x: f64, y: f64 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroViewport { width, height } => {
                write!(f, "viewport {width}x{height} has no pixels")
            }
            Self::InvalidFov(deg) => write!(f, "field of view {deg} is outside (0, 180) degrees"),
            Self::InvalidCollisionRadius(r) => {
                write!(f, "collision radius {r} is outside [0, 0.5)")
            }
            Self::InvalidMaxDistance(d) => write!(f, "max cast distance {d} must be positive"),
            Self::StartOutsideMap { x, y } => write!(f, "start position ({x}, {y}) is outside the map"),
            Self::StartInsideWall { x, y } => write!(f, "start position ({x}, {y}) is inside a wall"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Owns the player, the map and the frame. A tick integrates pending input,
/// resolves collisions, then casts one ray per output column.
pub struct RaycasterEngine {
    map: WorldMap,
    config: EngineConfig,
    shading: Shading,
    pose: PlayerPose,
    input: MotionHandle,

    frame: FrameBuffer,
    columns: Vec<ColumnCast>, // depth buffer, one entry per column

    steps: u64,
    frame_count: u64,
}

impl RaycasterEngine {
    /// The start pose's heading is kept; its camera plane is rebuilt from
    /// `config.fov_degrees`.
    pub fn new(map: WorldMap, config: EngineConfig, start: PlayerPose) -> Result<Self, EngineError> {
        config.validate()?;

        let Vec2d { x, y } = start.position;
        if !start.position.is_finite() || map.tile_at(x.floor() as i64, y.floor() as i64).is_none() {
            return Err(EngineError::StartOutsideMap { x, y });
        }
        if map.is_solid_at(x.floor() as i64, y.floor() as i64) {
            return Err(EngineError::StartInsideWall { x, y });
        }

        let mut pose = start;
        pose.position = settle(&map, start.position, config.collision_radius)
            .ok_or(EngineError::StartInsideWall { x, y })?;
        if pose.position != start.position {
            tracing::debug!(from = ?start.position, to = ?pose.position, "start pushed clear of walls");
        }
        pose.direction = if start.direction.length() > 0.0 && start.direction.is_finite() {
            start.direction.normalized()
        } else {
            Vec2d::new(0.0, 1.0)
        };
        pose.set_fov_from_horizontal(config.fov_degrees);

        let frame = FrameBuffer::new(config.pixel_width, config.pixel_height)?;
        let columns = vec![ColumnCast::Fallback(FallbackReason::MaxDistance); config.pixel_width];

        tracing::debug!(
            map_width = map.width(),
            map_height = map.height(),
            frame_width = frame.width(),
            frame_height = frame.height(),
            fov = config.fov_degrees,
            "raycaster engine ready"
        );

        Ok(Self {
            shading: config.shading(),
            map,
            config,
            pose,
            input: MotionHandle::new(),
            frame,
            columns,
            steps: 0,
            frame_count: 0,
        })
    }

    /// Adds to the pending motion. Rates: forward/strafe are multiplied by
    /// move speed and dt, turn by turn speed and dt. Positive strafe is
    /// right, positive turn is counter-clockwise.
    pub fn apply_motion(&self, forward: f64, strafe: f64, turn: f64) {
        self.input.apply_motion(forward, strafe, turn);
    }

    /// Horizontal pointer movement in pixels; moving right turns right.
    pub fn apply_pointer(&self, dx: f64) {
        self.input.apply_turn_angle(-dx * self.config.pointer_sensitivity);
    }

    /// Handle for feeding input from another thread.
    pub fn motion_handle(&self) -> MotionHandle {
        self.input.clone()
    }

    /// Simulation half of a tick: drains input, moves with collision, turns.
    pub fn step(&mut self, dt: f64) -> PlayerPose {
        let motion = self.input.drain();
        self.steps += 1;
        if motion.is_idle() {
            return self.pose;
        }
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        let dist = self.config.move_speed * dt;
        let dir = self.pose.direction;
        let displacement = dir * (motion.forward * dist) + dir.perp() * (motion.strafe * dist);
        if displacement.is_finite() && displacement != Vec2d::ZERO {
            self.pose.position = self.slide(self.pose.position, displacement);
        }

        let angle = motion.turn * self.config.turn_speed * dt + motion.turn_angle;
        if angle.is_finite() {
            self.pose.rotate(angle);
        }
        self.pose
    }

    /// Render half of a tick: one DDA cast per column into the frame buffer.
    pub fn render(&mut self) {
        let fallbacks = renderer::render_frame(
            &mut self.frame,
            &mut self.columns,
            &self.map,
            &self.pose,
            self.config.max_distance,
            &self.shading,
        );
        self.frame_count += 1;
        if fallbacks > 0 {
            tracing::trace!(frame = self.frame_count, fallbacks, "fallback columns");
        }
    }

    /// `step` followed by `render`.
    pub fn tick(&mut self, dt: f64) -> PlayerPose {
        let pose = self.step(dt);
        self.render();
        pose
    }

    #[inline]
    pub fn player_pose(&self) -> PlayerPose {
        self.pose
    }

    /// Last rendered frame. Only changes inside `render`/`tick`.
    #[inline]
    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Per-column results of the last render.
    #[inline]
    pub fn columns(&self) -> &[ColumnCast] {
        &self.columns
    }

    #[inline]
    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn set_fov(&mut self, fov_deg: f64) -> Result<(), EngineError> {
        if !(fov_deg > 0.0 && fov_deg < 180.0) {
            return Err(EngineError::InvalidFov(fov_deg));
        }
        self.config.fov_degrees = fov_deg;
        self.pose.set_fov_from_horizontal(fov_deg);
        tracing::debug!(fov = fov_deg, "field of view changed");
        Ok(())
    }

    /// Snaps the heading to `angle` radians.
    pub fn face(&mut self, angle: f64) {
        if angle.is_finite() {
            self.pose.face(angle);
        }
    }

    fn slide(&self, from: Vec2d, delta: Vec2d) -> Vec2d {
        // No path inside the map is longer than this
        let reach = (self.map.width() + self.map.height()) as f64;
        let len = delta.length();
        let delta = if len > reach { delta * (reach / len) } else { delta };

        let substeps = (delta.length() / MAX_SUBSTEP).ceil().max(1.0) as usize;
        let part = delta * (1.0 / substeps as f64);

        let mut pos = from;
        for _ in 0..substeps {
            pos.x = self.move_axis(pos.x, pos.y, part.x, |a, b| (a, b));
            pos.y = self.move_axis(pos.y, pos.x, part.y, |a, b| (b, a));
        }
        pos
    }

    /// Moves `along` by `d`, with `across` fixed. `cell` maps (along, across)
    /// cell indices to (x, y). A blocked move stops just short of the face.
    fn move_axis(&self, along: f64, across: f64, d: f64, cell: impl Fn(i64, i64) -> (i64, i64)) -> f64 {
        if d == 0.0 {
            return along;
        }
        let r = self.config.collision_radius;
        let target = along + d;
        let lead = if d > 0.0 { target + r } else { target - r };
        let lead_cell = lead.floor() as i64;

        // Cells the box spans across the motion; the centre's own cell always counts
        let centre = across.floor() as i64;
        let lo = ((across - r + SKIN).floor() as i64).min(centre);
        let hi = ((across + r - SKIN).floor() as i64).max(centre);
        let blocked = (lo..=hi).any(|c| {
            let (x, y) = cell(lead_cell, c);
            self.map.is_solid_at(x, y)
        });
        if !blocked {
            return target;
        }

        if d > 0.0 {
            (lead_cell as f64 - r - SKIN).max(along)
        } else {
            ((lead_cell + 1) as f64 + r + SKIN).min(along)
        }
    }
}

/// Pushes `pos` off the walls beside its own cell so the collision box of
/// half-size `r` starts clear. `None` if the box still overlaps a wall, as
/// with a diagonal neighbour.
fn settle(map: &WorldMap, pos: Vec2d, r: f64) -> Option<Vec2d> {
    let (cx, cy) = (pos.x.floor(), pos.y.floor());
    let solid = |dx: i64, dy: i64| map.is_solid_at(cx as i64 + dx, cy as i64 + dy);

    let mut p = pos;
    if p.x - r + SKIN < cx && solid(-1, 0) {
        p.x = cx + r + SKIN;
    }
    if p.x + r - SKIN > cx + 1.0 && solid(1, 0) {
        p.x = cx + 1.0 - r - SKIN;
    }
    if p.y - r + SKIN < cy && solid(0, -1) {
        p.y = cy + r + SKIN;
    }
    if p.y + r - SKIN > cy + 1.0 && solid(0, 1) {
        p.y = cy + 1.0 - r - SKIN;
    }

    let span = |c: f64| (c - r + SKIN).floor() as i64..=(c + r - SKIN).floor() as i64;
    let clear = span(p.x).all(|x| span(p.y).all(|y| !map.is_solid_at(x, y)));
    clear.then_some(p)
}
