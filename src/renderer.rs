use serde::{Deserialize, Serialize};

use crate::{
    camera::{PlayerPose, screen_center_y},
    engine::EngineError,
    vec2d::Vec2d,
    world::{TileId, WorldMap},
};

/// Perpendicular distances below this count as a camera inside a wall.
pub const MIN_DISTANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    #[inline]
    pub fn packed(self) -> u32 {
        pack_rgb(self.0, self.1, self.2)
    }

    /// Multiplies each channel by `k`, clamped to 0..=255.
    #[inline]
    pub fn scaled(self, k: f64) -> Rgb {
        let ch = |c: u8| (c as f64 * k).clamp(0.0, 255.0) as u8;
        Rgb(ch(self.0), ch(self.1), ch(self.2))
    }
}

/// Colour of each tile id.
pub const PALETTE: [Rgb; 10] = [
    Rgb(0, 0, 0),       // empty
    Rgb(0, 0, 255),     // blue
    Rgb(255, 0, 0),     // red
    Rgb(0, 255, 0),     // green
    Rgb(255, 0, 255),   // magenta
    Rgb(255, 255, 0),   // yellow
    Rgb(255, 175, 175), // pink
    Rgb(255, 200, 0),   // orange
    Rgb(0, 255, 255),   // cyan
    Rgb(255, 255, 255), // white
];

#[inline]
pub fn tile_color(tile: TileId) -> Rgb {
    PALETTE[tile.get() as usize]
}

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // 0x00RRGGBB, the layout softbuffer presents
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
}

/// Which family of grid lines the ray crossed when it hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Crossed a vertical grid line (x = const): wall face points along X.
    X,
    /// Crossed a horizontal grid line (y = const). Drawn darker.
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Camera inside a wall, or hit distance too small to project.
    Embedded,
    /// Ray left the map without hitting a wall.
    Escaped,
    /// Nothing hit within the configured max distance.
    MaxDistance,
}

/// Result of casting one column's ray; one entry of the depth buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnCast {
    Wall {
        tile: TileId,
        side: Side,
        distance: f64, // perpendicular to the camera plane
    },
    Fallback(FallbackReason),
}

impl ColumnCast {
    pub fn distance(&self) -> Option<f64> {
        match *self {
            ColumnCast::Wall { distance, .. } => Some(distance),
            ColumnCast::Fallback(_) => None,
        }
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self, ColumnCast::Fallback(_))
    }
}

/// Colours for the flat parts of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shading {
    pub ceiling: Rgb,
    pub floor: Rgb,
    /// Billboard colour for monster cells.
    pub monster: Rgb,
    /// Walls and billboards fade to black at this distance. `None` disables fog.
    pub fog_distance: Option<f64>,
}

impl Shading {
    pub fn wall_color(&self, tile: TileId, side: Side, distance: f64) -> u32 {
        let mut color = tile_color(tile);
        if side == Side::Y {
            color = color.scaled(0.5);
        }
        self.fogged(color, distance).packed()
    }

    pub fn monster_color(&self, distance: f64) -> u32 {
        self.fogged(self.monster, distance).packed()
    }

    fn fogged(&self, color: Rgb, distance: f64) -> Rgb {
        match self.fog_distance.filter(|f| *f > 0.0) {
            Some(fog) => color.scaled(1.0 - distance.min(fog) / fog),
            None => color,
        }
    }
}

/// Packed pixel grid, row-major, allocated once.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::ZeroViewport { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width * height],
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Writes `color` into rows `y0..y1` of column `x`.
    fn fill_column(&mut self, x: usize, y0: usize, y1: usize, color: u32) {
        let mut idx = y0 * self.width + x;
        for _ in y0..y1 {
            self.pixels[idx] = color;
            idx += self.width;
        }
    }
}

/// Walks the grid from `origin` along `ray` with a DDA until a wall cell is
/// entered. Every lookup is bounds-checked and the loop is bounded by the
/// number of grid lines a ray can cross inside the map.
pub fn cast_ray(map: &WorldMap, origin: Vec2d, ray: Vec2d, max_distance: f64) -> ColumnCast {
    let mut map_x = origin.x.floor() as i64;
    let mut map_y = origin.y.floor() as i64;

    match map.tile_at(map_x, map_y) {
        None => return ColumnCast::Fallback(FallbackReason::Escaped),
        Some(tile) if !tile.is_empty() => return ColumnCast::Fallback(FallbackReason::Embedded),
        Some(_) => {}
    }
    if !ray.is_finite() || (ray.x == 0.0 && ray.y == 0.0) {
        return ColumnCast::Fallback(FallbackReason::MaxDistance);
    }

    // Ray length between consecutive vertical / horizontal grid lines
    let delta_x = inverse_abs(ray.x);
    let delta_y = inverse_abs(ray.y);
    let (step_x, mut side_x) = first_crossing(origin.x, map_x, ray.x, delta_x);
    let (step_y, mut side_y) = first_crossing(origin.y, map_y, ray.y, delta_y);

    let max_steps = map.width() + map.height() + 2;
    for _ in 0..max_steps {
        let (side, distance) = if side_x < side_y {
            side_x += delta_x;
            map_x += step_x;
            (Side::X, side_x - delta_x)
        } else {
            side_y += delta_y;
            map_y += step_y;
            (Side::Y, side_y - delta_y)
        };

        if distance > max_distance {
            return ColumnCast::Fallback(FallbackReason::MaxDistance);
        }
        match map.tile_at(map_x, map_y) {
            None => return ColumnCast::Fallback(FallbackReason::Escaped),
            Some(tile) if tile.is_empty() => continue,
            Some(tile) => {
                if distance < MIN_DISTANCE {
                    return ColumnCast::Fallback(FallbackReason::Embedded);
                }
                return ColumnCast::Wall {
                    tile,
                    side,
                    distance,
                };
            }
        }
    }
    ColumnCast::Fallback(FallbackReason::MaxDistance)
}

#[inline]
fn inverse_abs(v: f64) -> f64 {
    if v == 0.0 { f64::INFINITY } else { (1.0 / v).abs() }
}

#[inline]
fn first_crossing(origin: f64, cell: i64, dir: f64, delta: f64) -> (i64, f64) {
    if delta.is_infinite() {
        // parallel to these grid lines, never crosses one
        return (0, f64::INFINITY);
    }
    if dir < 0.0 {
        (-1, (origin - cell as f64) * delta)
    } else {
        (1, (cell as f64 + 1.0 - origin) * delta)
    }
}

/// Draws one column: ceiling, wall slab of height `h / distance` centred
/// vertically, floor. Fallback columns are ceiling over floor.
pub fn draw_column(frame: &mut FrameBuffer, x: usize, cast: &ColumnCast, shading: &Shading) {
    let height = frame.height();
    let ceiling = shading.ceiling.packed();
    let floor = shading.floor.packed();

    match *cast {
        ColumnCast::Wall {
            tile,
            side,
            distance,
        } => {
            let center = screen_center_y(height);
            let slab = height as f64 / distance;
            let top = (center - 0.5 * slab).floor().max(0.0) as usize;
            let bottom = ((center + 0.5 * slab).floor().max(0.0) as usize).min(height);
            let top = top.min(bottom);

            frame.fill_column(x, 0, top, ceiling);
            frame.fill_column(x, top, bottom, shading.wall_color(tile, side, distance));
            frame.fill_column(x, bottom, height, floor);
        }
        ColumnCast::Fallback(_) => {
            let mid = height / 2;
            frame.fill_column(x, 0, mid, ceiling);
            frame.fill_column(x, mid, height, floor);
        }
    }
}

/// A monster projected into camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    /// Screen column of the billboard's centre, may lie off screen.
    pub screen_x: f64,
    /// Perpendicular distance, comparable with `ColumnCast::distance`.
    pub depth: f64,
}

/// Projects a world point through the inverse of the camera basis
/// `[camera_plane direction]`. `None` when the point is behind the camera,
/// too close to project, or the basis is degenerate.
pub fn project_billboard(pose: &PlayerPose, point: Vec2d, width: usize) -> Option<Billboard> {
    let (dir, plane) = (pose.direction, pose.camera_plane);
    let det = plane.x * dir.y - dir.x * plane.y;
    if det.abs() < f64::EPSILON {
        return None;
    }
    let rel = point - pose.position;
    let across = (rel.x * dir.y - dir.x * rel.y) / det;
    let depth = (plane.x * rel.y - rel.x * plane.y) / det;
    if !(depth >= MIN_DISTANCE) {
        return None;
    }
    Some(Billboard {
        screen_x: 0.5 * width as f64 * (1.0 + across / depth),
        depth,
    })
}

/// Draws each monster as a square billboard of side `h / depth`, far to
/// near, skipping every column whose wall is nearer than the billboard.
pub fn draw_monsters(
    frame: &mut FrameBuffer,
    columns: &[ColumnCast],
    map: &WorldMap,
    pose: &PlayerPose,
    max_distance: f64,
    shading: &Shading,
) -> usize {
    let (width, height) = (frame.width(), frame.height());
    let mut billboards: Vec<Billboard> = map
        .monsters()
        .into_iter()
        .filter_map(|c| {
            let centre = Vec2d::new(c.x as f64 + 0.5, c.y as f64 + 0.5);
            project_billboard(pose, centre, width)
        })
        .filter(|b| b.depth <= max_distance)
        .collect();
    billboards.sort_by(|a, b| b.depth.total_cmp(&a.depth));

    let center = screen_center_y(height);
    let mut drawn = 0;
    for b in &billboards {
        let size = height as f64 / b.depth;
        let span = |mid: f64, limit: usize| {
            let lo = (mid - 0.5 * size).floor().clamp(0.0, limit as f64) as usize;
            let hi = (mid + 0.5 * size).floor().clamp(0.0, limit as f64) as usize;
            (lo, hi)
        };
        let (left, right) = span(b.screen_x, width);
        let (top, bottom) = span(center, height);
        let color = shading.monster_color(b.depth);

        let mut visible = false;
        for (x, cast) in columns.iter().enumerate().take(right).skip(left) {
            let occluded = match *cast {
                ColumnCast::Wall { distance, .. } => distance <= b.depth,
                ColumnCast::Fallback(reason) => reason == FallbackReason::Embedded,
            };
            if !occluded {
                frame.fill_column(x, top, bottom, color);
                visible = true;
            }
        }
        drawn += visible as usize;
    }
    drawn
}

/// Casts one ray per column of `frame` and fills it in place, then draws the
/// monsters against the resulting depth buffer. `columns` must be
/// `frame.width()` long. Returns the number of fallback columns.
pub fn render_frame(
    frame: &mut FrameBuffer,
    columns: &mut [ColumnCast],
    map: &WorldMap,
    pose: &PlayerPose,
    max_distance: f64,
    shading: &Shading,
) -> usize {
    debug_assert_eq!(columns.len(), frame.width());
    let width = frame.width();
    let mut fallbacks = 0;

    for (x, slot) in columns.iter_mut().enumerate() {
        let ray = pose.ray_direction(x, width);
        let cast = cast_ray(map, pose.position, ray, max_distance);
        if cast.is_fallback() {
            fallbacks += 1;
        }
        draw_column(frame, x, &cast, shading);
        *slot = cast;
    }
    draw_monsters(frame, columns, map, pose, max_distance, shading);
    fallbacks
}
