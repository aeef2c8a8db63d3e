//! World to minimap pixel transform. Minimap Y grows downward, so world
//! row 0 lands at the bottom of the minimap.

use crate::{
    camera::PlayerPose,
    vec2d::Vec2d,
    world::{TileId, WorldMap},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub tile: TileId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dot {
    pub center: PixelPoint,
    pub radius: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimapProjection {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<TileRect>,
    pub monsters: Vec<Dot>,
    pub player: Dot,
    /// Player to `position + direction * view_distance`.
    pub heading: [PixelPoint; 2],
    /// Player, then the two frustum corners.
    pub view_cone: [PixelPoint; 3],
}

impl MinimapProjection {
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }
}

pub fn project(map: &WorldMap, pose: &PlayerPose, scale: i32, view_distance: f64) -> MinimapProjection {
    let scale = scale.max(1);
    let height = map.height() as i32 * scale;
    let to_screen = |p: Vec2d| PixelPoint {
        x: (p.x * scale as f64).floor() as i32,
        y: height - (p.y * scale as f64).floor() as i32,
    };

    let mut tiles = Vec::with_capacity(map.width() * map.height());
    for y in 0..map.height() {
        for x in 0..map.width() {
            let tile = map.tile_at(x as i64, y as i64).unwrap_or_default();
            tiles.push(TileRect {
                x: x as i32 * scale,
                y: height - (y as i32 + 1) * scale,
                size: (scale - 1).max(1),
                tile,
            });
        }
    }

    let monsters = map
        .monsters()
        .into_iter()
        .map(|c| Dot {
            center: PixelPoint {
                x: c.x as i32 * scale + scale / 2,
                y: height - (c.y as i32 + 1) * scale + scale / 2,
            },
            radius: scale / 4,
        })
        .collect();

    let pos = pose.position;
    let reach = |v: Vec2d| to_screen(pos + v * view_distance);

    MinimapProjection {
        width: map.width() as i32 * scale,
        height,
        tiles,
        monsters,
        player: Dot {
            center: to_screen(pos),
            radius: scale / 4,
        },
        heading: [to_screen(pos), reach(pose.direction)],
        view_cone: [
            to_screen(pos),
            reach(pose.direction + pose.camera_plane),
            reach(pose.direction - pose.camera_plane),
        ],
    }
}
