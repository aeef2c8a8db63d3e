//! End-to-end scenarios on small enclosed maps.

use std::f64::consts::FRAC_PI_2;

use grid_raycaster::{
    ColumnCast, EngineConfig, FallbackReason, PlayerPose, RaycasterEngine, Side, Vec2d, WorldMap,
    renderer::{Rgb, pack_rgb},
};

fn bordered(w: usize, h: usize) -> WorldMap {
    let mut tiles = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                tiles[y * w + x] = 1;
            }
        }
    }
    WorldMap::new(w, h, tiles, []).unwrap()
}

fn engine(map: WorldMap, width: usize, height: usize, pos: Vec2d) -> RaycasterEngine {
    let config = EngineConfig {
        pixel_width: width,
        pixel_height: height,
        fov_degrees: 90.0,
        fog_distance: None,
        ceiling_color: Rgb(1, 1, 1),
        floor_color: Rgb(2, 2, 2),
        ..EngineConfig::default()
    };
    let pose = PlayerPose::new(pos, FRAC_PI_2, 90.0);
    RaycasterEngine::new(map, config, pose).unwrap()
}

#[test]
fn five_by_five_room_fan_of_rays() {
    let mut engine = engine(bordered(5, 5), 8, 8, Vec2d::new(2.5, 2.5));
    engine.tick(0.016);

    let columns = engine.columns();
    assert_eq!(columns.len(), 8);
    let distances: Vec<f64> = columns
        .iter()
        .map(|c| c.distance().expect("every column hits the border"))
        .collect();
    assert!(distances.iter().all(|d| d.is_finite() && *d > 0.0));

    // Centre column looks straight at the far wall face at y = 4
    assert!((distances[4] - 1.5).abs() < 1e-9, "{distances:?}");
    // Leftmost ray (-1, 1) meets the left wall face at x = 1 after 1.5
    assert!((distances[0] - 1.5).abs() < 1e-9, "{distances:?}");
    // In between, rays reach the far wall no later than the straight one
    for d in &distances[1..8] {
        assert!(*d <= 1.5 + 1e-9, "{distances:?}");
    }
    // Column 6 is (0.5, 1): still hits the far face at perpendicular 1.5
    assert!((distances[6] - 1.5).abs() < 1e-9);
}

#[test]
fn far_wall_is_drawn_with_inverse_distance_height() {
    let mut engine = engine(bordered(5, 5), 8, 30, Vec2d::new(2.5, 2.5));
    engine.tick(0.0);

    // Slab height 30 / 1.5 = 20 rows centred on row 15: rows 5..25
    let frame = engine.frame_buffer();
    let wall = pack_rgb(0, 0, 127); // tile 1, Y-side hit is halved
    assert_eq!(frame.pixel(4, 4), Rgb(1, 1, 1).packed());
    assert_eq!(frame.pixel(4, 5), wall);
    assert_eq!(frame.pixel(4, 24), wall);
    assert_eq!(frame.pixel(4, 25), Rgb(2, 2, 2).packed());
}

#[test]
fn side_walls_are_darker() {
    let mut engine = engine(bordered(7, 7), 64, 16, Vec2d::new(3.5, 3.5));
    engine.face(0.0);
    engine.tick(0.0);
    let centre = engine.columns()[32];
    assert!(matches!(centre, ColumnCast::Wall { side: Side::X, .. }));
    let frame = engine.frame_buffer();
    assert_eq!(frame.pixel(32, 8), pack_rgb(0, 0, 255));
}

#[test]
fn overshoot_into_border_is_clamped() {
    let mut engine = engine(bordered(5, 5), 8, 8, Vec2d::new(2.5, 2.5));
    engine.apply_motion(10.0, 0.0, 0.0);
    let pose = engine.tick(1.0);

    let (cx, cy) = (pose.position.x.floor() as usize, pose.position.y.floor() as usize);
    assert_eq!((cx, cy), (2, 3));
    assert_eq!(engine.map().is_walkable(cx, cy), Ok(true));
    assert!(4.0 - pose.position.y < 0.25, "stopped too early at {}", pose.position.y);
}

#[test]
fn corridor_ray_without_wall_falls_back() {
    // Corridor open on both ends: no wall ever ahead
    let rows = [[1u8; 30], [0; 30], [1; 30]];
    let map = WorldMap::from_rows(&rows, []).unwrap();
    let config = EngineConfig {
        pixel_width: 1,
        pixel_height: 4,
        fov_degrees: 90.0,
        max_distance: 10.0,
        ..EngineConfig::default()
    };
    let pose = PlayerPose::new(Vec2d::new(2.5, 1.5), 0.0, 90.0);
    let mut engine = RaycasterEngine::new(map.clone(), config.clone(), pose).unwrap();
    engine.tick(0.0);
    // Single column: camera_x = -1, so the ray is direction + (-plane) = (1, 1)
    assert!(engine.columns()[0].distance().is_some());

    let wide = EngineConfig {
        pixel_width: 2,
        ..config.clone()
    };
    let mut engine = RaycasterEngine::new(map.clone(), wide, pose).unwrap();
    engine.tick(0.0);
    // Column 1 of 2 is the centre ray, parallel to the corridor walls
    assert_eq!(
        engine.columns()[1],
        ColumnCast::Fallback(FallbackReason::MaxDistance)
    );

    let far = EngineConfig {
        pixel_width: 2,
        max_distance: 1000.0,
        ..config
    };
    let mut engine = RaycasterEngine::new(map, far, pose).unwrap();
    engine.tick(0.0);
    assert_eq!(
        engine.columns()[1],
        ColumnCast::Fallback(FallbackReason::Escaped)
    );
}

#[test]
fn many_ticks_keep_the_pose_valid() {
    let mut engine = engine(bordered(9, 9), 16, 8, Vec2d::new(4.5, 4.5));
    for i in 0..2_000 {
        let t = i as f64 * 0.37;
        engine.apply_motion(t.sin(), t.cos(), (t * 0.5).sin());
        let pose = engine.tick(1.0 / 60.0);
        assert!(pose.direction.dot(pose.camera_plane).abs() < 1e-9);
        let (cx, cy) = (pose.position.x.floor() as usize, pose.position.y.floor() as usize);
        assert_eq!(engine.map().is_walkable(cx, cy), Ok(true));
    }
    assert_eq!(engine.frame_count(), 2_000);
}
