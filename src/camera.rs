use crate::vec2d::Vec2d;

/// Player position and view. `camera_plane` is perpendicular to `direction`
/// and its length is tan(fov / 2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPose {
    pub position: Vec2d,  // continuous map coordinates
    pub direction: Vec2d, // unit heading
    pub camera_plane: Vec2d,
}

impl PlayerPose {
    /// Pose at `position` facing `heading` radians with the given horizontal FOV.
    pub fn new(position: Vec2d, heading: f64, fov_deg: f64) -> Self {
        let direction = Vec2d::from_angle(heading);
        Self {
            position,
            direction,
            camera_plane: direction.perp() * plane_length(fov_deg),
        }
    }

    #[inline]
    pub fn heading(&self) -> f64 {
        self.direction.angle()
    }

    pub fn fov_degrees(&self) -> f64 {
        (2.0 * self.camera_plane.length().atan()).to_degrees()
    }

    /// Rotates direction and plane together, then re-orthonormalises so
    /// rounding error cannot accumulate across steps.
    pub fn rotate(&mut self, theta: f64) {
        if theta == 0.0 {
            return;
        }
        let plane_len = self.camera_plane.length();
        self.direction = self.direction.rotate(theta).normalized();
        self.camera_plane = self.direction.perp() * plane_len;
    }

    /// Snaps the heading to an absolute angle, keeping the FOV.
    pub fn face(&mut self, heading: f64) {
        let plane_len = self.camera_plane.length();
        self.direction = Vec2d::from_angle(heading);
        self.camera_plane = self.direction.perp() * plane_len;
    }

    pub fn set_fov_from_horizontal(&mut self, fov_deg: f64) {
        self.camera_plane = self.direction.perp() * plane_length(fov_deg);
    }

    /// Ray direction for output column `x` of `width`, sweeping left to right.
    #[inline]
    pub fn ray_direction(&self, x: usize, width: usize) -> Vec2d {
        let camera_x = 2.0 * x as f64 / width as f64 - 1.0;
        self.direction + self.camera_plane * camera_x
    }
}

#[inline]
pub fn plane_length(fov_deg: f64) -> f64 {
    (0.5 * fov_deg.to_radians()).tan()
}

#[inline]
pub fn screen_center_y(screen_h: usize) -> f64 {
    0.5 * screen_h as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn ninety_degree_fov_has_unit_plane() {
        let pose = PlayerPose::new(Vec2d::new(2.5, 2.5), FRAC_PI_2, 90.0);
        assert!((pose.direction.x).abs() < 1e-12);
        assert!((pose.direction.y - 1.0).abs() < 1e-12);
        assert!((pose.camera_plane.x - 1.0).abs() < 1e-12);
        assert!((pose.camera_plane.y).abs() < 1e-12);
        assert!((pose.fov_degrees() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_keeps_plane_perpendicular() {
        let mut pose = PlayerPose::new(Vec2d::ZERO, 0.3, 66.0);
        for _ in 0..10_000 {
            pose.rotate(0.0173);
        }
        assert!(pose.direction.dot(pose.camera_plane).abs() < 1e-9);
        assert!((pose.direction.length() - 1.0).abs() < 1e-9);
        assert!((pose.fov_degrees() - 66.0).abs() < 1e-6);
    }

    #[test]
    fn edge_rays_span_the_plane() {
        let pose = PlayerPose::new(Vec2d::ZERO, FRAC_PI_2, 90.0);
        let left = pose.ray_direction(0, 8);
        let center = pose.ray_direction(4, 8);
        assert!((left.x + 1.0).abs() < 1e-12 && (left.y - 1.0).abs() < 1e-12);
        assert!(center.x.abs() < 1e-12 && (center.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn face_and_fov_change() {
        let mut pose = PlayerPose::new(Vec2d::ZERO, 0.0, 90.0);
        pose.face(FRAC_PI_2);
        assert!((pose.heading() - FRAC_PI_2).abs() < 1e-12);
        pose.set_fov_from_horizontal(60.0);
        assert!((pose.fov_degrees() - 60.0).abs() < 1e-9);
        assert!(pose.direction.dot(pose.camera_plane).abs() < 1e-12);
    }
}
