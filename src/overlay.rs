//! Draws a minimap projection into a window-sized pixel buffer.

use crate::{
    minimap::{Dot, MinimapProjection, PixelPoint},
    renderer::{Rgb, tile_color},
};

const BACKGROUND: Rgb = Rgb(0, 0, 0);
const MONSTER: Rgb = Rgb(255, 200, 0);
const PLAYER: Rgb = Rgb(192, 192, 192);
const HEADING: Rgb = Rgb(64, 64, 64);
const VIEW_CONE: Rgb = Rgb(128, 128, 128);

/// Clipped drawing target.
pub struct Canvas<'a> {
    buf: &'a mut [u32],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(buf: &'a mut [u32], width: usize, height: usize) -> Self {
        debug_assert!(buf.len() >= width * height);
        Self { buf, width, height }
    }

    #[inline]
    pub fn put(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.buf[y as usize * self.width + x as usize] = color;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for yy in y0..y1 {
            let row = yy as usize * self.width;
            self.buf[row + x0 as usize..row + x1 as usize].fill(color);
        }
    }

    pub fn fill_dot(&mut self, c: PixelPoint, r: i32, color: u32) {
        let r = r.max(1);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.put(c.x + dx, c.y + dy, color);
                }
            }
        }
    }

    /// Bresenham line, both endpoints inclusive.
    pub fn line(&mut self, a: PixelPoint, b: PixelPoint, color: u32) {
        let (mut x, mut y) = (a.x, a.y);
        let dx = (b.x - a.x).abs();
        let dy = -(b.y - a.y).abs();
        let sx = if a.x < b.x { 1 } else { -1 };
        let sy = if a.y < b.y { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, color);
            if x == b.x && y == b.y {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Draws `proj` with its top-left corner at `origin`.
pub fn draw_minimap(canvas: &mut Canvas<'_>, proj: &MinimapProjection, origin: PixelPoint) {
    let at = |p: PixelPoint| PixelPoint {
        x: p.x + origin.x,
        y: p.y + origin.y,
    };

    canvas.fill_rect(origin.x, origin.y, proj.width, proj.height, BACKGROUND.packed());
    for t in &proj.tiles {
        let p = at(PixelPoint { x: t.x, y: t.y });
        canvas.fill_rect(p.x, p.y, t.size, t.size, tile_color(t.tile).packed());
    }
    for &Dot { center, radius } in &proj.monsters {
        canvas.fill_dot(at(center), radius, MONSTER.packed());
    }

    let [apex, left, right] = proj.view_cone.map(at);
    canvas.line(apex, left, VIEW_CONE.packed());
    canvas.line(left, right, VIEW_CONE.packed());
    canvas.line(right, apex, VIEW_CONE.packed());
    canvas.line(at(proj.heading[0]), at(proj.heading[1]), HEADING.packed());

    canvas.fill_dot(at(proj.player.center), proj.player.radius, PLAYER.packed());
}
