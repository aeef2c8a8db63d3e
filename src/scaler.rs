use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Precomputed nearest-neighbour mapping from window pixels to frame pixels,
/// letterboxed to keep the frame's aspect ratio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleLut {
    pub view_x: usize, // viewport origin in the window
    pub view_y: usize,
    src_x: Vec<usize>, // one entry per viewport column
    src_y: Vec<usize>, // one entry per viewport row
}

impl ScaleLut {
    pub fn empty() -> Self {
        Self {
            view_x: 0,
            view_y: 0,
            src_x: Vec::new(),
            src_y: Vec::new(),
        }
    }

    #[inline]
    pub fn view_width(&self) -> usize {
        self.src_x.len()
    }

    #[inline]
    pub fn view_height(&self) -> usize {
        self.src_y.len()
    }
}

pub fn build_scale_lut(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> ScaleLut {
    if dst_w == 0 || dst_h == 0 || src_w == 0 || src_h == 0 {
        return ScaleLut::empty();
    }

    // Largest viewport with the source aspect that fits the window
    let scale = (dst_w as f64 / src_w as f64).min(dst_h as f64 / src_h as f64);
    let view_w = ((src_w as f64 * scale).round() as usize).clamp(1, dst_w);
    let view_h = ((src_h as f64 * scale).round() as usize).clamp(1, dst_h);

    let map_axis = |view: usize, src: usize| -> Vec<usize> {
        (0..view)
            .map(|d| (d * src / view).min(src - 1))
            .collect()
    };

    ScaleLut {
        view_x: (dst_w - view_w) / 2,
        view_y: (dst_h - view_h) / 2,
        src_x: map_axis(view_w, src_w),
        src_y: map_axis(view_h, src_h),
    }
}

/// Parallel nearest-neighbour stretch. Rows are processed in parallel;
/// pixels outside the viewport are cleared to `border`.
pub fn blit_nearest_stretch(dst: &mut [u32], dw: usize, src: &[u32], sw: usize, lut: &ScaleLut, border: u32) {
    if dw == 0 {
        return;
    }
    let view_x = lut.view_x;
    let view_end = lut.view_x + lut.view_width();

    dst.par_chunks_mut(dw).enumerate().for_each(|(y, dst_row)| {
        let Some(&sy) = y.checked_sub(lut.view_y).and_then(|vy| lut.src_y.get(vy)) else {
            dst_row.fill(border);
            return;
        };
        let src_row = &src[sy * sw..(sy + 1) * sw];

        dst_row[..view_x].fill(border);
        for (d, &sx) in dst_row[view_x..view_end].iter_mut().zip(&lut.src_x) {
            *d = src_row[sx];
        }
        dst_row[view_end..].fill(border);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_upscale_repeats_pixels() {
        let lut = build_scale_lut(4, 2, 2, 1);
        assert_eq!((lut.view_x, lut.view_y), (0, 0));
        let src = [1, 2];
        let mut dst = [0u32; 8];
        blit_nearest_stretch(&mut dst, 4, &src, 2, &lut, 9);
        assert_eq!(dst, [1, 1, 2, 2, 1, 1, 2, 2]);
    }

    #[test]
    fn wide_window_is_letterboxed() {
        let lut = build_scale_lut(6, 2, 2, 2);
        assert_eq!((lut.view_x, lut.view_width(), lut.view_height()), (2, 2, 2));
        let src = [1, 2, 3, 4];
        let mut dst = [0u32; 12];
        blit_nearest_stretch(&mut dst, 6, &src, 2, &lut, 0);
        assert_eq!(dst, [0, 0, 1, 2, 0, 0, 0, 0, 3, 4, 0, 0]);
    }

    #[test]
    fn lut_stays_inside_source() {
        let lut = build_scale_lut(997, 613, 320, 200);
        assert!(lut.src_x.iter().all(|&x| x < 320));
        assert!(lut.src_y.iter().all(|&y| y < 200));
        assert!(lut.view_x + lut.view_width() <= 997);
        assert!(lut.view_y + lut.view_height() <= 613);
    }

    #[test]
    fn empty_window_builds_empty_lut() {
        assert_eq!(build_scale_lut(0, 10, 4, 4), ScaleLut::empty());
    }
}
