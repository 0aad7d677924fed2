// Flattening of the visible layers into one raster.
//
// The same `render_background` path paints the live preview and the frozen
// capture, so a freeze reproduces the preview pixel for pixel, mirror included.

use crate::config::FitPolicy;
use crate::fit::{self, PixelRect};
use crate::mode::Mirror;
use crate::stroke::source_over;
use crate::types::{FrameBuffer, Rgba, Size};

/// Which background sits under the strokes.
#[derive(Clone, Copy, Debug)]
pub enum Background<'a> {
    /// Live source, painted through the fit rectangle and the mirror transform.
    Live { frame: &'a FrameBuffer, mirror: Mirror },
    /// Frozen capture; its mirror is already baked into the pixels.
    Frozen(&'a FrameBuffer),
    /// Nothing ready to show yet.
    Empty,
}

/// Everything needed to reproduce the screen.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub viewport: Size,
    pub fit: FitPolicy,
    pub fill: Rgba,
    pub background: Background<'a>,
    pub strokes: &'a FrameBuffer,
}

/// Scale `src` into `rect` of `dst` (nearest sample), flipping columns when mirrored.
pub fn render_source(dst: &mut FrameBuffer, src: &FrameBuffer, rect: PixelRect, mirror: Mirror) {
    if src.is_empty() || rect.is_empty() {
        return;
    }
    let rw = rect.w as usize;
    let rh = rect.h as usize;

    /* Source column for each destination column of the rect, computed once.
       Visual: a mirrored source reads its columns right to left. */
    let cols: Vec<usize> = (0..rw)
        .map(|lx| {
            let lx = match mirror {
                Mirror::None => lx,
                Mirror::Horizontal => rw - 1 - lx,
            };
            (((lx as f64 + 0.5) * src.width as f64 / rw as f64) as usize).min(src.width - 1)
        })
        .collect();

    for ly in 0..rh {
        let dy = rect.y as usize + ly;
        if dy >= dst.height {
            break;
        }
        // nearest source row for this output row
        let sy = (((ly as f64 + 0.5) * src.height as f64 / rh as f64) as usize).min(src.height - 1);
        let src_row = &src.pixels[sy * src.width..(sy + 1) * src.width];
        let dst_row = &mut dst.pixels[dy * dst.width..(dy + 1) * dst.width];
        for (lx, &sx) in cols.iter().enumerate() {
            let dx = rect.x as usize + lx;
            if dx >= dst.width {
                break;
            }
            // camera pixels are opaque regardless of what the top byte held
            dst_row[dx] = src_row[sx] | 0xFF00_0000;
        }
    }
}

/// Paint a viewport-sized background from a live frame: margin fill, then the
/// source through the fit rectangle. `None` while either side is not ready.
pub fn render_background(viewport: Size, fit: FitPolicy, fill: Rgba, frame: &FrameBuffer, mirror: Mirror) -> Option<FrameBuffer> {
    let rect = fit::placement(fit, frame.size(), viewport)?;
    let mut out = FrameBuffer::filled(viewport.width as usize, viewport.height as usize, fill.to_argb());
    render_source(&mut out, frame, rect, mirror);
    Some(out)
}

/// Draw `top` over `dst` unmodified (no transform), straight-alpha "over".
pub fn draw_over(dst: &mut FrameBuffer, top: &FrameBuffer) {
    if dst.width != top.width || dst.height != top.height {
        return;
    }
    for (d, &t) in dst.pixels.iter_mut().zip(&top.pixels) {
        match t >> 24 {
            0 => {}
            0xFF => *d = t,
            _ => *d = source_over(*d, Rgba::from_argb(t), 1.0),
        }
    }
}

/// Flatten the scene into one raster sized to the viewport.
pub fn composite(scene: &Scene<'_>) -> Option<FrameBuffer> {
    if scene.viewport.is_empty() {
        return None;
    }
    let (w, h) = (scene.viewport.width as usize, scene.viewport.height as usize);

    /* 1) margin fill, 2) background.
       Visual: black bars around a letterboxed frame, or the frozen still. */
    let mut out = match scene.background {
        Background::Live { frame, mirror } => render_background(scene.viewport, scene.fit, scene.fill, frame, mirror)
            .unwrap_or_else(|| FrameBuffer::filled(w, h, scene.fill.to_argb())),
        Background::Frozen(frozen) => {
            let mut out = FrameBuffer::filled(w, h, scene.fill.to_argb());
            draw_over(&mut out, frozen);
            out
        }
        Background::Empty => FrameBuffer::filled(w, h, scene.fill.to_argb()),
    };

    /* 3) strokes, never mirrored.
       Visual: ink stays where the pointer put it even over a flipped preview. */
    draw_over(&mut out, scene.strokes);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: Rgba = Rgba::BLACK;

    /// 4x2 frame whose pixel value encodes its column: left red, right blue.
    fn two_tone() -> FrameBuffer {
        let red = 0xFFFF_0000;
        let blue = 0xFF00_00FF;
        FrameBuffer { width: 4, height: 2, pixels: vec![red, red, blue, blue, red, red, blue, blue] }
    }

    #[test]
    fn mirror_swaps_left_and_right() {
        let plain = render_background(Size::new(8, 4), FitPolicy::EdgeToEdge, FILL, &two_tone(), Mirror::None).unwrap();
        let flipped = render_background(Size::new(8, 4), FitPolicy::EdgeToEdge, FILL, &two_tone(), Mirror::Horizontal).unwrap();
        assert_eq!(plain.get(0, 0), Some(0xFFFF_0000));
        assert_eq!(flipped.get(0, 0), Some(0xFF00_00FF));
        for y in 0..4 {
            for x in 0..8 {
                assert_eq!(plain.get(x, y), flipped.get(7 - x, y));
            }
        }
    }

    #[test]
    fn letterbox_margins_take_the_fill_colour() {
        let src = FrameBuffer::filled(16, 9, 0xFF11_2233);
        let out = render_background(Size::new(16, 12), FitPolicy::Letterbox, FILL, &src, Mirror::None).unwrap();
        // 16x9 in 16x12 -> rows 1..10 carry the source
        assert_eq!(out.get(5, 0), Some(FILL.to_argb()));
        assert_eq!(out.get(5, 1), Some(0xFF11_2233));
        assert_eq!(out.get(5, 9), Some(0xFF11_2233));
        assert_eq!(out.get(5, 10), Some(FILL.to_argb()));
        assert_eq!(out.get(5, 11), Some(FILL.to_argb()));
    }

    #[test]
    fn strokes_land_on_top_and_transparent_ink_shows_background() {
        let src = FrameBuffer::filled(4, 4, 0xFF00_FF00);
        let mut strokes = FrameBuffer::transparent(4, 4);
        strokes.pixels[5] = 0xFFFF_0000;
        let scene = Scene {
            viewport: Size::new(4, 4),
            fit: FitPolicy::EdgeToEdge,
            fill: FILL,
            background: Background::Live { frame: &src, mirror: Mirror::Horizontal },
            strokes: &strokes,
        };
        let out = composite(&scene).unwrap();
        // ink stays at (1,1) even though the background is mirrored
        assert_eq!(out.get(1, 1), Some(0xFFFF_0000));
        assert_eq!(out.get(2, 1), Some(0xFF00_FF00));
    }

    #[test]
    fn not_ready_source_composites_fill_and_ink() {
        let strokes = FrameBuffer::transparent(3, 3);
        let empty = FrameBuffer::transparent(0, 0);
        let scene = Scene {
            viewport: Size::new(3, 3),
            fit: FitPolicy::Letterbox,
            fill: Rgba::opaque(1, 2, 3),
            background: Background::Live { frame: &empty, mirror: Mirror::None },
            strokes: &strokes,
        };
        let out = composite(&scene).unwrap();
        assert!(out.pixels.iter().all(|&p| p == Rgba::opaque(1, 2, 3).to_argb()));
    }

    #[test]
    fn empty_viewport_composites_nothing() {
        let strokes = FrameBuffer::transparent(0, 0);
        let scene = Scene {
            viewport: Size::new(0, 0),
            fit: FitPolicy::EdgeToEdge,
            fill: FILL,
            background: Background::Empty,
            strokes: &strokes,
        };
        assert!(composite(&scene).is_none());
    }

    #[test]
    fn half_transparent_ink_blends() {
        let mut dst = FrameBuffer::filled(1, 1, 0xFF00_0000);
        let top = FrameBuffer::filled(1, 1, Rgba { r: 255, g: 255, b: 255, a: 128 }.to_argb());
        draw_over(&mut dst, &top);
        let c = Rgba::from_argb(dst.pixels[0]);
        assert_eq!(c.a, 255);
        assert_eq!(c.r, 128);
    }
}
