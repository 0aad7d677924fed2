//! Aspect-preserving "contain" fit of a source frame into a destination box.
//!
//! Degenerate sizes return `None`: callers skip the frame instead of dividing
//! by zero.

use crate::config::FitPolicy;
use crate::types::Size;

/// Destination rectangle in floating point destination pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Destination rectangle snapped to whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Fitted size only, with no centering offsets.
pub fn contain_size(src: Size, dst: Size) -> Option<(f64, f64)> {
    if src.is_empty() || dst.is_empty() {
        return None;
    }
    let (sw, sh) = (src.width as f64, src.height as f64);
    let (dw, dh) = (dst.width as f64, dst.height as f64);
    // Cross-multiplied so the tight axis comes out exact.
    if dw * sh <= dh * sw {
        Some((dw, sh * dw / sw))
    } else {
        Some((sw * dh / sh, dh))
    }
}

/// Fitted rectangle centered on whichever axis has slack.
pub fn contain(src: Size, dst: Size) -> Option<FitRect> {
    let (w, h) = contain_size(src, dst)?;
    Some(FitRect {
        x: (dst.width as f64 - w) / 2.0,
        y: (dst.height as f64 - h) / 2.0,
        w,
        h,
    })
}

impl FitRect {
    /// Snap to whole pixels: sizes floor, offsets re-center on the snapped size.
    pub fn to_pixels(&self, dst: Size) -> PixelRect {
        let w = ((self.w + 1e-6).floor() as u32).min(dst.width);
        let h = ((self.h + 1e-6).floor() as u32).min(dst.height);
        PixelRect { x: (dst.width - w) / 2, y: (dst.height - h) / 2, w, h }
    }
}

/// Where the source lands inside a viewport under `policy`.
///
/// Edge-to-edge covers the whole viewport (the viewport was already sized to
/// the source aspect); letterbox centers a contain fit.
pub fn placement(policy: FitPolicy, src: Size, viewport: Size) -> Option<PixelRect> {
    if src.is_empty() || viewport.is_empty() {
        return None;
    }
    match policy {
        FitPolicy::EdgeToEdge => Some(PixelRect { x: 0, y: 0, w: viewport.width, h: viewport.height }),
        FitPolicy::Letterbox => Some(contain(src, viewport)?.to_pixels(viewport)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn hd_source_letterboxes_into_4_3_container() {
        let r = contain(Size::new(1920, 1080), Size::new(800, 600)).unwrap();
        assert_eq!((r.x, r.y, r.w, r.h), (0.0, 75.0, 800.0, 450.0));
        let p = r.to_pixels(Size::new(800, 600));
        assert_eq!(p, PixelRect { x: 0, y: 75, w: 800, h: 450 });
    }

    #[test]
    fn tall_source_pillarboxes() {
        let r = contain(Size::new(1080, 1920), Size::new(800, 600)).unwrap();
        assert!((r.h - 600.0).abs() < EPS);
        assert!((r.w - 337.5).abs() < EPS);
        assert!((r.x - 231.25).abs() < EPS);
        assert_eq!(r.y, 0.0);
    }

    #[test]
    fn aspect_and_centering_hold_over_a_grid() {
        let sizes = [1u32, 3, 7, 640, 1080, 1920, 4000];
        for &sw in &sizes {
            for &sh in &sizes {
                for &(dw, dh) in &[(800u32, 600u32), (600, 800), (1, 1), (333, 1000)] {
                    let r = contain(Size::new(sw, sh), Size::new(dw, dh)).unwrap();
                    let src_ratio = sw as f64 / sh as f64;
                    assert!(((r.w / r.h) - src_ratio).abs() <= 1e-9 * src_ratio.max(1.0));
                    assert!(r.w <= dw as f64 + EPS && r.h <= dh as f64 + EPS);
                    assert!((r.x - (dw as f64 - r.w) / 2.0).abs() < EPS);
                    assert!((r.y - (dh as f64 - r.h) / 2.0).abs() < EPS);
                    // at least one axis is tight
                    assert!((r.w - dw as f64).abs() < 1e-6 || (r.h - dh as f64).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn zero_sizes_are_not_ready() {
        assert_eq!(contain(Size::new(0, 1080), Size::new(800, 600)), None);
        assert_eq!(contain(Size::new(1920, 0), Size::new(800, 600)), None);
        assert_eq!(contain(Size::new(1920, 1080), Size::new(0, 600)), None);
        assert_eq!(placement(FitPolicy::Letterbox, Size::new(0, 0), Size::new(10, 10)), None);
    }

    #[test]
    fn edge_to_edge_covers_the_viewport() {
        let p = placement(FitPolicy::EdgeToEdge, Size::new(1920, 1080), Size::new(800, 450)).unwrap();
        assert_eq!(p, PixelRect { x: 0, y: 0, w: 800, h: 450 });
    }
}
