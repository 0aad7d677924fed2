// Stroke layer: a transparent raster that only ever holds ink.
// Ink is painted "source-over"; the eraser is "destination-out", so it only
// removes ink and never touches whatever is drawn underneath the layer.

use image::imageops::{self, FilterType};
use image::{Rgba as ImgRgba, RgbaImage};
use log::debug;

use crate::config::ResizePolicy;
use crate::pointer::RasterPoint;
use crate::types::{FrameBuffer, Rgba, Size, ToolKind, ToolState};

pub struct StrokeLayer {
    raster: FrameBuffer,
}

impl StrokeLayer {
    pub fn new(size: Size) -> Self {
        Self { raster: FrameBuffer::transparent(size.width as usize, size.height as usize) }
    }

    pub fn size(&self) -> Size {
        self.raster.size()
    }

    pub fn raster(&self) -> &FrameBuffer {
        &self.raster
    }

    /// True when no pixel carries any ink.
    pub fn is_blank(&self) -> bool {
        !has_ink(&self.raster)
    }

    /// Trash: wipe everything back to transparent.
    pub fn clear(&mut self) {
        self.raster.fill(0);
    }

    /// Give the layer a new backing raster. Same size is a no-op.
    pub fn resize(&mut self, size: Size, policy: ResizePolicy) {
        if size == self.size() {
            return;
        }
        let fresh = FrameBuffer::transparent(size.width as usize, size.height as usize);
        let old = std::mem::replace(&mut self.raster, fresh);
        if policy == ResizePolicy::Clear || old.is_empty() || size.is_empty() || !has_ink(&old) {
            debug!("stroke layer reset to {}x{}", size.width, size.height);
            return;
        }
        // Filter in premultiplied space: empty pixels are 0x00000000 and would
        // otherwise pull black into every antialiased edge.
        let scaled = imageops::resize(&to_premultiplied_image(&old), size.width, size.height, FilterType::Triangle);
        self.raster = from_premultiplied_image(&scaled);
        debug!(
            "stroke layer resampled {}x{} -> {}x{}",
            old.width, old.height, size.width, size.height
        );
    }

    /// Stroke one round-capped segment from `from` to `to` with the given tool.
    /// Consecutive segments sharing an endpoint join with round joins.
    pub fn stroke_segment(&mut self, from: RasterPoint, to: RasterPoint, tool: ToolKind, width: f32, color: Rgba) {
        if self.raster.is_empty() {
            return;
        }
        let radius = (width as f64 / 2.0).max(0.5); // visual: half the slider width
        let pad = radius + 1.0;
        let w = self.raster.width as i64;
        let h = self.raster.height as i64;

        /* Only visit the segment's padded bounding box.
           Visual: nothing outside the capsule around from..to ever changes. */
        let x_lo = ((from.x.min(to.x) - pad).floor() as i64).clamp(0, w);
        let x_hi = ((from.x.max(to.x) + pad).ceil() as i64).clamp(0, w);
        let y_lo = ((from.y.min(to.y) - pad).floor() as i64).clamp(0, h);
        let y_hi = ((from.y.max(to.y) + pad).ceil() as i64).clamp(0, h);

        for py in y_lo..y_hi {
            for px in x_lo..x_hi {
                let centre = RasterPoint::new(px as f64 + 0.5, py as f64 + 0.5);
                let d = distance_to_segment(centre, from, to);
                // One pixel of antialiasing ramp straddling the edge.
                let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let idx = py as usize * self.raster.width + px as usize;
                let dst = self.raster.pixels[idx];
                self.raster.pixels[idx] = match tool {
                    ToolKind::Ink => source_over(dst, color, coverage), // visual: ink laid on top
                    ToolKind::Erase => destination_out(dst, coverage), // visual: ink thins, background shows
                };
            }
        }
    }
}

fn has_ink(fb: &FrameBuffer) -> bool {
    fb.pixels.iter().any(|&p| p >> 24 != 0)
}

fn distance_to_segment(p: RasterPoint, a: RasterPoint, b: RasterPoint) -> f64 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len2 = abx * abx + aby * aby;
    let t = if len2 > 0.0 {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.x + abx * t, a.y + aby * t);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Straight-alpha "over" of `color` scaled by `coverage` onto `dst`.
pub(crate) fn source_over(dst: u32, color: Rgba, coverage: f64) -> u32 {
    let sa = color.a as f64 / 255.0 * coverage;
    if sa <= 0.0 {
        return dst;
    }
    let d = Rgba::from_argb(dst);
    let da = d.a as f64 / 255.0;
    let oa = sa + da * (1.0 - sa);
    let mix = |s: u8, d: u8| -> u8 {
        let v = (s as f64 * sa + d as f64 * da * (1.0 - sa)) / oa;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba {
        r: mix(color.r, d.r),
        g: mix(color.g, d.g),
        b: mix(color.b, d.b),
        a: (oa * 255.0).round().clamp(0.0, 255.0) as u8,
    }
    .to_argb()
}

/// "Destination-out": knock `coverage` worth of alpha out of `dst`.
fn destination_out(dst: u32, coverage: f64) -> u32 {
    let d = Rgba::from_argb(dst);
    let a = (d.a as f64 * (1.0 - coverage)).round() as u8;
    if a == 0 { 0 } else { Rgba { a, ..d }.to_argb() }
}

pub(crate) fn to_rgba_image(fb: &FrameBuffer) -> RgbaImage {
    RgbaImage::from_fn(fb.width as u32, fb.height as u32, |x, y| {
        let c = Rgba::from_argb(fb.pixels[y as usize * fb.width + x as usize]);
        ImgRgba([c.r, c.g, c.b, c.a])
    })
}

fn to_premultiplied_image(fb: &FrameBuffer) -> RgbaImage {
    RgbaImage::from_fn(fb.width as u32, fb.height as u32, |x, y| {
        let c = Rgba::from_argb(fb.pixels[y as usize * fb.width + x as usize]);
        let pm = |v: u8| ((v as u32 * c.a as u32 + 127) / 255) as u8;
        ImgRgba([pm(c.r), pm(c.g), pm(c.b), c.a])
    })
}

fn from_premultiplied_image(img: &RgbaImage) -> FrameBuffer {
    let (w, h) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| {
            let a = p[3] as u32;
            if a == 0 {
                return 0;
            }
            let un = |v: u8| ((v as u32 * 255 + a / 2) / a).min(255) as u8;
            Rgba { r: un(p[0]), g: un(p[1]), b: un(p[2]), a: p[3] }.to_argb()
        })
        .collect();
    FrameBuffer { width: w as usize, height: h as usize, pixels }
}

/* ---------- Drawing protocol: one gesture at a time ---------- */

/// The points of the gesture in progress. Each segment starts where the
/// previous one ended, so the path stays continuous.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub tool: ToolKind,
    pub width: f32,
    pub color: Rgba,
    pub points: Vec<RasterPoint>,
}

impl Stroke {
    pub fn segments(&self) -> impl Iterator<Item = (RasterPoint, RasterPoint)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    pub fn last_point(&self) -> Option<RasterPoint> {
        self.points.last().copied()
    }
}

/// IDLE -> DRAWING -> IDLE. While drawing, the gesture owns its pointer.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Drawing { pointer_id: u32, stroke: Stroke },
}

impl Gesture {
    /// Pointer that currently owns the layer, if any.
    pub fn captured_pointer(&self) -> Option<u32> {
        match self {
            Gesture::Idle => None,
            Gesture::Drawing { pointer_id, .. } => Some(*pointer_id),
        }
    }

    /// Start drawing at `at`. Ignored if another gesture holds the capture.
    pub fn begin(&mut self, pointer_id: u32, at: RasterPoint, tools: &ToolState) -> bool {
        if !matches!(self, Gesture::Idle) {
            return false;
        }
        *self = Gesture::Drawing {
            pointer_id,
            stroke: Stroke { tool: tools.kind, width: tools.width(), color: tools.color, points: vec![at] },
        };
        true
    }

    /// Extend the active stroke to `to` and paint the new segment.
    pub fn extend(&mut self, pointer_id: u32, to: RasterPoint, layer: &mut StrokeLayer) -> bool {
        let Gesture::Drawing { pointer_id: owner, stroke } = self else {
            return false;
        };
        if *owner != pointer_id {
            return false;
        }
        let Some(from) = stroke.last_point() else {
            return false;
        };
        layer.stroke_segment(from, to, stroke.tool, stroke.width, stroke.color);
        stroke.points.push(to);
        true
    }

    /// Follow the raster into a new size so the next segment continues from
    /// the same spot on screen.
    pub fn rescale(&mut self, from: Size, to: Size) {
        let Gesture::Drawing { stroke, .. } = self else {
            return;
        };
        if from.is_empty() || to.is_empty() {
            return;
        }
        let sx = to.width as f64 / from.width as f64;
        let sy = to.height as f64 / from.height as f64;
        for p in &mut stroke.points {
            *p = RasterPoint::new(p.x * sx, p.y * sy);
        }
    }

    /// Release the capture and hand back the finished stroke.
    pub fn end(&mut self, pointer_id: u32) -> Option<Stroke> {
        if self.captured_pointer() != Some(pointer_id) {
            return None;
        }
        match std::mem::take(self) {
            Gesture::Drawing { stroke, .. } => Some(stroke),
            Gesture::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::opaque(255, 0, 0);

    fn alpha_at(layer: &StrokeLayer, x: usize, y: usize) -> u8 {
        (layer.raster().get(x, y).unwrap() >> 24) as u8
    }

    fn pt(x: f64, y: f64) -> RasterPoint {
        RasterPoint::new(x, y)
    }

    #[test]
    fn ink_segment_covers_its_path_and_leaves_the_rest_transparent() {
        let mut layer = StrokeLayer::new(Size::new(40, 20));
        layer.stroke_segment(pt(5.0, 10.0), pt(35.0, 10.0), ToolKind::Ink, 4.0, RED);
        assert_eq!(layer.raster().get(20, 9), Some(RED.to_argb()));
        assert_eq!(alpha_at(&layer, 20, 2), 0);
        // round cap reaches past the endpoint by the radius
        assert!(alpha_at(&layer, 36, 9) > 0);
        assert_eq!(alpha_at(&layer, 39, 9), 0);
    }

    #[test]
    fn zero_length_segment_draws_a_round_dot() {
        let mut layer = StrokeLayer::new(Size::new(20, 20));
        layer.stroke_segment(pt(10.0, 10.0), pt(10.0, 10.0), ToolKind::Ink, 6.0, RED);
        assert_eq!(alpha_at(&layer, 10, 10), 255);
        assert_eq!(alpha_at(&layer, 11, 9), 255);
        // corner of the bounding square stays outside the disc
        assert_eq!(alpha_at(&layer, 13, 13), 0);
    }

    #[test]
    fn erase_removes_ink_only_where_it_passes() {
        let mut layer = StrokeLayer::new(Size::new(40, 40));
        layer.stroke_segment(pt(0.0, 20.0), pt(40.0, 20.0), ToolKind::Ink, 10.0, RED);
        layer.stroke_segment(pt(20.0, 0.0), pt(20.0, 40.0), ToolKind::Erase, 6.0, RED);
        assert_eq!(alpha_at(&layer, 19, 19), 0);
        assert_eq!(alpha_at(&layer, 5, 19), 255);
        assert_eq!(alpha_at(&layer, 35, 19), 255);
    }

    #[test]
    fn erase_on_blank_layer_stays_blank() {
        let mut layer = StrokeLayer::new(Size::new(10, 10));
        layer.stroke_segment(pt(0.0, 0.0), pt(10.0, 10.0), ToolKind::Erase, 8.0, RED);
        assert!(layer.is_blank());
    }

    #[test]
    fn clear_wipes_all_ink() {
        let mut layer = StrokeLayer::new(Size::new(10, 10));
        layer.stroke_segment(pt(0.0, 0.0), pt(10.0, 10.0), ToolKind::Ink, 3.0, RED);
        assert!(!layer.is_blank());
        layer.clear();
        assert!(layer.is_blank());
    }

    #[test]
    fn same_size_resize_keeps_pixels() {
        let mut layer = StrokeLayer::new(Size::new(30, 30));
        layer.stroke_segment(pt(3.0, 3.0), pt(27.0, 27.0), ToolKind::Ink, 4.0, RED);
        let before = layer.raster().clone();
        layer.resize(Size::new(30, 30), ResizePolicy::Clear);
        assert_eq!(layer.raster(), &before);
    }

    #[test]
    fn resample_policy_carries_ink_into_the_new_raster() {
        let mut layer = StrokeLayer::new(Size::new(80, 60));
        layer.stroke_segment(pt(10.0, 30.0), pt(70.0, 30.0), ToolKind::Ink, 8.0, RED);
        layer.resize(Size::new(60, 80), ResizePolicy::Resample);
        assert_eq!(layer.size(), Size::new(60, 80));
        assert!(!layer.is_blank());
        // the horizontal line is now at 40/80 of the height
        assert!(alpha_at(&layer, 30, 40) > 200);
        assert_eq!(alpha_at(&layer, 30, 5), 0);
    }

    #[test]
    fn resampled_ink_keeps_its_colour_at_the_edges() {
        let white = Rgba::opaque(255, 255, 255);
        let mut layer = StrokeLayer::new(Size::new(80, 60));
        layer.stroke_segment(pt(10.0, 30.0), pt(70.0, 30.0), ToolKind::Ink, 8.0, white);
        layer.resize(Size::new(60, 80), ResizePolicy::Resample);
        let inked: Vec<_> = layer.raster().pixels.iter().filter(|&&p| p >> 24 != 0).collect();
        assert!(!inked.is_empty());
        // partially covered edge pixels fade in alpha only, never darken
        for &&p in &inked {
            assert_eq!(p & 0x00FF_FFFF, 0x00FF_FFFF, "dark fringe at {p:#010x}");
        }
    }

    #[test]
    fn clear_policy_drops_ink_on_resize() {
        let mut layer = StrokeLayer::new(Size::new(80, 60));
        layer.stroke_segment(pt(10.0, 30.0), pt(70.0, 30.0), ToolKind::Ink, 8.0, RED);
        layer.resize(Size::new(60, 80), ResizePolicy::Clear);
        assert_eq!(layer.size(), Size::new(60, 80));
        assert!(layer.is_blank());
    }

    #[test]
    fn gesture_records_a_continuous_path() {
        let tools = ToolState { kind: ToolKind::Ink, color: RED, ink_width: 2.0, erase_width: 9.0 };
        let mut layer = StrokeLayer::new(Size::new(50, 50));
        let mut g = Gesture::default();
        assert!(g.begin(7, pt(1.0, 1.0), &tools));
        assert!(!g.begin(8, pt(2.0, 2.0), &tools), "capture is exclusive");
        assert!(g.extend(7, pt(10.0, 1.0), &mut layer));
        assert!(!g.extend(8, pt(40.0, 40.0), &mut layer));
        assert!(g.extend(7, pt(10.0, 10.0), &mut layer));
        let stroke = g.end(7).unwrap();
        assert_eq!(g, Gesture::Idle);
        let segs: Vec<_> = stroke.segments().collect();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].1, segs[1].0);
        assert_eq!(stroke.width, 2.0);
        assert_eq!(alpha_at(&layer, 40, 40), 0);
    }

    #[test]
    fn rescale_moves_the_recorded_path_with_the_raster() {
        let tools = ToolState { kind: ToolKind::Ink, color: RED, ink_width: 2.0, erase_width: 9.0 };
        let mut g = Gesture::default();
        g.begin(1, pt(400.0, 300.0), &tools);
        g.rescale(Size::new(800, 600), Size::new(600, 800));
        let Gesture::Drawing { stroke, .. } = &g else { panic!("gesture ended") };
        assert_eq!(stroke.last_point(), Some(pt(300.0, 400.0)));
    }

    #[test]
    fn moves_without_a_gesture_draw_nothing() {
        let mut layer = StrokeLayer::new(Size::new(10, 10));
        let mut g = Gesture::Idle;
        assert!(!g.extend(1, pt(5.0, 5.0), &mut layer));
        assert!(g.end(1).is_none());
        assert!(layer.is_blank());
    }
}
