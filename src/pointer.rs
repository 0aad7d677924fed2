//! Screen-to-raster coordinate mapping for pointer input.
//!
//! The stroke raster may be shown at a different size than its internal
//! resolution, so mapping always applies a per-axis scale after removing the
//! surface's screen offset. When the two sizes agree the scale is simply 1.

use crate::types::Size;

/// A position in stroke-raster pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterPoint {
    pub x: f64,
    pub y: f64,
}

impl RasterPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A position in screen (window) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen bounding box of the stroke surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

/// Raw device sample: a mouse-style single position, or the changed touch
/// points of a touch event.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerSample {
    Mouse { position: ScreenPoint, button: u16 },
    Touch { changed: Vec<ScreenPoint> },
}

impl PointerSample {
    /// The one coordinate this sample stands for. A touch event with no
    /// changed points has none.
    pub fn position(&self) -> Option<ScreenPoint> {
        match self {
            PointerSample::Mouse { position, .. } => Some(*position),
            PointerSample::Touch { changed } => changed.first().copied(),
        }
    }

    /// Only touches and the primary mouse button may start a stroke.
    pub fn may_start_stroke(&self) -> bool {
        match self {
            PointerSample::Mouse { button, .. } => *button == 0,
            PointerSample::Touch { .. } => true,
        }
    }
}

/// A pointer event as delivered to the session.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub sample: PointerSample,
    pub surface: ScreenRect, // where the stroke surface sits on screen right now
}

/// Per-axis raster/displayed scale. `None` while either size is degenerate.
fn axis_scales(surface: &ScreenRect, raster: Size) -> Option<(f64, f64)> {
    if raster.is_empty() || surface.width <= 0.0 || surface.height <= 0.0 {
        return None;
    }
    Some((raster.width as f64 / surface.width, raster.height as f64 / surface.height))
}

/// Map a screen position into the raster's own pixel space.
pub fn screen_to_raster(p: ScreenPoint, surface: &ScreenRect, raster: Size) -> Option<RasterPoint> {
    let (sx, sy) = axis_scales(surface, raster)?;
    Some(RasterPoint::new((p.x - surface.left) * sx, (p.y - surface.top) * sy))
}

/// Inverse of [`screen_to_raster`].
pub fn raster_to_screen(p: RasterPoint, surface: &ScreenRect, raster: Size) -> Option<ScreenPoint> {
    let (sx, sy) = axis_scales(surface, raster)?;
    Some(ScreenPoint::new(p.x / sx + surface.left, p.y / sy + surface.top))
}

impl PointerEvent {
    /// Normalised raster position of this event.
    pub fn raster_position(&self, raster: Size) -> Option<RasterPoint> {
        screen_to_raster(self.sample.position()?, &self.surface, raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscaled_surface_is_plain_offset_subtraction() {
        let surface = ScreenRect::new(80.0, 75.0, 800.0, 450.0);
        let p = screen_to_raster(ScreenPoint::new(100.0, 100.0), &surface, Size::new(800, 450)).unwrap();
        assert_eq!(p, RasterPoint::new(20.0, 25.0));
    }

    #[test]
    fn css_scaled_surface_is_corrected_per_axis() {
        // raster 1600x900 shown at 800x300
        let surface = ScreenRect::new(10.0, 20.0, 800.0, 300.0);
        let p = screen_to_raster(ScreenPoint::new(410.0, 170.0), &surface, Size::new(1600, 900)).unwrap();
        assert_eq!(p, RasterPoint::new(800.0, 450.0));
    }

    #[test]
    fn round_trip_returns_the_screen_point() {
        let surface = ScreenRect::new(13.5, 7.25, 333.0, 777.0);
        let raster = Size::new(1024, 768);
        for &(x, y) in &[(13.5, 7.25), (200.0, 300.0), (346.5, 784.25), (-50.0, 1000.0)] {
            let screen = ScreenPoint::new(x, y);
            let back = raster_to_screen(screen_to_raster(screen, &surface, raster).unwrap(), &surface, raster).unwrap();
            assert!((back.x - x).abs() < 1e-9 && (back.y - y).abs() < 1e-9);
        }
    }

    #[test]
    fn touch_uses_first_changed_point() {
        let sample = PointerSample::Touch {
            changed: vec![ScreenPoint::new(5.0, 6.0), ScreenPoint::new(50.0, 60.0)],
        };
        assert_eq!(sample.position(), Some(ScreenPoint::new(5.0, 6.0)));
        assert!(sample.may_start_stroke());
        assert_eq!(PointerSample::Touch { changed: vec![] }.position(), None);
    }

    #[test]
    fn secondary_mouse_buttons_do_not_start_strokes() {
        let right = PointerSample::Mouse { position: ScreenPoint::new(0.0, 0.0), button: 2 };
        assert!(!right.may_start_stroke());
    }

    #[test]
    fn degenerate_surface_maps_nothing() {
        let p = ScreenPoint::new(1.0, 1.0);
        assert_eq!(screen_to_raster(p, &ScreenRect::new(0.0, 0.0, 0.0, 10.0), Size::new(10, 10)), None);
        assert_eq!(screen_to_raster(p, &ScreenRect::new(0.0, 0.0, 10.0, 10.0), Size::new(0, 10)), None);
    }

    #[test]
    fn positions_outside_the_surface_still_map() {
        let surface = ScreenRect::new(100.0, 100.0, 200.0, 200.0);
        let p = screen_to_raster(ScreenPoint::new(50.0, 400.0), &surface, Size::new(200, 200)).unwrap();
        assert_eq!(p, RasterPoint::new(-50.0, 300.0));
    }
}
