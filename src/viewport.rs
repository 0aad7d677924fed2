// Viewport sizing: turns the container box and the source's native
// resolution into the drawing surface size, and places that surface on screen.

use log::debug;

use crate::config::FitPolicy;
use crate::fit;
use crate::pointer::ScreenRect;
use crate::types::Size;

/// Target viewport for a container under `policy`. `None` means "not ready":
/// keep whatever viewport is current.
pub fn target_size(policy: FitPolicy, container: Size, source: Option<Size>) -> Option<Size> {
    if container.is_empty() {
        return None;
    }
    match policy {
        FitPolicy::Letterbox => Some(container),
        FitPolicy::EdgeToEdge => {
            let (w, h) = fit::contain_size(source?, container)?;
            // whole pixels, so raster resolution equals the displayed box
            let size = Size::new((w + 1e-6).floor() as u32, (h + 1e-6).floor() as u32);
            (!size.is_empty()).then_some(size)
        }
    }
}

/// Keeps the current viewport and reports only real changes.
#[derive(Clone, Copy, Debug)]
pub struct ViewportSizer {
    policy: FitPolicy,
    container: Size,
    viewport: Size,
}

impl ViewportSizer {
    pub fn new(policy: FitPolicy, container: Size) -> Self {
        Self { policy, container, viewport: Size::default() }
    }

    pub fn policy(&self) -> FitPolicy {
        self.policy
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Recompute for a (possibly new) container and source resolution.
    /// Returns the new viewport only when it differs from the current one,
    /// so repeated calls with the same inputs change nothing.
    pub fn recompute(&mut self, container: Size, source: Option<Size>) -> Option<Size> {
        self.container = container;
        let next = target_size(self.policy, container, source)?;
        if next == self.viewport {
            return None;
        }
        debug!(
            "viewport {}x{} -> {}x{} (container {}x{})",
            self.viewport.width, self.viewport.height, next.width, next.height, container.width, container.height
        );
        self.viewport = next;
        Some(next)
    }

    /// Screen box of the drawing surface: the viewport centered in the container.
    pub fn surface_box(&self) -> ScreenRect {
        let c = self.container;
        let v = self.viewport;
        ScreenRect::new(
            (c.width.saturating_sub(v.width) / 2) as f64,
            (c.height.saturating_sub(v.height) / 2) as f64,
            v.width as f64,
            v.height as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: Size = Size::new(1920, 1080);

    #[test]
    fn edge_to_edge_takes_the_source_aspect() {
        assert_eq!(target_size(FitPolicy::EdgeToEdge, Size::new(800, 600), Some(HD)), Some(Size::new(800, 450)));
        assert_eq!(target_size(FitPolicy::EdgeToEdge, Size::new(600, 800), Some(HD)), Some(Size::new(600, 337)));
    }

    #[test]
    fn letterbox_uses_the_whole_container() {
        assert_eq!(target_size(FitPolicy::Letterbox, Size::new(800, 600), Some(HD)), Some(Size::new(800, 600)));
        assert_eq!(target_size(FitPolicy::Letterbox, Size::new(800, 600), None), Some(Size::new(800, 600)));
    }

    #[test]
    fn edge_to_edge_waits_for_a_source() {
        assert_eq!(target_size(FitPolicy::EdgeToEdge, Size::new(800, 600), None), None);
        assert_eq!(target_size(FitPolicy::EdgeToEdge, Size::new(800, 600), Some(Size::new(0, 0))), None);
        assert_eq!(target_size(FitPolicy::EdgeToEdge, Size::new(0, 600), Some(HD)), None);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut sizer = ViewportSizer::new(FitPolicy::EdgeToEdge, Size::new(800, 600));
        assert_eq!(sizer.recompute(Size::new(800, 600), Some(HD)), Some(Size::new(800, 450)));
        assert_eq!(sizer.recompute(Size::new(800, 600), Some(HD)), None);
        assert_eq!(sizer.viewport(), Size::new(800, 450));
    }

    #[test]
    fn not_ready_keeps_the_current_viewport() {
        let mut sizer = ViewportSizer::new(FitPolicy::EdgeToEdge, Size::new(800, 600));
        sizer.recompute(Size::new(800, 600), Some(HD));
        assert_eq!(sizer.recompute(Size::new(1000, 600), None), None);
        assert_eq!(sizer.viewport(), Size::new(800, 450));
        assert_eq!(sizer.container(), Size::new(1000, 600));
    }

    #[test]
    fn surface_is_centered_in_the_container() {
        let mut sizer = ViewportSizer::new(FitPolicy::EdgeToEdge, Size::new(800, 600));
        sizer.recompute(Size::new(800, 600), Some(HD));
        assert_eq!(sizer.surface_box(), ScreenRect::new(0.0, 75.0, 800.0, 450.0));
    }
}
