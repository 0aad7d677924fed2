// LIVE / FROZEN state machine and the mirror transform.

use log::{debug, info};

use crate::compositor::render_background;
use crate::config::FitPolicy;
use crate::types::{Facing, FrameBuffer, FrameSource, Mode, Rgba, Size};

/// Horizontal flip applied to a source. Derived once from facing and used by
/// both the preview path and the capture path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirror {
    None,
    Horizontal,
}

impl Mirror {
    /// Front cameras read as a mirror; back cameras never flip.
    pub fn for_facing(facing: Facing) -> Self {
        match facing {
            Facing::Front => Mirror::Horizontal,
            Facing::Back => Mirror::None,
        }
    }
}

/// Which background is visible, and the frozen capture when there is one.
#[derive(Debug, Default)]
pub struct ModeController {
    mode: Mode,
    frozen: Option<FrameBuffer>, // sized to the viewport it was captured in
}

impl ModeController {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn frozen_frame(&self) -> Option<&FrameBuffer> {
        self.frozen.as_ref()
    }

    /// LIVE -> FROZEN: capture the source through the preview's fit and
    /// mirror, then show the capture. Skipped while the source is not ready.
    pub fn freeze(&mut self, source: Option<&FrameSource>, viewport: Size, fit: FitPolicy, fill: Rgba) -> bool {
        if self.mode == Mode::Frozen {
            return false;
        }
        let Some(src) = source.filter(|s| s.is_ready()) else {
            debug!("freeze skipped: no ready source");
            return false;
        };
        let mirror = Mirror::for_facing(src.facing);
        let Some(capture) = render_background(viewport, fit, fill, &src.frame, mirror) else {
            debug!("freeze skipped: viewport not ready");
            return false;
        };
        self.frozen = Some(capture);
        self.mode = Mode::Frozen;
        info!("frozen {}x{} frame ({:?} mirror)", viewport.width, viewport.height, mirror);
        true
    }

    /// FROZEN -> LIVE: show the live source again. The capture is kept until
    /// the next freeze supersedes it, but is no longer visible.
    pub fn resume(&mut self) -> bool {
        if self.mode == Mode::Live {
            return false;
        }
        self.mode = Mode::Live;
        info!("resumed live preview");
        true
    }

    /// The capture is never resampled: a new viewport leaves it blank until
    /// the next freeze.
    pub fn viewport_changed(&mut self, viewport: Size) {
        if self.frozen.is_some() {
            debug!("frozen frame blanked for {}x{} viewport", viewport.width, viewport.height);
            self.frozen = Some(FrameBuffer::transparent(viewport.width as usize, viewport.height as usize));
        }
    }

    /// Drop the capture entirely (it belongs to a source that is going away).
    pub fn discard_frozen(&mut self) {
        self.frozen = None;
    }
}
