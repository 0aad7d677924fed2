//! Session state and the single event dispatcher.
//!
//! All mutable sketchpad state lives in [`Session`]. Each input is an
//! [`Event`]; [`Session::dispatch`] consumes the session, applies the event and
//! hands the session back together with an optional [`Command`] for the host
//! (currently only "acquire a camera"). Nothing here touches a window or a
//! device, so whole interaction sequences can be replayed in tests.

use std::path::Path;

use log::{debug, info, warn};

use crate::compositor::{self, Background, Scene};
use crate::config::{FitPolicy, ResizePolicy, SketchConfig};
use crate::error::Error;
use crate::export;
use crate::mode::{Mirror, ModeController};
use crate::pointer::{PointerEvent, ScreenRect};
use crate::stroke::{Gesture, StrokeLayer};
use crate::types::{Facing, FrameBuffer, FrameSource, Mode, Rgba, Size, ToolKind, ToolState};
use crate::viewport::ViewportSizer;

/// Closed set of inputs the session reacts to.
#[derive(Clone, Debug)]
pub enum Event {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp { pointer_id: u32 },
    /// The container box changed (window resize, rotation).
    Resize(Size),
    /// Freeze when live, resume when frozen.
    ModeToggle,
    /// A newly acquired source delivered its first frame.
    SourceChanged(FrameSource),
    /// A fresh frame from the current source.
    SourceFrame(FrameBuffer),
    /// Flip between front and back cameras.
    SwitchCamera,
    AcquisitionFailed(String),
    SelectTool(ToolKind),
    SetColor(Rgba),
    SetWidth(f32),
    /// Trash: wipe all ink.
    Clear,
    /// A message for the user (e.g. a failed export).
    Notice(String),
}

/// Work the host has to perform on the session's behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Acquire(Facing),
}

pub struct Session {
    fit: FitPolicy,
    resize: ResizePolicy,
    fill: Rgba,
    tools: ToolState,
    facing: Facing,
    source: Option<FrameSource>,
    acquiring: bool,
    sizer: ViewportSizer,
    strokes: StrokeLayer,
    gesture: Gesture,
    modes: ModeController,
    notice: Option<String>,
}

impl Session {
    pub fn new(config: &SketchConfig, container: Size) -> Self {
        let mut sizer = ViewportSizer::new(config.fit_policy, container);
        // Letterbox can size itself before any camera shows up.
        sizer.recompute(container, None);
        Self {
            fit: config.fit_policy,
            resize: config.resize_policy,
            fill: config.letterbox_fill,
            tools: config.initial_tools(),
            facing: config.initial_facing,
            source: None,
            acquiring: false,
            strokes: StrokeLayer::new(sizer.viewport()),
            sizer,
            gesture: Gesture::Idle,
            modes: ModeController::default(),
            notice: None,
        }
    }

    /// Apply one event.
    pub fn dispatch(mut self, event: Event) -> (Self, Option<Command>) {
        let mut command = None;
        match event {
            Event::PointerDown(ev) => self.pointer_down(&ev),
            Event::PointerMove(ev) => self.pointer_move(&ev),
            Event::PointerUp { pointer_id } => {
                if let Some(stroke) = self.gesture.end(pointer_id) {
                    debug!("stroke finished: {} points ({:?})", stroke.points.len(), stroke.tool);
                }
            }
            Event::Resize(container) => self.relayout(container),
            Event::ModeToggle => self.toggle_mode(),
            Event::SourceChanged(source) => {
                info!(
                    "{:?} source ready at {}x{}",
                    source.facing,
                    source.frame.width,
                    source.frame.height
                );
                self.acquiring = false;
                self.facing = source.facing;
                self.source = Some(source);
                self.notice = None;
                self.relayout(self.sizer.container());
            }
            Event::SourceFrame(frame) => self.source_frame(frame),
            Event::SwitchCamera => {
                if self.modes.mode() == Mode::Frozen {
                    // The capture belongs to the camera that is going away.
                    self.modes.resume();
                    self.modes.discard_frozen();
                }
                self.facing = self.facing.flipped();
                self.acquiring = true;
                command = Some(Command::Acquire(self.facing));
            }
            Event::AcquisitionFailed(msg) => {
                warn!("camera acquisition failed: {msg}");
                self.acquiring = false;
                if let Some(src) = &self.source {
                    self.facing = src.facing;
                }
                self.notice = Some(msg);
            }
            Event::SelectTool(kind) => self.tools.kind = kind,
            // colour belongs to the pen even while the eraser is active
            Event::SetColor(color) => self.tools.color = color,
            Event::SetWidth(width) => self.tools.set_width(width),
            Event::Clear => self.strokes.clear(),
            Event::Notice(msg) => self.notice = Some(msg),
        }
        (self, command)
    }

    fn pointer_down(&mut self, ev: &PointerEvent) {
        if !ev.sample.may_start_stroke() {
            return;
        }
        let Some(at) = ev.raster_position(self.strokes.size()) else {
            return;
        };
        self.gesture.begin(ev.pointer_id, at, &self.tools);
    }

    fn pointer_move(&mut self, ev: &PointerEvent) {
        if self.gesture.captured_pointer() != Some(ev.pointer_id) {
            return;
        }
        if let Some(to) = ev.raster_position(self.strokes.size()) {
            self.gesture.extend(ev.pointer_id, to, &mut self.strokes);
        }
    }

    fn source_frame(&mut self, frame: FrameBuffer) {
        if self.acquiring {
            return;
        }
        let resized = match self.source.as_mut() {
            Some(source) => {
                let resized = source.frame.size() != frame.size();
                source.frame = frame;
                resized
            }
            None => {
                // first frame only arrived after the device was installed
                self.source = Some(FrameSource::new(self.facing, frame));
                true
            }
        };
        if resized {
            self.relayout(self.sizer.container());
        }
    }

    /// Recompute the viewport; on a real change resize the stroke layer and
    /// blank the frozen frame.
    fn relayout(&mut self, container: Size) {
        let native = self.ready_source().map(FrameSource::native_size);
        let previous = self.sizer.viewport();
        if let Some(viewport) = self.sizer.recompute(container, native) {
            self.strokes.resize(viewport, self.resize);
            self.gesture.rescale(previous, viewport);
            self.modes.viewport_changed(viewport);
        }
    }

    fn toggle_mode(&mut self) {
        self.relayout(self.sizer.container());
        match self.modes.mode() {
            Mode::Live => {
                let viewport = self.sizer.viewport();
                // field-level borrow so `modes` stays mutable
                let source = if self.acquiring { None } else { self.source.as_ref() };
                self.modes.freeze(source, viewport, self.fit, self.fill);
            }
            Mode::Frozen => {
                self.modes.resume();
            }
        }
    }

    /// The live source, unless it is missing, empty, or being replaced.
    pub fn ready_source(&self) -> Option<&FrameSource> {
        if self.acquiring {
            return None;
        }
        self.source.as_ref().filter(|s| s.is_ready())
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn viewport(&self) -> Size {
        self.sizer.viewport()
    }

    pub fn container(&self) -> Size {
        self.sizer.container()
    }

    /// Where the stroke surface currently sits inside the container.
    pub fn surface_box(&self) -> ScreenRect {
        self.sizer.surface_box()
    }

    pub fn strokes(&self) -> &StrokeLayer {
        &self.strokes
    }

    pub fn frozen_frame(&self) -> Option<&FrameBuffer> {
        self.modes.frozen_frame()
    }

    pub fn is_acquiring(&self) -> bool {
        self.acquiring
    }

    pub fn is_drawing(&self) -> bool {
        self.gesture.captured_pointer().is_some()
    }

    /// Last user-facing message (acquisition or export failure).
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Exactly what is on screen: background per mode, then the ink.
    pub fn composite(&self) -> Option<FrameBuffer> {
        let background = match self.modes.mode() {
            Mode::Frozen => self.modes.frozen_frame().map_or(Background::Empty, Background::Frozen),
            Mode::Live => match self.ready_source() {
                Some(src) => Background::Live { frame: &src.frame, mirror: Mirror::for_facing(src.facing) },
                None => Background::Empty,
            },
        };
        compositor::composite(&Scene {
            viewport: self.sizer.viewport(),
            fit: self.fit,
            fill: self.fill,
            background,
            strokes: self.strokes.raster(),
        })
    }

    /// Export into `dir` and report the outcome as a notice. A failure never
    /// touches the ink or the frozen frame.
    pub fn save(self, dir: &Path) -> Self {
        let notice = match self.export_png() {
            Ok(Some(bytes)) => match export::save_png(&bytes, dir) {
                Ok(path) => format!("saved {}", path.display()),
                Err(e) => e.to_string(),
            },
            Ok(None) => {
                debug!("export skipped: no viewport yet");
                return self;
            }
            Err(e) => e.to_string(),
        };
        self.dispatch(Event::Notice(notice)).0
    }

    /// Composite and encode as PNG. `Ok(None)` while there is no viewport yet.
    pub fn export_png(&self) -> Result<Option<Vec<u8>>, Error> {
        match self.composite() {
            Some(raster) => export::encode_png(&raster).map(Some),
            None => Ok(None),
        }
    }
}
