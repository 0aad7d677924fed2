// What you SEE:
// • The camera feed, fitted into the window without stretching.
// • Hold Left Mouse: draw on top of it. P pen, E eraser, [ ] width, 1-6 colours.
// • F freezes the current frame (press again to go live), S switches camera.
// • C clears the ink, X saves a PNG of exactly what is on screen. ESC quits.

mod draw;

use std::path::PathBuf;

use log::warn;
use minifb::Key;

use draw::Drawer;
use overlay_sketch::camera::{Acquirer, Acquisition, CameraCapture};
use overlay_sketch::config::{CameraConfig, DEFAULT_CONFIG_FILE, SketchConfig};
use overlay_sketch::error::Error;
use overlay_sketch::pointer::{PointerEvent, PointerSample};
use overlay_sketch::session::{Command, Event, Session};
use overlay_sketch::types::{Facing, Mode, Rgba, ToolKind};

const PALETTE: [(Key, Rgba); 6] = [
    (Key::Key1, Rgba::opaque(255, 0, 0)),
    (Key::Key2, Rgba::opaque(0, 200, 0)),
    (Key::Key3, Rgba::opaque(0, 90, 255)),
    (Key::Key4, Rgba::opaque(255, 220, 0)),
    (Key::Key5, Rgba::opaque(255, 255, 255)),
    (Key::Key6, Rgba::opaque(0, 0, 0)),
];
const WIDTH_STEP: f32 = 2.0;

fn main() -> Result<(), Error> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = SketchConfig::load_or_default(&config_path);

    let mut drawer = Drawer::new(&config.window)?;
    let mut cameras: Acquirer<CameraCapture> = Acquirer::default();
    let mut session = Session::new(&config, drawer.container_size());
    session = acquire(session, &mut cameras, &config.camera, config.initial_facing);

    let mut pointer_down = false;

    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Container box: the window may have been resized or rotated. */
        let container = drawer.container_size();
        if container != session.container() {
            session = step(session, Event::Resize(container), &mut cameras, &config.camera);
        }

        /* 2) Fresh live frame from whichever camera is active. */
        match cameras.active_mut().map(CameraCapture::next_frame) {
            Some(Ok(frame)) => session = step(session, Event::SourceFrame(frame), &mut cameras, &config.camera),
            Some(Err(e)) => warn!("{e}"),
            None => {}
        }

        /* 3) Keys -> events. */
        for event in key_events(&drawer, &session) {
            session = step(session, event, &mut cameras, &config.camera);
        }
        if drawer.key_pressed_once(Key::X) {
            session = session.save(&config.export_dir);
        }

        /* 4) Mouse -> pointer events against the surface's current screen box. */
        let left = drawer.left_mouse_down();
        let mouse = |position| PointerEvent {
            pointer_id: 0,
            sample: PointerSample::Mouse { position, button: 0 },
            surface: session.surface_box(),
        };
        let event = match (pointer_down, left, drawer.mouse_pos()) {
            (true, false, _) => Some(Event::PointerUp { pointer_id: 0 }),
            (false, true, Some(p)) => Some(Event::PointerDown(mouse(p))),
            (true, true, Some(p)) => Some(Event::PointerMove(mouse(p))),
            _ => None,
        };
        if let Some(event) = event {
            session = step(session, event, &mut cameras, &config.camera);
        }
        pointer_down = left;

        /* 5) Present exactly what an export would contain. */
        drawer.set_status(&status_line(&session));
        let surface = session.composite();
        drawer.present(surface.as_ref(), session.surface_box())?;
    }

    Ok(())
}

/// Dispatch one event and carry out whatever the session asks for.
fn step(session: Session, event: Event, cameras: &mut Acquirer<CameraCapture>, camera: &CameraConfig) -> Session {
    match session.dispatch(event) {
        (session, Some(Command::Acquire(facing))) => acquire(session, cameras, camera, facing),
        (session, None) => session,
    }
}

/// Open the camera for `facing` and report the outcome to the session.
/// The old camera keeps streaming until the new one has delivered a frame.
fn acquire(session: Session, cameras: &mut Acquirer<CameraCapture>, camera: &CameraConfig, facing: Facing) -> Session {
    let event = match cameras.acquire(facing, |f| CameraCapture::open_streaming(camera, f)) {
        Acquisition::Ready(source) => Event::SourceChanged(source),
        Acquisition::Failed(e) => Event::AcquisitionFailed(e.to_string()),
        Acquisition::Superseded => return session,
    };
    session.dispatch(event).0
}

fn key_events(drawer: &Drawer, session: &Session) -> Vec<Event> {
    let mut events = Vec::new();
    if drawer.key_pressed_once(Key::F) {
        events.push(Event::ModeToggle);
    }
    if drawer.key_pressed_once(Key::S) {
        events.push(Event::SwitchCamera);
    }
    if drawer.key_pressed_once(Key::P) {
        events.push(Event::SelectTool(ToolKind::Ink));
    }
    if drawer.key_pressed_once(Key::E) {
        events.push(Event::SelectTool(ToolKind::Erase));
    }
    if drawer.key_pressed_once(Key::C) {
        events.push(Event::Clear);
    }
    let width = session.tools().width();
    if drawer.key_pressed_once(Key::LeftBracket) {
        events.push(Event::SetWidth(width - WIDTH_STEP));
    }
    if drawer.key_pressed_once(Key::RightBracket) {
        events.push(Event::SetWidth(width + WIDTH_STEP));
    }
    for (key, color) in PALETTE {
        if drawer.key_pressed_once(key) {
            events.push(Event::SetColor(color));
        }
    }
    events
}

fn status_line(session: &Session) -> String {
    let mode = match session.mode() {
        Mode::Live => "LIVE",
        Mode::Frozen => "FROZEN",
    };
    let tool = match session.tools().kind {
        ToolKind::Ink => "pen",
        ToolKind::Erase => "eraser",
    };
    let camera = if session.is_acquiring() {
        "switching camera…".to_string()
    } else {
        format!("{:?} camera", session.facing())
    };
    let mut line = format!("{mode} | {tool} {}px | {camera}", session.tools().width());
    if let Some(notice) = session.notice() {
        line.push_str(" | ");
        line.push_str(notice);
    }
    line
}
