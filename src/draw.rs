// Window + raw input.
// The window is the container: its client size is the box the viewport is
// fitted into, and the composited surface is blitted centered inside it.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use overlay_sketch::config::WindowConfig;
use overlay_sketch::error::Error;
use overlay_sketch::pointer::{ScreenPoint, ScreenRect};
use overlay_sketch::types::{FrameBuffer, Size};

const BACKDROP: u32 = 0xFF20_2020; // container colour around the surface

pub struct Drawer {
    window: Window,
    screen: FrameBuffer, // container-sized buffer handed to minifb
}

impl Drawer {
    pub fn new(config: &WindowConfig) -> Result<Self, Error> {
        let opts = WindowOptions { resize: true, ..WindowOptions::default() };
        let window = Window::new(&config.title, config.width as usize, config.height as usize, opts)
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        let (w, h) = window.get_size();
        Ok(Self { window, screen: FrameBuffer::filled(w, h, BACKDROP) })
    }

    /// Current client area, i.e. the container box.
    pub fn container_size(&self) -> Size {
        let (w, h) = self.window.get_size();
        Size::new(w as u32, h as u32)
    }

    /// Blit `surface` at its screen box and push the result to the window.
    pub fn present(&mut self, surface: Option<&FrameBuffer>, at: ScreenRect) -> Result<(), Error> {
        let Size { width, height } = self.container_size();
        let (w, h) = (width as usize, height as usize);
        if self.screen.width != w || self.screen.height != h {
            self.screen = FrameBuffer::filled(w, h, BACKDROP);
        } else {
            self.screen.fill(BACKDROP);
        }
        if let Some(surface) = surface {
            blit(&mut self.screen, surface, at.left as usize, at.top as usize);
        }
        self.window
            .update_with_buffer(&self.screen.pixels, w, h)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    pub fn set_status(&mut self, text: &str) {
        self.window.set_title(text);
    }

    /// Returns false when the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    pub fn key_pressed_once(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    /// Mouse position even outside the window, so a captured stroke keeps tracking.
    pub fn mouse_pos(&self) -> Option<ScreenPoint> {
        self.window
            .get_mouse_pos(MouseMode::Pass)
            .map(|(x, y)| ScreenPoint::new(x as f64, y as f64))
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }
}

/// Copy `surface` into `screen` with its top-left at (ox, oy), cropped to the
/// screen. The window may have shrunk since the layout was computed, so the
/// offset can lie past the edge.
fn blit(screen: &mut FrameBuffer, surface: &FrameBuffer, ox: usize, oy: usize) {
    let cols = surface.width.min(screen.width.saturating_sub(ox));
    let rows = if cols == 0 { 0 } else { surface.height.min(screen.height.saturating_sub(oy)) };
    for y in 0..rows {
        let src = &surface.pixels[y * surface.width..y * surface.width + cols];
        let start = (oy + y) * screen.width + ox;
        screen.pixels[start..start + cols].copy_from_slice(src);
    }
}
