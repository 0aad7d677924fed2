// Core types shared by the fitter, the layers and the compositor.

use serde::{Deserialize, Serialize};

/// A raster of packed 0xAARRGGBB pixels.
/// minifb ignores the top byte, so a buffer can be presented directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>, // length = width * height, row-major
}

impl FrameBuffer {
    /// Fully transparent buffer (what an empty stroke layer looks like).
    pub fn transparent(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, argb: u32) -> Self {
        Self { width, height, pixels: vec![argb; width * height] }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }

    /// A zero-area buffer carries no usable frame yet.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn fill(&mut self, argb: u32) {
        self.pixels.fill(argb);
    }
}

/// Integer pixel dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Straight (non-premultiplied) RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn from_argb(px: u32) -> Self {
        Self {
            a: (px >> 24) as u8,
            r: (px >> 16) as u8,
            g: (px >> 8) as u8,
            b: px as u8,
        }
    }

    /// Parse `#rrggbb` (leading `#` optional), like an HTML colour input value.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 {
            return None;
        }
        let v = u32::from_str_radix(digits, 16).ok()?;
        Some(Self::opaque((v >> 16) as u8, (v >> 8) as u8, v as u8))
    }
}

/// Which way the capture device points. Decides the mirror policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    pub fn flipped(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

/// A live or still visual source with its native resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSource {
    pub facing: Facing,
    pub frame: FrameBuffer, // latest frame; its dimensions are the native resolution
}

impl FrameSource {
    pub fn new(facing: Facing, frame: FrameBuffer) -> Self {
        Self { facing, frame }
    }

    pub fn native_size(&self) -> Size {
        self.frame.size()
    }

    /// Zero-sized frames mean the device has not delivered anything yet.
    pub fn is_ready(&self) -> bool {
        !self.frame.is_empty()
    }
}

/// Which background is visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Live,
    Frozen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Ink,
    Erase,
}

/// Current tool plus the remembered settings of each tool.
/// Exactly one tool is active at any time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolState {
    pub kind: ToolKind,
    pub color: Rgba,
    pub ink_width: f32,
    pub erase_width: f32,
}

impl ToolState {
    pub const MIN_WIDTH: f32 = 1.0;
    pub const MAX_WIDTH: f32 = 100.0;

    /// Width of whichever tool is active.
    pub fn width(&self) -> f32 {
        match self.kind {
            ToolKind::Ink => self.ink_width,
            ToolKind::Erase => self.erase_width,
        }
    }

    /// Set the active tool's width, clamped to the slider range.
    pub fn set_width(&mut self, width: f32) {
        let w = width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH);
        match self.kind {
            ToolKind::Ink => self.ink_width = w,
            ToolKind::Erase => self.erase_width = w,
        }
    }
}
