//! Camera overlay sketchpad engine.
//!
//! A live camera frame is fitted into a viewport without distortion, ink is
//! drawn on a transparent stroke layer above it, the frame can be frozen to
//! draw over a still, and the visible layers flatten into one exportable
//! image that matches the screen.
//!
//! Data flows one way:
//!
//! ```text
//!   camera -> fit -> viewport -> mode (live | frozen) -> compositor <- stroke <- pointer
//! ```
//!
//! [`session::Session`] owns all of it and reacts to one closed set of
//! [`session::Event`]s.

pub mod camera;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod fit;
pub mod mode;
pub mod pointer;
pub mod session;
pub mod stroke;
pub mod types;
pub mod viewport;
