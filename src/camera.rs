// Camera acquisition.
// `CameraCapture` opens a native device for a facing and turns its frames into
// opaque 0xFFRRGGBB buffers. `Acquirer` tracks which acquisition is current so
// a late result from a superseded request is released instead of installed.

use log::{debug, info, warn};

use crate::config::CameraConfig;
use crate::error::Error;
use crate::types::{Facing, FrameBuffer, FrameSource};

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
};

/// An open, streaming capture device.
pub struct CameraCapture {
    cam: Camera,
    facing: Facing,
}

impl CameraCapture {
    /// Open the device configured for `facing`, asking for the closest format
    /// to the configured resolution and frame rate.
    pub fn open(config: &CameraConfig, facing: Facing) -> Result<Self, Error> {
        let index = config.index_for(facing);
        let fmt = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            config.fps,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(CameraIndex::Index(index), req)
            .map_err(|e| Error::CameraInit(format!("create camera {index}: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("open stream {index}: {e}")))?;

        // The stream may settle on a different resolution than requested.
        let actual = cam.resolution();
        info!(
            "camera {} ({:?}) streaming at {}x{}",
            index,
            facing,
            actual.width(),
            actual.height()
        );
        Ok(Self { cam, facing })
    }

    /// Open the device and wait for its first frame. A device that opens but
    /// never delivers counts as a failed acquisition.
    pub fn open_streaming(config: &CameraConfig, facing: Facing) -> Result<(Self, FrameBuffer), Error> {
        let mut cam = Self::open(config, facing)?;
        let first = cam.next_frame()?;
        Ok((cam, first))
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Grab one frame (blocks until the device has one) as opaque pixels.
    pub fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("fetch frame: {e}")))?;
        let rgb = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode RGB: {e}")))?;

        let (w, h) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| 0xFF00_0000 | ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect();
        Ok(FrameBuffer { width: w as usize, height: h as usize, pixels })
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.cam.stop_stream() {
            warn!("stopping {:?} camera: {e}", self.facing);
        }
    }
}

/// Identifies one acquisition request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    pub facing: Facing,
}

/// What became of a resolved acquisition.
#[derive(Debug)]
pub enum Acquired {
    /// The new handle is active; the previous one has been released.
    Installed,
    /// The device could not be acquired; the previous handle stays active.
    Failed(Error),
    /// A newer request exists; this result was released and ignored.
    Superseded,
}

/// Result of a whole acquisition round, first frame included.
#[derive(Debug)]
pub enum Acquisition {
    /// The new device is active and this is its first frame.
    Ready(FrameSource),
    /// Nothing changed; the previous device keeps streaming.
    Failed(Error),
    Superseded,
}

/// Owner of the active device handle plus the one acquisition in flight.
pub struct Acquirer<H> {
    active: Option<(Facing, H)>,
    pending: Option<Ticket>,
    next_generation: u64,
}

impl<H> Default for Acquirer<H> {
    fn default() -> Self {
        Self { active: None, pending: None, next_generation: 0 }
    }
}

impl<H> Acquirer<H> {
    /// Start a new acquisition; any earlier pending one is superseded.
    pub fn begin(&mut self, facing: Facing) -> Ticket {
        if let Some(old) = self.pending {
            debug!("acquisition #{} superseded by a {:?} request", old.generation, facing);
        }
        let ticket = Ticket { generation: self.next_generation, facing };
        self.next_generation += 1;
        self.pending = Some(ticket);
        ticket
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Settle `ticket` with the backend's result. The old handle is released
    /// only after the new one is in place.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<H, Error>) -> Acquired {
        if self.pending != Some(ticket) {
            match result {
                Ok(handle) => {
                    info!("releasing superseded {:?} camera", ticket.facing);
                    drop(handle);
                }
                Err(e) => debug!("superseded {:?} acquisition failed: {e}", ticket.facing),
            }
            return Acquired::Superseded;
        }
        self.pending = None;
        match result {
            Ok(handle) => {
                let previous = self.active.replace((ticket.facing, handle));
                drop(previous);
                Acquired::Installed
            }
            Err(e) => {
                warn!("{:?} camera unavailable: {e}", ticket.facing);
                Acquired::Failed(e)
            }
        }
    }

    /// Run one acquisition for `facing`. `open` must hand back the handle
    /// together with its first frame; only then is the old handle released.
    pub fn acquire<F>(&mut self, facing: Facing, open: F) -> Acquisition
    where
        F: FnOnce(Facing) -> Result<(H, FrameBuffer), Error>,
    {
        let ticket = self.begin(facing);
        let (result, first) = match open(facing) {
            Ok((handle, frame)) => (Ok(handle), Some(frame)),
            Err(e) => (Err(e), None),
        };
        match (self.resolve(ticket, result), first) {
            (Acquired::Installed, Some(frame)) => Acquisition::Ready(FrameSource::new(facing, frame)),
            (Acquired::Failed(e), _) => Acquisition::Failed(e),
            _ => Acquisition::Superseded,
        }
    }

    pub fn active_facing(&self) -> Option<Facing> {
        self.active.as_ref().map(|(facing, _)| *facing)
    }

    pub fn active_mut(&mut self) -> Option<&mut H> {
        self.active.as_mut().map(|(_, handle)| handle)
    }
}
