// Frame source: opens the default camera and converts frames into packed
// 0x00RRGGBB buffers for the compositor. Only the most recent frame is ever
// visible; there is no queue, so a slow iteration simply drops frames
// (fine for a live preview, this is not a lossless pipeline).

use crate::error::Error;
use crate::types::FrameBuffer;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
    delivered_any: bool, // set after the first full frame comes through
}

impl CameraCapture {
    /// Try to open a camera at a target resolution (falls back if not exact).
    /// Nothing is shown on screen yet; we just hold an open stream.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        // 1) Choose the device (0 = default webcam)
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );

        // 2) Ask for RGB frames near our requested format.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        // 3) Create the camera (this fails if no device exists or access is denied).
        let mut cam =
            Camera::new(idx, req).map_err(|e| Error::CameraInit(format!("create camera: {e}")))?;

        // 4) Start streaming.
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("open stream: {e}")))?;

        // 5) The stream may have chosen a slightly different resolution.
        let actual = cam.resolution();

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
            delivered_any: false,
        })
    }

    /// Grab the current frame, or `None` while the device is still warming up.
    /// Render-loop contract: skip compositing on `None`, never treat it as an
    /// error. Once the first frame has been delivered, fetch failures are real.
    pub fn poll_frame(&mut self) -> Result<Option<FrameBuffer>, Error> {
        let frame = match self.cam.frame() {
            Ok(f) => f,
            Err(e) if !self.delivered_any => {
                // Device not ready yet; report Unavailable rather than failing.
                log::debug!("camera warming up: {e}");
                return Ok(None);
            }
            Err(e) => return Err(Error::CameraFrame(format!("fetch frame: {e}"))),
        };

        // Decode to ImageBuffer<Rgb<u8>, _>; handles the raw formats safely.
        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode RGB: {e}")))?;

        // Pack into u32 pixels for the window (0x00RRGGBB).
        let (w, h) = rgb_img.dimensions();
        let mut out = Vec::with_capacity((w as usize) * (h as usize));
        for (_x, _y, pixel) in rgb_img.enumerate_pixels() {
            let r = pixel[0] as u32;
            let g = pixel[1] as u32;
            let b = pixel[2] as u32;
            out.push((r << 16) | (g << 8) | b);
        }

        self.delivered_any = true;
        Ok(Some(FrameBuffer {
            width: w as usize,
            height: h as usize,
            pixels: out,
        }))
    }

    /// The resolution the camera is actually delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
