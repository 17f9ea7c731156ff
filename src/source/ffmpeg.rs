#![cfg(feature = "source-ffmpeg")]

//! Local video file source using FFmpeg.
//!
//! Frames are decoded and scaled to RGB24 in-memory. Seeks land on the
//! nearest preceding keyframe and decode forward until the requested frame
//! index, which gives the exact positioning the clip engine needs for its
//! pre-roll rewind.

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;

use super::FrameSource;
use crate::frame::Frame;

pub struct FileSource {
    path: String,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    fps: f64,
    width: u32,
    height: u32,
    time_base: f64,
    /// Index the next decoded frame will carry.
    next_index: u64,
    /// Frame decoded during seek forward-scan, not yet handed out.
    pending: Option<Frame>,
    drained: bool,
}

impl FileSource {
    /// Open a local video file. Failure here is fatal to the run.
    pub fn open(path: &str) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&path)
            .with_context(|| format!("failed to open video file '{}'", path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("'{}' has no video track", path))?;
        let stream_index = input_stream.index();

        let rate = input_stream.avg_frame_rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        if fps <= 0.0 {
            return Err(anyhow!("'{}' reports no usable frame rate", path));
        }
        let tb = input_stream.time_base();
        let time_base = if tb.denominator() != 0 {
            tb.numerator() as f64 / tb.denominator() as f64
        } else {
            0.0
        };

        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg::util::format::pixel::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        log::info!("FileSource: opened {} ({}x{} @ {:.2} fps)", path, width, height, fps);

        Ok(Self {
            path: path.to_string(),
            input,
            stream_index,
            decoder,
            scaler,
            fps,
            width,
            height,
            time_base,
            next_index: 0,
            pending: None,
            drained: false,
        })
    }

    fn decode_one(&mut self) -> Result<Option<Frame>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb_frame = ffmpeg::frame::Video::empty();

        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                self.scaler
                    .run(&decoded, &mut rgb_frame)
                    .context("scale frame to RGB")?;
                let pixels = frame_to_pixels(&rgb_frame)?;

                // Recover the frame index from the presentation timestamp when
                // available; after seeks this is what re-anchors the counter.
                if let Some(pts) = decoded.pts() {
                    let secs = pts as f64 * self.time_base;
                    self.next_index = (secs * self.fps).round() as u64;
                }
                let index = self.next_index;
                self.next_index += 1;
                return Ok(Some(Frame::new(index, self.width, self.height, pixels)));
            }

            if self.drained {
                return Ok(None);
            }

            let mut sent = false;
            for (stream, packet) in self.input.packets() {
                if stream.index() != self.stream_index {
                    continue;
                }
                self.decoder
                    .send_packet(&packet)
                    .context("send packet to ffmpeg decoder")?;
                sent = true;
                break;
            }
            if !sent {
                self.decoder.send_eof().context("flush ffmpeg decoder")?;
                self.drained = true;
            }
        }
    }
}

impl FrameSource for FileSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_next(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }
        match self.decode_one() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                // Mid-stream decode failure ends the run, it does not abort it.
                log::warn!("FileSource: decode error in {}, treating as end of stream: {}", self.path, e);
                Ok(None)
            }
        }
    }

    fn seek(&mut self, frame_index: u64) -> Result<()> {
        let ts = (frame_index as f64 / self.fps * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
        self.input
            .seek(ts, ..ts)
            .with_context(|| format!("seek to frame {} failed", frame_index))?;
        self.decoder.flush();
        self.pending = None;
        self.drained = false;

        // The container lands on a keyframe at or before the target; decode
        // forward until the requested frame comes out.
        loop {
            match self.decode_one()? {
                Some(frame) if frame.index < frame_index => continue,
                Some(frame) => {
                    if frame.index > frame_index {
                        log::warn!(
                            "FileSource: seek to {} landed on {} (non-exact container timestamps)",
                            frame_index,
                            frame.index
                        );
                    }
                    self.pending = Some(frame);
                    return Ok(());
                }
                None => {
                    return Err(anyhow!(
                        "seek target {} beyond end of {}",
                        frame_index,
                        self.path
                    ))
                }
            }
        }
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<Vec<u8>> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let row_bytes = width * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        return Ok(data.to_vec());
    }

    let mut pixels = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok(pixels)
}
