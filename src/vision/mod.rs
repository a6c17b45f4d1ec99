//! Vision collaborators - Capture / Detection / OCR boundary
//!
//! The capture driver, the plate detector and the OCR engine are external
//! systems. The pipeline only sees these traits:
//!
//! - `FrameSource::grab` - `Err` is a fatal device failure, `Ok(None)` is
//!   a clean operator stop or end of stream
//! - `PlateDetector::detect` - zero or more candidate regions per frame
//! - `OcrEngine::recognize` - raw text, or `None` for anything unusable;
//!   OCR garbage is a frequent non-error, never a failure
//!
//! `TextFeed` is the built-in development harness: each input line plays
//! the role of one frame whose OCR result is the line itself, which lets
//! the binary run end to end without a camera attached.

use crate::error::{Error, Result};
use std::io::BufRead;

/// Opaque captured frame
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Rectangular region of a frame likely to contain a plate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

pub trait FrameSource {
    fn grab(&mut self) -> Result<Option<Frame>>;
}

pub trait PlateDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Region>;
}

pub trait OcrEngine {
    fn recognize(&mut self, frame: &Frame, region: &Region) -> Option<String>;
}

/// Line-oriented development harness: source, detector and OCR in one.
///
/// `q` on its own line stops the feed, mirroring the keypress exit of the
/// interactive capture tooling.
pub struct TextFeed<R> {
    reader: R,
}

impl TextFeed<std::io::BufReader<std::io::Stdin>> {
    pub fn stdin() -> Self {
        Self {
            reader: std::io::BufReader::new(std::io::stdin()),
        }
    }
}

impl<R: BufRead> TextFeed<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> FrameSource for TextFeed<R> {
    fn grab(&mut self) -> Result<Option<Frame>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| Error::Device(format!("text feed read failed: {e}")))?;

        let line = line.trim_end_matches(['\r', '\n']);
        if read == 0 || line == "q" {
            return Ok(None);
        }
        Ok(Some(Frame::new(line.as_bytes().to_vec())))
    }
}

impl<R> PlateDetector for TextFeed<R> {
    fn detect(&mut self, frame: &Frame) -> Vec<Region> {
        if frame.data().is_empty() {
            return Vec::new();
        }
        // The whole "frame" is the plate region
        vec![Region {
            x: 0,
            y: 0,
            width: frame.data().len() as u32,
            height: 1,
        }]
    }
}

impl<R> OcrEngine for TextFeed<R> {
    fn recognize(&mut self, frame: &Frame, _region: &Region) -> Option<String> {
        String::from_utf8(frame.data().to_vec()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_text_feed_frames_and_quit() {
        let mut feed = TextFeed::new(Cursor::new("abc123\n\nq\nnever\n"));

        let frame = feed.grab().unwrap().unwrap();
        assert_eq!(frame.data(), b"abc123");

        // Blank line: a frame with no detectable region
        let blank = feed.grab().unwrap().unwrap();
        assert!(feed.detect(&blank).is_empty());

        // 'q' stops the feed
        assert!(feed.grab().unwrap().is_none());
    }

    #[test]
    fn test_text_feed_eof_stops() {
        let mut feed = TextFeed::new(Cursor::new(""));
        assert!(feed.grab().unwrap().is_none());
    }

    #[test]
    fn test_detect_then_recognize_round_trips_line() {
        let mut feed = TextFeed::new(Cursor::new("xyz-999\n"));
        let frame = feed.grab().unwrap().unwrap();
        let regions = feed.detect(&frame);
        assert_eq!(regions.len(), 1);
        assert_eq!(
            feed.recognize(&frame, &regions[0]).as_deref(),
            Some("xyz-999")
        );
    }
}
