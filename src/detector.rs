// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detector bootstrap for unlabeled images.
//!
//! A [`Detector`] proposes boxes for an image that has no label file yet.
//! Inference runs on a background thread; the UI thread polls for the
//! tagged result and applies it only if the same image is still open.

use crate::config::DetectorConfig;
use crate::models::annotation::Rect;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

/// One proposed box in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub rect: Rect,
    pub class_id: usize,
}

pub trait Detector: Send + Sync {
    fn infer(&self, image_path: &Path) -> Result<Vec<Detection>>;
}

/// Detector that never proposes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDetector;

impl Detector for NoDetector {
    fn infer(&self, _image_path: &Path) -> Result<Vec<Detection>> {
        Ok(Vec::new())
    }
}

/// Runs an external program with the image path as its last argument.
///
/// The program prints one `x1 y1 x2 y2 class_id` line per box.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
}

impl CommandDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

impl Detector for CommandDetector {
    fn infer(&self, image_path: &Path) -> Result<Vec<Detection>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .output()
            .with_context(|| format!("Failed to run detector '{}'", self.program))?;
        if !output.status.success() {
            bail!(
                "Detector '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        parse_detections(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Build the detector described by the configuration.
pub fn from_config(config: Option<&DetectorConfig>) -> Arc<dyn Detector> {
    match config {
        Some(config) => Arc::new(CommandDetector::new(config)),
        None => Arc::new(NoDetector),
    }
}

/// Parse detector output lines.
pub fn parse_detections(text: &str) -> Result<Vec<Detection>> {
    let mut detections = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 5 {
            bail!("detector line {}: expected 5 fields, found {}", line_no + 1, fields.len());
        }
        let mut coords = [0i32; 4];
        for (slot, field) in coords.iter_mut().zip(&fields[..4]) {
            // Accept float output and truncate to pixels.
            let value: f64 = field
                .parse()
                .with_context(|| format!("detector line {}: bad number '{}'", line_no + 1, field))?;
            *slot = value as i32;
        }
        let class_id = fields[4]
            .parse()
            .with_context(|| format!("detector line {}: bad class '{}'", line_no + 1, fields[4]))?;
        let [x1, y1, x2, y2] = coords;
        detections.push(Detection {
            rect: Rect::new(x1, y1, x2, y2).normalized(),
            class_id,
        });
    }
    Ok(detections)
}

/// Detections for one image, tagged with its file name.
#[derive(Debug)]
pub struct DetectionResult {
    pub filename: String,
    pub detections: Result<Vec<Detection>>,
}

/// Background inference, one request in flight at a time.
pub struct DetectorWorker {
    detector: Arc<dyn Detector>,
    pending: Option<Receiver<DetectionResult>>,
}

impl DetectorWorker {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        Self {
            detector,
            pending: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Start inference for `filename`. A request still in flight is abandoned.
    pub fn request(&mut self, filename: String, image_path: PathBuf) {
        let (sender, receiver) = channel();
        self.pending = Some(receiver);
        let detector = Arc::clone(&self.detector);

        std::thread::spawn(move || {
            let detections = detector.infer(&image_path);
            if let Ok(found) = &detections {
                log::debug!("Detector found {} boxes in {}", found.len(), filename);
            }
            // The receiver is gone if the request was abandoned.
            let _ = sender.send(DetectionResult {
                filename,
                detections,
            });
        });
    }

    /// Collect a finished result without blocking.
    pub fn poll(&mut self) -> Option<DetectionResult> {
        let receiver = self.pending.as_ref()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.pending = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::error!("Detector worker stopped without a result");
                self.pending = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct FixedDetector(Vec<Detection>);

    impl Detector for FixedDetector {
        fn infer(&self, _image_path: &Path) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_parse_detections() {
        let text = "10 20 110 220 0\n\n300.7 40 250 10 3\n";
        let found = parse_detections(text).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].rect, Rect::new(10, 20, 110, 220));
        assert_eq!(found[1].rect, Rect::new(250, 10, 300, 40));
        assert_eq!(found[1].class_id, 3);
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(parse_detections("1 2 3 4\n").is_err());
        assert!(parse_detections("1 2 3 4 cat\n").is_err());
        assert!(parse_detections("1 two 3 4 0\n").is_err());
    }

    #[test]
    fn test_no_detector_is_empty() {
        assert!(NoDetector.infer(Path::new("x.jpg")).unwrap().is_empty());
    }

    #[test]
    fn test_worker_tags_result_with_filename() {
        let detection = Detection {
            rect: Rect::new(0, 0, 5, 5),
            class_id: 1,
        };
        let mut worker = DetectorWorker::new(Arc::new(FixedDetector(vec![detection])));
        assert!(worker.poll().is_none());

        worker.request("a.jpg".into(), PathBuf::from("/imgs/a.jpg"));
        assert!(worker.is_busy());

        let deadline = Instant::now() + Duration::from_secs(5);
        let result = loop {
            if let Some(result) = worker.poll() {
                break result;
            }
            assert!(Instant::now() < deadline, "worker timed out");
            std::thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(result.filename, "a.jpg");
        assert_eq!(result.detections.unwrap(), vec![detection]);
        assert!(!worker.is_busy());
    }
}
