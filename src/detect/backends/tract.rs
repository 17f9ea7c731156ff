#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};

/// Tract-based backend for ONNX object detection.
///
/// Loads a local model file and runs inference on RGB frames. The model is
/// expected to emit rows of `[cx, cy, w, h, score_0, .., score_n]` in frame
/// pixel coordinates (the common exported-detector layout). Rows below
/// `min_confidence` are dropped at the backend so callers only see
/// plausible candidates.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    width: u32,
    height: u32,
    min_confidence: f32,
    class_names: Vec<String>,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
            min_confidence: 0.25,
            class_names: Vec::new(),
        })
    }

    /// Override the backend-side confidence floor.
    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold;
        self
    }

    /// Attach class names in class-id order (for overlay labels).
    pub fn with_class_names(mut self, names: Vec<String>) -> Self {
        self.class_names = names;
        self
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.width || height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.width,
                self.height
            ));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn decode_rows(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        // Flatten the leading batch dimension; rows are [cx, cy, w, h, scores...].
        let rows = view
            .to_shape((view.len() / view.shape()[view.ndim() - 1], view.shape()[view.ndim() - 1]))
            .context("unexpected model output shape")?;

        let mut detections = Vec::new();
        for row in rows.rows() {
            if row.len() < 5 {
                return Err(anyhow!("model output rows too short for box decode"));
            }
            let (best_class, best_score) = row
                .iter()
                .skip(4)
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |acc, (idx, &score)| {
                    if score > acc.1 {
                        (idx, score)
                    } else {
                        acc
                    }
                });
            if !best_score.is_finite() || best_score < self.min_confidence {
                continue;
            }
            detections.push(Detection::new(
                best_class as u32,
                best_score,
                BoundingBox {
                    cx: row[0],
                    cy: row[1],
                    w: row[2],
                    h: row[3],
                },
            ));
        }

        Ok(detections)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode_rows(outputs)
    }

    fn class_name(&self, class_id: u32) -> Option<&str> {
        self.class_names.get(class_id as usize).map(|s| s.as_str())
    }
}
