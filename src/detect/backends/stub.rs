use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};

/// Stub backend for testing. Uses pixel hashing to detect scene changes.
///
/// When consecutive frames differ it reports a single full-frame detection
/// with a fixed class id and confidence. The first frame never detects
/// (there is nothing to compare against).
pub struct StubBackend {
    last_hash: Option<[u8; 32]>,
    class_id: u32,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            last_hash: None,
            class_id: 0,
        }
    }

    /// Report detections under a different class id.
    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let current_hash: [u8; 32] = Sha256::digest(pixels).into();

        let changed = self.last_hash.is_some_and(|prev| prev != current_hash);

        self.last_hash = Some(current_hash);

        if changed {
            Ok(vec![Detection::new(
                self.class_id,
                0.85,
                BoundingBox {
                    cx: width as f32 / 2.0,
                    cy: height as f32 / 2.0,
                    w: width as f32,
                    h: height as f32,
                },
            )])
        } else {
            Ok(Vec::new())
        }
    }

    fn class_name(&self, class_id: u32) -> Option<&str> {
        (class_id == self.class_id).then_some("motion")
    }
}
