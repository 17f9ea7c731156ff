use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// The engine treats backends as reliable collaborators: `detect` always
/// returns a (possibly empty) detection list for identical pixel input, and
/// no shared mutable state is carried across calls beyond what the backend
/// itself chooses to keep.
///
/// Implementations must treat the pixel slice as read-only and ephemeral;
/// it is not valid beyond the `detect` call.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one RGB24 frame.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Human-readable class name for overlay labels, when the backend knows it.
    fn class_name(&self, _class_id: u32) -> Option<&str> {
        None
    }

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
