//! Frame annotation helpers.
//!
//! Pure, stateless drawing over RGB24 frames: detection boxes with class
//! labels (the dense-annotation variant) and the frame-index caption the
//! clip engine stamps on written frames. Text rendering uses a built-in 5x7
//! glyph set; there is no font dependency.

use crate::detect::{Detection, DetectorBackend};
use crate::frame::Frame;

pub const GREEN: [u8; 3] = [0, 255, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Glyph cell width including 1px spacing.
const CELL_W: u32 = GLYPH_W + 1;

/// Draw a rectangle outline from corner coordinates, clamped to the frame.
pub fn draw_box(frame: &mut Frame, x1: f32, y1: f32, x2: f32, y2: f32, color: [u8; 3], thickness: u32) {
    let clamp = |v: f32, max: u32| -> u32 { v.max(0.0).min(max.saturating_sub(1) as f32) as u32 };
    let x0 = clamp(x1.min(x2), frame.width);
    let y0 = clamp(y1.min(y2), frame.height);
    let x1 = clamp(x1.max(x2), frame.width);
    let y1 = clamp(y1.max(y2), frame.height);

    for t in 0..thickness {
        let xx0 = x0 + t;
        let yy0 = y0 + t;
        let xx1 = x1.saturating_sub(t);
        let yy1 = y1.saturating_sub(t);
        if xx0 > xx1 || yy0 > yy1 {
            continue;
        }
        for x in xx0..=xx1 {
            frame.put_pixel(x, yy0, color);
            frame.put_pixel(x, yy1, color);
        }
        for y in yy0..=yy1 {
            frame.put_pixel(xx0, y, color);
            frame.put_pixel(xx1, y, color);
        }
    }
}

/// Pixel width of `text` at the given scale.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * CELL_W * scale
}

/// Draw `text` with its top-left corner at (x, y). Unknown characters render
/// as blanks; pixels falling outside the frame are dropped.
pub fn draw_text(frame: &mut Frame, text: &str, x: i32, y: i32, color: [u8; 3], scale: u32) {
    let mut pen_x = x;
    for ch in text.chars() {
        if let Some(rows) = glyph(ch) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let px = pen_x + (col * scale + dx) as i32;
                            let py = y + (row as u32 * scale + dy) as i32;
                            if px >= 0 && py >= 0 {
                                frame.put_pixel(px as u32, py as u32, color);
                            }
                        }
                    }
                }
            }
        }
        pen_x += (CELL_W * scale) as i32;
    }
}

/// Overlay label text for one detection: `"<class_name> (<class_id>) <confidence>"`.
pub fn detection_label(detection: &Detection, detector: &dyn DetectorBackend) -> String {
    let name = detector
        .class_name(detection.class_id)
        .unwrap_or("object")
        .to_string();
    format!(
        "{} ({}) {:.2}",
        name, detection.class_id, detection.confidence
    )
}

/// Draw boxes and labels for the given detections.
///
/// Boxes arrive in center-width-height form and are converted to corners
/// here; the label sits just above the top-left corner of each box.
pub fn draw_detections(frame: &mut Frame, detections: &[Detection], detector: &dyn DetectorBackend) {
    for detection in detections {
        let (x1, y1, x2, y2) = detection.bbox.corners();
        draw_box(frame, x1, y1, x2, y2, GREEN, 2);

        let label = detection_label(detection, detector);
        draw_text(
            frame,
            &label.to_ascii_uppercase(),
            x1 as i32,
            y1 as i32 - 10 - GLYPH_H as i32,
            GREEN,
            1,
        );
    }
}

/// Stamp the frame-index caption: centered horizontally, 30 px above the
/// bottom edge. Rendered as `FRAME: <n>` since the glyph set only carries
/// uppercase letters.
pub fn caption_frame_index(frame: &mut Frame) {
    let text = format!("FRAME: {}", frame.index);
    let scale = 2;
    let width = text_width(&text, scale);
    let x = (frame.width.saturating_sub(width) / 2) as i32;
    let y = frame.height.saturating_sub(30) as i32;
    draw_text(frame, &text, x, y, WHITE, scale);
}

/// 5x7 glyph rows, bit 4 = leftmost column. Covers digits, uppercase
/// letters, and the punctuation the overlay labels use.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        ' ' => [0x00; 7],
        _ => return None,
    };
    Some(rows)
}
