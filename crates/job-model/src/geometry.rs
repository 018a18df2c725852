//! Placement of images on the output canvas.
//!
//! All values are in output pixels; `(0, 0)` is the top-left corner of
//! the canvas.

use serde::{Deserialize, Serialize};

use crate::media::ImageSource;

/// An image rectangle placed on the canvas. Offsets may be negative when
/// the image overflows the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FittedRect {
    /// Scale an image so its shorter side fills the matching canvas side,
    /// then center it.
    ///
    /// Portrait images fill the canvas width; landscape and square images
    /// fill the canvas height. Dimensions are rounded to even pixels so
    /// 4:2:0 encoders accept them.
    pub fn fit_shorter_side(image: &ImageSource, canvas_w: u32, canvas_h: u32) -> Self {
        let (iw, ih) = (image.width as f64, image.height as f64);
        let (cw, ch) = (canvas_w as f64, canvas_h as f64);

        let (width, height) = if image.is_portrait() {
            (cw, even(ih * cw / iw))
        } else {
            (even(iw * ch / ih), ch)
        };

        Self {
            x: (cw - width) / 2.0,
            y: (ch - height) / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Uniformly scale the rectangle about its center.
    pub fn scaled(&self, factor: f64) -> Self {
        let (cx, cy) = self.center();
        let width = self.width * factor;
        let height = self.height * factor;
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }
}

/// Round to the nearest even integer, never below 2.
fn even(value: f64) -> f64 {
    ((value / 2.0).round() * 2.0).max(2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(image_w: u32, image_h: u32) -> FittedRect {
        let image = ImageSource::new("img.jpg", image_w, image_h).unwrap();
        FittedRect::fit_shorter_side(&image, 1080, 1920)
    }

    fn covers_canvas(rect: &FittedRect) -> bool {
        rect.x <= 0.0 && rect.y <= 0.0 && rect.x + rect.width >= 1080.0 && rect.y + rect.height >= 1920.0
    }

    #[test]
    fn test_landscape_fills_height_and_overflows_width() {
        let rect = fit(1920, 1080);
        assert_eq!(rect.height, 1920.0);
        assert_eq!(rect.width, 3414.0);
        assert_eq!(rect.y, 0.0);
        assert_eq!(rect.x, (1080.0 - 3414.0) / 2.0);
        assert!(covers_canvas(&rect));
    }

    #[test]
    fn test_tall_portrait_fills_width() {
        let rect = fit(1080, 2400);
        assert_eq!(rect.width, 1080.0);
        assert_eq!(rect.height, 2400.0);
        assert!(covers_canvas(&rect));
    }

    #[test]
    fn test_short_portrait_leaves_bars() {
        // 3:4 portrait: width fills, height falls short of 9:16.
        let rect = fit(900, 1200);
        assert_eq!(rect.width, 1080.0);
        assert_eq!(rect.height, 1440.0);
        assert_eq!(rect.y, 240.0);
        assert!(!covers_canvas(&rect));
    }

    #[test]
    fn test_odd_dimensions_round_to_even() {
        let rect = fit(1001, 1000);
        assert_eq!(rect.height, 1920.0);
        assert_eq!(rect.width % 2.0, 0.0);
    }

    #[test]
    fn test_scaled_keeps_center() {
        let rect = fit(1080, 1920);
        let zoomed = rect.scaled(1.3);
        assert_eq!(rect.center(), (540.0, 960.0));
        let (cx, cy) = zoomed.center();
        assert!((cx - 540.0).abs() < 1e-9);
        assert!((cy - 960.0).abs() < 1e-9);
        assert!((zoomed.width - 1404.0).abs() < 1e-9);
    }
}
