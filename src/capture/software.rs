//! Software camera
//!
//! Rasterises a flat scene of axis-aligned rectangles, each on a render
//! layer. Lets the daemon run headless while keeping layer exclusion
//! visible in the captured pixels.

use image::Rgb;

use super::camera::{Camera, LayerMask, RenderError, RenderTarget};

/// A filled rectangle in normalised viewport coordinates (0.0..=1.0)
#[derive(Debug, Clone, Copy)]
pub struct SceneRect {
    pub layer: u8,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: [u8; 3],
}

#[derive(Debug, Clone)]
pub struct SoftwareCamera {
    mask: LayerMask,
    background: [u8; 3],
    scene: Vec<SceneRect>,
}

impl SoftwareCamera {
    pub fn new(background: [u8; 3]) -> Self {
        Self {
            mask: LayerMask::EVERYTHING,
            background,
            scene: Vec::new(),
        }
    }

    /// Ground, a prop, and the player's hands on `first_person_layer`
    pub fn demo(first_person_layer: u8) -> Self {
        let mut camera = Self::new([135, 180, 235]);
        camera.add(SceneRect {
            layer: 0,
            x: 0.0,
            y: 0.6,
            width: 1.0,
            height: 0.4,
            color: [70, 120, 60],
        });
        camera.add(SceneRect {
            layer: 0,
            x: 0.4,
            y: 0.35,
            width: 0.2,
            height: 0.3,
            color: [150, 90, 40],
        });
        camera.add(SceneRect {
            layer: first_person_layer,
            x: 0.65,
            y: 0.7,
            width: 0.3,
            height: 0.3,
            color: [220, 180, 150],
        });
        camera
    }

    pub fn add(&mut self, rect: SceneRect) {
        self.scene.push(rect);
    }
}

impl Camera for SoftwareCamera {
    fn culling_mask(&self) -> LayerMask {
        self.mask
    }

    fn set_culling_mask(&mut self, mask: LayerMask) {
        self.mask = mask;
    }

    fn render(&mut self, target: &mut RenderTarget) -> Result<(), RenderError> {
        let (width, height) = target.dimensions();
        let image = target.color_mut();
        for pixel in image.pixels_mut() {
            *pixel = Rgb(self.background);
        }

        for rect in self.scene.iter().filter(|r| self.mask.contains(r.layer)) {
            let x0 = to_pixel(rect.x, width);
            let y0 = to_pixel(rect.y, height);
            let x1 = to_pixel(rect.x + rect.width, width);
            let y1 = to_pixel(rect.y + rect.height, height);
            for y in y0..y1 {
                for x in x0..x1 {
                    image.put_pixel(x, y, Rgb(rect.color));
                }
            }
        }

        Ok(())
    }
}

fn to_pixel(fraction: f32, extent: u32) -> u32 {
    ((fraction.clamp(0.0, 1.0) * extent as f32).round() as u32).min(extent)
}
