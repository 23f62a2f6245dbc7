//! Camera abstraction: layers, visibility masks and render targets

use std::collections::HashMap;

use image::RgbImage;
use tracing::trace;

/// Number of render layers a mask can address
pub const MAX_LAYERS: u8 = 32;

/// Bitmask of render layers a camera draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const EVERYTHING: LayerMask = LayerMask(u32::MAX);

    pub fn contains(self, layer: u8) -> bool {
        layer < MAX_LAYERS && self.0 & (1 << layer) != 0
    }

    pub fn without(self, layer: u8) -> LayerMask {
        if layer < MAX_LAYERS {
            LayerMask(self.0 & !(1 << layer))
        } else {
            self
        }
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::EVERYTHING
    }
}

/// Layer name to index lookup
#[derive(Debug, Clone, Default)]
pub struct LayerTable {
    names: HashMap<String, u8>,
}

impl LayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in layers plus the first-person layer used for the player's hands
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (index, name) in [
            (0, "Default"),
            (1, "TransparentFX"),
            (2, "Ignore Raycast"),
            (4, "Water"),
            (5, "UI"),
            (6, "FirstPerson"),
        ] {
            table.define(name, index);
        }
        table
    }

    /// Name a layer. Returns false if `index` is out of range.
    pub fn define(&mut self, name: &str, index: u8) -> bool {
        if index >= MAX_LAYERS {
            return false;
        }
        self.names.insert(name.to_string(), index);
        true
    }

    pub fn index_of(&self, name: &str) -> Option<u8> {
        self.names.get(name).copied()
    }
}

/// Errors raised while rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render target size {width}x{height} is invalid")]
    InvalidSize { width: u32, height: u32 },
}

/// Offscreen color target. Released when dropped.
#[derive(Debug)]
pub struct RenderTarget {
    color: RgbImage,
}

impl RenderTarget {
    pub fn acquire(width: u32, height: u32, depth_bits: u8) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        trace!(width, height, depth_bits, "render target acquired");
        Ok(Self {
            color: RgbImage::new(width, height),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }

    pub fn color(&self) -> &RgbImage {
        &self.color
    }

    pub fn color_mut(&mut self) -> &mut RgbImage {
        &mut self.color
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        let (width, height) = self.color.dimensions();
        trace!(width, height, "render target released");
    }
}

/// A camera that can draw the scene into an offscreen target
pub trait Camera: Send {
    fn culling_mask(&self) -> LayerMask;

    fn set_culling_mask(&mut self, mask: LayerMask);

    /// Draw every layer in the current culling mask into `target`
    fn render(&mut self, target: &mut RenderTarget) -> Result<(), RenderError>;
}

/// Source of the current display resolution
pub trait Screen: Send {
    fn resolution(&self) -> (u32, u32);
}

/// A display with a fixed size
#[derive(Debug, Clone, Copy)]
pub struct FixedScreen {
    pub width: u32,
    pub height: u32,
}

impl Screen for FixedScreen {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_without() {
        let mask = LayerMask::EVERYTHING.without(6);
        assert!(!mask.contains(6));
        assert!(mask.contains(0));
        assert_eq!(mask.without(6), mask);
    }

    #[test]
    fn test_out_of_range_layer_is_ignored() {
        assert_eq!(LayerMask::EVERYTHING.without(40), LayerMask::EVERYTHING);
        assert!(!LayerMask::EVERYTHING.contains(32));
    }

    #[test]
    fn test_layer_table() {
        let mut table = LayerTable::standard();
        assert_eq!(table.index_of("FirstPerson"), Some(6));
        assert_eq!(table.index_of("Nope"), None);
        assert!(!table.define("Overflow", 32));
        assert!(table.define("Props", 9));
        assert_eq!(table.index_of("Props"), Some(9));
    }

    #[test]
    fn test_render_target_rejects_empty_size() {
        assert!(matches!(
            RenderTarget::acquire(0, 10, 24),
            Err(RenderError::InvalidSize { width: 0, height: 10 })
        ));
        let target = RenderTarget::acquire(4, 3, 24).unwrap();
        assert_eq!(target.dimensions(), (4, 3));
    }
}
