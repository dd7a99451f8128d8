//! Testing utilities and mock implementations.
//!
//! This module provides mocks for the transformer and store seams plus a
//! manually driven clock, so batch and cache behavior can be tested without
//! real media or real waiting.
//!
//! # Example
//!
//! ```rust,ignore
//! use pressroom_core::testing::{ManualClock, MockArtifactStore, MockTransformer};
//!
//! let store = Arc::new(MockArtifactStore::new());
//! let transformer = Arc::new(MockTransformer::new());
//! let clock = Arc::new(ManualClock::default());
//!
//! transformer.fail_on("b.png", "corrupt").await;
//! clock.advance(chrono::Duration::minutes(31));
//! ```

mod mock_store;
mod mock_transformer;

pub use crate::cache::ManualClock;
pub use mock_store::MockArtifactStore;
pub use mock_transformer::{MockTransformer, RecordedTransform};

/// Test fixtures and helper functions.
pub mod fixtures {
    use image::{ImageBuffer, Rgb, RgbImage};
    use std::io::Cursor;

    /// A small gradient image; compresses well in every format.
    pub fn gradient(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
        })
    }

    /// Encodes a gradient as `format` and returns the bytes.
    pub fn encoded_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        gradient(width, height)
            .write_to(&mut bytes, format)
            .expect("fixture encode failed");
        bytes.into_inner()
    }

    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        encoded_image(width, height, image::ImageFormat::Png)
    }

    pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        encoded_image(width, height, image::ImageFormat::Jpeg)
    }
}
