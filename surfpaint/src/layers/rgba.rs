use super::{LayerProps, Scratch};
use crate::error::{PaintError, PaintResult};
use crate::geometry::tolerance::clamp01;
use crate::options::LayerOptions;

/// Precomputed per-vertex colours passed through as-is (alpha scaled by opacity).
#[derive(Clone, Debug)]
pub struct RgbaLayer {
    pub(crate) props: LayerProps,
    data: Vec<f32>,
    scratch: Scratch,
}

impl RgbaLayer {
    pub fn new(id: impl Into<String>, data: Vec<f32>, opts: &LayerOptions) -> PaintResult<Self> {
        check_len(&data)?;
        Ok(RgbaLayer { props: LayerProps::new(id, opts)?, data, scratch: Scratch::default() })
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<f32>) -> PaintResult<()> {
        check_len(&data)?;
        self.data = data;
        self.props.needs_update = true;
        Ok(())
    }

    pub fn is_stale(&self, vertex_count: usize) -> bool {
        self.scratch.is_stale(&self.props, vertex_count, 0)
    }

    /// Vertices past the end of the source stay transparent, as do pixels with
    /// any non-finite channel.
    pub fn rgba(&mut self, vertex_count: usize) -> &[f32] {
        if self.is_stale(vertex_count) {
            let opacity = self.props.opacity;
            let buf = self.scratch.reset(vertex_count);
            for (dst, src) in buf.chunks_exact_mut(4).zip(self.data.chunks_exact(4)) {
                if src.iter().all(|c| c.is_finite()) {
                    for k in 0..3 {
                        dst[k] = clamp01(src[k]);
                    }
                    dst[3] = clamp01(src[3]) * opacity;
                }
            }
            self.scratch.finish(&mut self.props, vertex_count, 0);
        }
        self.scratch.get()
    }
}

fn check_len(data: &[f32]) -> PaintResult<()> {
    if data.len() % 4 == 0 {
        Ok(())
    } else {
        Err(PaintError::input(format!("RGBA buffer length {} is not a multiple of 4", data.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_colours_through() {
        let opts = LayerOptions { opacity: 0.5, ..Default::default() };
        let data = vec![1.0, 0.0, 0.0, 1.0, f32::NAN, 0.0, 0.0, 1.0];
        let mut l = RgbaLayer::new("rgba", data, &opts).unwrap();
        assert_eq!(l.rgba(3), &[1.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn rejects_ragged_buffer() {
        assert!(RgbaLayer::new("rgba", vec![0.0; 5], &LayerOptions::default()).is_err());
    }
}
