use super::{put, LayerProps, Scratch};
use crate::error::{PaintError, PaintResult};
use crate::geometry::limits::channel_ok;
use crate::model::Rgba;
use crate::options::LayerOptions;

/// Constant tint over the whole surface.
#[derive(Clone, Debug)]
pub struct BaseLayer {
    pub(crate) props: LayerProps,
    color: Rgba,
    scratch: Scratch,
}

impl BaseLayer {
    pub fn new(id: impl Into<String>, color: Rgba, opts: &LayerOptions) -> PaintResult<Self> {
        check_color(color)?;
        Ok(BaseLayer { props: LayerProps::new(id, opts)?, color, scratch: Scratch::default() })
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba) -> PaintResult<()> {
        check_color(color)?;
        self.color = color;
        self.props.needs_update = true;
        Ok(())
    }

    pub fn is_stale(&self, vertex_count: usize) -> bool {
        self.scratch.is_stale(&self.props, vertex_count, 0)
    }

    pub fn rgba(&mut self, vertex_count: usize) -> &[f32] {
        if self.is_stale(vertex_count) {
            let buf = self.scratch.reset(vertex_count);
            for v in 0..vertex_count {
                put(buf, v, self.color, self.props.opacity);
            }
            self.scratch.finish(&mut self.props, vertex_count, 0);
        }
        self.scratch.get()
    }
}

fn check_color(c: Rgba) -> PaintResult<()> {
    if c.iter().all(|&v| channel_ok(v)) {
        Ok(())
    } else {
        Err(PaintError::input(format!("colour {:?} has a channel outside [0, 1]", c)))
    }
}
