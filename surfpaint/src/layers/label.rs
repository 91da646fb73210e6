use super::{put, LayerProps, Scratch, VertexField};
use crate::error::{PaintError, PaintResult};
use crate::geometry::limits::channel_ok;
use crate::model::LabelEntry;
use crate::options::LayerOptions;
use std::collections::{BTreeMap, BTreeSet};

/// Categorical parcellation: label id per data point, colour per label.
#[derive(Clone, Debug)]
pub struct LabelLayer {
    pub(crate) props: LayerProps,
    field: VertexField<i32>,
    table: BTreeMap<i32, LabelEntry>,
    hidden: BTreeSet<i32>,
    scratch: Scratch,
}

impl LabelLayer {
    pub fn new(
        id: impl Into<String>,
        labels: Vec<i32>,
        indices: Option<Vec<u32>>,
        table: BTreeMap<i32, LabelEntry>,
        opts: &LayerOptions,
    ) -> PaintResult<Self> {
        check_table(&table)?;
        Ok(LabelLayer {
            props: LayerProps::new(id, opts)?,
            field: VertexField::new(labels, indices)?,
            table,
            hidden: BTreeSet::new(),
            scratch: Scratch::default(),
        })
    }

    pub fn table(&self) -> &BTreeMap<i32, LabelEntry> {
        &self.table
    }

    pub fn set_table(&mut self, table: BTreeMap<i32, LabelEntry>) -> PaintResult<()> {
        check_table(&table)?;
        self.table = table;
        self.props.needs_update = true;
        Ok(())
    }

    pub fn set_labels(&mut self, labels: Vec<i32>, indices: Option<Vec<u32>>) -> PaintResult<()> {
        self.field = VertexField::new(labels, indices)?;
        self.props.needs_update = true;
        Ok(())
    }

    /// Show or hide every vertex carrying `label`. Returns whether anything changed.
    pub fn set_label_visible(&mut self, label: i32, visible: bool) -> bool {
        let changed = if visible { self.hidden.remove(&label) } else { self.hidden.insert(label) };
        if changed {
            self.props.needs_update = true;
        }
        changed
    }

    pub fn is_label_visible(&self, label: i32) -> bool {
        !self.hidden.contains(&label)
    }

    /// Label id and table entry at a vertex, if any data lands there.
    pub fn label_at(&self, vertex: u32) -> Option<(i32, Option<&LabelEntry>)> {
        self.field.at_vertex(vertex).map(|(_, id)| (id, self.table.get(&id)))
    }

    pub fn is_stale(&self, vertex_count: usize) -> bool {
        self.scratch.is_stale(&self.props, vertex_count, 0)
    }

    pub fn rgba(&mut self, vertex_count: usize) -> &[f32] {
        if self.is_stale(vertex_count) {
            let opacity = self.props.opacity;
            let buf = self.scratch.reset(vertex_count);
            for (_, v, label) in self.field.points(vertex_count) {
                if self.hidden.contains(&label) {
                    continue;
                }
                if let Some(entry) = self.table.get(&label) {
                    put(buf, v, entry.color, opacity);
                }
            }
            self.scratch.finish(&mut self.props, vertex_count, 0);
        }
        self.scratch.get()
    }
}

fn check_table(table: &BTreeMap<i32, LabelEntry>) -> PaintResult<()> {
    for (id, e) in table {
        if !e.color.iter().all(|&c| channel_ok(c)) {
            return Err(PaintError::input(format!("label {} colour has a channel outside [0, 1]", id)));
        }
    }
    Ok(())
}
