use super::GraphStore;
use crate::error::{EntityKind, GraphError};
use crate::events::GraphEvent;
use crate::geometry::{Point, Rect};
use ahash::RandomState;
use indexmap::IndexSet;
use tracing::debug;

/// The selected node ids (in selection order) and the pending rubber-band rectangle.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: IndexSet<String, RandomState>,
    area: Option<Rect>,
}

impl SelectionState {
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.selected.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn area(&self) -> Option<Rect> {
        self.area
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        self.selected.shift_remove(id)
    }
}

impl GraphStore {
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.selected.iter().cloned().collect()
    }

    /// Replaces the selection. Unknown ids are ignored; node `is_selected` flags are synced.
    pub fn select_by_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in self.selection.selected.drain(..) {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.state.is_selected = false;
            }
        }
        self.extend_selection(ids);
    }

    /// Adds to the current selection.
    pub fn add_to_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extend_selection(ids);
    }

    pub fn clear_selection(&mut self) {
        self.select_by_ids(std::iter::empty::<&str>());
    }

    fn extend_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            if let Some(node) = self.nodes.get_mut(id) {
                node.state.is_selected = true;
                self.selection.selected.insert(id.to_string());
            }
        }
        self.events.emit(GraphEvent::Selection {
            node_ids: self.selected_ids(),
        });
    }

    /// Sets or clears the pending rubber-band rectangle (world space).
    pub fn set_selection_area(&mut self, area: Option<Rect>) {
        self.selection.area = area;
        self.events.emit(GraphEvent::SelectionArea { area });
    }

    /// Selects every node whose rendered rectangle intersects the pending area, then clears
    /// the area. Without a pending area nothing changes.
    pub fn select_by_area(&mut self) -> Vec<String> {
        let Some(area) = self.selection.area else {
            return Vec::new();
        };
        let hits = self.spatial.query_ids_in_area(&area);
        // Keep graph order so results are stable across runs.
        let ids: Vec<String> = self
            .nodes
            .keys()
            .filter(|id| hits.contains(*id))
            .cloned()
            .collect();
        debug!(count = ids.len(), "selected nodes by area");
        self.select_by_ids(&ids);
        self.set_selection_area(None);
        ids
    }

    /// Moves every selected node by `delta`, keeping their index entries aligned.
    pub fn drag_selection(&mut self, delta: Point) {
        if self.selection.is_empty() {
            return;
        }
        for id in &self.selection.selected {
            if let Some(node) = self.nodes.get_mut(id) {
                node.offset = node.offset + delta;
            }
            if let Some(rect) = self.spatial.rect_of(id) {
                self.spatial.insert(id, rect.translate(delta));
            }
        }
        self.events.emit(GraphEvent::DragSelection { delta });
    }

    fn set_collapsed(&mut self, collapsed: bool) {
        if self.selection.is_empty() {
            return;
        }
        let ids = self.selected_ids();
        for id in &ids {
            if let Some(node) = self.nodes.get_mut(id) {
                node.state.is_collapsed = collapsed;
            }
        }
        debug!(count = ids.len(), collapsed, "toggled collapse");
        self.events.emit(GraphEvent::Collapse {
            node_ids: ids,
            collapsed,
        });
    }

    pub fn collapse_selected(&mut self) {
        self.set_collapsed(true);
    }

    pub fn expand_selected(&mut self) {
        self.set_collapsed(false);
    }

    /// Announces an in-progress link drag from a port. `to = None` ends the preview.
    pub fn draw_temp_link(
        &mut self,
        from: &str,
        from_port: &str,
        to: Option<Point>,
    ) -> Result<(), GraphError> {
        if !self.try_node(from)?.ports.contains_key(from_port) {
            return Err(GraphError::not_found(EntityKind::Port, from_port));
        }
        self.events.emit(GraphEvent::DrawTempLink {
            from: from.to_string(),
            from_port: from_port.to_string(),
            to,
        });
        Ok(())
    }
}
