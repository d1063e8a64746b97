use super::GraphStore;
use crate::events::GraphEvent;
use crate::geometry::{Point, Rect, Size};
use tracing::debug;

/// Pan and zoom of the view. A world point `w` appears on screen at `(w + offset) * zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset: Point,
    pub zoom: f64,
    pub size: Size,
}

impl Viewport {
    pub fn new(size: Size) -> Self {
        Self {
            offset: Point::ZERO,
            zoom: 1.0,
            size,
        }
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        screen.scale(1.0 / self.zoom) - self.offset
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        (world + self.offset).scale(self.zoom)
    }

    /// World-space centre of the visible area.
    pub fn center(&self) -> Point {
        self.screen_to_world(Point::new(self.size.width / 2.0, self.size.height / 2.0))
    }

    /// World-space rectangle currently visible.
    pub fn visible_area(&self) -> Rect {
        Rect::from_corners(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(self.size.width, self.size.height)),
        )
    }
}

impl GraphStore {
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport.size = size;
    }

    fn clamp_offset(&self, offset: Point) -> Point {
        let bounds = self.config.pan_bounds;
        Point::new(
            offset.x.clamp(bounds.min.x, bounds.max.x),
            offset.y.clamp(bounds.min.y, bounds.max.y),
        )
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.viewport.zoom;
        }
        zoom.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Pans the view, clamped to the configured bounds. Returns the applied offset.
    pub fn set_viewport_offset(&mut self, offset: Point) -> Point {
        let offset = self.clamp_offset(offset);
        if offset != self.viewport.offset {
            self.viewport.offset = offset;
            self.events.emit(GraphEvent::ViewportOffset { offset });
        }
        offset
    }

    /// Zooms the view, clamped to the configured range. Returns the applied zoom.
    pub fn set_viewport_zoom(&mut self, zoom: f64) -> f64 {
        let zoom = self.clamp_zoom(zoom);
        if zoom != self.viewport.zoom {
            self.viewport.zoom = zoom;
            self.events.emit(GraphEvent::ViewportZoom { zoom });
        }
        zoom
    }

    /// Zooms by `factor` while keeping the world point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let anchor = self.viewport.screen_to_world(screen);
        let zoom = self.set_viewport_zoom(self.viewport.zoom * factor);
        self.set_viewport_offset(screen.scale(1.0 / zoom) - anchor);
    }

    /// Frames the given nodes: pads their bounding rectangle, fits it into the viewport and
    /// centres it. Nodes never rendered contribute their offset as a point. Returns the
    /// padded rectangle, or `None` when none of the ids exist.
    pub fn focus_on<I, S>(&mut self, ids: I) -> Option<Rect>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rects: Vec<Rect> = ids
            .into_iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let node = self.nodes.get(id)?;
                Some(
                    self.spatial
                        .rect_of(id)
                        .unwrap_or_else(|| Rect::from_corners(node.offset, node.offset)),
                )
            })
            .collect();
        let padded = Rect::bounding(rects)?.expand(self.config.focus_padding);

        let size = self.viewport.size;
        let fit = (size.width / padded.width()).min(size.height / padded.height());
        let zoom = self.set_viewport_zoom(fit);
        let center = padded.center();
        self.set_viewport_offset(Point::new(
            size.width / (2.0 * zoom) - center.x,
            size.height / (2.0 * zoom) - center.y,
        ));
        debug!(zoom, ?center, "focused viewport");
        Some(padded)
    }
}
