//! The scrollable preview container as seen by the engine

/// Layout box of a rendered element, relative to the preview content.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementBox {
    pub offset_top: f32,
    pub offset_height: f32,
}

/// The host's preview pane.
pub trait PreviewSurface {
    /// Replace the rendered content.
    fn replace_html(&mut self, html: &str);

    /// Measure an element by id after the last `replace_html`.
    fn measure(&self, element_id: &str) -> Option<ElementBox>;

    fn scroll_top(&self) -> f32;

    fn set_scroll_top(&mut self, top: f32);

    fn scroll_height(&self) -> f32;

    fn client_height(&self) -> f32;

    /// Largest valid scroll offset.
    fn max_scroll(&self) -> f32 {
        (self.scroll_height() - self.client_height()).max(0.0)
    }
}
