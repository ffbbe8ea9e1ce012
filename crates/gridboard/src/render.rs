//! Widget renderer boundary.
//!
//! The visual widget components live outside this crate. They consume
//! nothing but the placement of each enabled widget.

use crate::Widget;

/// Placement of one enabled widget, as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFrame {
    /// Widget id.
    pub id: String,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
    /// Width in grid columns.
    pub w: u32,
    /// Height in grid rows.
    pub h: u32,
    /// Always `true` for frames produced by [`frames`].
    pub enabled: bool,
}

/// Consumer side of the rendering boundary.
pub trait RenderSurface {
    /// Draws one widget at its frame.
    fn draw(&mut self, frame: &WidgetFrame);
}

/// Extracts render frames for the enabled widgets of a layout, in
/// layout order.
pub fn frames(layout: &[Widget]) -> Vec<WidgetFrame> {
    layout
        .iter()
        .filter(|w| w.enabled)
        .map(|w| WidgetFrame {
            id: w.id.clone(),
            x: w.x,
            y: w.y,
            w: w.w,
            h: w.h,
            enabled: true,
        })
        .collect()
}

/// Renders every enabled widget of a layout onto a surface.
pub fn render_layout<S: RenderSurface>(layout: &[Widget], surface: &mut S) {
    for frame in frames(layout) {
        surface.draw(&frame);
    }
}
