//! Surface module - the capability the core renders through.

mod surface_traits;

pub use surface_traits::{
    ErrorView, MockRenderingSurface, PositionsView, RenderedContent, RenderingSurface,
};
