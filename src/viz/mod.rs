//! Projecting entity embeddings to 2D and drawing them.
//!
//! Display only: nothing here feeds back into training.

mod plot;
mod tsne;

pub use plot::render_svg;
pub use tsne::{pca_2d, ProjectedPoint, Projection, Tsne};
