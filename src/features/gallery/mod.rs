pub mod models;
pub mod services;

pub use models::{GalleryQuery, GalleryView, OwnerFilter, SortOrder};
pub use services::{GalleryLoader, LoadOutcome};
