mod gallery_query;
mod gallery_view;

pub use gallery_query::{GalleryQuery, OwnerFilter, SortDirection, SortField, SortOrder};
pub use gallery_view::{header_for, GalleryView};
