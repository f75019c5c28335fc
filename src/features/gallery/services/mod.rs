mod gallery_loader;

pub use gallery_loader::{GalleryLoader, LoadOutcome};
