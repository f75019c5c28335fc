use super::gallery_query::OwnerFilter;
use crate::shared::types::{Image, ImagePage};

/// What the rendering layer observes for the gallery
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryView {
    pub images: Vec<Image>,
    pub total: u64,
    pub pages: u32,
    pub current_page: u32,
    /// A query is in flight; the grid is de-emphasized and input suppressed
    pub loading: bool,
    pub header: String,
    /// Error of the last current query, cleared by the next applied page
    pub last_error: Option<String>,
}

impl GalleryView {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            images: Vec::new(),
            total: 0,
            pages: 0,
            current_page: 1,
            loading: false,
            header: header.into(),
            last_error: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.pages
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }

    pub(crate) fn apply_page(&mut self, page: ImagePage) {
        self.images = page.images;
        self.total = page.total;
        self.pages = page.pages;
        self.current_page = page.current_page.max(1);
        self.loading = false;
        self.last_error = None;
    }

    pub(crate) fn apply_error(&mut self, message: String) {
        self.loading = false;
        self.last_error = Some(message);
    }
}

/// Header text for a listing, derived from the unfiltered header every time
pub fn header_for(base: &str, filter: Option<&OwnerFilter>) -> String {
    match filter {
        None => base.to_string(),
        Some(filter) => match filter.username.as_deref() {
            Some(name) if !name.is_empty() => format!("{}'s Images", name),
            _ => format!("User #{}'s Images", filter.user_id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::image;

    #[test]
    fn test_apply_page_replaces_content() {
        let mut view = GalleryView::new("My Images");
        view.loading = true;
        view.last_error = Some("old".to_string());

        view.apply_page(ImagePage {
            images: vec![image(1, "a.png"), image(2, "b.png")],
            total: 22,
            pages: 2,
            current_page: 1,
        });

        assert_eq!(view.images.len(), 2);
        assert_eq!(view.total, 22);
        assert!(!view.loading);
        assert!(view.last_error.is_none());
        assert!(view.has_next_page());
        assert!(!view.has_prev_page());
    }

    #[test]
    fn test_apply_error_keeps_content() {
        let mut view = GalleryView::new("My Images");
        view.images = vec![image(1, "a.png")];
        view.loading = true;

        view.apply_error("Server unavailable".to_string());

        assert_eq!(view.images.len(), 1);
        assert!(!view.loading);
        assert_eq!(view.last_error.as_deref(), Some("Server unavailable"));
    }

    #[test]
    fn test_header_for_filter() {
        assert_eq!(header_for("My Images", None), "My Images");

        let named = OwnerFilter {
            user_id: 7,
            username: Some("alice".to_string()),
        };
        assert_eq!(header_for("My Images", Some(&named)), "alice's Images");

        let anonymous = OwnerFilter {
            user_id: 7,
            username: None,
        };
        assert_eq!(header_for("My Images", Some(&anonymous)), "User #7's Images");
    }
}
