use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::error::AppError;
use crate::modules::http::ApiRequest;
use crate::shared::constants::IMAGES_PATH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Time,
    Size,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Time => "time",
            SortField::Size => "size",
            SortField::Name => "name",
        }
    }
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort column plus direction, written `time_desc`, `size_asc`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.field.as_str(), self.direction.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("Invalid sort order '{}'", s));

        let (field, direction) = s.split_once('_').ok_or_else(invalid)?;
        let field = match field {
            "time" => SortField::Time,
            "size" => SortField::Size,
            "name" => SortField::Name,
            _ => return Err(invalid()),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(invalid()),
        };

        Ok(Self { field, direction })
    }
}

/// Restrict the listing to one user's images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerFilter {
    pub user_id: i64,
    /// Shown in the header while the filter is active
    pub username: Option<String>,
}

/// Everything that determines one gallery page
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct GalleryQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: u32,
    pub sort: SortOrder,
    pub owner_filter: Option<OwnerFilter>,
}

impl Default for GalleryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            sort: SortOrder::default(),
            owner_filter: None,
        }
    }
}

impl GalleryQuery {
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_owner_filter(mut self, filter: Option<OwnerFilter>) -> Self {
        self.owner_filter = filter;
        self
    }

    pub fn to_request(&self) -> ApiRequest {
        let request = ApiRequest::get(IMAGES_PATH)
            .query("page", self.page)
            .query("sort", self.sort.field.as_str())
            .query("order", self.sort.direction.as_str());

        match &self.owner_filter {
            Some(filter) => request.query("user_id", filter.user_id),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parse_and_display() {
        let sort: SortOrder = "size_asc".parse().unwrap();
        assert_eq!(sort, SortOrder::new(SortField::Size, SortDirection::Asc));
        assert_eq!(sort.to_string(), "size_asc");

        assert_eq!(SortOrder::default().to_string(), "time_desc");
        assert!("time".parse::<SortOrder>().is_err());
        assert!("colour_asc".parse::<SortOrder>().is_err());
        assert!("name_up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_query_request_parameters() {
        let query = GalleryQuery::default()
            .with_page(3)
            .with_sort(SortOrder::new(SortField::Name, SortDirection::Asc));
        let request = query.to_request();

        assert_eq!(request.path, IMAGES_PATH);
        assert_eq!(request.query_value("page"), Some("3"));
        assert_eq!(request.query_value("sort"), Some("name"));
        assert_eq!(request.query_value("order"), Some("asc"));
        assert_eq!(request.query_value("user_id"), None);

        let filtered = query.with_owner_filter(Some(OwnerFilter {
            user_id: 42,
            username: None,
        }));
        assert_eq!(filtered.to_request().query_value("user_id"), Some("42"));
    }

    #[test]
    fn test_page_must_be_positive() {
        assert!(GalleryQuery::default().validate().is_ok());
        assert!(GalleryQuery::default().with_page(0).validate().is_err());
    }
}
