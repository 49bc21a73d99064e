//! Offset pagination and search filtering for the relationship listings

use uuid::Uuid;

use crate::graph::{GraphError, RelationshipView, ValidationReason};

/// Bounds for the page size, taken from the configuration
#[derive(Debug, Copy, Clone)]
pub struct PageLimits {
    /// The limit used if a request doesn't specify one
    pub default_limit: u64,
    /// The largest limit a request may ask for
    pub max_limit: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// A validated request for a single page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// The 1-based page number
    pub page: u64,
    /// The maximum number of items on a page
    pub limit: u64,
    /// Lowercased search term, never empty
    pub search: Option<String>,
}

impl PageRequest {
    /// Validate the raw query parameters of a listing.
    ///
    /// Missing values fall back to the first page and the default limit.
    /// A blank search term is treated as no search at all.
    pub fn new(
        page: Option<u64>,
        limit: Option<u64>,
        search: Option<&str>,
        limits: &PageLimits,
    ) -> Result<Self, GraphError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(limits.default_limit);

        if page == 0 || limit == 0 || limit > limits.max_limit {
            return Err(ValidationReason::InvalidPagination.into());
        }

        // The offset is sent to the database as a signed 64 bit integer
        let offset = (page - 1).checked_mul(limit);
        if !offset.is_some_and(|offset| i64::try_from(offset).is_ok()) {
            return Err(ValidationReason::InvalidPagination.into());
        }

        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Ok(Self {
            page,
            limit,
            search,
        })
    }

    /// The number of items to skip
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Cut the page out of an already filtered and ordered list
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);

        Page {
            items: items.into_iter().skip(offset).take(limit).collect(),
            total,
            page: self.page,
            limit: self.limit,
        }
    }

    /// Check whether a relationship matches the search term of this request.
    ///
    /// The term is matched against the display name and the username of the
    /// other party, ignoring case.
    pub fn matches(&self, view: &RelationshipView, caller: Uuid) -> bool {
        let Some(term) = &self.search else {
            return true;
        };

        let other = view.other_party(caller);
        other.display_name.to_lowercase().contains(term.as_str())
            || other.username.to_lowercase().contains(term.as_str())
    }
}

/// A single page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The items on this page
    pub items: Vec<T>,
    /// The number of items over all pages
    pub total: u64,
    /// The 1-based number of this page
    pub page: u64,
    /// The requested page size
    pub limit: u64,
}

impl<T> Page<T> {
    /// Convert the items while keeping the pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}
