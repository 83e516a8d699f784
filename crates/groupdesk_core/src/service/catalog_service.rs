//! Group catalog use-cases: list, search, view and delete.
//!
//! # Invariants
//! - Search text is trimmed, whitespace-collapsed and lowercased; blank
//!   search means no filter.
//! - The requested page is clamped to the last existing page.

use crate::model::group::MusicGroup;
use crate::model::ids::GroupId;
use crate::repo::common::{EntityKind, RepoError};
use crate::repo::group_repo::{GroupListQuery, MusicGroupRepository};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default number of groups per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_VISIBLE_PAGES: u32 = 10;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogError {
    GroupNotFound(GroupId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GroupNotFound(group_id) => write!(f, "music group not found: {group_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::GroupNotFound(_) => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: EntityKind::MusicGroup,
                id,
            } => Self::GroupNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Page window derived from a match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based page actually served.
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub prev: u32,
    pub next: u32,
    /// Number of page links shown at once.
    pub visible_pages: u32,
}

impl Pagination {
    /// Builds the window for `total` matches, clamping `page` into range.
    ///
    /// `page_size` of zero is treated as one.
    pub fn new(total: u64, page: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let page_count =
            u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX);
        let last_page = page_count.saturating_sub(1);
        let page = page.min(last_page);

        Self {
            page,
            page_size,
            page_count,
            prev: page.saturating_sub(1),
            next: page.saturating_add(1).min(last_page),
            visible_pages: page_count.min(MAX_VISIBLE_PAGES),
        }
    }

    /// Row offset of the first item on the served page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_mul(self.page_size)
    }
}

/// Catalog filter and requested page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Restrict to seeded (`Some(true)`) or user-created (`Some(false)`) groups.
    pub seeded: Option<bool>,
    pub search: Option<String>,
    pub page: u32,
}

/// One served catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListing {
    pub items: Vec<MusicGroup>,
    pub total: u64,
    pub pagination: Pagination,
}

/// Catalog facade over a group repository.
pub struct CatalogService<R: MusicGroupRepository> {
    repo: R,
    page_size: u32,
}

impl<R: MusicGroupRepository> CatalogService<R> {
    /// Creates a service with the default page size.
    pub fn new(repo: R) -> Self {
        Self::with_page_size(repo, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(repo: R, page_size: u32) -> Self {
        Self {
            repo,
            page_size: page_size.max(1),
        }
    }

    /// Lists groups matching `query`, sorted by name.
    pub fn list_groups(&self, query: &CatalogQuery) -> Result<GroupListing, CatalogError> {
        let mut repo_query = GroupListQuery {
            seeded: query.seeded,
            search: query.search.as_deref().and_then(normalize_search),
            limit: self.page_size,
            offset: query.page.saturating_mul(self.page_size),
        };
        let mut page = self.repo.list_groups(&repo_query)?;

        // The total is only known after the first query.
        let pagination = Pagination::new(page.total, query.page, self.page_size);
        if pagination.offset() != repo_query.offset {
            repo_query.offset = pagination.offset();
            page = self.repo.list_groups(&repo_query)?;
        }

        Ok(GroupListing {
            items: page.items,
            total: page.total,
            pagination,
        })
    }

    /// Reads one group with its albums and artists.
    pub fn view_group(&self, group_id: GroupId) -> Result<MusicGroup, CatalogError> {
        self.repo
            .get_group(group_id)?
            .ok_or(CatalogError::GroupNotFound(group_id))
    }

    /// Deletes one group and returns the refreshed page for `query`.
    ///
    /// Albums and membership rows go with the group. Deleting an absent
    /// group is not an error.
    pub fn delete_group(
        &self,
        group_id: GroupId,
        query: &CatalogQuery,
    ) -> Result<GroupListing, CatalogError> {
        self.repo.delete_group(group_id)?;
        info!(
            "event=group_delete module=service status=ok group_id={}",
            group_id
        );
        self.list_groups(query)
    }
}

/// Normalizes free-text search input; `None` when nothing is left.
pub fn normalize_search(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ").to_lowercase();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_search, Pagination};

    #[test]
    fn pagination_rounds_page_count_up() {
        let pagination = Pagination::new(21, 0, 10);
        assert_eq!(pagination.page_count, 3);
        assert_eq!(pagination.prev, 0);
        assert_eq!(pagination.next, 1);
        assert_eq!(pagination.visible_pages, 3);
    }

    #[test]
    fn pagination_saturates_at_last_page() {
        let pagination = Pagination::new(30, 2, 10);
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.prev, 1);
        assert_eq!(pagination.next, 2);
        assert_eq!(pagination.offset(), 20);
    }

    #[test]
    fn pagination_clamps_out_of_range_page() {
        let pagination = Pagination::new(15, 9, 10);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.offset(), 10);
    }

    #[test]
    fn pagination_of_empty_result() {
        let pagination = Pagination::new(0, 3, 10);
        assert_eq!(pagination.page_count, 0);
        assert_eq!(pagination.page, 0);
        assert_eq!(pagination.prev, 0);
        assert_eq!(pagination.next, 0);
        assert_eq!(pagination.visible_pages, 0);
    }

    #[test]
    fn visible_pages_are_capped_at_ten() {
        assert_eq!(Pagination::new(1_000, 0, 10).visible_pages, 10);
    }

    #[test]
    fn search_is_collapsed_and_lowercased() {
        assert_eq!(
            normalize_search("  Deep \t  PURPLE \n"),
            Some("deep purple".to_string())
        );
        assert_eq!(normalize_search(" \n\t "), None);
    }
}
