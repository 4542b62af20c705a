//! Data window over the backing record sequence
//!
//! A pile of N slots shows N consecutive records. On page `k` the slot at
//! order position `p` shows record `N*k - p - 1`, so the front card holds the
//! last record of the page. Index arithmetic is signed so that pages that
//! would reach below zero are detected instead of wrapping.

use std::str::FromStr;

use serde::Deserialize;

use crate::domain::error::PileError;
use crate::domain::order::Direction;

/// Read-only indexed access to the records behind the pile
pub trait DataSource {
    type Record;

    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&Self::Record>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R> DataSource for Vec<R> {
    type Record = R;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<&R> {
        self.as_slice().get(index)
    }
}

/// What to do when window arithmetic falls outside the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPolicy {
    /// Surface `IndexOutOfRange`
    #[default]
    Strict,
    /// Bind the nearest valid record instead
    Clamp,
}

impl FromStr for IndexPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(IndexPolicy::Strict),
            "clamp" => Ok(IndexPolicy::Clamp),
            other => Err(format!("unknown index policy '{other}'")),
        }
    }
}

/// Current page plus the informational progress counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataWindow {
    capacity: usize,
    page_index: usize,
    progress: usize,
    policy: IndexPolicy,
}

impl DataWindow {
    pub const FIRST_PAGE: usize = 1;
    /// Highest page a window may reach
    pub const MAX_PAGE: usize = u32::MAX as usize;

    /// Creates a window positioned on `initial_page`
    ///
    /// # Arguments
    /// * `capacity` - Number of slots in the pile
    /// * `initial_page` - Page to bind first, `FIRST_PAGE..=MAX_PAGE`
    /// * `policy` - Out-of-range handling for every bind
    ///
    /// # Returns
    /// The window, or `EmptyPile`, `PageUnderflow` or `PageOverflow`
    pub fn new(
        capacity: usize,
        initial_page: usize,
        policy: IndexPolicy,
    ) -> Result<Self, PileError> {
        if capacity == 0 {
            return Err(PileError::EmptyPile);
        }
        if initial_page < Self::FIRST_PAGE {
            return Err(PileError::PageUnderflow);
        }
        if initial_page > Self::MAX_PAGE {
            return Err(PileError::PageOverflow { page: initial_page });
        }
        Ok(Self {
            capacity,
            page_index: initial_page,
            progress: 0,
            policy,
        })
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Rotation progress; never used for indexing
    pub fn progress(&self) -> usize {
        self.progress
    }

    pub fn policy(&self) -> IndexPolicy {
        self.policy
    }

    /// Record index for `position` on `page` before the policy is applied
    ///
    /// # Returns
    /// `N*page - position - 1`, which may be negative, or `PageOverflow`
    /// when it does not fit in an `i64`
    pub fn raw_index(&self, page: usize, position: usize) -> Result<i64, PileError> {
        let overflow = || PileError::PageOverflow { page };
        let capacity = i64::try_from(self.capacity).map_err(|_| overflow())?;
        let signed_page = i64::try_from(page).map_err(|_| overflow())?;
        let position = i64::try_from(position).map_err(|_| overflow())?;

        capacity
            .checked_mul(signed_page)
            .and_then(|last| last.checked_sub(position))
            .and_then(|index| index.checked_sub(1))
            .ok_or_else(overflow)
    }

    /// Record index for `position` on `page`, with the window policy applied
    ///
    /// # Arguments
    /// * `page` - Page to resolve
    /// * `position` - Order position, 0 is the front
    /// * `len` - Number of records in the source
    pub fn resolve_index(
        &self,
        page: usize,
        position: usize,
        len: usize,
    ) -> Result<usize, PileError> {
        let index = self.raw_index(page, position)?;
        if index >= 0 && (index as u64) < len as u64 {
            return Ok(index as usize);
        }
        match self.policy {
            IndexPolicy::Strict => Err(PileError::IndexOutOfRange { index, len }),
            IndexPolicy::Clamp => {
                if len == 0 {
                    return Err(PileError::EmptySource);
                }
                let last = i64::try_from(len - 1).unwrap_or(i64::MAX);
                Ok(index.clamp(0, last) as usize)
            }
        }
    }

    /// Record indices for every order position of `page`, front first
    ///
    /// Either every position resolves or nothing is returned.
    pub fn resolve_page(&self, page: usize, len: usize) -> Result<Vec<usize>, PileError> {
        (0..self.capacity)
            .map(|position| self.resolve_index(page, position, len))
            .collect()
    }

    /// Record indices for the current page
    pub fn bindings(&self, len: usize) -> Result<Vec<usize>, PileError> {
        self.resolve_page(self.page_index, len)
    }

    /// Page after the current one
    ///
    /// # Returns
    /// The next page, or `PageOverflow` past `MAX_PAGE`
    pub fn next_page(&self) -> Result<usize, PileError> {
        self.page_index
            .checked_add(1)
            .filter(|page| *page <= Self::MAX_PAGE)
            .ok_or(PileError::PageOverflow {
                page: self.page_index,
            })
    }

    /// Page before the current one, if there is one
    pub fn previous_page(&self) -> Result<usize, PileError> {
        if self.page_index <= Self::FIRST_PAGE {
            return Err(PileError::PageUnderflow);
        }
        Ok(self.page_index - 1)
    }

    pub(crate) fn set_page(&mut self, page: usize) {
        self.page_index = page;
    }

    /// Moves the progress counter for a completed rotation
    pub fn record_rotation(&mut self, direction: Direction) {
        self.progress = match direction {
            Direction::Forward => self.progress + 1,
            Direction::Backward => self.progress.saturating_sub(1),
        };
    }
}
