//! Page-window parsing for list endpoints.
//!
//! Query parameters arrive as raw strings (`pn`, `ps`) so that a
//! non-integer value produces this module's 400 rather than a framework
//! decode error. Defaults are page 1, ten items.

use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_PAGE_NUM: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Raw query parameters as sent by the client.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub pn: Option<String>,
    pub ps: Option<String>,
}

/// A validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page_num: i64,
    page_size: i64,
}

impl PageWindow {
    pub fn new(page_num: i64, page_size: i64) -> Result<Self, AppError> {
        if page_num < 1 || page_size < 1 {
            return Err(invalid());
        }
        Ok(Self {
            page_num,
            page_size,
        })
    }

    pub fn from_query(query: &PageQuery) -> Result<Self, AppError> {
        let page_num = parse_param(query.pn.as_deref(), DEFAULT_PAGE_NUM)?;
        let page_size = parse_param(query.ps.as_deref(), DEFAULT_PAGE_SIZE)?;
        Self::new(page_num, page_size)
    }

    /// Number of items to skip: `ps * (pn - 1)`.
    pub fn offset(&self) -> u64 {
        (self.page_size * (self.page_num - 1)) as u64
    }

    pub fn size(&self) -> i64 {
        self.page_size
    }
}

fn parse_param(raw: Option<&str>, default: i64) -> Result<i64, AppError> {
    match raw {
        None => Ok(default),
        Some(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
    }
}

fn invalid() -> AppError {
    AppError::bad_request("INVALID_PAGINATION", "Invalid pagination parameters")
}

#[cfg(test)]
mod tests {
    use super::{PageQuery, PageWindow};

    fn query(pn: Option<&str>, ps: Option<&str>) -> PageQuery {
        PageQuery {
            pn: pn.map(String::from),
            ps: ps.map(String::from),
        }
    }

    #[test]
    fn test_defaults_to_first_page_of_ten() {
        let window = PageWindow::from_query(&query(None, None)).unwrap();
        assert_eq!(window.offset(), 0);
        assert_eq!(window.size(), 10);
    }

    #[test]
    fn test_offset_formula() {
        let window = PageWindow::from_query(&query(Some("3"), Some("25"))).unwrap();
        assert_eq!(window.offset(), 50);
        assert_eq!(window.size(), 25);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        for (pn, ps) in [("0", "10"), ("-1", "10"), ("1", "0"), ("1", "-5")] {
            let err = PageWindow::from_query(&query(Some(pn), Some(ps))).unwrap_err();
            assert_eq!(err.detail(), "Invalid pagination parameters");
        }
    }

    #[test]
    fn test_rejects_non_integer_values() {
        for (pn, ps) in [("abc", "10"), ("1", "xyz"), ("1.5", "10")] {
            assert!(PageWindow::from_query(&query(Some(pn), Some(ps))).is_err());
        }
    }
}
