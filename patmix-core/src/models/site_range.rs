use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::ScopeError;

///
/// A contiguous run of CpG sites, by 1-based site index. `end` is exclusive.
///
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SiteRange {
    pub start: u64,
    pub end: u64,
}

impl SiteRange {
    pub fn new(start: u64, end: u64) -> Result<Self, ScopeError> {
        if start < 1 || end <= start {
            return Err(ScopeError::InvalidSiteRange(format!("{}-{}", start, end)));
        }
        Ok(SiteRange { start, end })
    }

    /// Number of sites in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromStr for SiteRange {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScopeError::InvalidSiteRange(s.to_string());
        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        let start = start.trim().parse::<u64>().map_err(|_| invalid())?;
        let end = end.trim().parse::<u64>().map_err(|_| invalid())?;
        SiteRange::new(start, end)
    }
}

impl Display for SiteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_parse_site_range() {
        let range: SiteRange = "100-250".parse().unwrap();
        assert_eq!(range, SiteRange { start: 100, end: 250 });
        assert_eq!(range.len(), 150);
        assert_eq!(range.to_string(), "100-250");
    }

    #[rstest]
    #[case("100")]
    #[case("0-10")]
    #[case("20-10")]
    #[case("5-5")]
    #[case("a-b")]
    fn test_reject_bad_site_range(#[case] raw: &str) {
        assert!(raw.parse::<SiteRange>().is_err());
    }
}
