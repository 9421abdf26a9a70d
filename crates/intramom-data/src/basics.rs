//! Security reference data: which securities exist and when they listed.

use std::path::Path;

use intramom_traits::{Date, Result, SecurityBasics, SecurityId};
use serde::{Deserialize, Serialize};

/// Listing record of one security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Security identifier.
    pub id: SecurityId,
    /// First trading date.
    pub list_date: Date,
}

/// The security universe with listing dates.
#[derive(Debug, Clone, Default)]
pub struct SecurityList {
    listings: Vec<Listing>,
}

impl SecurityList {
    /// Creates a universe from listing records.
    pub fn new(mut listings: Vec<Listing>) -> Self {
        listings.sort_by(|a, b| a.id.cmp(&b.id));
        listings.dedup_by(|a, b| a.id == b.id);
        Self { listings }
    }

    /// Loads listings from a CSV file with `id` and `list_date` columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a row fails to parse.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let listings = reader
            .deserialize::<Listing>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(listings))
    }

    /// Number of securities in the universe.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl SecurityBasics for SecurityList {
    fn list_securities(&self, listed_before: Date) -> Result<Vec<SecurityId>> {
        Ok(self
            .listings
            .iter()
            .filter(|listing| listing.list_date < listed_before)
            .map(|listing| listing.id.clone())
            .collect())
    }
}
