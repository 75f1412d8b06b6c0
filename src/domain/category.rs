// src/domain/category.rs

use crate::errors::ConfigError;
use std::fmt;
use std::str::FromStr;

/// The disclosure types published in the register of members' financial interests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    AdHocPayments,
    OngoingEmployment,
    Donations,
    GiftsUk,
    Visits,
    GiftsForeign,
    Property,
    Shareholdings,
    Miscellaneous,
    Overall,
}

impl Category {
    /// Register order, which is also the order a sync run walks them in.
    pub const ALL: [Category; 10] = [
        Category::AdHocPayments,
        Category::OngoingEmployment,
        Category::Donations,
        Category::GiftsUk,
        Category::Visits,
        Category::GiftsForeign,
        Category::Property,
        Category::Shareholdings,
        Category::Miscellaneous,
        Category::Overall,
    ];

    /// Stable label stored in the database and fed into the identity hash.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AdHocPayments => "ad_hoc_payments",
            Category::OngoingEmployment => "ongoing_employment",
            Category::Donations => "donations",
            Category::GiftsUk => "gifts_uk",
            Category::Visits => "visits",
            Category::GiftsForeign => "gifts_foreign",
            Category::Property => "property",
            Category::Shareholdings => "shareholdings",
            Category::Miscellaneous => "miscellaneous",
            Category::Overall => "overall",
        }
    }

    /// File name of the category's dataset in the published release.
    pub fn default_file(&self) -> &'static str {
        match self {
            Category::AdHocPayments => "category_1.1.csv",
            Category::OngoingEmployment => "category_1.2.csv",
            Category::Donations => "category_2.csv",
            Category::GiftsUk => "category_3.csv",
            Category::Visits => "category_4.csv",
            Category::GiftsForeign => "category_5.csv",
            Category::Property => "category_6.csv",
            Category::Shareholdings => "category_7.csv",
            Category::Miscellaneous => "category_8.csv",
            Category::Overall => "overall.csv",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownLabel(s.to_string()))
    }
}
