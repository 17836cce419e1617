// ledgerflow-core/src/domain/measure.rs

use serde::{Deserialize, Serialize};

/// State of a fact measure, carried next to the number until final reporting.
///
/// `Absent` means the side of the join had no row for the key: the measure is a
/// legitimate 0. `Unresolved` and `Excluded` mean expense rows exist but at least one
/// could not be converted to the reporting currency. `Invalid` means every currency
/// resolved but at least one amount is missing or was not numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureStatus {
    Present,
    Absent,
    Unresolved,
    Excluded,
    Invalid,
}

impl MeasureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureStatus::Present => "present",
            MeasureStatus::Absent => "absent",
            MeasureStatus::Unresolved => "unresolved",
            MeasureStatus::Excluded => "excluded",
            MeasureStatus::Invalid => "invalid",
        }
    }
}

/// What the gold fact does with expense rows whose currency has no rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// The key's expense measure becomes NULL (status `unresolved`).
    #[default]
    Null,
    /// Unconvertible rows are left out of the sum (status `excluded`), and counted.
    Exclude,
}

impl UnresolvedPolicy {
    /// Status written on a key that has at least one unconvertible expense row.
    pub fn status(&self) -> MeasureStatus {
        match self {
            UnresolvedPolicy::Null => MeasureStatus::Unresolved,
            UnresolvedPolicy::Exclude => MeasureStatus::Excluded,
        }
    }

    /// Status of a key whose rates all resolved but that carries NULL amounts.
    /// Under `exclude` those rows are left out of the sum like unconvertible ones.
    pub fn invalid_amount_status(&self) -> MeasureStatus {
        match self {
            UnresolvedPolicy::Null => MeasureStatus::Invalid,
            UnresolvedPolicy::Exclude => MeasureStatus::Excluded,
        }
    }
}
