use std::collections::BTreeMap;

use serde::Serialize;

use super::money::Cents;
use super::types::{UserId, UserProjection, YearProjection};

/// All users' rows for one calendar year, plus household totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdYear {
    pub year: i16,
    pub users: BTreeMap<UserId, YearProjection>,
    pub combined_balance: Cents,
    pub combined_balance_today_dollars: Cents,
    pub combined_contributions: Cents,
    pub combined_withdrawal: Cents,
}

impl HouseholdYear {
    fn new(year: i16) -> Self {
        Self {
            year,
            users: BTreeMap::new(),
            combined_balance: Cents::ZERO,
            combined_balance_today_dollars: Cents::ZERO,
            combined_contributions: Cents::ZERO,
            combined_withdrawal: Cents::ZERO,
        }
    }

    fn add(&mut self, user: &UserId, row: &YearProjection) {
        self.combined_balance += row.total_balance;
        self.combined_balance_today_dollars += row.total_balance_today_dollars;
        self.combined_contributions += row.contributions.total;
        self.combined_withdrawal += row.withdrawal;
        self.users.insert(user.clone(), *row);
    }
}

/// Merges per-user series into one table keyed by calendar year. Years where
/// only some users have rows (different life spans) list just those users.
pub fn assemble(projections: &[UserProjection]) -> BTreeMap<i16, HouseholdYear> {
    let mut table = BTreeMap::new();
    for projection in projections {
        for row in &projection.years {
            table
                .entry(row.year)
                .or_insert_with(|| HouseholdYear::new(row.year))
                .add(&projection.user, row);
        }
    }
    table
}

pub fn row_at_age(projection: &UserProjection, age: u32) -> Option<&YearProjection> {
    projection.years.iter().find(|row| row.age == age)
}

/// The row for the user's configured retirement age, if the series reaches it.
pub fn retirement_row(projection: &UserProjection) -> Option<&YearProjection> {
    row_at_age(projection, projection.retirement_age)
}
