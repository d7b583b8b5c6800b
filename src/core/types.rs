use std::fmt;

use jiff::Timestamp;
use jiff::civil::Date;
use serde::Serialize;

use super::money::{Cents, Rate};

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnModel {
    /// Declining pre-retirement rate floored at the retirement-phase rate.
    GlidePath,
    /// Retirement-phase rate at every age.
    Flat,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayFrequency {
    Weekly,
    Biweekly,
    SemiMonthly,
    Monthly,
}

impl PayFrequency {
    pub fn periods_per_year(self) -> i64 {
        match self {
            PayFrequency::Weekly => 52,
            PayFrequency::Biweekly => 26,
            PayFrequency::SemiMonthly => 24,
            PayFrequency::Monthly => 12,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaxTreatment {
    TaxFree,
    TaxDeferred,
    AfterTax,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    /// Recorded by the portfolio/performance tracker for that year.
    Actual,
    /// Full-year estimate from salary and the match rule.
    Calculated,
    /// Remaining-year estimate for the current calendar year.
    Projected,
}

/// Per-user retirement settings.
#[derive(Debug, Clone)]
pub struct RetirementParameters {
    pub age_at_retirement: u32,
    pub age_of_death: u32,
    pub annual_salary_increase: Rate,
    pub raises_in_retirement: Rate,
    pub employer_match: Rate,
    pub employee_contribution_for_match: Rate,
}

/// Household-wide economic assumptions.
#[derive(Debug, Clone)]
pub struct SharedAssumptions {
    pub annual_inflation: Rate,
    pub withdrawal_rate: Rate,
    pub retirement_return_rate: Rate,
    pub return_model: ReturnModel,
}

/// Salary and elections as supplied by the paycheck module.
#[derive(Debug, Clone)]
pub struct PaycheckProfile {
    pub birthday: Option<Date>,
    pub annual_salary: Option<Cents>,
    pub pretax_401k: Rate,
    pub roth_401k: Rate,
    pub traditional_ira_monthly: Cents,
    pub roth_ira_monthly: Cents,
    pub brokerage_monthly: Vec<Cents>,
    pub pay_frequency: PayFrequency,
}

impl PaycheckProfile {
    pub fn payroll_election(&self) -> Rate {
        self.pretax_401k + self.roth_401k
    }

    pub fn brokerage_monthly_total(&self) -> Cents {
        self.brokerage_monthly.iter().sum()
    }
}

#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub owner: UserId,
    pub account_type: String,
    pub tax_treatment: Option<TaxTreatment>,
    pub balance: Cents,
}

/// One dated set of account balances from the portfolio tracker.
#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    pub year: i16,
    pub updated_at: Timestamp,
    pub accounts: Vec<AccountRecord>,
}

/// Historical per-account performance figures for one year.
#[derive(Debug, Clone)]
pub struct PerformanceRecord {
    pub owner: UserId,
    pub year: i16,
    pub account_type: String,
    pub employer_match: Option<Cents>,
}

#[derive(Debug, Clone)]
pub struct UserInputs {
    pub user: UserId,
    pub parameters: RetirementParameters,
    pub paycheck: PaycheckProfile,
}

/// Everything a household projection needs, captured as one snapshot.
#[derive(Debug, Clone)]
pub struct Household {
    pub as_of: Date,
    pub assumptions: SharedAssumptions,
    pub users: Vec<UserInputs>,
    pub active_users: Vec<UserId>,
    pub portfolio_snapshots: Vec<PortfolioSnapshot>,
    pub performance: Vec<PerformanceRecord>,
}

/// A single user's projection inputs with starting balances already seeded.
#[derive(Debug, Clone)]
pub struct ProjectionInputs<'a> {
    pub user: &'a UserId,
    pub as_of: Date,
    pub parameters: &'a RetirementParameters,
    pub assumptions: &'a SharedAssumptions,
    pub paycheck: &'a PaycheckProfile,
    pub starting_balances: Balances,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    pub tax_free: Cents,
    pub tax_deferred: Cents,
    pub after_tax: Cents,
}

impl Balances {
    pub fn total(self) -> Cents {
        self.tax_free + self.tax_deferred + self.after_tax
    }

    pub fn bucket_mut(&mut self, treatment: TaxTreatment) -> &mut Cents {
        match treatment {
            TaxTreatment::TaxFree => &mut self.tax_free,
            TaxTreatment::TaxDeferred => &mut self.tax_deferred,
            TaxTreatment::AfterTax => &mut self.after_tax,
        }
    }
}

/// Per-source contribution amounts for one simulated year.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionBreakdown {
    pub pretax_401k: Cents,
    pub roth_401k: Cents,
    pub employer_match: Cents,
    pub match_source: MatchSource,
    pub traditional_ira: Cents,
    pub roth_ira: Cents,
    pub brokerage: Cents,
}

impl ContributionBreakdown {
    pub fn none(match_source: MatchSource) -> Self {
        Self {
            pretax_401k: Cents::ZERO,
            roth_401k: Cents::ZERO,
            employer_match: Cents::ZERO,
            match_source,
            traditional_ira: Cents::ZERO,
            roth_ira: Cents::ZERO,
            brokerage: Cents::ZERO,
        }
    }

    pub fn employee(&self) -> Cents {
        self.pretax_401k + self.roth_401k + self.traditional_ira + self.roth_ira + self.brokerage
    }

    pub fn employer(&self) -> Cents {
        self.employer_match
    }

    pub fn total(&self) -> Cents {
        self.employee() + self.employer()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributions {
    pub employee: Cents,
    pub employer: Cents,
    pub total: Cents,
    pub breakdown: ContributionBreakdown,
}

impl From<ContributionBreakdown> for Contributions {
    fn from(breakdown: ContributionBreakdown) -> Self {
        Self {
            employee: breakdown.employee(),
            employer: breakdown.employer(),
            total: breakdown.total(),
            breakdown,
        }
    }
}

/// One simulated year for one user.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearProjection {
    pub year: i16,
    pub age: u32,
    pub salary: Cents,
    pub contributions: Contributions,
    pub withdrawal: Cents,
    pub balances: Balances,
    pub total_balance: Cents,
    pub total_balance_today_dollars: Cents,
    pub is_retired: bool,
    #[serde(rename = "returnRatePercent")]
    pub return_rate: Rate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProjection {
    pub user: UserId,
    pub retirement_age: u32,
    pub degraded: bool,
    pub years: Vec<YearProjection>,
}
