mod accounts;
mod contributions;
mod employer_match;
mod engine;
mod ledger;
mod money;
mod rates;
mod series;
mod types;

pub use accounts::{AccountType, classify, latest_snapshot, starting_balances};
pub use contributions::{
    ContributionResolver, PayScheduleRemaining, RemainingContributions, annual_contributions,
    employer_match_amount,
};
pub use employer_match::{EmployerMatchSource, NoRecordedMatches, RecordedMatches};
pub use engine::{MAX_AGE, age_on, is_degraded, project_household, project_user};
pub use ledger::{BalanceLedger, proportional_split, withdrawal_amount};
pub use money::{Cents, Rate};
pub use rates::{modeled_return_rate, return_rate};
pub use series::{HouseholdYear, assemble, retirement_row, row_at_age};
pub use types::{
    AccountRecord, Balances, ContributionBreakdown, Contributions, Household, MatchSource,
    PayFrequency, PaycheckProfile, PerformanceRecord, PortfolioSnapshot, ProjectionInputs,
    RetirementParameters, ReturnModel, SharedAssumptions, TaxTreatment, UserId, UserInputs,
    UserProjection, YearProjection,
};
