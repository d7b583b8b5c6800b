use jiff::civil::Date;
use tracing::{debug, warn};

use super::accounts::starting_balances;
use super::contributions::{ContributionResolver, PayScheduleRemaining, RemainingContributions};
use super::employer_match::{EmployerMatchSource, RecordedMatches};
use super::ledger::{BalanceLedger, withdrawal_amount};
use super::money::{Cents, Rate};
use super::rates::modeled_return_rate;
use super::types::{
    Balances, ContributionBreakdown, Household, MatchSource, PaycheckProfile, ProjectionInputs,
    UserProjection, YearProjection,
};

/// Starting age used when the paycheck profile cannot place the user in time.
const FALLBACK_AGE: u32 = 30;

/// No timeline runs past this age, whatever the requested age of death.
pub const MAX_AGE: u32 = 150;

/// Whole years between `birthday` and `as_of`.
pub fn age_on(birthday: Date, as_of: Date) -> u32 {
    let mut years = as_of.year() as i32 - birthday.year() as i32;
    if (as_of.month(), as_of.day()) < (birthday.month(), birthday.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// A profile without a birthday or salary only gets the zero-balance stub.
pub fn is_degraded(profile: &PaycheckProfile) -> bool {
    profile.birthday.is_none() || profile.annual_salary.is_none()
}

struct StartingPoint {
    age: u32,
    salary: Cents,
    balances: Balances,
    degraded: bool,
}

fn starting_point(inputs: &ProjectionInputs<'_>) -> StartingPoint {
    match (inputs.paycheck.birthday, inputs.paycheck.annual_salary) {
        (Some(birthday), Some(salary)) => StartingPoint {
            age: age_on(birthday, inputs.as_of),
            salary,
            balances: inputs.starting_balances,
            degraded: false,
        },
        _ => StartingPoint {
            age: FALLBACK_AGE,
            salary: Cents::ZERO,
            balances: Balances::default(),
            degraded: true,
        },
    }
}

/// Simulates one user from today through the assumed age of death.
///
/// The first row is the "today" snapshot: starting balances before any growth,
/// carrying the contributions still expected this calendar year. Every later
/// row reflects balances after that year's growth and contributions (or
/// withdrawal once retired).
pub fn project_user(
    inputs: &ProjectionInputs<'_>,
    matches: &dyn EmployerMatchSource,
    remaining: &dyn RemainingContributions,
) -> Vec<YearProjection> {
    let params = inputs.parameters;
    let assumptions = inputs.assumptions;
    let start = starting_point(inputs);
    if start.degraded {
        warn!(user = %inputs.user, "paycheck profile lacks birthday or salary; projecting zero balances");
    }

    let end_age = params.age_of_death.min(MAX_AGE).max(start.age);
    let resolver = ContributionResolver {
        user: inputs.user,
        profile: inputs.paycheck,
        parameters: params,
        matches,
        remaining,
    };

    let mut ledger = BalanceLedger::new(start.balances);
    let mut salary = start.salary;
    let mut price_index = 1.0_f64;
    let mut rows = Vec::with_capacity((end_age - start.age + 1) as usize);

    for (offset, age) in (start.age..=end_age).enumerate() {
        let year = inputs.as_of.year().saturating_add(offset as i16);
        let first_year = offset == 0;
        let is_retired = age >= params.age_at_retirement;
        let rate = modeled_return_rate(
            assumptions.return_model,
            age,
            params.age_at_retirement,
            assumptions.retirement_return_rate,
        );

        if !first_year {
            price_index *= 1.0 + assumptions.annual_inflation.as_fraction();
            if !is_retired {
                salary = salary.grow(params.annual_salary_increase);
            } else if !params.raises_in_retirement.is_zero() {
                salary = salary.grow(params.raises_in_retirement);
            }
        }

        let contribution = if is_retired || start.degraded {
            ContributionBreakdown::none(MatchSource::Calculated)
        } else {
            resolver.resolve(year, salary, first_year)
        };

        if first_year {
            rows.push(year_row(
                YearState {
                    year,
                    age,
                    salary,
                    is_retired,
                    rate,
                },
                contribution,
                Cents::ZERO,
                ledger.balances(),
                price_index,
            ));
        }

        ledger.apply_growth(rate);
        let withdrawal = if is_retired {
            let amount = withdrawal_amount(ledger.total(), assumptions.withdrawal_rate);
            ledger.apply_withdrawal(amount);
            amount
        } else {
            ledger.apply_contribution(&contribution);
            Cents::ZERO
        };

        if !first_year {
            rows.push(year_row(
                YearState {
                    year,
                    age,
                    salary,
                    is_retired,
                    rate,
                },
                contribution,
                withdrawal,
                ledger.balances(),
                price_index,
            ));
        }
    }

    debug!(
        user = %inputs.user,
        start_age = start.age,
        end_age,
        rows = rows.len(),
        final_total = %ledger.total(),
        "projection complete"
    );
    rows
}

#[derive(Clone, Copy)]
struct YearState {
    year: i16,
    age: u32,
    salary: Cents,
    is_retired: bool,
    rate: Rate,
}

fn year_row(
    state: YearState,
    contribution: ContributionBreakdown,
    withdrawal: Cents,
    balances: Balances,
    price_index: f64,
) -> YearProjection {
    let total = balances.total();
    YearProjection {
        year: state.year,
        age: state.age,
        salary: state.salary,
        contributions: contribution.into(),
        withdrawal,
        balances,
        total_balance: total,
        total_balance_today_dollars: Cents::from_dollars(total.as_dollars() / price_index.max(1e-9)),
        is_retired: state.is_retired,
        return_rate: state.rate,
    }
}

/// Projects every active user in the household. Users are independent; an
/// active id with no matching user is skipped.
pub fn project_household(household: &Household) -> Vec<UserProjection> {
    let matches = RecordedMatches::new(&household.performance);
    let remaining = PayScheduleRemaining::new(household.as_of);

    household
        .active_users
        .iter()
        .filter_map(|id| {
            let found = household.users.iter().find(|u| &u.user == id);
            if found.is_none() {
                warn!(user = %id, "active user has no retirement inputs");
            }
            found
        })
        .map(|user| {
            let seeded = starting_balances(&household.portfolio_snapshots, &user.user);
            if seeded.is_none() {
                debug!(user = %user.user, "no portfolio records; starting from zero balances");
            }
            let inputs = ProjectionInputs {
                user: &user.user,
                as_of: household.as_of,
                parameters: &user.parameters,
                assumptions: &household.assumptions,
                paycheck: &user.paycheck,
                starting_balances: seeded.unwrap_or_default(),
            };
            UserProjection {
                user: user.user.clone(),
                retirement_age: user.parameters.age_at_retirement,
                degraded: is_degraded(&user.paycheck),
                years: project_user(&inputs, &matches, &remaining),
            }
        })
        .collect()
}
