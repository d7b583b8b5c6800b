use jiff::civil::Date;

use super::employer_match::EmployerMatchSource;
use super::money::{Cents, Rate};
use super::types::{
    ContributionBreakdown, MatchSource, PaycheckProfile, RetirementParameters, UserId,
};

/// Employer match is all-or-nothing: paid in full only when the employee's
/// own payroll election meets the threshold.
pub fn employer_match_amount(
    salary: Cents,
    employee_election: Rate,
    employer_match: Rate,
    match_threshold: Rate,
) -> Cents {
    if employee_election >= match_threshold {
        salary.scale(employer_match)
    } else {
        Cents::ZERO
    }
}

/// Full calendar-year contributions at `salary`.
pub fn annual_contributions(
    profile: &PaycheckProfile,
    salary: Cents,
    parameters: &RetirementParameters,
) -> ContributionBreakdown {
    ContributionBreakdown {
        pretax_401k: salary.scale(profile.pretax_401k),
        roth_401k: salary.scale(profile.roth_401k),
        employer_match: employer_match_amount(
            salary,
            profile.payroll_election(),
            parameters.employer_match,
            parameters.employee_contribution_for_match,
        ),
        match_source: MatchSource::Calculated,
        traditional_ira: profile.traditional_ira_monthly.times(12),
        roth_ira: profile.roth_ira_monthly.times(12),
        brokerage: profile.brokerage_monthly_total().times(12),
    }
}

/// Contributions still achievable for the rest of the current calendar year.
pub trait RemainingContributions {
    fn remaining(
        &self,
        profile: &PaycheckProfile,
        salary: Cents,
        employer_match: Rate,
        match_threshold: Rate,
    ) -> ContributionBreakdown;
}

/// Prorates payroll contributions by remaining pay periods and monthly
/// contributions by remaining months, counting from `as_of`.
#[derive(Debug, Clone, Copy)]
pub struct PayScheduleRemaining {
    pub as_of: Date,
}

impl PayScheduleRemaining {
    pub fn new(as_of: Date) -> Self {
        Self { as_of }
    }

    /// Pay periods from `as_of` (inclusive) through December 31.
    pub fn remaining_pay_periods(&self, periods_per_year: i64) -> i64 {
        let days_in_year = self.as_of.days_in_year() as i64;
        let days_remaining = days_in_year - self.as_of.day_of_year() as i64 + 1;
        (periods_per_year * days_remaining + days_in_year - 1) / days_in_year
    }

    /// Months remaining, including the current one.
    pub fn remaining_months(&self) -> i64 {
        12 - self.as_of.month() as i64 + 1
    }
}

impl RemainingContributions for PayScheduleRemaining {
    fn remaining(
        &self,
        profile: &PaycheckProfile,
        salary: Cents,
        employer_match: Rate,
        match_threshold: Rate,
    ) -> ContributionBreakdown {
        let periods = profile.pay_frequency.periods_per_year();
        let remaining_periods = self.remaining_pay_periods(periods);
        let months = self.remaining_months();
        let prorate = |annual: Cents| annual.mul_div(remaining_periods, periods);

        ContributionBreakdown {
            pretax_401k: prorate(salary.scale(profile.pretax_401k)),
            roth_401k: prorate(salary.scale(profile.roth_401k)),
            employer_match: prorate(employer_match_amount(
                salary,
                profile.payroll_election(),
                employer_match,
                match_threshold,
            )),
            match_source: MatchSource::Projected,
            traditional_ira: profile.traditional_ira_monthly.times(months),
            roth_ira: profile.roth_ira_monthly.times(months),
            brokerage: profile.brokerage_monthly_total().times(months),
        }
    }
}

/// Resolves one year's contributions for a single user, preferring recorded
/// employer match over the calculated estimate.
pub struct ContributionResolver<'a> {
    pub user: &'a UserId,
    pub profile: &'a PaycheckProfile,
    pub parameters: &'a RetirementParameters,
    pub matches: &'a dyn EmployerMatchSource,
    pub remaining: &'a dyn RemainingContributions,
}

impl ContributionResolver<'_> {
    pub fn resolve(&self, year: i16, salary: Cents, first_year: bool) -> ContributionBreakdown {
        let mut breakdown = if first_year {
            self.remaining.remaining(
                self.profile,
                salary,
                self.parameters.employer_match,
                self.parameters.employee_contribution_for_match,
            )
        } else {
            annual_contributions(self.profile, salary, self.parameters)
        };

        if let Some(actual) = self.matches.resolve(self.user, year) {
            breakdown.employer_match = actual;
            breakdown.match_source = MatchSource::Actual;
        }
        breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::employer_match::{NoRecordedMatches, RecordedMatches};
    use crate::core::types::{PayFrequency, PerformanceRecord};
    use jiff::civil::date;

    fn pct(p: f64) -> Rate {
        Rate::from_percent(p)
    }

    fn sample_profile() -> PaycheckProfile {
        PaycheckProfile {
            birthday: Some(date(1986, 3, 14)),
            annual_salary: Some(Cents::dollars(100_000)),
            pretax_401k: pct(5.0),
            roth_401k: pct(0.0),
            traditional_ira_monthly: Cents::ZERO,
            roth_ira_monthly: Cents::ZERO,
            brokerage_monthly: Vec::new(),
            pay_frequency: PayFrequency::Biweekly,
        }
    }

    fn sample_parameters() -> RetirementParameters {
        RetirementParameters {
            age_at_retirement: 65,
            age_of_death: 90,
            annual_salary_increase: Rate::ZERO,
            raises_in_retirement: Rate::ZERO,
            employer_match: pct(4.0),
            employee_contribution_for_match: pct(4.0),
        }
    }

    #[test]
    fn match_paid_in_full_at_or_above_threshold() {
        let salary = Cents::dollars(100_000);
        assert_eq!(
            employer_match_amount(salary, pct(4.0), pct(4.0), pct(4.0)),
            Cents::dollars(4_000)
        );
        assert_eq!(
            employer_match_amount(salary, pct(10.0), pct(4.0), pct(4.0)),
            Cents::dollars(4_000)
        );
    }

    #[test]
    fn match_is_zero_below_threshold_regardless_of_salary() {
        for dollars in [30_000, 100_000, 1_000_000] {
            assert_eq!(
                employer_match_amount(Cents::dollars(dollars), pct(2.0), pct(4.0), pct(4.0)),
                Cents::ZERO
            );
        }
    }

    #[test]
    fn annual_contributions_combine_payroll_and_monthly_sources() {
        let mut profile = sample_profile();
        profile.pretax_401k = pct(3.0);
        profile.roth_401k = pct(2.0);
        profile.traditional_ira_monthly = Cents::dollars(100);
        profile.roth_ira_monthly = Cents::dollars(200);
        profile.brokerage_monthly = vec![Cents::dollars(50), Cents::dollars(150)];

        let b = annual_contributions(&profile, Cents::dollars(100_000), &sample_parameters());
        assert_eq!(b.pretax_401k, Cents::dollars(3_000));
        assert_eq!(b.roth_401k, Cents::dollars(2_000));
        assert_eq!(b.employer_match, Cents::dollars(4_000));
        assert_eq!(b.match_source, MatchSource::Calculated);
        assert_eq!(b.traditional_ira, Cents::dollars(1_200));
        assert_eq!(b.roth_ira, Cents::dollars(2_400));
        assert_eq!(b.brokerage, Cents::dollars(2_400));
        assert_eq!(b.employee(), Cents::dollars(11_000));
        assert_eq!(b.total(), Cents::dollars(15_000));
    }

    #[test]
    fn monthly_sources_do_not_scale_with_salary() {
        let mut profile = sample_profile();
        profile.roth_ira_monthly = Cents::dollars(500);
        let low = annual_contributions(&profile, Cents::dollars(10_000), &sample_parameters());
        let high = annual_contributions(&profile, Cents::dollars(500_000), &sample_parameters());
        assert_eq!(low.roth_ira, high.roth_ira);
    }

    #[test]
    fn remaining_on_january_first_is_the_full_year() {
        let calc = PayScheduleRemaining::new(date(2026, 1, 1));
        assert_eq!(calc.remaining_pay_periods(26), 26);
        assert_eq!(calc.remaining_months(), 12);

        let mut profile = sample_profile();
        profile.roth_ira_monthly = Cents::dollars(100);
        let b = calc.remaining(&profile, Cents::dollars(100_000), pct(4.0), pct(4.0));
        assert_eq!(b.pretax_401k, Cents::dollars(5_000));
        assert_eq!(b.employer_match, Cents::dollars(4_000));
        assert_eq!(b.roth_ira, Cents::dollars(1_200));
        assert_eq!(b.match_source, MatchSource::Projected);
    }

    #[test]
    fn remaining_mid_year_is_prorated() {
        // 2026-07-01 is day 182 of 365: 184 days remain.
        let calc = PayScheduleRemaining::new(date(2026, 7, 1));
        assert_eq!(calc.remaining_pay_periods(12), 7);
        assert_eq!(calc.remaining_pay_periods(26), 14);
        assert_eq!(calc.remaining_months(), 6);

        let mut profile = sample_profile();
        profile.pay_frequency = PayFrequency::Monthly;
        profile.brokerage_monthly = vec![Cents::dollars(100)];
        let b = calc.remaining(&profile, Cents::dollars(120_000), pct(4.0), pct(4.0));
        assert_eq!(b.pretax_401k, Cents::dollars(3_500));
        assert_eq!(b.employer_match, Cents::dollars(2_800));
        assert_eq!(b.brokerage, Cents::dollars(600));
    }

    #[test]
    fn remaining_on_last_day_still_has_one_paycheck() {
        let calc = PayScheduleRemaining::new(date(2026, 12, 31));
        assert_eq!(calc.remaining_pay_periods(52), 1);
        assert_eq!(calc.remaining_months(), 1);
    }

    #[test]
    fn remaining_applies_match_cliff() {
        let calc = PayScheduleRemaining::new(date(2026, 1, 1));
        let mut profile = sample_profile();
        profile.pretax_401k = pct(2.0);
        let b = calc.remaining(&profile, Cents::dollars(100_000), pct(4.0), pct(4.0));
        assert_eq!(b.employer_match, Cents::ZERO);
    }

    #[test]
    fn resolver_prefers_recorded_match() {
        let user = UserId::new("a");
        let profile = sample_profile();
        let parameters = sample_parameters();
        let records = vec![PerformanceRecord {
            owner: user.clone(),
            year: 2027,
            account_type: "401k".to_string(),
            employer_match: Some(Cents::dollars(3_210)),
        }];
        let matches = RecordedMatches::new(&records);
        let remaining = PayScheduleRemaining::new(date(2026, 1, 1));
        let resolver = ContributionResolver {
            user: &user,
            profile: &profile,
            parameters: &parameters,
            matches: &matches,
            remaining: &remaining,
        };

        let actual = resolver.resolve(2027, Cents::dollars(100_000), false);
        assert_eq!(actual.employer_match, Cents::dollars(3_210));
        assert_eq!(actual.match_source, MatchSource::Actual);
        assert_eq!(actual.pretax_401k, Cents::dollars(5_000));

        let calculated = resolver.resolve(2028, Cents::dollars(100_000), false);
        assert_eq!(calculated.employer_match, Cents::dollars(4_000));
        assert_eq!(calculated.match_source, MatchSource::Calculated);
    }

    #[test]
    fn resolver_uses_remaining_calculator_for_first_year() {
        let user = UserId::new("a");
        let profile = sample_profile();
        let parameters = sample_parameters();
        let remaining = PayScheduleRemaining::new(date(2026, 7, 1));
        let resolver = ContributionResolver {
            user: &user,
            profile: &profile,
            parameters: &parameters,
            matches: &NoRecordedMatches,
            remaining: &remaining,
        };

        let first = resolver.resolve(2026, Cents::dollars(104_000), true);
        assert_eq!(first.match_source, MatchSource::Projected);
        // 14 of 26 biweekly periods remain.
        assert_eq!(first.pretax_401k, Cents::dollars(2_800));
    }
}
