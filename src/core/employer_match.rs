use super::accounts::AccountType;
use super::money::Cents;
use super::types::{PerformanceRecord, UserId};

/// Looks up an employer match that was actually paid in a given year.
pub trait EmployerMatchSource {
    /// `None` means nothing was recorded and the calculated estimate stands.
    fn resolve(&self, user: &UserId, year: i16) -> Option<Cents>;
}

/// Match figures recorded by the performance tracker.
#[derive(Debug, Clone, Copy)]
pub struct RecordedMatches<'a> {
    records: &'a [PerformanceRecord],
}

impl<'a> RecordedMatches<'a> {
    pub fn new(records: &'a [PerformanceRecord]) -> Self {
        Self { records }
    }
}

impl EmployerMatchSource for RecordedMatches<'_> {
    fn resolve(&self, user: &UserId, year: i16) -> Option<Cents> {
        self.records
            .iter()
            .filter(|r| r.year == year && &r.owner == user)
            .filter(|r| AccountType::from_label(&r.account_type).is_employer_plan())
            .filter_map(|r| r.employer_match)
            .fold(None, |acc, amount| Some(acc.unwrap_or(Cents::ZERO) + amount))
    }
}

/// A source with no records; every year uses the calculated estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecordedMatches;

impl EmployerMatchSource for NoRecordedMatches {
    fn resolve(&self, _user: &UserId, _year: i16) -> Option<Cents> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: &str, year: i16, account_type: &str, dollars: Option<i64>) -> PerformanceRecord {
        PerformanceRecord {
            owner: UserId::new(owner),
            year,
            account_type: account_type.to_string(),
            employer_match: dollars.map(Cents::dollars),
        }
    }

    #[test]
    fn sums_matches_across_employer_plans_for_user_and_year() {
        let records = vec![
            record("a", 2025, "401k", Some(3_000)),
            record("a", 2025, "Roth 401(k)", Some(1_000)),
            record("a", 2025, "brokerage", Some(500)),
            record("a", 2024, "401k", Some(2_000)),
            record("b", 2025, "401k", Some(9_000)),
        ];
        let source = RecordedMatches::new(&records);
        assert_eq!(
            source.resolve(&UserId::new("a"), 2025),
            Some(Cents::dollars(4_000))
        );
        assert_eq!(
            source.resolve(&UserId::new("a"), 2024),
            Some(Cents::dollars(2_000))
        );
    }

    #[test]
    fn missing_records_resolve_to_none() {
        let records = vec![
            record("a", 2025, "401k", None),
            record("a", 2025, "roth ira", Some(100)),
        ];
        let source = RecordedMatches::new(&records);
        assert_eq!(source.resolve(&UserId::new("a"), 2025), None);
        assert_eq!(source.resolve(&UserId::new("a"), 2030), None);
        assert_eq!(NoRecordedMatches.resolve(&UserId::new("a"), 2025), None);
    }

    #[test]
    fn recorded_zero_is_an_actual_value() {
        let records = vec![record("a", 2025, "401k", Some(0))];
        let source = RecordedMatches::new(&records);
        assert_eq!(source.resolve(&UserId::new("a"), 2025), Some(Cents::ZERO));
    }
}
