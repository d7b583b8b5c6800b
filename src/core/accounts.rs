//! Account-type classification and starting-balance seeding.

use super::types::{Balances, PortfolioSnapshot, TaxTreatment, UserId};

/// Account kinds the portfolio tracker is known to emit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AccountType {
    Traditional401k,
    Roth401k,
    Plan403b,
    Plan457b,
    TraditionalIra,
    RothIra,
    Hsa,
    Brokerage,
    Cash,
    Other,
}

impl AccountType {
    /// Parses a free-form account label. Unknown labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "401k" | "traditional401k" | "pretax401k" => AccountType::Traditional401k,
            "roth401k" => AccountType::Roth401k,
            "403b" | "traditional403b" => AccountType::Plan403b,
            "457b" | "457" => AccountType::Plan457b,
            "ira" | "traditionalira" | "rolloverira" | "sepira" => AccountType::TraditionalIra,
            "rothira" => AccountType::RothIra,
            "hsa" => AccountType::Hsa,
            "brokerage" | "taxable" | "individual" | "joint" => AccountType::Brokerage,
            "cash" | "savings" | "checking" => AccountType::Cash,
            _ => AccountType::Other,
        }
    }

    pub fn tax_treatment(self) -> TaxTreatment {
        match self {
            AccountType::Roth401k | AccountType::RothIra | AccountType::Hsa => TaxTreatment::TaxFree,
            AccountType::Traditional401k
            | AccountType::Plan403b
            | AccountType::Plan457b
            | AccountType::TraditionalIra => TaxTreatment::TaxDeferred,
            AccountType::Brokerage | AccountType::Cash | AccountType::Other => {
                TaxTreatment::AfterTax
            }
        }
    }

    /// Employer-sponsored plans that can receive a match.
    pub fn is_employer_plan(self) -> bool {
        matches!(
            self,
            AccountType::Traditional401k
                | AccountType::Roth401k
                | AccountType::Plan403b
                | AccountType::Plan457b
        )
    }
}

/// An explicit treatment wins; otherwise the label decides.
pub fn classify(account_type: &str, explicit: Option<TaxTreatment>) -> TaxTreatment {
    explicit.unwrap_or_else(|| AccountType::from_label(account_type).tax_treatment())
}

/// The snapshot with the latest update timestamp, regardless of its `year`.
pub fn latest_snapshot(snapshots: &[PortfolioSnapshot]) -> Option<&PortfolioSnapshot> {
    snapshots.iter().max_by_key(|s| s.updated_at)
}

/// Sums one user's accounts in the latest snapshot into tax buckets.
pub fn starting_balances(snapshots: &[PortfolioSnapshot], user: &UserId) -> Option<Balances> {
    let snapshot = latest_snapshot(snapshots)?;
    let mut balances = Balances::default();
    let mut found = false;
    for account in snapshot.accounts.iter().filter(|a| &a.owner == user) {
        *balances.bucket_mut(classify(&account.account_type, account.tax_treatment)) +=
            account.balance;
        found = true;
    }
    found.then_some(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::Cents;
    use crate::core::types::AccountRecord;
    use jiff::Timestamp;

    fn record(owner: &str, account_type: &str, dollars: i64) -> AccountRecord {
        AccountRecord {
            owner: UserId::new(owner),
            account_type: account_type.to_string(),
            tax_treatment: None,
            balance: Cents::dollars(dollars),
        }
    }

    fn snapshot(year: i16, updated_secs: i64, accounts: Vec<AccountRecord>) -> PortfolioSnapshot {
        PortfolioSnapshot {
            year,
            updated_at: Timestamp::from_second(updated_secs).expect("valid timestamp"),
            accounts,
        }
    }

    #[test]
    fn labels_are_normalized_before_matching() {
        assert_eq!(AccountType::from_label("401(k)"), AccountType::Traditional401k);
        assert_eq!(AccountType::from_label("Roth 401(k)"), AccountType::Roth401k);
        assert_eq!(AccountType::from_label("ROTH_IRA"), AccountType::RothIra);
        assert_eq!(AccountType::from_label("Traditional IRA"), AccountType::TraditionalIra);
        assert_eq!(AccountType::from_label("403(b)"), AccountType::Plan403b);
        assert_eq!(AccountType::from_label("crypto wallet"), AccountType::Other);
    }

    #[test]
    fn unknown_account_types_fall_back_to_after_tax() {
        assert_eq!(classify("collectibles", None), TaxTreatment::AfterTax);
        assert_eq!(classify("", None), TaxTreatment::AfterTax);
    }

    #[test]
    fn explicit_treatment_overrides_label() {
        assert_eq!(
            classify("brokerage", Some(TaxTreatment::TaxDeferred)),
            TaxTreatment::TaxDeferred
        );
    }

    #[test]
    fn employer_plan_detection() {
        assert!(AccountType::from_label("401k").is_employer_plan());
        assert!(AccountType::from_label("roth 401k").is_employer_plan());
        assert!(AccountType::from_label("457(b)").is_employer_plan());
        assert!(!AccountType::from_label("roth ira").is_employer_plan());
        assert!(!AccountType::from_label("brokerage").is_employer_plan());
    }

    #[test]
    fn latest_snapshot_is_chosen_by_update_time_not_year() {
        let snapshots = vec![
            snapshot(2026, 1_000, vec![record("a", "401k", 1)]),
            snapshot(2025, 5_000, vec![record("a", "401k", 2)]),
            snapshot(2024, 3_000, vec![record("a", "401k", 3)]),
        ];
        let latest = latest_snapshot(&snapshots).expect("one snapshot");
        assert_eq!(latest.year, 2025);
    }

    #[test]
    fn starting_balances_bucket_a_single_users_accounts() {
        let mut explicit = record("a", "mystery fund", 7);
        explicit.tax_treatment = Some(TaxTreatment::TaxFree);
        let snapshots = vec![snapshot(
            2026,
            10,
            vec![
                record("a", "401k", 100),
                record("a", "Roth IRA", 50),
                record("a", "brokerage", 25),
                record("a", "unknown", 5),
                record("b", "401k", 999),
                explicit,
            ],
        )];

        let balances = starting_balances(&snapshots, &UserId::new("a")).expect("user a present");
        assert_eq!(balances.tax_deferred, Cents::dollars(100));
        assert_eq!(balances.tax_free, Cents::dollars(57));
        assert_eq!(balances.after_tax, Cents::dollars(30));
    }

    #[test]
    fn starting_balances_missing_user_or_snapshot_is_none() {
        assert!(starting_balances(&[], &UserId::new("a")).is_none());
        let snapshots = vec![snapshot(2026, 10, vec![record("b", "401k", 1)])];
        assert!(starting_balances(&snapshots, &UserId::new("a")).is_none());
    }
}
