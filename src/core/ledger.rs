use super::money::{Cents, Rate};
use super::types::{Balances, ContributionBreakdown, TaxTreatment};

/// Balances across the three tax buckets for one user's run.
///
/// Buckets are never clamped: an aggressive withdrawal or a return below
/// -100% can leave a bucket negative and it stays that way.
#[derive(Debug, Clone)]
pub struct BalanceLedger {
    balances: Balances,
}

impl BalanceLedger {
    pub fn new(balances: Balances) -> Self {
        Self { balances }
    }

    pub fn balances(&self) -> Balances {
        self.balances
    }

    pub fn total(&self) -> Cents {
        self.balances.total()
    }

    pub fn apply_growth(&mut self, rate: Rate) {
        let b = &mut self.balances;
        b.tax_free = b.tax_free.grow(rate);
        b.tax_deferred = b.tax_deferred.grow(rate);
        b.after_tax = b.after_tax.grow(rate);
    }

    pub fn apply_contribution(&mut self, contribution: &ContributionBreakdown) {
        let routed = [
            (TaxTreatment::TaxFree, contribution.roth_401k),
            (TaxTreatment::TaxFree, contribution.roth_ira),
            (TaxTreatment::TaxDeferred, contribution.pretax_401k),
            (TaxTreatment::TaxDeferred, contribution.traditional_ira),
            (TaxTreatment::TaxDeferred, contribution.employer_match),
            (TaxTreatment::AfterTax, contribution.brokerage),
        ];
        for (bucket, amount) in routed {
            *self.balances.bucket_mut(bucket) += amount;
        }
    }

    /// Takes `amount` out of the buckets in proportion to their current share.
    /// Returns the per-bucket amounts removed.
    pub fn apply_withdrawal(&mut self, amount: Cents) -> Balances {
        let split = proportional_split(self.balances, amount);
        self.balances.tax_free -= split.tax_free;
        self.balances.tax_deferred -= split.tax_deferred;
        self.balances.after_tax -= split.after_tax;
        split
    }
}

/// `total × withdrawal rate`. Nothing is drawn from an empty or negative total.
pub fn withdrawal_amount(total: Cents, withdrawal_rate: Rate) -> Cents {
    if total <= Cents::ZERO {
        return Cents::ZERO;
    }
    total.scale(withdrawal_rate)
}

/// Splits `amount` by each bucket's share of the total. The parts always sum
/// to `amount` exactly; the rounding remainder lands on the largest bucket.
pub fn proportional_split(balances: Balances, amount: Cents) -> Balances {
    let total = balances.total();
    if total.is_zero() || amount.is_zero() {
        return Balances::default();
    }

    let mut split = Balances {
        tax_free: balances.tax_free.mul_div(amount.get(), total.get()),
        tax_deferred: balances.tax_deferred.mul_div(amount.get(), total.get()),
        after_tax: balances.after_tax.mul_div(amount.get(), total.get()),
    };

    let remainder = amount - split.total();
    if !remainder.is_zero() {
        let largest = [
            (TaxTreatment::TaxFree, balances.tax_free),
            (TaxTreatment::TaxDeferred, balances.tax_deferred),
            (TaxTreatment::AfterTax, balances.after_tax),
        ]
        .into_iter()
        .max_by_key(|(_, balance)| *balance)
        .map(|(bucket, _)| bucket)
        .unwrap_or(TaxTreatment::AfterTax);
        *split.bucket_mut(largest) += remainder;
    }

    split
}
