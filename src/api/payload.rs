//! Request payloads and their conversion into engine inputs.
//!
//! Numbers arrive from user-editable form fields, so every numeric field is
//! accepted as either a JSON number or a string. Anything that does not parse
//! becomes 0 here, before the engine sees it.

use std::collections::HashSet;

use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::ProjectionDefaults;
use super::error::{ApiError, ApiResult};
use crate::core::{
    AccountRecord, Cents, Household, MAX_AGE, PayFrequency, PaycheckProfile, PerformanceRecord,
    PortfolioSnapshot, Rate, RetirementParameters, ReturnModel, SharedAssumptions, TaxTreatment,
    UserId, UserInputs,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiReturnModel {
    #[serde(alias = "glidePath", alias = "glide_path", alias = "glide")]
    GlidePath,
    Flat,
    #[serde(other)]
    Unknown,
}

impl From<ApiReturnModel> for ReturnModel {
    fn from(value: ApiReturnModel) -> Self {
        match value {
            ApiReturnModel::Flat => ReturnModel::Flat,
            ApiReturnModel::GlidePath | ApiReturnModel::Unknown => ReturnModel::GlidePath,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiPayFrequency {
    Weekly,
    #[serde(alias = "bi-weekly", alias = "fortnightly")]
    Biweekly,
    #[serde(alias = "semiMonthly", alias = "semimonthly", alias = "semi_monthly")]
    SemiMonthly,
    Monthly,
    #[serde(other)]
    Unknown,
}

impl From<ApiPayFrequency> for PayFrequency {
    fn from(value: ApiPayFrequency) -> Self {
        match value {
            ApiPayFrequency::Weekly => PayFrequency::Weekly,
            ApiPayFrequency::SemiMonthly => PayFrequency::SemiMonthly,
            ApiPayFrequency::Monthly => PayFrequency::Monthly,
            ApiPayFrequency::Biweekly | ApiPayFrequency::Unknown => PayFrequency::Biweekly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiTaxTreatment {
    #[serde(alias = "taxFree", alias = "tax_free", alias = "roth")]
    TaxFree,
    #[serde(alias = "taxDeferred", alias = "tax_deferred", alias = "traditional", alias = "pretax")]
    TaxDeferred,
    #[serde(alias = "afterTax", alias = "after_tax", alias = "taxable")]
    AfterTax,
    #[serde(other)]
    Unknown,
}

impl ApiTaxTreatment {
    fn into_treatment(self) -> Option<TaxTreatment> {
        match self {
            ApiTaxTreatment::TaxFree => Some(TaxTreatment::TaxFree),
            ApiTaxTreatment::TaxDeferred => Some(TaxTreatment::TaxDeferred),
            ApiTaxTreatment::AfterTax => Some(TaxTreatment::AfterTax),
            ApiTaxTreatment::Unknown => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HouseholdPayload {
    pub as_of: Option<String>,
    pub assumptions: AssumptionsPayload,
    pub users: Vec<UserPayload>,
    /// `None` projects every listed user.
    pub active_users: Option<Vec<String>>,
    pub portfolio_snapshots: Vec<SnapshotPayload>,
    pub performance: Vec<PerformancePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssumptionsPayload {
    #[serde(deserialize_with = "lenient_number")]
    pub annual_inflation_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub withdrawal_rate_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub retirement_return_rate_percent: Option<f64>,
    pub return_model: Option<ApiReturnModel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPayload {
    pub id: String,
    pub retirement: RetirementPayload,
    pub paycheck: PaycheckPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetirementPayload {
    #[serde(deserialize_with = "lenient_number")]
    pub age_at_retirement: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub age_of_death: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub annual_salary_increase_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub raises_in_retirement_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub employer_match_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub employee_contribution_for_match_percent: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaycheckPayload {
    pub birthday: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub salary: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub pretax_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub roth_percent: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub traditional_ira_monthly: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub roth_ira_monthly: Option<f64>,
    #[serde(deserialize_with = "lenient_number_list")]
    pub brokerage_monthly: Vec<f64>,
    pub pay_frequency: Option<ApiPayFrequency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotPayload {
    #[serde(deserialize_with = "lenient_number")]
    pub year: Option<f64>,
    pub updated_at: String,
    pub accounts: Vec<AccountPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountPayload {
    pub owner: String,
    pub account_type: String,
    pub tax_treatment: Option<ApiTaxTreatment>,
    #[serde(deserialize_with = "lenient_number")]
    pub balance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformancePayload {
    pub owner: String,
    #[serde(deserialize_with = "lenient_number")]
    pub year: Option<f64>,
    pub account_type: String,
    #[serde(deserialize_with = "lenient_number")]
    pub employer_match: Option<f64>,
}

/// `null` and blank strings are absent; any other non-number becomes 0.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let finite_or_zero = |v: Option<f64>| v.filter(|v| v.is_finite()).unwrap_or(0.0);
    match value {
        Value::Null => None,
        Value::Number(n) => Some(finite_or_zero(n.as_f64())),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '%' | '_') && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(finite_or_zero(cleaned.parse::<f64>().ok()))
            }
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Some(0.0),
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_number))
}

fn lenient_number_list<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(coerce_number).collect(),
        Some(other) => coerce_number(&other).into_iter().collect(),
    })
}

fn whole(value: f64) -> i64 {
    value.round() as i64
}

fn age(field: &str, value: Option<f64>, default: u32) -> u32 {
    let Some(value) = value else {
        return default;
    };
    let years = whole(value.max(0.0));
    if years > MAX_AGE as i64 {
        warn!(field, requested = value, capped = MAX_AGE, "capping age");
        return MAX_AGE;
    }
    years as u32
}

fn percent(value: Option<f64>, default: f64) -> Rate {
    Rate::from_percent(value.unwrap_or(default))
}

fn dollars(value: Option<f64>) -> Cents {
    value.map_or(Cents::ZERO, Cents::from_dollars)
}

pub fn parse_date(field: &str, value: &str) -> ApiResult<Date> {
    value.trim().parse::<Date>().map_err(|_| ApiError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_timestamp(field: &str, value: &str) -> ApiResult<Timestamp> {
    value
        .trim()
        .parse::<Timestamp>()
        .map_err(|_| ApiError::InvalidTimestamp {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn build_assumptions(payload: &AssumptionsPayload, defaults: &ProjectionDefaults) -> SharedAssumptions {
    SharedAssumptions {
        annual_inflation: percent(payload.annual_inflation_percent, defaults.inflation_rate),
        withdrawal_rate: percent(payload.withdrawal_rate_percent, defaults.withdrawal_rate),
        retirement_return_rate: percent(
            payload.retirement_return_rate_percent,
            defaults.retirement_return_rate,
        ),
        return_model: payload
            .return_model
            .map_or(ReturnModel::GlidePath, ReturnModel::from),
    }
}

fn build_parameters(payload: &RetirementPayload, defaults: &ProjectionDefaults) -> RetirementParameters {
    RetirementParameters {
        age_at_retirement: age(
            "ageAtRetirement",
            payload.age_at_retirement,
            defaults.retirement_age,
        ),
        age_of_death: age("ageOfDeath", payload.age_of_death, defaults.death_age),
        annual_salary_increase: percent(
            payload.annual_salary_increase_percent,
            defaults.salary_increase,
        ),
        raises_in_retirement: percent(payload.raises_in_retirement_percent, 0.0),
        employer_match: percent(payload.employer_match_percent, 0.0),
        employee_contribution_for_match: percent(
            payload.employee_contribution_for_match_percent,
            0.0,
        ),
    }
}

fn build_paycheck(user: &str, payload: &PaycheckPayload) -> PaycheckProfile {
    // A malformed birthday degrades like a missing one.
    let birthday = payload.birthday.as_deref().and_then(|raw| {
        let parsed = parse_date("birthday", raw).ok();
        if parsed.is_none() && !raw.trim().is_empty() {
            warn!(user, birthday = raw, "ignoring unparsable birthday");
        }
        parsed
    });

    PaycheckProfile {
        birthday,
        annual_salary: payload.salary.map(Cents::from_dollars),
        pretax_401k: percent(payload.pretax_percent, 0.0),
        roth_401k: percent(payload.roth_percent, 0.0),
        traditional_ira_monthly: dollars(payload.traditional_ira_monthly),
        roth_ira_monthly: dollars(payload.roth_ira_monthly),
        brokerage_monthly: payload
            .brokerage_monthly
            .iter()
            .copied()
            .map(Cents::from_dollars)
            .collect(),
        pay_frequency: payload
            .pay_frequency
            .map_or(PayFrequency::Biweekly, PayFrequency::from),
    }
}

fn build_snapshot(index: usize, payload: &SnapshotPayload) -> ApiResult<PortfolioSnapshot> {
    Ok(PortfolioSnapshot {
        year: payload.year.map_or(0, |y| whole(y) as i16),
        updated_at: parse_timestamp(&format!("portfolioSnapshots[{index}].updatedAt"), &payload.updated_at)?,
        accounts: payload
            .accounts
            .iter()
            .map(|a| AccountRecord {
                owner: UserId::new(a.owner.clone()),
                account_type: a.account_type.clone(),
                tax_treatment: a.tax_treatment.and_then(ApiTaxTreatment::into_treatment),
                balance: dollars(a.balance),
            })
            .collect(),
    })
}

/// Resolves a payload into a complete household snapshot. `as_of` wins over
/// the payload's own date; with neither, today's local date is used.
pub fn build_household(
    payload: HouseholdPayload,
    defaults: &ProjectionDefaults,
    as_of: Option<Date>,
) -> ApiResult<Household> {
    let as_of = match (as_of, payload.as_of.as_deref()) {
        (Some(date), _) => date,
        (None, Some(raw)) => parse_date("asOf", raw)?,
        (None, None) => jiff::Zoned::now().date(),
    };

    let mut seen = HashSet::new();
    let mut users = Vec::with_capacity(payload.users.len());
    for user in &payload.users {
        if !seen.insert(user.id.as_str()) {
            return Err(ApiError::DuplicateUser(user.id.clone()));
        }
        users.push(UserInputs {
            user: UserId::new(user.id.clone()),
            parameters: build_parameters(&user.retirement, defaults),
            paycheck: build_paycheck(&user.id, &user.paycheck),
        });
    }

    let active_users = match &payload.active_users {
        None => users.iter().map(|u| u.user.clone()).collect(),
        Some(ids) => {
            let mut active = Vec::with_capacity(ids.len());
            for id in ids {
                if !seen.contains(id.as_str()) {
                    return Err(ApiError::UnknownActiveUser(id.clone()));
                }
                active.push(UserId::new(id.clone()));
            }
            active
        }
    };

    let portfolio_snapshots = payload
        .portfolio_snapshots
        .iter()
        .enumerate()
        .map(|(idx, snapshot)| build_snapshot(idx, snapshot))
        .collect::<ApiResult<Vec<_>>>()?;

    let performance = payload
        .performance
        .iter()
        .map(|p| PerformanceRecord {
            owner: UserId::new(p.owner.clone()),
            year: p.year.map_or(0, |y| whole(y) as i16),
            account_type: p.account_type.clone(),
            employer_match: p.employer_match.map(Cents::from_dollars),
        })
        .collect();

    Ok(Household {
        as_of,
        assumptions: build_assumptions(&payload.assumptions, defaults),
        users,
        active_users,
        portfolio_snapshots,
        performance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_number(&json!(4.5)), Some(4.5));
        assert_eq!(coerce_number(&json!("4.5")), Some(4.5));
        assert_eq!(coerce_number(&json!(" $100,000 ")), Some(100_000.0));
        assert_eq!(coerce_number(&json!("6%")), Some(6.0));
    }

    #[test]
    fn coerce_number_turns_garbage_into_zero() {
        assert_eq!(coerce_number(&json!("abc")), Some(0.0));
        assert_eq!(coerce_number(&json!("NaN")), Some(0.0));
        assert_eq!(coerce_number(&json!("inf")), Some(0.0));
        assert_eq!(coerce_number(&json!(true)), Some(0.0));
        assert_eq!(coerce_number(&json!({"a": 1})), Some(0.0));
    }

    #[test]
    fn coerce_number_treats_null_and_blank_as_absent() {
        assert_eq!(coerce_number(&Value::Null), None);
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!("   ")), None);
    }

    #[test]
    fn brokerage_list_accepts_mixed_entries() {
        let payload: PaycheckPayload = serde_json::from_value(json!({
            "brokerageMonthly": [100, "50", "oops", null]
        }))
        .expect("payload parses");
        assert_eq!(payload.brokerage_monthly, vec![100.0, 50.0, 0.0]);

        let single: PaycheckPayload =
            serde_json::from_value(json!({ "brokerageMonthly": "25" })).expect("payload parses");
        assert_eq!(single.brokerage_monthly, vec![25.0]);
    }

    #[test]
    fn unknown_enum_strings_fall_back() {
        let account: AccountPayload = serde_json::from_value(json!({
            "owner": "a",
            "accountType": "401k",
            "taxTreatment": "mystery"
        }))
        .expect("payload parses");
        assert_eq!(account.tax_treatment, Some(ApiTaxTreatment::Unknown));

        let paycheck: PaycheckPayload =
            serde_json::from_value(json!({ "payFrequency": "daily" })).expect("payload parses");
        assert_eq!(
            paycheck.pay_frequency.map(PayFrequency::from),
            Some(PayFrequency::Biweekly)
        );
    }

    #[test]
    fn unparsable_birthday_degrades_instead_of_failing() {
        let payload = PaycheckPayload {
            birthday: Some("not a date".to_string()),
            salary: Some(50_000.0),
            ..PaycheckPayload::default()
        };
        let profile = build_paycheck("a", &payload);
        assert!(profile.birthday.is_none());
        assert_eq!(profile.annual_salary, Some(Cents::dollars(50_000)));
    }

    #[test]
    fn ages_are_rounded_floored_and_capped() {
        assert_eq!(age("ageOfDeath", None, 90), 90);
        assert_eq!(age("ageOfDeath", Some(64.6), 90), 65);
        assert_eq!(age("ageOfDeath", Some(-3.0), 90), 0);
        assert_eq!(age("ageOfDeath", Some(40_000.0), 90), MAX_AGE);
        assert_eq!(age("ageOfDeath", Some(1e300), 90), MAX_AGE);
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let snapshot = SnapshotPayload {
            year: Some(2026.0),
            updated_at: "yesterday".to_string(),
            accounts: Vec::new(),
        };
        let err = build_snapshot(0, &snapshot).expect_err("must reject timestamp");
        assert!(err.to_string().contains("portfolioSnapshots[0].updatedAt"));
    }
}
