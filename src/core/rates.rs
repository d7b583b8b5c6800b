use super::money::Rate;
use super::types::ReturnModel;

const GLIDE_ANCHOR_AGE: u32 = 20;
/// 10% at the anchor age.
const GLIDE_ANCHOR_RATE: Rate = Rate::from_micros(100_000);
/// 0.1 percentage point per year of age.
const GLIDE_STEP: Rate = Rate::from_micros(1_000);

/// Expected return for the year the user turns `age`.
pub fn return_rate(age: u32, retirement_age: u32, retirement_rate: Rate) -> Rate {
    if age >= retirement_age {
        return retirement_rate;
    }
    let years_past_anchor = age as i64 - GLIDE_ANCHOR_AGE as i64;
    let glide = Rate::from_micros(GLIDE_ANCHOR_RATE.micros() - GLIDE_STEP.micros() * years_past_anchor);
    glide.max(retirement_rate)
}

pub fn modeled_return_rate(
    model: ReturnModel,
    age: u32,
    retirement_age: u32,
    retirement_rate: Rate,
) -> Rate {
    match model {
        ReturnModel::GlidePath => return_rate(age, retirement_age, retirement_rate),
        ReturnModel::Flat => retirement_rate,
    }
}
