//! Human-readable reconstruction of the loan formula.
//!
//! The calculation service is the authority on the amount. Everything here is
//! derived from the submitted inputs and the returned amount purely for display.

use crate::form::{format_currency, LoanRequest, PropertyType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FicoBand {
    pub label: &'static str,
    pub min: u16,
    pub max: u16,
    pub multiplier: f64,
}

pub static FICO_BANDS: [FicoBand; 5] = [
    FicoBand { label: "Poor", min: 300, max: 579, multiplier: 0.5 },
    FicoBand { label: "Fair", min: 580, max: 669, multiplier: 0.7 },
    FicoBand { label: "Good", min: 670, max: 739, multiplier: 0.9 },
    FicoBand { label: "Very Good", min: 740, max: 799, multiplier: 1.0 },
    FicoBand { label: "Exceptional", min: 800, max: 850, multiplier: 1.1 },
];

pub const DEFAULT_MULTIPLIER: f64 = 1.0;

pub fn fico_band(score: u16) -> Option<&'static FicoBand> {
    FICO_BANDS.iter().find(|band| (band.min..=band.max).contains(&score))
}

/// Scores outside every band, and a missing score, keep the default multiplier.
pub fn fico_multiplier(score: Option<u16>) -> f64 {
    score
        .and_then(fico_band)
        .map_or(DEFAULT_MULTIPLIER, |band| band.multiplier)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Explanation {
    pub formula: String,
    pub explanation: String,
}

pub fn explain(snapshot: &LoanRequest, loan_amount: f64) -> Explanation {
    let multiplier = fico_multiplier(snapshot.fico_score);

    let (base, fragment) = match &snapshot.property_type {
        PropertyType::Residential => (
            format!(
                "0.8 * min({}, {})",
                snapshot.property_value, snapshot.purchase_price
            ),
            format!(
                "For residential, we take 80% of the lower between property value (${}) and purchase price (${}).",
                snapshot.property_value, snapshot.purchase_price
            ),
        ),
        PropertyType::FixAndFlip => (
            format!("0.7 * {}", snapshot.arv),
            format!("For fix-and-flip, we take 70% of ARV (${}).", snapshot.arv),
        ),
        PropertyType::Construction => (
            format!("0.85 * {}", snapshot.construction_cost),
            format!(
                "For construction, we take 85% of construction cost (${}).",
                snapshot.construction_cost
            ),
        ),
        PropertyType::Other(_) => (String::new(), String::new()),
    };

    let rule = format!(
        "The FICO multiplier is {multiplier}. Final loan amount is base * multiplier."
    );
    let explanation = if fragment.is_empty() {
        rule
    } else {
        format!("{fragment} {rule}")
    };

    Explanation {
        formula: format!("({base}) * {multiplier} = {:.2}", round_cents(loan_amount)),
        explanation,
    }
}

// Ties go away from zero, so 1000.125 shows as 1000.13.
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Formats an amount with thousands separators and two decimals, e.g. `220,500.00`.
pub fn format_loan_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", round_cents(amount).abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{}.{cents}", format_currency(whole))
}

/// Reference text describing how each product is sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationNote {
    pub title: &'static str,
    pub formula: &'static str,
    pub uses: &'static str,
    pub ignores: &'static str,
}

pub fn calculation_note(property_type: &PropertyType) -> Option<CalculationNote> {
    let note = match property_type {
        PropertyType::Residential => CalculationNote {
            title: "Residential",
            formula: "0.8 * min(Property Value, Purchase Price) * FICO Multiplier",
            uses: "Property Value and Purchase Price; the lower of the two is selected.",
            ignores: "Construction Cost and After-Repair Value (ARV).",
        },
        PropertyType::FixAndFlip => CalculationNote {
            title: "Fix and Flip",
            formula: "0.7 * ARV * FICO Multiplier",
            uses: "ARV (After-Repair Value), the property's estimated value after renovations.",
            ignores: "Property Value, Purchase Price, and Construction Cost.",
        },
        PropertyType::Construction => CalculationNote {
            title: "Construction",
            formula: "0.85 * Construction Cost * FICO Multiplier",
            uses: "Construction Cost, which covers building expenses.",
            ignores: "Property Value, Purchase Price, and ARV.",
        },
        PropertyType::Other(_) => return None,
    };
    Some(note)
}

pub fn calculation_notes() -> Vec<CalculationNote> {
    PropertyType::OPTIONS
        .iter()
        .filter_map(calculation_note)
        .collect()
}
