//! Form state for the loan calculator.
//!
//! Currency inputs are kept as the comma-grouped strings the user sees and are
//! only turned into integers when a snapshot is taken for submission.

use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PropertyValue,
    FicoScore,
    ConstructionCost,
    PurchasePrice,
    Arv,
    PropertyType,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::PropertyValue,
        Field::FicoScore,
        Field::ConstructionCost,
        Field::PurchasePrice,
        Field::Arv,
        Field::PropertyType,
    ];

    /// Wire name of the field in the calculation payload.
    pub fn name(&self) -> &'static str {
        match self {
            Field::PropertyValue => "propertyValue",
            Field::FicoScore => "ficoScore",
            Field::ConstructionCost => "constructionCost",
            Field::PurchasePrice => "purchasePrice",
            Field::Arv => "arv",
            Field::PropertyType => "propertyType",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::PropertyValue => "Property Value",
            Field::FicoScore => "FICO Score",
            Field::ConstructionCost => "Construction Cost",
            Field::PurchasePrice => "Purchase Price",
            Field::Arv => "After-Repair Value (ARV)",
            Field::PropertyType => "Property Type",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Field::PropertyValue => "e.g., 300,000",
            Field::ConstructionCost => "e.g., 100,000",
            Field::PurchasePrice => "e.g., 250,000",
            Field::Arv => "e.g., 350,000",
            Field::FicoScore | Field::PropertyType => "",
        }
    }

    pub fn is_currency(&self) -> bool {
        !matches!(self, Field::FicoScore | Field::PropertyType)
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Loan product the borrower is applying for.
///
/// `Other` keeps any selector value that is not one of the known products so
/// that it can be forwarded to the service untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PropertyType {
    #[default]
    Residential,
    FixAndFlip,
    Construction,
    Other(String),
}

impl PropertyType {
    pub const OPTIONS: [PropertyType; 3] = [
        PropertyType::Residential,
        PropertyType::FixAndFlip,
        PropertyType::Construction,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Residential => "residential",
            PropertyType::FixAndFlip => "fixAndFlip",
            PropertyType::Construction => "construction",
            PropertyType::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PropertyType::Residential => "Residential (80%)",
            PropertyType::FixAndFlip => "Fix and Flip (70%)",
            PropertyType::Construction => "Construction (85%)",
            PropertyType::Other(raw) => raw,
        }
    }

    fn cycle(&self, forward: bool) -> Self {
        let len = Self::OPTIONS.len();
        let next = match Self::OPTIONS.iter().position(|o| o == self) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        Self::OPTIONS[next].clone()
    }
}

impl From<&str> for PropertyType {
    fn from(raw: &str) -> Self {
        match raw {
            "residential" => PropertyType::Residential,
            "fixAndFlip" => PropertyType::FixAndFlip,
            "construction" => PropertyType::Construction,
            other => PropertyType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PropertyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FicoOption {
    pub label: &'static str,
    pub value: u16,
}

/// The only scores the FICO selector offers, one per risk band.
pub static FICO_OPTIONS: [FicoOption; 5] = [
    FicoOption { label: "Poor (300 - 579)", value: 500 },
    FicoOption { label: "Fair (580 - 669)", value: 625 },
    FicoOption { label: "Good (670 - 739)", value: 705 },
    FicoOption { label: "Very Good (740 - 799)", value: 770 },
    FicoOption { label: "Exceptional (800 - 850)", value: 825 },
];

pub const FICO_UNSELECTED_LABEL: &str = "Select FICO Range";

pub fn fico_option(value: u16) -> Option<&'static FicoOption> {
    FICO_OPTIONS.iter().find(|o| o.value == value)
}

/// Strips every non-digit and re-inserts a `,` every three digits from the right.
pub fn format_currency(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*digit);
    }
    formatted
}

/// Parses a comma-grouped amount. Anything unparseable counts as 0.
pub fn parse_currency(formatted: &str) -> u64 {
    formatted.replace(',', "").trim().parse().unwrap_or(0)
}

/// Sanitized form contents, as sent to the calculation service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub property_value: u64,
    pub fico_score: Option<u16>,
    pub construction_cost: u64,
    pub purchase_price: u64,
    pub arv: u64,
    pub property_type: PropertyType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanForm {
    property_value: String,
    fico_score: Option<u16>,
    construction_cost: String,
    purchase_price: String,
    arv: String,
    property_type: PropertyType,
}

impl LoanForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a raw edit to `field` and returns the updated form.
    ///
    /// Currency fields store the formatted string. The FICO field only accepts
    /// an empty value or one of [`FICO_OPTIONS`]; anything else is ignored.
    pub fn on_field_change(&mut self, field: Field, raw: &str) -> &Self {
        match field {
            Field::FicoScore => {
                let raw = raw.trim();
                if raw.is_empty() {
                    self.fico_score = None;
                } else if let Some(option) = raw.parse().ok().and_then(fico_option) {
                    self.fico_score = Some(option.value);
                } else {
                    debug!(value = raw, "ignoring FICO score outside the offered ranges");
                }
            }
            Field::PropertyType => self.property_type = PropertyType::from(raw),
            Field::PropertyValue => self.property_value = format_currency(raw),
            Field::ConstructionCost => self.construction_cost = format_currency(raw),
            Field::PurchasePrice => self.purchase_price = format_currency(raw),
            Field::Arv => self.arv = format_currency(raw),
        }
        debug!(field = field.name(), value = %self.raw_value(field), "field changed");
        self
    }

    /// Value as it is stored for `field`: the formatted amount, the FICO score
    /// digits, or the property type's wire name.
    pub fn raw_value(&self, field: Field) -> String {
        match field {
            Field::FicoScore => self.fico_score.map(|v| v.to_string()).unwrap_or_default(),
            Field::PropertyType => self.property_type.as_str().to_string(),
            currency => self.currency(currency).to_string(),
        }
    }

    pub fn display_value(&self, field: Field) -> String {
        match field {
            Field::FicoScore => self
                .fico_score
                .and_then(fico_option)
                .map_or(FICO_UNSELECTED_LABEL, |o| o.label)
                .to_string(),
            Field::PropertyType => self.property_type.label().to_string(),
            currency => self.currency(currency).to_string(),
        }
    }

    /// Drops the last digit of a currency field.
    pub fn backspace(&mut self, field: Field) {
        if !field.is_currency() {
            return;
        }
        let mut digits: String = self
            .currency(field)
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        digits.pop();
        self.on_field_change(field, &digits);
    }

    /// Moves a selector field to its next (or previous) option.
    pub fn cycle(&mut self, field: Field, forward: bool) {
        match field {
            Field::FicoScore => {
                let position = self
                    .fico_score
                    .and_then(|v| FICO_OPTIONS.iter().position(|o| o.value == v));
                // Index 0 is the unselected state.
                let slots = FICO_OPTIONS.len() + 1;
                let current = position.map_or(0, |i| i + 1);
                let next = if forward {
                    (current + 1) % slots
                } else {
                    (current + slots - 1) % slots
                };
                let raw = match next {
                    0 => String::new(),
                    i => FICO_OPTIONS[i - 1].value.to_string(),
                };
                self.on_field_change(field, &raw);
            }
            Field::PropertyType => {
                let next = self.property_type.cycle(forward);
                self.on_field_change(field, next.as_str());
            }
            _ => {}
        }
    }

    pub fn fico_score(&self) -> Option<u16> {
        self.fico_score
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    pub fn snapshot(&self) -> LoanRequest {
        LoanRequest {
            property_value: parse_currency(&self.property_value),
            fico_score: self.fico_score,
            construction_cost: parse_currency(&self.construction_cost),
            purchase_price: parse_currency(&self.purchase_price),
            arv: parse_currency(&self.arv),
            property_type: self.property_type.clone(),
        }
    }

    fn currency(&self, field: Field) -> &str {
        match field {
            Field::PropertyValue => &self.property_value,
            Field::ConstructionCost => &self.construction_cost,
            Field::PurchasePrice => &self.purchase_price,
            Field::Arv => &self.arv,
            Field::FicoScore | Field::PropertyType => "",
        }
    }
}
