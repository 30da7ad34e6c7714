use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label shown instead of a total when a draft has no line items
pub const EMPTY_DRAFT_LABEL: &str = "No items added";

const DEFAULT_SENDER_NAME: &str = "Your Business";
const DRAFTING_HEADING: &str = "Drafting...";

/// Invoice produced by the AI backend and edited through the chat
///
/// Every field is optional on the wire: drafts arrive incrementally and must
/// render without errors at any point. Derived amounts are never stored; use
/// [`InvoiceDocument::totals`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub sender: Party,
    #[serde(default)]
    pub client: Party,
    /// Flat client name some drafts send instead of `client.name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(default)]
    pub items: Vec<LineItem>,

    /// Percentage in `0..=100`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
    /// Absolute currency amount subtracted after tax
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One billable row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    /// Missing on the wire means one unit; an explicit `null` counts as zero
    #[serde(default = "default_quantity", alias = "hours")]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub rate: Option<f64>,
}

fn default_quantity() -> Option<f64> {
    Some(1.0)
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, rate: f64) -> Self {
        Self {
            description: description.into(),
            quantity: Some(quantity),
            rate: Some(rate),
        }
    }

    pub fn line_total(&self) -> f64 {
        saturate(amount(self.quantity) * amount(self.rate))
    }
}

/// Derived financial summary of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub line_totals: Vec<f64>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub discount: f64,
    pub total: f64,
    /// No line items at all, as opposed to a zero-cost invoice
    pub is_empty: bool,
}

impl Totals {
    /// Text for the total line of the rendered invoice
    pub fn total_label(&self) -> String {
        if self.is_empty {
            EMPTY_DRAFT_LABEL.to_string()
        } else {
            format_currency(self.total)
        }
    }
}

/// Derive totals from a possibly partial document
///
/// Absent and non-finite inputs count as zero before any arithmetic. Every
/// intermediate saturates at [`MAX_AMOUNT`], so the result is always finite
/// and `total == subtotal + tax_amount - discount` holds exactly.
pub fn compute_totals(doc: &InvoiceDocument) -> Totals {
    let line_totals: Vec<f64> = doc.items.iter().map(LineItem::line_total).collect();
    let subtotal = line_totals.iter().fold(0.0, |acc, line| saturate(acc + line));
    let tax_amount = saturate(subtotal * (amount(doc.tax_rate) / 100.0));
    let discount = saturate(amount(doc.discount));
    let total = subtotal + tax_amount - discount;

    Totals {
        line_totals,
        subtotal,
        tax_amount,
        discount,
        total,
        is_empty: doc.items.is_empty(),
    }
}

/// `$1,234.50` style rendering with two decimals
pub fn format_currency(value: f64) -> String {
    let value = finite_or_zero(value);
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingClientName,
    TaxRateOutOfRange,
    NegativeDiscount,
    InvalidQuantity,
    InvalidRate,
    EmptyDescription,
    DueBeforeIssue,
}

/// A schema violation that does not prevent rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub kind: IssueKind,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    pub fn message(&self) -> String {
        match self.kind {
            IssueKind::MissingClientName => "client name is required".to_string(),
            IssueKind::TaxRateOutOfRange => "tax rate must be between 0 and 100".to_string(),
            IssueKind::NegativeDiscount => "discount cannot be negative".to_string(),
            IssueKind::InvalidQuantity => format!("{} must be a non-negative number", self.field),
            IssueKind::InvalidRate => format!("{} must be a non-negative number", self.field),
            IssueKind::EmptyDescription => format!("{} is empty", self.field),
            IssueKind::DueBeforeIssue => "due date precedes issue date".to_string(),
        }
    }
}

impl InvoiceDocument {
    pub fn totals(&self) -> Totals {
        compute_totals(self)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `client.name`, falling back to the flat `clientName`
    pub fn client_display_name(&self) -> Option<&str> {
        non_blank(self.client.name.as_deref()).or_else(|| non_blank(self.client_name.as_deref()))
    }

    /// Client name, or a drafting placeholder while the AI fills it in
    pub fn heading(&self) -> &str {
        self.client_display_name().unwrap_or(DRAFTING_HEADING)
    }

    pub fn sender_name(&self) -> &str {
        non_blank(self.sender.name.as_deref()).unwrap_or(DEFAULT_SENDER_NAME)
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if self.client_display_name().is_none() {
            issues.push(ValidationIssue::new("client.name", IssueKind::MissingClientName));
        }

        if let Some(rate) = self.tax_rate {
            if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                issues.push(ValidationIssue::new("taxRate", IssueKind::TaxRateOutOfRange));
            }
        }

        if let Some(discount) = self.discount {
            if !discount.is_finite() || discount < 0.0 {
                issues.push(ValidationIssue::new("discount", IssueKind::NegativeDiscount));
            }
        }

        if let (Some(issued), Some(due)) = (self.issue_date, self.due_date) {
            if due < issued {
                issues.push(ValidationIssue::new("dueDate", IssueKind::DueBeforeIssue));
            }
        }

        for (i, item) in self.items.iter().enumerate() {
            if item.description.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    format!("items[{}].description", i),
                    IssueKind::EmptyDescription,
                ));
            }
            if !is_valid_amount(item.quantity) {
                issues.push(ValidationIssue::new(
                    format!("items[{}].quantity", i),
                    IssueKind::InvalidQuantity,
                ));
            }
            if !is_valid_amount(item.rate) {
                issues.push(ValidationIssue::new(
                    format!("items[{}].rate", i),
                    IssueKind::InvalidRate,
                ));
            }
        }

        issues
    }
}

fn amount(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Ceiling for any derived amount; three of them still sum without overflow
pub const MAX_AMOUNT: f64 = f64::MAX / 4.0;

fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-MAX_AMOUNT, MAX_AMOUNT)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// Absent is fine (defaults to zero); present must be finite and >= 0
fn is_valid_amount(value: Option<f64>) -> bool {
    value.map_or(true, |v| v.is_finite() && v >= 0.0)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
