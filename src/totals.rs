use serde::Serialize;

use crate::schema::{DEFAULT_CURRENCY, DocumentForm, LineItem};

/// Amounts printed in the footer of the last page.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub currency: String,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub discount: f64,
    pub total: f64,
}

impl Totals {
    pub fn compute(form: &DocumentForm) -> Self {
        let subtotal = subtotal(&form.items);
        let tax_rate = form.settings.tax_rate;
        let tax_amount = subtotal * tax_rate / 100.0;
        let discount = form.settings.discount;

        Self {
            currency: display_currency(&form.items).to_string(),
            subtotal,
            tax_rate,
            tax_amount,
            discount,
            total: subtotal + tax_amount - discount,
        }
    }
}

/// Sum of quantity x price. This is also the figure stored as a record's
/// `totalAmount`; tax and discount only affect the printed total.
pub fn subtotal(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::amount).sum()
}

/// Footer amounts are shown in the first item's currency.
pub fn display_currency(items: &[LineItem]) -> &str {
    items
        .first()
        .map(|item| item.currency.trim())
        .filter(|currency| !currency.is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
}

pub fn format_amount(currency: &str, amount: f64) -> String {
    format!("{currency} {amount:.2}")
}
