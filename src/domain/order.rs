//! Order data returned by the merch API.

use super::grouping::group_by;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A band the authenticated account can manage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub subdomain: String,
    pub name: String,
    pub band_id: u64,
}

/// One purchased item within an order.
///
/// Line items bought in the same checkout share a `payment_id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderLineItem {
    pub payment_id: u64,
    pub sale_item_id: u64,
    pub item_name: String,
    pub option: Option<String>,
    pub option_id: Option<u64>,
    pub quantity: u32,
    pub sku: Option<String>,
    pub artist: Option<String>,
    pub item_url: Option<String>,
    pub selling_band_url: Option<String>,
    pub package_id: Option<u64>,

    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_phone: Option<String>,
    pub buyer_note: Option<String>,
    pub paypal_id: Option<String>,

    pub ship_to_name: Option<String>,
    pub ship_to_street: Option<String>,
    pub ship_to_street_2: Option<String>,
    pub ship_to_city: Option<String>,
    pub ship_to_state: Option<String>,
    pub ship_to_zip: Option<String>,
    pub ship_to_country: Option<String>,
    pub ship_to_country_code: Option<String>,
    pub ship_from_country_name: Option<String>,
    pub ship_notes: Option<String>,
    pub ship_date: Option<String>,

    pub payment_state: Option<String>,
    pub order_date: Option<String>,
    pub discount_code: Option<String>,
    pub currency: Option<String>,
    pub sub_total: Option<f64>,
    pub shipping: Option<f64>,
    pub tax: Option<f64>,
    pub order_total: Option<f64>,
}

impl OrderLineItem {
    /// Convenience constructor for the fields printed on a label.
    pub fn new(payment_id: u64, item_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            payment_id,
            item_name: item_name.into(),
            quantity,
            ..Default::default()
        }
    }

    /// Sets the variant option (size, colour, ...).
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }
}

/// All line items of a run, keyed by payment id.
pub type OrdersByPayment = IndexMap<u64, Vec<OrderLineItem>>;

/// Groups line items by their payment id.
pub fn group_by_payment_id(items: impl IntoIterator<Item = OrderLineItem>) -> OrdersByPayment {
    group_by(items, |item| item.payment_id)
}
