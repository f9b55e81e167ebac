//! Client for the Bandcamp merch API.
//!
//! [`BandcampApi`] wraps an [`AuthenticatedClient`] and exposes the three
//! endpoints the label pipeline needs: the account's bands, merch details
//! and the order list.

pub mod auth;
pub mod token;
pub mod transport;

pub use auth::{AuthenticatedClient, ClientCredentials, Grant};
pub use token::{FileTokenStore, MemoryTokenStore, OauthToken, TokenStore};
pub use transport::{HttpRequest, HttpResponse, RequestBody, Transport, UreqTransport};

use crate::config::{Credentials, EPOCH_START};
use crate::domain::{Band, OrderLineItem};
use crate::error::{LabelError, LabelResult};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

const MY_BANDS_PATH: &str = "api/account/1/my_bands";
const MERCH_DETAILS_PATH: &str = "api/merchorders/1/get_merch_details";
const ORDERS_PATH: &str = "api/merchorders/3/get_orders";

/// Filter for the order listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub band_id: u64,
    pub unshipped_only: bool,
    pub start_time: Option<String>,
}

impl OrderQuery {
    /// Unshipped orders of a band.
    pub fn new(band_id: u64) -> Self {
        Self {
            band_id,
            unshipped_only: true,
            start_time: None,
        }
    }

    pub fn unshipped_only(mut self, unshipped_only: bool) -> Self {
        self.unshipped_only = unshipped_only;
        self
    }

    pub fn start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("unshipped_only".to_string(), json!(self.unshipped_only));
        if let Some(start_time) = &self.start_time {
            body.insert("start_time".to_string(), json!(start_time));
        }
        body.insert("band_id".to_string(), json!(self.band_id));
        Value::Object(body)
    }
}

/// Typed access to the merch endpoints.
pub struct BandcampApi<T, S> {
    client: AuthenticatedClient<T, S>,
}

impl BandcampApi<UreqTransport, FileTokenStore> {
    /// Connects over HTTP with the token cached in `tokens`.
    pub fn connect(base_url: &str, credentials: &Credentials, tokens: FileTokenStore) -> Self {
        Self::new(AuthenticatedClient::new(
            base_url,
            ClientCredentials::new(&credentials.id, &credentials.secret),
            UreqTransport::new(),
            tokens,
        ))
    }
}

impl<T: Transport, S: TokenStore> BandcampApi<T, S> {
    pub fn new(client: AuthenticatedClient<T, S>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AuthenticatedClient<T, S> {
        &self.client
    }

    /// Bands the account can manage.
    pub fn my_bands(&self) -> LabelResult<Vec<Band>> {
        let response = self.client.post_json(MY_BANDS_PATH, json!({}))?;
        field(response, "bands", MY_BANDS_PATH)
    }

    /// Merch items of a band, as returned by the API.
    pub fn merch_details(&self, band_id: u64, start_time: Option<&str>) -> LabelResult<Vec<Value>> {
        let body = json!({
            "band_id": band_id,
            "start_time": start_time.unwrap_or(EPOCH_START),
        });
        let response = self.client.post_json(MERCH_DETAILS_PATH, body)?;
        field(response, "items", MERCH_DETAILS_PATH)
    }

    /// Order line items matching the query.
    pub fn orders(&self, query: &OrderQuery) -> LabelResult<Vec<OrderLineItem>> {
        log::info!(
            "fetching {} orders of band {}",
            if query.unshipped_only { "unshipped" } else { "all" },
            query.band_id
        );
        let response = self.client.post_json(ORDERS_PATH, query.to_body())?;
        let items: Vec<OrderLineItem> = field(response, "items", ORDERS_PATH)?;
        log::info!("fetched {} order line items", items.len());
        Ok(items)
    }
}

fn field<D: DeserializeOwned>(mut response: Value, key: &str, endpoint: &str) -> LabelResult<D> {
    let value = response.get_mut(key).map(Value::take).ok_or_else(|| LabelError::InvalidInput {
        parameter: endpoint.to_string(),
        reason: format!("response has no '{}' field", key),
    })?;
    serde_json::from_value(value).map_err(|e| LabelError::json(format!("decoding {}", endpoint), e))
}
