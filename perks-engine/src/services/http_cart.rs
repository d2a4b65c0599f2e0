//! REST cart store adapter
//!
//! JSON contract (camelCase bodies) under the configured base URL:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get | `GET /carts/{id}` |
//! | add_lines | `POST /carts/{id}/lines` `{ "lines": [...] }` |
//! | update_lines | `PATCH /carts/{id}/lines` `{ "lines": [...] }` |
//! | remove_lines | `POST /carts/{id}/lines/remove` `{ "lineIds": [...] }` |
//! | update_attributes | `PUT /carts/{id}/attributes` `{ "attributes": [...] }` |
//! | update_discount_codes | `PUT /carts/{id}/discount-codes` `{ "discountCodes": [...] }` |

use super::cart_store::CartStore;
use super::{http_client, status_error, transport_error};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::cart::{CartAttributes, CartLineInput, CartLineUpdateInput, CartMutation, CartSnapshot};
use shared::error::{AppError, AppResult, ErrorCode};
use std::time::Duration;

#[derive(Serialize)]
struct LinesBody<'a, T> {
    lines: &'a [T],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoveBody<'a> {
    line_ids: &'a [String],
}

#[derive(Serialize)]
struct AttributesBody<'a> {
    attributes: &'a CartAttributes,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscountCodesBody<'a> {
    discount_codes: &'a [String],
}

#[derive(Debug, Clone)]
pub struct HttpCartStore {
    client: Client,
    base_url: String,
}

impl HttpCartStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Cart ids are opaque (`gid://...?key=...`), so they travel as one encoded segment
    fn url(&self, cart_id: &str, suffix: &str) -> String {
        format!("{}/carts/{}{}", self.base_url, urlencoding::encode(cart_id), suffix)
    }

    async fn send<T, B>(&self, method: Method, url: String, body: Option<&B>) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%method, %url, %status, "Cart store request failed");
            return Err(status_error(status, text));
        }

        response.json().await.map_err(transport_error)
    }

    async fn mutate<B: Serialize + ?Sized>(
        &self,
        method: Method,
        cart_id: &str,
        suffix: &str,
        body: &B,
    ) -> AppResult<CartMutation> {
        self.send(method, self.url(cart_id, suffix), Some(body))
            .await
            .map_err(|e| cart_error(e, cart_id))
    }
}

/// Map a failed mutation onto cart error codes
///
/// A rejected request (4xx) is final, an unexpected status may be retried.
fn cart_error(err: AppError, cart_id: &str) -> AppError {
    match err.code {
        ErrorCode::NotFound => AppError::cart_not_found(cart_id),
        ErrorCode::InvalidRequest => {
            AppError::with_message(ErrorCode::CartUserError, err.message)
                .with_detail("cart_id", cart_id)
        }
        ErrorCode::InternalError => {
            AppError::cart_mutation(err.message).with_detail("cart_id", cart_id)
        }
        _ => err,
    }
}

#[async_trait]
impl CartStore for HttpCartStore {
    async fn get(&self, cart_id: &str) -> AppResult<CartSnapshot> {
        self.send::<CartSnapshot, ()>(Method::GET, self.url(cart_id, ""), None)
            .await
            .map_err(|e| match e.code {
                ErrorCode::NotFound => AppError::cart_not_found(cart_id),
                _ => e,
            })
    }

    async fn add_lines(&self, cart_id: &str, lines: &[CartLineInput]) -> AppResult<CartMutation> {
        self.mutate(Method::POST, cart_id, "/lines", &LinesBody { lines })
            .await
    }

    async fn update_lines(
        &self,
        cart_id: &str,
        lines: &[CartLineUpdateInput],
    ) -> AppResult<CartMutation> {
        self.mutate(Method::PATCH, cart_id, "/lines", &LinesBody { lines })
            .await
    }

    async fn remove_lines(&self, cart_id: &str, line_ids: &[String]) -> AppResult<CartMutation> {
        self.mutate(
            Method::POST,
            cart_id,
            "/lines/remove",
            &RemoveBody { line_ids },
        )
        .await
    }

    async fn update_attributes(
        &self,
        cart_id: &str,
        attributes: &CartAttributes,
    ) -> AppResult<CartMutation> {
        self.mutate(
            Method::PUT,
            cart_id,
            "/attributes",
            &AttributesBody { attributes },
        )
        .await
    }

    async fn update_discount_codes(
        &self,
        cart_id: &str,
        codes: &[String],
    ) -> AppResult<CartMutation> {
        self.mutate(
            Method::PUT,
            cart_id,
            "/discount-codes",
            &DiscountCodesBody {
                discount_codes: codes,
            },
        )
        .await
    }
}
