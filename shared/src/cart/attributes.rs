//! Line and cart attributes
//!
//! The wire format is a flat list of `{ key, value }` pairs. Reserved keys carry
//! engine semantics and are lifted into named fields; everything else is kept
//! verbatim in `extra` so a round trip never drops foreign attributes.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==================== Reserved keys (wire contract) ====================

/// Bundle display name shared by all lines of one bundle purchase
pub const BUNDLE_NAME_KEY: &str = "_BUNDLE_NAME";
/// Per-instance bundle identifier
pub const BUNDLE_ID_KEY: &str = "_BUNDLE_ID";
/// Marks an engine-injected free line (`"true"`)
pub const FREE_ITEM_KEY: &str = "_FREE_ITEM";
/// Product handle of the milestone that injected the free line
pub const FREE_ITEM_TYPE_KEY: &str = "_FREE_ITEM_TYPE";
/// Subtotal threshold that unlocked the free line
pub const FREE_ITEM_THRESHOLD_KEY: &str = "_FREE_ITEM_THRESHOLD";

/// Cart attribute carrying the free shipping flag (`"true"` / `"false"`)
pub const FREE_SHIPPING_KEY: &str = "__FREE_SHIPPING";
/// Cart attribute listing free item handles the shopper removed by hand
pub const DECLINED_FREE_ITEMS_KEY: &str = "__DECLINED_FREE_ITEMS";

const TRUE: &str = "true";
const FALSE: &str = "false";

/// Raw key/value attribute as exchanged with the cart store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// Trimmed value, `None` when empty
    fn non_empty_value(&self) -> Option<String> {
        let v = self.value_str().trim();
        (!v.is_empty()).then(|| v.to_string())
    }
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(TRUE)
}

/// Stringify a threshold the way it is stored on free lines ("100", "49.5")
pub fn format_threshold(threshold: Decimal) -> String {
    threshold.normalize().to_string()
}

// =============================================================================
// Line attributes
// =============================================================================

/// Typed view over a cart line's attribute list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Attribute>", into = "Vec<Attribute>")]
pub struct LineAttributes {
    pub bundle_name: Option<String>,
    pub bundle_id: Option<String>,
    pub free_item: bool,
    pub free_item_type: Option<String>,
    /// `None` when the tag is absent or not a number
    pub free_item_threshold: Option<Decimal>,
    /// Non-reserved attributes, preserved in order
    pub extra: Vec<Attribute>,
}

impl LineAttributes {
    /// Attributes for an engine-injected free line
    pub fn free_item(handle: impl Into<String>, threshold: Decimal) -> Self {
        Self {
            free_item: true,
            free_item_type: Some(handle.into()),
            free_item_threshold: Some(threshold),
            ..Self::default()
        }
    }

    /// Attributes for one line of a bundle purchase
    pub fn bundle(name: impl Into<String>, bundle_id: impl Into<String>) -> Self {
        Self {
            bundle_name: Some(name.into()),
            bundle_id: Some(bundle_id.into()),
            ..Self::default()
        }
    }

    pub fn is_free(&self) -> bool {
        self.free_item
    }

    /// Carries a bundle identity (free lines never count as bundle members)
    pub fn is_bundled(&self) -> bool {
        !self.free_item && (self.bundle_name.is_some() || self.bundle_id.is_some())
    }

    /// Key used to bucket bundle lines: the per-instance id, else the name
    pub fn bundle_key(&self) -> Option<&str> {
        if self.free_item {
            return None;
        }
        self.bundle_id.as_deref().or(self.bundle_name.as_deref())
    }

    /// Convert back to the wire list
    pub fn to_attributes(&self) -> Vec<Attribute> {
        self.clone().into()
    }
}

impl From<Vec<Attribute>> for LineAttributes {
    fn from(attrs: Vec<Attribute>) -> Self {
        let mut out = Self::default();
        for attr in attrs {
            match attr.key.as_str() {
                BUNDLE_NAME_KEY => out.bundle_name = attr.non_empty_value(),
                BUNDLE_ID_KEY => out.bundle_id = attr.non_empty_value(),
                FREE_ITEM_KEY if is_true(attr.value_str()) => out.free_item = true,
                FREE_ITEM_TYPE_KEY => out.free_item_type = attr.non_empty_value(),
                FREE_ITEM_THRESHOLD_KEY => {
                    match Decimal::from_str(attr.value_str().trim()) {
                        Ok(threshold) => out.free_item_threshold = Some(threshold),
                        Err(_) => {
                            tracing::debug!(
                                value = ?attr.value,
                                "Unparseable free item threshold, keeping raw attribute"
                            );
                            out.extra.push(attr);
                        }
                    }
                }
                _ => out.extra.push(attr),
            }
        }
        out
    }
}

impl From<LineAttributes> for Vec<Attribute> {
    fn from(attrs: LineAttributes) -> Self {
        let mut out = Vec::with_capacity(attrs.extra.len() + 5);
        if let Some(name) = attrs.bundle_name {
            out.push(Attribute::new(BUNDLE_NAME_KEY, name));
        }
        if let Some(id) = attrs.bundle_id {
            out.push(Attribute::new(BUNDLE_ID_KEY, id));
        }
        if attrs.free_item {
            out.push(Attribute::new(FREE_ITEM_KEY, TRUE));
        }
        if let Some(handle) = attrs.free_item_type {
            out.push(Attribute::new(FREE_ITEM_TYPE_KEY, handle));
        }
        if let Some(threshold) = attrs.free_item_threshold {
            out.push(Attribute::new(
                FREE_ITEM_THRESHOLD_KEY,
                format_threshold(threshold),
            ));
        }
        out.extend(attrs.extra);
        out
    }
}

// =============================================================================
// Cart attributes
// =============================================================================

/// Typed view over the cart-level attribute list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Attribute>", into = "Vec<Attribute>")]
pub struct CartAttributes {
    /// Stored `__FREE_SHIPPING`; absent is read as false
    pub free_shipping: Option<bool>,
    /// Handles from `__DECLINED_FREE_ITEMS`
    pub declined_free_items: BTreeSet<String>,
    pub extra: Vec<Attribute>,
}

impl CartAttributes {
    pub fn free_shipping_enabled(&self) -> bool {
        self.free_shipping == Some(true)
    }

    pub fn is_declined(&self, handle: &str) -> bool {
        self.declined_free_items.contains(handle)
    }

    /// Whether applying `update` would change anything
    pub fn differs(&self, update: &CartAttributeUpdate) -> bool {
        match update {
            CartAttributeUpdate::FreeShipping(desired) => self.free_shipping_enabled() != *desired,
            CartAttributeUpdate::DeclinedFreeItems(handles) => {
                &self.declined_free_items != handles
            }
        }
    }

    pub fn apply(&mut self, update: &CartAttributeUpdate) {
        match update {
            CartAttributeUpdate::FreeShipping(value) => self.free_shipping = Some(*value),
            CartAttributeUpdate::DeclinedFreeItems(handles) => {
                self.declined_free_items = handles.clone();
            }
        }
    }

    pub fn to_attributes(&self) -> Vec<Attribute> {
        self.clone().into()
    }
}

impl From<Vec<Attribute>> for CartAttributes {
    fn from(attrs: Vec<Attribute>) -> Self {
        let mut out = Self::default();
        for attr in attrs {
            match attr.key.as_str() {
                FREE_SHIPPING_KEY => match attr.value_str().trim() {
                    v if v.eq_ignore_ascii_case(TRUE) => out.free_shipping = Some(true),
                    v if v.eq_ignore_ascii_case(FALSE) => out.free_shipping = Some(false),
                    _ => out.extra.push(attr),
                },
                DECLINED_FREE_ITEMS_KEY => {
                    out.declined_free_items = attr
                        .value_str()
                        .split(',')
                        .map(str::trim)
                        .filter(|h| !h.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => out.extra.push(attr),
            }
        }
        out
    }
}

impl From<CartAttributes> for Vec<Attribute> {
    fn from(attrs: CartAttributes) -> Self {
        let mut out = Vec::with_capacity(attrs.extra.len() + 2);
        if let Some(free_shipping) = attrs.free_shipping {
            out.push(Attribute::new(
                FREE_SHIPPING_KEY,
                if free_shipping { TRUE } else { FALSE },
            ));
        }
        if !attrs.declined_free_items.is_empty() {
            let joined = attrs
                .declined_free_items
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            out.push(Attribute::new(DECLINED_FREE_ITEMS_KEY, joined));
        }
        out.extend(attrs.extra);
        out
    }
}

/// Typed cart attribute upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "attribute", content = "value", rename_all = "camelCase")]
pub enum CartAttributeUpdate {
    FreeShipping(bool),
    DeclinedFreeItems(BTreeSet<String>),
}

impl CartAttributeUpdate {
    pub fn key(&self) -> &'static str {
        match self {
            Self::FreeShipping(_) => FREE_SHIPPING_KEY,
            Self::DeclinedFreeItems(_) => DECLINED_FREE_ITEMS_KEY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(key: &str, value: &str) -> Attribute {
        Attribute::new(key, value)
    }

    #[test]
    fn test_parse_free_line_attributes() {
        let attrs = LineAttributes::from(vec![
            attr(FREE_ITEM_KEY, "true"),
            attr(FREE_ITEM_TYPE_KEY, "sunnies"),
            attr(FREE_ITEM_THRESHOLD_KEY, "100"),
        ]);
        assert!(attrs.is_free());
        assert!(!attrs.is_bundled());
        assert_eq!(attrs.free_item_type.as_deref(), Some("sunnies"));
        assert_eq!(attrs.free_item_threshold, Some(Decimal::ONE_HUNDRED));
        assert!(attrs.extra.is_empty());
    }

    #[test]
    fn test_free_item_flag_requires_true() {
        let attrs = LineAttributes::from(vec![attr(FREE_ITEM_KEY, "false")]);
        assert!(!attrs.is_free());
        // Preserved for the round trip
        assert_eq!(attrs.extra.len(), 1);
    }

    #[test]
    fn test_malformed_threshold_is_kept_raw() {
        let attrs = LineAttributes::from(vec![
            attr(FREE_ITEM_KEY, "true"),
            attr(FREE_ITEM_THRESHOLD_KEY, "one hundred"),
        ]);
        assert!(attrs.is_free());
        assert_eq!(attrs.free_item_threshold, None);
        let wire = attrs.to_attributes();
        assert!(wire.contains(&attr(FREE_ITEM_THRESHOLD_KEY, "one hundred")));
    }

    #[test]
    fn test_bundle_key_prefers_id() {
        let attrs = LineAttributes::bundle("Men's T-Shirt Bundle", "b-1");
        assert!(attrs.is_bundled());
        assert_eq!(attrs.bundle_key(), Some("b-1"));

        let name_only = LineAttributes {
            bundle_name: Some("Men's T-Shirt Bundle".to_string()),
            ..Default::default()
        };
        assert_eq!(name_only.bundle_key(), Some("Men's T-Shirt Bundle"));
    }

    #[test]
    fn test_free_line_never_bundled() {
        let mut attrs = LineAttributes::free_item("sunnies", Decimal::ONE_HUNDRED);
        attrs.bundle_id = Some("b-1".to_string());
        assert!(!attrs.is_bundled());
        assert_eq!(attrs.bundle_key(), None);
    }

    #[test]
    fn test_line_attributes_wire_json() {
        let json = r#"[
            {"key": "_BUNDLE_NAME", "value": "Men's T-Shirt Bundle"},
            {"key": "_BUNDLE_ID", "value": "abc"},
            {"key": "gift_note", "value": "hi"}
        ]"#;
        let attrs: LineAttributes = serde_json::from_str(json).unwrap();
        assert_eq!(attrs.bundle_id.as_deref(), Some("abc"));
        assert_eq!(attrs.extra, vec![attr("gift_note", "hi")]);

        let back = serde_json::to_value(&attrs).unwrap();
        assert_eq!(back.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_threshold_formatting() {
        let attrs = LineAttributes::free_item("front-pack", Decimal::new(15000, 2));
        let wire = attrs.to_attributes();
        assert!(wire.contains(&attr(FREE_ITEM_THRESHOLD_KEY, "150")));
        assert!(wire.contains(&attr(FREE_ITEM_KEY, "true")));
    }

    #[test]
    fn test_cart_attributes_absent_shipping_is_false() {
        let attrs = CartAttributes::from(vec![]);
        assert_eq!(attrs.free_shipping, None);
        assert!(!attrs.free_shipping_enabled());
        assert!(!attrs.differs(&CartAttributeUpdate::FreeShipping(false)));
        assert!(attrs.differs(&CartAttributeUpdate::FreeShipping(true)));
    }

    #[test]
    fn test_cart_attributes_declined_list() {
        let attrs = CartAttributes::from(vec![attr(DECLINED_FREE_ITEMS_KEY, "sunnies, front-pack,")]);
        assert!(attrs.is_declined("sunnies"));
        assert!(attrs.is_declined("front-pack"));
        assert_eq!(attrs.declined_free_items.len(), 2);

        let wire = attrs.to_attributes();
        assert_eq!(wire, vec![attr(DECLINED_FREE_ITEMS_KEY, "front-pack,sunnies")]);
    }

    #[test]
    fn test_cart_attributes_apply_update() {
        let mut attrs = CartAttributes::from(vec![attr(FREE_SHIPPING_KEY, "false"), attr("note", "x")]);
        attrs.apply(&CartAttributeUpdate::FreeShipping(true));
        let wire = attrs.to_attributes();
        assert_eq!(wire[0], attr(FREE_SHIPPING_KEY, "true"));
        assert_eq!(wire[1], attr("note", "x"));
    }
}
