use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

const SORT_TYPE_RELEVANCE: u8 = 0;

/// Catalog identifiers come back as numbers, but older entries in a seen
/// file may hold strings. Both compare by exact value.
#[derive(Serialize, Deserialize, Display, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum ItemId {
    #[display("{_0}")]
    Number(i64),
    #[display("{_0}")]
    Text(String),
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Number(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Text(id.to_string())
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub category: String,
    pub limit: u32,
    pub sort_type: u8,
}

impl SearchQuery {
    pub fn new(category: impl Into<String>, limit: u32) -> Self {
        Self {
            category: category.into(),
            limit,
            sort_type: SORT_TYPE_RELEVANCE,
        }
    }
}

/// Reference returned by a search, echoed back verbatim to the details endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemReference {
    pub item_type: Value,
    pub id: ItemId,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub id: ItemId,
    #[serde(default)]
    pub price: Option<Number>,
    #[serde(default)]
    pub price_tickets: Option<Number>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub creator_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_restrictions: Vec<String>,
    #[serde(default)]
    pub offsale_deadline: Option<String>,
}

impl ItemDetail {
    /// Robux price if set, otherwise the ticket price. `None` means free.
    pub fn resolved_price(&self) -> Option<&Number> {
        [&self.price, &self.price_tickets]
            .into_iter()
            .flatten()
            .find(|n| !is_zero(n))
    }
}

/// The catalog sends `null` for unset fields on some items.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero(n: &Number) -> bool {
    n.as_f64() == Some(0.0)
}

#[derive(Serialize)]
pub(crate) struct DetailsRequest<'a> {
    pub items: &'a [ItemReference],
}

#[derive(Deserialize)]
pub(crate) struct DataResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}
