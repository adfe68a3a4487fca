use strum_macros::{Display, EnumString};

/// Catalog endpoints, relative to the base URL
#[derive(EnumString, Display, Copy, Clone, Debug)]
pub enum Endpoint {
    #[strum(serialize = "apisite/catalog/v1/search/items")]
    SearchItems,
    #[strum(serialize = "apisite/catalog/v1/catalog/items/details")]
    ItemDetails,
}
