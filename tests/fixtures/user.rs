/// Someone who posts listings.
/// @document
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct User {
    pub id: String,
    pub title: String,
    pub amount: Option<f64>,
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub visits: i64,
    pub active: bool,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Address {
    pub street: String,
}
