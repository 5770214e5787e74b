use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Board {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct List {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Swimlane {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
}

/// Board-scoped custom field definition. Values live on cards as
/// `(fieldId, rawValue)` pairs; the name only exists here.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldDef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
}
