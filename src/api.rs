use serde::Serialize;

use crate::model::Coordinate;

pub const ENDPOINTS: &[&str] = &[
    "POST /addSchool",
    "GET /listSchools?latitude=<lat>&longitude=<lon>",
    "GET /school/:id",
    "PUT /school/:id",
    "DELETE /school/:id",
    "GET /health",
];

#[derive(Debug, Default)]
pub struct LocationParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl LocationParams {
    /// Builds the params from raw query pairs. A repeated key keeps its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = LocationParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "latitude" => &mut params.latitude,
                "longitude" => &mut params.longitude,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}


/// Envelope wrapped around every response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct APIResponse<T = ()> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_endpoints: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> APIResponse<T> {
    fn base(success: bool, msg: &str) -> Self {
        APIResponse {
            success,
            message: msg.to_owned(),
            data: None,
            count: None,
            user_location: None,
            timestamp: None,
            database: None,
            available_endpoints: None,
            error: None,
        }
    }

    pub fn new_with_data(msg: &str, data: T) -> Self {
        APIResponse {
            data: Some(data),
            ..Self::base(true, msg)
        }
    }
}

impl APIResponse {
    pub fn new_from_msg(msg: &str) -> Self {
        Self::base(true, msg)
    }

    pub fn failure(msg: &str) -> Self {
        Self::base(false, msg)
    }
}
