use delay_model::FlightRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightData {
    #[serde(rename = "OPERA")]
    pub opera: String,
    #[serde(rename = "TIPOVUELO")]
    pub tipo_vuelo: String,
    #[serde(rename = "MES")]
    pub mes: i64,
}

impl From<FlightData> for FlightRecord {
    fn from(f: FlightData) -> Self {
        FlightRecord::new(f.opera, f.tipo_vuelo, f.mes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub flights: Vec<FlightData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predict: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// One request validation failure. `loc` is the path into the request,
/// starting at `"body"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}
