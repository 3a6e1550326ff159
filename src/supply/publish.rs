//! Renders a snapshot the way supply consumers expect it. Amounts are plain decimal strings in wei.
use serde::Serialize;

use crate::network_profile::ResponseEnvelope;

use super::SupplySnapshot;

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct FlatSupplyResponse {
    pub circulating_supply: String,
    pub total_supply: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TotalSupplyData {
    pub total_supply: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct WrappedSupplyResponse {
    pub status: &'static str,
    pub data: TotalSupplyData,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SupplyResponse {
    Flat(FlatSupplyResponse),
    Wrapped(WrappedSupplyResponse),
}

pub fn render(snapshot: &SupplySnapshot, envelope: ResponseEnvelope) -> SupplyResponse {
    match envelope {
        ResponseEnvelope::Flat => SupplyResponse::Flat(FlatSupplyResponse {
            circulating_supply: snapshot.circulating_supply().to_string(),
            total_supply: snapshot.total_supply().to_string(),
        }),
        ResponseEnvelope::Wrapped => SupplyResponse::Wrapped(WrappedSupplyResponse {
            status: "OK",
            data: TotalSupplyData {
                total_supply: snapshot.total_supply().to_string(),
            },
        }),
    }
}
