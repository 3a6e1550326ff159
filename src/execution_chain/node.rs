//! Reads account balances from an execution node over JSON-RPC.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use num_bigint::BigUint;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{performance::TimedExt, sources::AddressBalanceIndex, units::WeiNewtype};

use super::Address;

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<JsonRpcError>,
}

fn wei_from_hex_quantity(quantity: &str) -> Result<WeiNewtype> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("expected hex quantity, got {quantity}"))?;

    if digits.is_empty() {
        return Err(anyhow!("expected hex quantity, got {quantity}"));
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .map(WeiNewtype)
        .ok_or_else(|| anyhow!("expected hex quantity, got {quantity}"))
}

pub struct ExecutionNodeHttp {
    client: reqwest::Client,
    execution_url: String,
}

impl ExecutionNodeHttp {
    pub fn new(execution_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            execution_url: execution_url.to_string(),
        }
    }
}

#[async_trait]
impl AddressBalanceIndex for ExecutionNodeHttp {
    async fn balance_of(&self, address: &Address) -> Result<WeiNewtype> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "eth_getBalance",
            "params": [address, "latest"],
        });

        let res = self
            .client
            .post(&self.execution_url)
            .json(&body)
            .send()
            .timed("eth_getBalance")
            .await?
            .error_for_status()?
            .json::<JsonRpcResponse>()
            .await
            .context("failed to decode eth_getBalance response")?;

        match (res.result, res.error) {
            (_, Some(JsonRpcError { code, message })) => Err(anyhow!(
                "eth_getBalance for {address} failed. code = {code} message = {message}"
            )),
            (Some(quantity), None) => {
                let balance = wei_from_hex_quantity(&quantity)?;
                debug!(%address, %balance, "got balance");
                Ok(balance)
            }
            (None, None) => Err(anyhow!(
                "eth_getBalance for {address} returned neither result nor error"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn deposit_contract() -> Address {
        "0xcafe00000000000000000000000000000000cafe".parse().unwrap()
    }

    #[test]
    fn wei_from_hex_quantity_test() {
        assert_eq!(
            wei_from_hex_quantity("0x0").unwrap(),
            WeiNewtype::from(0u128)
        );
        assert_eq!(
            wei_from_hex_quantity("0x43c33c1937564800000").unwrap(),
            WeiNewtype::from_eth(20_000)
        );
    }

    #[test]
    fn wei_from_hex_quantity_invalid_test() {
        assert!(wei_from_hex_quantity("0x").is_err());
        assert!(wei_from_hex_quantity("1234").is_err());
        assert!(wei_from_hex_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn balance_of_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBalance",
                "params": ["0xcafe00000000000000000000000000000000cafe", "latest"],
            })))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x43c33c1937564800000"}"#)
            .create_async()
            .await;

        let execution_node = ExecutionNodeHttp::new(&server.url());
        let balance = execution_node
            .balance_of(&deposit_contract())
            .await
            .unwrap();

        assert_eq!(balance, WeiNewtype::from_eth(20_000));
    }

    #[tokio::test]
    async fn balance_of_rpc_error_test() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32000,"message":"header not found"}}"#,
            )
            .create_async()
            .await;

        let execution_node = ExecutionNodeHttp::new(&server.url());
        let error = execution_node
            .balance_of(&deposit_contract())
            .await
            .unwrap_err();

        assert!(error.to_string().contains("header not found"));
    }
}
