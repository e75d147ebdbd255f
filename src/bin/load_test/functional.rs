//! Functional scenario: a single pass over every backend route.

use std::time::Duration;

use rand::{Rng, seq::SliceRandom};
use tracing::info;

use crate::client::{ApiClient, pluck};

const SAMPLE_USER: &str = "0x2a58a3d405c527491daae4c62561b949e7f87efe";

fn random_chain(chain_ids: &[u64]) -> String {
    chain_ids
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

fn low_capacity() -> String {
    rand::thread_rng().gen_range(10_000..=1_000_000).to_string()
}

async fn default_routes(client: &ApiClient) {
    client.get("get root success", "/", &[]).await;
    client.get("get health success", "/health", &[]).await;
}

async fn market_list(client: &ApiClient, chain_id: &str) -> Vec<String> {
    let body = client
        .get(
            "get market list success",
            "/market/config/market/list",
            &[("chainId", chain_id.to_string())],
        )
        .await;
    pluck(body.as_ref().and_then(|b| b.get("data")), "/contracts/marketAddr")
}

async fn order_list(client: &ApiClient, chain_id: &str) -> Vec<String> {
    let body = client
        .get(
            "get order list success",
            "/market/config/order/list",
            &[("chainId", chain_id.to_string())],
        )
        .await;
    pluck(body.as_ref().and_then(|b| b.get("data")), "/contracts/orderAddr")
}

async fn asset_list(client: &ApiClient, chain_id: &str) -> Vec<String> {
    let body = client
        .get(
            "get asset list success",
            "/market/config/asset/list",
            &[("chainId", chain_id.to_string())],
        )
        .await;
    pluck(body.as_ref().and_then(|b| b.get("data")), "/contractAddress")
}

/// Requests `path` once per address, passing it as `param`.
async fn per_address(
    client: &ApiClient,
    check: &'static str,
    path: &str,
    chain_id: &str,
    param: &str,
    addresses: &[String],
) {
    for address in addresses {
        client
            .get(
                check,
                path,
                &[("chainId", chain_id.to_string()), (param, address.clone())],
            )
            .await;
    }
}

async fn market_routes(client: &ApiClient, chain_id: &str) {
    let chain = || vec![("chainId", chain_id.to_string())];

    client
        .get("get general config success", "/market/config/general", &chain())
        .await;
    client.get("get market data success", "/market/data", &chain()).await;
    client
        .get(
            "get market data with minLowCapacityValue success",
            "/market/data",
            &[("chainId", chain_id.to_string()), ("minLowCapacityValue", low_capacity())],
        )
        .await;
    client
        .get("get config list success", "/market/config/list", &chain())
        .await;
    client
        .get(
            "get config list with minLowCapacityValue success",
            "/market/config/list",
            &[("chainId", chain_id.to_string()), ("minLowCapacityValue", low_capacity())],
        )
        .await;

    let markets = market_list(client, chain_id).await;
    per_address(
        client,
        "get market item success",
        "/market/config/market/item",
        chain_id,
        "marketAddress",
        &markets,
    )
    .await;

    let assets = asset_list(client, chain_id).await;
    per_address(
        client,
        "get asset item success",
        "/market/config/asset/item",
        chain_id,
        "assetAddress",
        &assets,
    )
    .await;

    client
        .get("get gt list success", "/market/config/gt/list", &chain())
        .await;
    per_address(
        client,
        "get gt item success",
        "/market/config/gt/item",
        chain_id,
        "marketAddress",
        &markets,
    )
    .await;

    let orders = order_list(client, chain_id).await;
    per_address(
        client,
        "get order item success",
        "/market/config/order/item",
        chain_id,
        "orderAddress",
        &orders,
    )
    .await;
    client
        .get("get order infos success", "/market/info/orders", &chain())
        .await;
    per_address(
        client,
        "get order info success",
        "/market/info/order",
        chain_id,
        "orderAddress",
        &orders,
    )
    .await;
    client
        .get("get price infos success", "/market/info/prices", &chain())
        .await;
    per_address(
        client,
        "get price info success",
        "/market/info/price",
        chain_id,
        "assetAddress",
        &assets,
    )
    .await;
}

async fn dashboard_routes(client: &ApiClient, chain_id: &str) {
    let query = [
        ("chainId", chain_id.to_string()),
        ("userAddress", SAMPLE_USER.to_string()),
    ];
    client
        .get("get position summary success", "/dashboard/position/summary", &query)
        .await;
    client
        .get(
            "get total usd value success",
            "/dashboard/position/total-usd-value",
            &query,
        )
        .await;
}

async fn maker_routes(client: &ApiClient, chain_id: &str) {
    let markets = market_list(client, chain_id).await;
    for market in &markets {
        let typ = ["hybrid", "lend", "borrow"]
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("hybrid");
        client
            .get(
                "get default order params success",
                "/maker/order/default-order-params",
                &[
                    ("chainId", chain_id.to_string()),
                    ("typ", typ.to_string()),
                    ("marketAddress", market.clone()),
                ],
            )
            .await;
    }
    per_address(
        client,
        "get create order history success",
        "/maker/order/create-order-history",
        chain_id,
        "marketAddress",
        &markets,
    )
    .await;

    let orders = order_list(client, chain_id).await;
    per_address(
        client,
        "get update order history success",
        "/maker/order/update-order-history",
        chain_id,
        "orderAddress",
        &orders,
    )
    .await;
    client
        .get(
            "get debug create history success",
            "/maker/order/debug-create-history",
            &[],
        )
        .await;
}

const TAKER_ROUTES: [(&str, &str); 8] = [
    ("get buy ft success", "/taker/order/buy-ft"),
    ("get buy xt success", "/taker/order/buy-xt"),
    ("get sell ft success", "/taker/order/sell-ft"),
    ("get sell xt success", "/taker/order/sell-xt"),
    ("get aggregator buy ft success", "/taker/order/aggregator/buy-ft"),
    ("get aggregator buy xt success", "/taker/order/aggregator/buy-xt"),
    ("get aggregator sell ft success", "/taker/order/aggregator/sell-ft"),
    ("get aggregator sell xt success", "/taker/order/aggregator/sell-xt"),
];

async fn taker_routes(client: &ApiClient, chain_id: &str) {
    let markets = market_list(client, chain_id).await;
    for (check, path) in TAKER_ROUTES {
        per_address(client, check, path, chain_id, "marketAddress", &markets).await;
    }
}

/// Runs one pass of the functional scenario.
pub async fn run(client: &ApiClient, chain_ids: &[u64]) {
    info!("functional scenario started");
    default_routes(client).await;
    market_routes(client, &random_chain(chain_ids)).await;
    dashboard_routes(client, &random_chain(chain_ids)).await;
    maker_routes(client, &random_chain(chain_ids)).await;
    taker_routes(client, &random_chain(chain_ids)).await;

    let pause = rand::thread_rng().gen_range(1..=5);
    tokio::time::sleep(Duration::from_secs(pause)).await;
    info!("functional scenario completed");
}
