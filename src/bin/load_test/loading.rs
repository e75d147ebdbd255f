//! Loading scenario: ramping virtual users browsing orders and prices.

use std::time::Duration;

use rand::{Rng, seq::SliceRandom};
use tokio::{task::JoinSet, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    client::{ApiClient, pluck},
    config::Stage,
};

const TICK: Duration = Duration::from_secs(1);
const START_VUS: u32 = 1;

/// Virtual users wanted `elapsed` into the run, `None` once every stage is
/// over. Targets are interpolated linearly within a stage.
pub fn vus_at(stages: &[Stage], elapsed: Duration) -> Option<u32> {
    let mut from = START_VUS;
    let mut stage_start = Duration::ZERO;
    for stage in stages {
        let stage_end = stage_start + stage.duration;
        if elapsed < stage_end {
            let progress = (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
            let vus = from as f64 + (stage.target as f64 - from as f64) * progress;
            return Some(vus.round() as u32);
        }
        from = stage.target;
        stage_start = stage_end;
    }
    None
}

async fn iteration(client: &ApiClient, chain_ids: &[u64]) {
    let chain_id = chain_ids
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string();

    let configs = client
        .get(
            "get configs success",
            "/market/config/list",
            &[
                ("chainId", chain_id.clone()),
                ("minLowCapacityValue", "10000".to_string()),
            ],
        )
        .await;
    let data = configs.as_ref().and_then(|c| c.get("data"));
    let markets = pluck(data.and_then(|d| d.get("markets")), "/contracts/marketAddr");
    let orders = pluck(data.and_then(|d| d.get("orderConfigs")), "/contracts/orderAddr");

    for order in orders {
        client
            .get(
                "get order info success",
                "/market/info/order",
                &[("chainId", chain_id.clone()), ("orderAddress", order)],
            )
            .await;
    }
    for market in markets {
        client
            .get(
                "get price success",
                "/market/info/prices",
                &[
                    ("chainId", chain_id.clone()),
                    ("marketAddress", market),
                    ("includeInactive", "false".to_string()),
                ],
            )
            .await;
    }
}

async fn virtual_user(id: usize, client: ApiClient, chain_ids: Vec<u64>, cancel: CancellationToken) {
    debug!(id, "virtual user started");
    while !cancel.is_cancelled() {
        iteration(&client, &chain_ids).await;
        let pause = Duration::from_secs(rand::thread_rng().gen_range(1..=5));
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }
    debug!(id, "virtual user stopped");
}

/// Runs the loading scenario following `stages`.
///
/// Virtual users leaving during a ramp down finish their current iteration.
pub async fn run(client: &ApiClient, chain_ids: &[u64], stages: &[Stage]) {
    info!(stages = stages.len(), "loading scenario started");
    let started = Instant::now();
    let mut tasks = JoinSet::new();
    let mut users: Vec<CancellationToken> = Vec::new();
    let mut spawned = 0;

    while let Some(target) = vus_at(stages, started.elapsed()) {
        let target = target as usize;
        while users.len() < target {
            let cancel = CancellationToken::new();
            tasks.spawn(virtual_user(
                spawned,
                client.clone(),
                chain_ids.to_vec(),
                cancel.clone(),
            ));
            users.push(cancel);
            spawned += 1;
        }
        while users.len() > target {
            if let Some(cancel) = users.pop() {
                cancel.cancel();
            }
        }
        tokio::time::sleep(TICK).await;
    }

    for cancel in users {
        cancel.cancel();
    }
    while tasks.join_next().await.is_some() {}
    info!(virtual_users = spawned, "loading scenario completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Workload;

    #[test]
    fn test_vus_ramp() {
        let stages = Workload::Average.stages();
        assert_eq!(vus_at(&stages, Duration::ZERO), Some(1));
        assert_eq!(vus_at(&stages, Duration::from_secs(30)), Some(51));
        assert_eq!(vus_at(&stages, Duration::from_secs(60)), Some(100));
        assert_eq!(vus_at(&stages, Duration::from_secs(200)), Some(100));
        assert_eq!(vus_at(&stages, Duration::from_secs(330)), Some(50));
        assert_eq!(vus_at(&stages, Duration::from_secs(360)), None);
    }

    #[test]
    fn test_vus_smoke() {
        let stages = Workload::Smoke.stages();
        assert_eq!(vus_at(&stages, Duration::from_secs(10)), Some(1));
        assert_eq!(vus_at(&stages, Duration::from_secs(59)), Some(1));
        assert_eq!(vus_at(&stages, Duration::from_secs(60)), None);
    }
}
