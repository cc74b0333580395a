//! In-memory price source and warehouse used by the stage tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::api::{ApiError, CoinHistory, PriceSource, RateLimitInfo};
use crate::db::Warehouse;
use crate::models::{Asset, Observation, ObservationDate};

/// Scripted answer for one history request
#[derive(Debug, Clone)]
pub enum Reply {
    Ok { price: f64, market_cap: f64, volume: f64 },
    Status(u16),
    Unreachable,
    Malformed,
}

impl Reply {
    pub fn ok(price: f64) -> Self {
        Reply::Ok {
            price,
            market_cap: price * 1_000_000.0,
            volume: price * 1_000.0,
        }
    }

    fn into_result(self, external_id: &str) -> Result<CoinHistory, ApiError> {
        match self {
            Reply::Ok { price, market_cap, volume } => {
                let body = serde_json::json!({
                    "id": external_id,
                    "market_data": {
                        "current_price": {"usd": price},
                        "market_cap": {"usd": market_cap},
                        "total_volume": {"usd": volume}
                    }
                });
                Ok(serde_json::from_value(body).expect("fake body parses"))
            }
            Reply::Status(status) => Err(ApiError::from_status(status, String::new())),
            Reply::Unreachable => Err(ApiError::Unreachable("connection refused".to_string())),
            Reply::Malformed => Ok(serde_json::from_value(serde_json::json!({"id": external_id}))
                .expect("fake body parses")),
        }
    }
}

/// Price source answering from a per-coin script. The last scripted reply for
/// a coin repeats; unscripted coins answer `Reply::ok(1.0)`.
pub struct FakePriceSource {
    remaining: Option<u64>,
    ping_fails: bool,
    script: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakePriceSource {
    pub fn new() -> Self {
        Self {
            remaining: Some(10_000),
            ping_fails: false,
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_remaining(mut self, remaining: Option<u64>) -> Self {
        self.remaining = remaining;
        self
    }

    pub fn with_failing_ping(mut self) -> Self {
        self.ping_fails = true;
        self
    }

    pub fn reply(self, external_id: &str, replies: Vec<Reply>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(external_id.to_string(), replies.into());
        self
    }

    /// External ids requested, in call order
    pub fn requested(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    /// Dates requested, in `DD-MM-YYYY`
    pub fn requested_dates(&self) -> HashSet<String> {
        self.calls.lock().unwrap().iter().map(|(_, d)| d.clone()).collect()
    }
}

#[async_trait]
impl PriceSource for FakePriceSource {
    async fn ping(&self) -> Result<RateLimitInfo, ApiError> {
        if self.ping_fails {
            return Err(ApiError::Unauthorized("invalid key".to_string()));
        }
        Ok(RateLimitInfo {
            limit: Some(500_000),
            remaining: self.remaining,
            reset: None,
        })
    }

    async fn coin_history(
        &self,
        external_id: &str,
        date: ObservationDate,
    ) -> Result<CoinHistory, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((external_id.to_string(), date.api_format()));

        let reply = {
            let mut script = self.script.lock().unwrap();
            match script.get_mut(external_id) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        reply.unwrap_or_else(|| Reply::ok(1.0)).into_result(external_id)
    }
}

/// Warehouse keeping committed rows in memory
pub struct FakeWarehouse {
    assets: Vec<Asset>,
    rows: Mutex<Vec<Observation>>,
    fail_insert_at: Option<usize>,
    count_override: Option<i64>,
    insert_calls: Mutex<usize>,
}

impl FakeWarehouse {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            assets,
            rows: Mutex::new(Vec::new()),
            fail_insert_at: None,
            count_override: None,
            insert_calls: Mutex::new(0),
        }
    }

    /// Make the insert of the row at `index` (0-based) fail
    pub fn failing_insert_at(mut self, index: usize) -> Self {
        self.fail_insert_at = Some(index);
        self
    }

    /// Report `count` from the verification query regardless of stored rows
    pub fn reporting_count(mut self, count: i64) -> Self {
        self.count_override = Some(count);
        self
    }

    pub fn with_rows(self, rows: Vec<Observation>) -> Self {
        self.rows.lock().unwrap().extend(rows);
        self
    }

    pub fn committed(&self) -> Vec<Observation> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert_calls(&self) -> usize {
        *self.insert_calls.lock().unwrap()
    }
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    async fn fetch_active_assets(&self, limit: u32) -> Result<Vec<Asset>, sqlx::Error> {
        Ok(self.assets.iter().take(limit as usize).cloned().collect())
    }

    async fn insert_observations(&self, rows: &[Observation]) -> Result<u64, sqlx::Error> {
        *self.insert_calls.lock().unwrap() += 1;

        let mut staged = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if self.fail_insert_at == Some(index) {
                return Err(sqlx::Error::Protocol(format!(
                    "insert rejected for asset {}",
                    row.asset_id
                )));
            }
            staged.push(row.clone());
        }

        self.rows.lock().unwrap().extend(staged);
        Ok(rows.len() as u64)
    }

    async fn count_assets_at(&self, timestamp: NaiveDateTime) -> Result<i64, sqlx::Error> {
        if let Some(count) = self.count_override {
            return Ok(count);
        }
        let distinct: HashSet<i64> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.timestamp == timestamp)
            .map(|row| row.asset_id)
            .collect();
        Ok(distinct.len() as i64)
    }
}

/// `count` assets named `coin-1`, `coin-2`, ... with ids 1, 2, ...
pub fn assets(count: i64) -> Vec<Asset> {
    (1..=count)
        .map(|id| Asset::new(id, format!("coin-{}", id)))
        .collect()
}

/// Paused-clock sleeps land on millisecond ticks, so allow a little slack
pub fn assert_elapsed(start: tokio::time::Instant, secs: u64) {
    let elapsed = start.elapsed();
    let expected = std::time::Duration::from_secs(secs);
    assert!(
        elapsed >= expected && elapsed < expected + std::time::Duration::from_millis(100),
        "expected ~{}s, got {:?}",
        secs,
        elapsed
    );
}
