#![allow(dead_code)]

use async_trait::async_trait;
use pims_dashboard::api::{ApiClient, ApiError, HttpRequest, HttpResponse, HttpTransport};
use pims_dashboard::live::AnalyticsSource;
use pims_dashboard::models::{AnalyticsSnapshot, LastUpdated};
use pims_dashboard::router::{Route, Router};
use pims_dashboard::session::SessionStore;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-process transport answering from scripted responses per path
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response for `path`; the last queued one repeats
    pub fn respond(&self, path: &str, status: u16, body: Value) {
        let response = HttpResponse {
            status,
            body: serde_json::to_vec(&body).unwrap(),
        };
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let path = request.path.clone();
        self.requests.lock().unwrap().push(request);

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(&path)
            .ok_or_else(|| ApiError::Transport(format!("no response scripted for {}", path)))?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| ApiError::Transport(format!("no response scripted for {}", path)))
    }
}

/// Client over a fake transport with an in-memory session
pub fn client_with(transport: Arc<FakeTransport>) -> ApiClient {
    let session = SessionStore::in_memory();
    let router = Router::new(Route::Login);
    ApiClient::new(transport, session, router)
}

pub fn user_json(id: i64, username: &str, full_name: Option<&str>) -> Value {
    json!({ "id": id, "username": username, "fullName": full_name })
}

pub fn snapshot_json(pharmacy_name: &str) -> Value {
    json!({
        "pharmacyId": "ph-1",
        "pharmacyName": pharmacy_name,
        "lastUpdatedAt": "2025-03-10T11:55:00Z",
        "analytics": {
            "metrics": [
                {"label": "Total Revenue", "value": "637.00 (+--19.3%)", "trendUp": false},
                {"label": "Incomplete Orders Breakdown", "value": {"pending": 4, "completed": 10}, "trendUp": true},
                {"label": "Low Stock", "value": 12, "trendUp": false}
            ],
            "inventoryCards": [
                {"label": "Stock Value", "value": "12,400.00", "trendUp": true}
            ],
            "distributionByCategory": [
                {"category": "Antibiotics", "stockQty": 120, "soldQty": 45}
            ],
            "monthlyStockedVsSold": [
                {"month": "Jan", "stocked": 300, "sold": 210}
            ],
            "topSuppliers": [
                {
                    "id": 1, "name": "MedSupply", "volumeSupplied": 500, "valueSupplied": 12500.5,
                    "ordersDelivered": 9, "orderCompletionPct": 90.0, "mostSuppliedItem": "Amoxicillin"
                }
            ],
            "topPerformers": [
                {"name": "Abebe", "username": "abebe", "email": "abebe@example.com", "volumeSold": 320}
            ],
            "outOfStockProducts": [
                {"genericName": "Amoxicillin", "tradeName": "Amoxil", "sku": "AMX-500", "quantity": 0, "unitPrice": 3.5}
            ],
            "expiredProducts": [],
            "fastMovingProducts": [
                {"genericName": "Paracetamol", "quantity": 1500, "unitPrice": 0.75, "expiryDate": "2026-01-31T00:00:00Z"}
            ]
        },
        "uploadedAt": "2025-03-10T11:55:00Z",
        "storedAt": "2025-03-10T11:55:02Z"
    })
}

pub fn snapshot(pharmacy_name: &str) -> AnalyticsSnapshot {
    serde_json::from_value(snapshot_json(pharmacy_name)).unwrap()
}

/// Scripted analytics source for scheduler tests
pub struct FakeSource {
    snapshots: Mutex<VecDeque<Result<AnalyticsSnapshot, ApiError>>>,
    pub fetches: AtomicUsize,
    pub polls: AtomicUsize,
    /// Simulated latency of each snapshot fetch
    pub delay: Duration,
}

impl FakeSource {
    pub fn new(outcomes: Vec<Result<AnalyticsSnapshot, ApiError>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            snapshots: Mutex::new(outcomes.into()),
            fetches: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticsSource for FakeSource {
    async fn latest_snapshot(&self) -> Result<AnalyticsSnapshot, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut outcomes = self.snapshots.lock().unwrap();
        match outcomes.pop_front() {
            Some(outcome) => outcome,
            None => Err(ApiError::Transport("no more snapshots".to_string())),
        }
    }

    async fn last_updated(&self) -> Result<LastUpdated, ApiError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(LastUpdated {
            pharmacy_id: "ph-1".to_string(),
            last_updated_at: Some("2025-03-10T11:58:00Z".to_string()),
        })
    }
}
