//! Shared test helpers
//!
//! Logging setup, mock text generators and small hand-built organizations

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use beanstack::core::calendar::ymd;
use beanstack::core::config::GenerationSettings;
use beanstack::domain::{
    Address, Branch, BranchSize, CitySpec, GeoPoint, Lifecycle, Region,
};
use beanstack::infrastructure::llm::TextGenerator;
use chrono::NaiveDate;

static INIT: Once = Once::new();

/// Initialize test logging once
pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Test timeout wrapper for async tests
pub async fn with_timeout<F, T>(duration: std::time::Duration, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, f)
        .await
        .expect("Test timed out")
}

pub const TEST_TIMEOUT_SHORT: std::time::Duration = std::time::Duration::from_secs(5);

/// Text generator that answers every prompt with a fixed email, or fails
/// on selected calls
pub struct MockGenerator {
    reply: String,
    fail_calls: Vec<usize>,
    fail_all: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_calls: vec![],
            fail_all: false,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(vec![]),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::replying("")
        }
    }

    /// Fail only the given 1-based calls
    pub fn failing_on(reply: &str, calls: &[usize]) -> Self {
        Self {
            fail_calls: calls.to_vec(),
            ..Self::replying(reply)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_all || self.fail_calls.contains(&call) {
            anyhow::bail!("service unavailable");
        }
        Ok(self.reply.clone())
    }
}

/// Settings with a two-city catalog, small enough for fast runs
pub fn small_settings(seed: u64) -> GenerationSettings {
    GenerationSettings {
        seed,
        cities: vec![
            CitySpec {
                city: "Austin".to_string(),
                state: "TX".to_string(),
                lat: 30.2672,
                lon: -97.7431,
                region: Region::Southwest,
                zip_prefix: "787".to_string(),
                branch_count: 3,
            },
            CitySpec {
                city: "Portland".to_string(),
                state: "OR".to_string(),
                lat: 45.5152,
                lon: -122.6784,
                region: Region::West,
                zip_prefix: "972".to_string(),
                branch_count: 1,
            },
        ],
        ..GenerationSettings::default()
    }
}

pub fn branch(id: &str, size: BranchSize, lifecycle: Lifecycle) -> Branch {
    Branch::new(
        id,
        format!("BeanStack Test {}", id),
        Address {
            street: "100 Oak St".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip: "78701".to_string(),
        },
        Region::Southwest,
        GeoPoint {
            lat: 30.2672,
            lon: -97.7431,
        },
        size,
        lifecycle,
    )
    .unwrap()
}

pub fn open_branch(id: &str, opened: NaiveDate) -> Branch {
    branch(id, BranchSize::Medium, Lifecycle::Open { opened })
}

pub fn closed_branch(id: &str, opened: NaiveDate, closed: NaiveDate) -> Branch {
    branch(id, BranchSize::Small, Lifecycle::Closed { opened, closed })
}

pub fn jan_2020() -> NaiveDate {
    ymd(2020, 1, 1)
}
