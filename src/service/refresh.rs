//! Periodic status refresh
//!
//! While a queue is active the presentation layer re-reads the status on a
//! fixed period so elapsed and remaining times keep moving. The task stops
//! on its own once the queue is no longer active.

use crate::service::app::QueueService;
use crate::types::QueueStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Shortest accepted refresh period
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Poll the status every `period` and hand it to `on_tick`.
///
/// The first tick fires immediately. Returns the number of ticks delivered,
/// including the final inactive one.
pub async fn run_status_refresh<F>(
    service: Arc<Mutex<QueueService>>,
    period: Duration,
    mut on_tick: F,
) -> u64
where
    F: FnMut(&QueueStatus),
{
    let mut interval = tokio::time::interval(period.max(MIN_PERIOD));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut ticks = 0;
    loop {
        interval.tick().await;

        // Hold the lock only for the read
        let status = service.lock().await.status();
        ticks += 1;
        on_tick(&status);

        if !status.is_active() {
            debug!("Stopping status refresh after {} ticks ({})", ticks, status.state());
            return ticks;
        }
    }
}

/// Run [`run_status_refresh`] as a background task
pub fn spawn_status_refresh<F>(
    service: Arc<Mutex<QueueService>>,
    period: Duration,
    on_tick: F,
) -> JoinHandle<u64>
where
    F: FnMut(&QueueStatus) + Send + 'static,
{
    tokio::spawn(run_status_refresh(service, period, on_tick))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::estimate::calculator::EstimatorConfig;
    use crate::estimate::tracker::QueueEstimator;
    use crate::persistence::store::InMemoryStore;

    fn service() -> Arc<Mutex<QueueService>> {
        let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
        let estimator = QueueEstimator::new(EstimatorConfig::default(), clock).unwrap();
        Arc::new(Mutex::new(QueueService::new(
            estimator,
            Box::new(InMemoryStore::new()),
        )))
    }

    #[tokio::test]
    async fn test_refresh_stops_immediately_when_idle() {
        let service = service();
        let mut seen = Vec::new();

        let ticks = run_status_refresh(service, Duration::from_millis(5), |status| {
            seen.push(status.state())
        })
        .await;

        assert_eq!(ticks, 1);
        assert_eq!(seen, vec![crate::types::QueueState::Idle]);
    }

    #[tokio::test]
    async fn test_refresh_stops_after_completion() {
        let service = service();
        service.lock().await.start(3, "Boss-A").unwrap();

        let handle = spawn_status_refresh(service.clone(), Duration::from_millis(5), |_| {});

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!handle.is_finished());

        service.lock().await.update(0);

        let ticks = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("refresh task should stop")
            .unwrap();
        assert!(ticks >= 2);
    }

    #[tokio::test]
    async fn test_refresh_stops_after_leave() {
        let service = service();
        service.lock().await.start(3, "Boss-A").unwrap();

        let handle = spawn_status_refresh(service.clone(), Duration::from_millis(5), |_| {});
        service.lock().await.leave();

        let ticks = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("refresh task should stop")
            .unwrap();
        assert!(ticks >= 1);
    }
}
