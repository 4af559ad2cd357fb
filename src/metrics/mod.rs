use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for the order engine
// ============================================================================
//
// Covers:
// - Order lifecycle (created, completed by the status engine, reopened)
// - Stock reservations and releases
// - Notification outcomes and notifier circuit state
// - Time spent waiting on per-entity locks
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub orders_completed: IntCounter,
    pub orders_reopened: IntCounter,

    pub stock_reservations: IntCounterVec,
    pub stock_released_units: IntCounter,

    pub notifications: IntCounterVec,
    pub notifier_circuit_state: IntGauge,

    pub lock_wait_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let orders_completed = IntCounter::new(
            "orders_completed_total",
            "Orders moved to Completed because all their tasks were done",
        )?;
        registry.register(Box::new(orders_completed.clone()))?;

        let orders_reopened = IntCounter::new(
            "orders_reopened_total",
            "Completed orders reopened because a task was no longer done",
        )?;
        registry.register(Box::new(orders_reopened.clone()))?;

        let stock_reservations = IntCounterVec::new(
            Opts::new("stock_reservations_total", "Stock reservation attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(stock_reservations.clone()))?;

        let stock_released_units = IntCounter::new(
            "stock_released_units_total",
            "Units returned to stock by released reservations",
        )?;
        registry.register(Box::new(stock_released_units.clone()))?;

        let notifications = IntCounterVec::new(
            Opts::new("notifications_total", "Customer notifications by kind and outcome"),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        let notifier_circuit_state = IntGauge::new(
            "notifier_circuit_state",
            "Notifier circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(notifier_circuit_state.clone()))?;

        let lock_wait_seconds = HistogramVec::new(
            HistogramOpts::new("lock_wait_seconds", "Time spent waiting for an entity lock")
                .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["resource"],
        )?;
        registry.register(Box::new(lock_wait_seconds.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            orders_completed,
            orders_reopened,
            stock_reservations,
            stock_released_units,
            notifications,
            notifier_circuit_state,
            lock_wait_seconds,
        })
    }

    /// Text exposition format, for whoever wants to scrape it
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_reservation(&self, outcome: &str) {
        self.stock_reservations.with_label_values(&[outcome]).inc();
    }

    pub fn record_release(&self, units: u32) {
        self.stock_released_units.inc_by(u64::from(units));
    }

    pub fn record_notification(&self, kind: &str, outcome: &str) {
        self.notifications.with_label_values(&[kind, outcome]).inc();
    }

    pub fn update_notifier_circuit_state(&self, state: i64) {
        self.notifier_circuit_state.set(state);
    }

    pub fn observe_lock_wait(&self, resource: &str, seconds: f64) {
        self.lock_wait_seconds.with_label_values(&[resource]).observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.orders_created.inc();
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_reservation_outcomes() {
        let metrics = Metrics::new().unwrap();
        metrics.record_reservation("reserved");
        metrics.record_reservation("reserved");
        metrics.record_reservation("insufficient_stock");

        let gathered = metrics.registry.gather();
        let family = gathered.iter().find(|m| m.name() == "stock_reservations_total").unwrap();
        assert_eq!(family.metric.len(), 2);
    }

    #[test]
    fn test_render_contains_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.record_release(3);
        metrics.update_notifier_circuit_state(1);

        let text = metrics.render().unwrap();
        assert!(text.contains("stock_released_units_total 3"));
        assert!(text.contains("notifier_circuit_state 1"));
    }
}
