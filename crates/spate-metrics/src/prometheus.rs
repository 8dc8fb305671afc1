//! Prometheus text exposition format.
//!
//! Renders a metrics snapshot for scraping by a Prometheus server or a
//! compatible agent (for example an autoscaler watching the store level).

use crate::MetricsSnapshot;

/// Content type served alongside [`render_prometheus`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render a metrics snapshot into Prometheus text format.
pub fn render_prometheus(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    write_metric(
        &mut out,
        "spate_demo_store",
        "Pending work units in the store.",
        "gauge",
        snapshot.store,
    );
    write_metric(
        &mut out,
        "spate_demo_desired_replicas",
        "Desired replicas of the watched service.",
        "gauge",
        snapshot.desired_replicas,
    );
    write_metric(
        &mut out,
        "spate_demo_actual_replicas",
        "Running replicas of the watched service.",
        "gauge",
        snapshot.actual_replicas,
    );
    write_metric(
        &mut out,
        "spate_demo_produced_total",
        "Work units added by the producer.",
        "counter",
        snapshot.produced_total,
    );
    write_metric(
        &mut out,
        "spate_demo_consumed_total",
        "Work units removed by consumers.",
        "counter",
        snapshot.consumed_total,
    );

    out
}

fn write_metric(out: &mut String, name: &str, help: &str, kind: &str, value: u64) {
    out.push_str(&format!("# HELP {name} {help}\n"));
    out.push_str(&format!("# TYPE {name} {kind}\n"));
    out.push_str(&format!("{name} {value}\n"));
}
