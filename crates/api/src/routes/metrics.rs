//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers descriptions for the metrics emitted by the saga and store.
pub fn describe() {
    describe_counter!("orders_created_total", "Orders placed and persisted");
    describe_counter!(
        "order_create_rejected_total",
        "Order placements rejected before persistence, by reason"
    );
    describe_histogram!(
        "order_create_duration_seconds",
        Unit::Seconds,
        "Time to place an order, side effects included"
    );
    describe_counter!(
        "order_status_transitions_total",
        "Applied order status transitions, by target status"
    );
    describe_counter!(
        "saga_side_effect_total",
        "Best-effort side effects, by step and outcome"
    );
    describe_histogram!(
        "collaborator_call_duration_seconds",
        Unit::Seconds,
        "Collaborator call latency, by service"
    );
    describe_histogram!(
        "order_store_update_duration_seconds",
        Unit::Seconds,
        "Atomic order update latency in the Postgres store"
    );
}

/// GET /metrics: Returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
