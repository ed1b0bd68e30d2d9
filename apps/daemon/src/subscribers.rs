//! Logging consumers for published state.

use orrery_core::Subscription;
use orrery_signals::StateMessage;
use serde_json::Value;
use tokio::task::JoinHandle;

/// Logs every message delivered to `subscription` until it closes or the task is aborted.
pub fn spawn_logger(subscription: Subscription) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::debug!("logging {} (subscriber {})", subscription.key(), subscription.id());
        while let Some(message) = subscription.recv().await {
            log::info!("{}", summarize(&message));
        }
        if subscription.dropped() > 0 {
            log::warn!(
                "{} fell behind and lost {} messages",
                subscription.key(),
                subscription.dropped()
            );
        }
    })
}

/// One-line digest of a user snapshot or group analysis.
pub fn summarize(message: &StateMessage) -> String {
    let state = &message.state;
    let key = message.key();

    if let Some(pairs) = state.get("synastry_matrix").and_then(Value::as_array) {
        let dynamics = state
            .get("group_dynamics")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        return format!("{} @ {}: {} pairs, {} dynamics", key, message.timestamp, pairs.len(), dynamics);
    }

    let stale = state.get("stale").and_then(Value::as_bool).unwrap_or(false);
    let hottest = state
        .get("houses")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|h| Some((h.get("number")?.as_u64()?, h.get("activation")?.as_f64()?)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    let influences: Vec<&str> = state
        .get("dominant_influences")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|i| i.get("label").and_then(Value::as_str))
        .collect();

    let triggers = state
        .get("transformation_triggers")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);

    let mut line = format!("{} @ {}", key, message.timestamp);
    if stale {
        line.push_str(" [stale]");
    }
    if let Some((house, activation)) = hottest.filter(|(_, a)| *a > 0.0) {
        line.push_str(&format!(" house {} at {:.2}", house, activation));
    }
    if !influences.is_empty() {
        line.push_str(&format!(" | {}", influences.join(", ")));
    }
    if triggers > 0 {
        line.push_str(&format!(" | {} triggers", triggers));
    }
    line
}
