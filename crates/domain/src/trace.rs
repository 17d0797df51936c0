use serde::Serialize;

/// Structured trace events emitted across all conduit crates.
///
/// Events never carry session keys, certificates or signatures.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ConduitCall {
        method: String,
        status: u16,
        duration_ms: u64,
    },
    SessionOpened {
        user: String,
        connection_id: Option<i64>,
    },
    SessionReset {
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "pc_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let ev = TraceEvent::ConduitCall {
            method: "user.whoami".into(),
            status: 200,
            duration_ms: 12,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "ConduitCall");
        assert_eq!(json["method"], "user.whoami");
        assert_eq!(json["status"], 200);
    }
}
