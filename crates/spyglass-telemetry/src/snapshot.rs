//! The per-tick telemetry record.

use serde::Serialize;

/// One telemetry record, produced once per tick and discarded after the
/// publish attempt.
///
/// Field names serialize exactly as the collector schema expects
/// (`PodName`, `OnlinePlayers`, `MaxPlayers`, `Population`); zero values
/// are always emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    /// Identifier of the pod running the observed server.
    pub pod_name: String,
    /// Players connected at probe time.
    pub online_players: i64,
    /// Configured player capacity.
    pub max_players: i64,
    /// Count of persisted player-profile entries on the data volume.
    pub population: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_exact_field_names() {
        let snapshot = Snapshot {
            pod_name: "pod-a".to_string(),
            online_players: 5,
            max_players: 20,
            population: 7,
        };

        assert_eq!(
            serde_json::to_string(&snapshot).unwrap(),
            r#"{"PodName":"pod-a","OnlinePlayers":5,"MaxPlayers":20,"Population":7}"#
        );
    }

    #[test]
    fn zero_values_are_not_omitted() {
        let snapshot = Snapshot {
            pod_name: "pod-b".to_string(),
            online_players: 0,
            max_players: 0,
            population: 0,
        };

        assert_eq!(
            serde_json::to_string(&snapshot).unwrap(),
            r#"{"PodName":"pod-b","OnlinePlayers":0,"MaxPlayers":0,"Population":0}"#
        );
    }
}
