//! Versioned JSON envelope
//!
//! ```json
//! { "version": 1, "payload": { ... } }
//! ```
//!
//! The version is checked before the payload is interpreted. A blob written
//! by any other schema version is refused outright, and a payload that parses
//! but breaks a run invariant is refused as invalid.

use serde::{Deserialize, Serialize};

use super::SaveGame;
use crate::consts::SAVE_VERSION;
use crate::error::PersistError;

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    payload: &'a SaveGame,
}

#[derive(Deserialize)]
struct RawEnvelope {
    version: u32,
    payload: serde_json::Value,
}

pub fn encode(save: &SaveGame) -> Result<String, PersistError> {
    let envelope = Envelope {
        version: SAVE_VERSION,
        payload: save,
    };
    Ok(serde_json::to_string(&envelope)?)
}

pub fn decode(blob: &str) -> Result<SaveGame, PersistError> {
    let raw: RawEnvelope = serde_json::from_str(blob)?;
    if raw.version != SAVE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: raw.version,
            expected: SAVE_VERSION,
        });
    }
    let save: SaveGame = serde_json::from_value(raw.payload)?;
    save.validate()?;
    Ok(save)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameState;
    use crate::tuning::Tuning;

    fn sample() -> SaveGame {
        let mut state = GameState::new(31337, Tuning::default());
        state.start_run();
        SaveGame::capture(&state)
    }

    #[test]
    fn test_envelope_carries_version() {
        let blob = encode(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(value["version"], SAVE_VERSION);
        assert_eq!(value["payload"]["seed"], 31337);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let blob = encode(&sample()).unwrap().replacen(
            &format!("\"version\":{}", SAVE_VERSION),
            "\"version\":99",
            1,
        );
        match decode(&blob) {
            Err(PersistError::UnsupportedVersion { found, expected }) => {
                assert_eq!(found, 99);
                assert_eq!(expected, SAVE_VERSION);
            }
            other => panic!("expected UnsupportedVersion, got {:?}", other.map(|s| s.seed)),
        }
    }

    #[test]
    fn test_corrupt_blobs_are_malformed() {
        assert!(matches!(decode("not json"), Err(PersistError::Malformed(_))));
        assert!(matches!(
            decode(r#"{"version":1,"payload":{"seed":"x"}}"#),
            Err(PersistError::Malformed(_))
        ));
        assert!(matches!(decode(r#"{"payload":{}}"#), Err(PersistError::Malformed(_))));
    }
}
