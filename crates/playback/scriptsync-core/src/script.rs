use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::data::{ScriptBundle, Timeline};
use crate::error::SyncError;

/// Public API: parse funscript-style JSON into a [`ScriptBundle`].
///
/// Accepted shapes:
/// - a single funscript `{ "actions": [...], "inverted"?: bool }`,
/// - a multi-axis document with `main` (or top-level `actions`) plus optional
///   `vibrate` / `rotate` funscripts,
/// - the bridge envelope `{ "content": "<funscript json>" }`,
/// - the bridge error envelope `{ "error": "<message>" }`, reported as
///   `InvalidScript`.
///
/// Extra keys (`version`, `range`, `metadata`, ...) are ignored and an
/// `inverted` flag that is not a boolean reads as `false`. A malformed
/// vibrate/rotate axis is dropped with a warning; a malformed main axis fails
/// the whole document.
pub fn parse_funscript_json(s: &str) -> Result<ScriptBundle, SyncError> {
    let doc: RawDocument = serde_json::from_str(s)?;
    match doc {
        RawDocument::Error { error } => Err(SyncError::invalid_script(format!(
            "script source reported: {error}"
        ))),
        RawDocument::Envelope { content } => parse_funscript_json(&content),
        RawDocument::Script(raw) => to_bundle(raw),
    }
}

fn to_bundle(raw: RawScript) -> Result<ScriptBundle, SyncError> {
    let main = match (raw.main, raw.actions) {
        (Some(axis), _) => {
            let axis = RawAxis::deserialize(axis)
                .map_err(|err| SyncError::invalid_script(format!("main axis: {err}")))?;
            Timeline::load(&axis.actions, axis.inverted)?
        }
        (None, Some(actions)) => Timeline::load(&actions, raw.inverted)?,
        (None, None) => return Err(SyncError::invalid_script("script has no main actions")),
    };

    Ok(ScriptBundle {
        main,
        vibrate: raw.vibrate.and_then(|axis| load_axis("vibrate", axis)),
        rotate: raw.rotate.and_then(|axis| load_axis("rotate", axis)),
    })
}

fn load_axis(name: &str, axis: JsonValue) -> Option<Timeline> {
    let loaded = RawAxis::deserialize(axis)
        .map_err(|err| SyncError::invalid_script(err.to_string()))
        .and_then(|axis| Timeline::load(&axis.actions, axis.inverted));
    match loaded {
        Ok(timeline) => Some(timeline),
        Err(err) => {
            warn!(axis = name, %err, "dropping malformed script axis");
            None
        }
    }
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDocument {
    // Put the envelopes BEFORE the permissive script shape.
    Error { error: String },
    Envelope { content: String },
    Script(RawScript),
}

// Axes stay raw here so one bad axis cannot fail the whole document.
#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    pub actions: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub inverted: bool,
    #[serde(default)]
    pub main: Option<JsonValue>,
    #[serde(default)]
    pub vibrate: Option<JsonValue>,
    #[serde(default)]
    pub rotate: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct RawAxis {
    pub actions: JsonValue,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub inverted: bool,
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(JsonValue::deserialize(d)?.as_bool().unwrap_or(false))
}
