// Release Record Validator
// Turns raw history entries into canonical releases and applies the
// staggered-rollout draw

use rand::Rng;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::auto_update::types::{CanonicalRelease, RawRelease};
use crate::auto_update::version;

/// Rollout percentage used when an entry does not specify one
const DEFAULT_STAGGERING: f64 = 100.0;

/// Validate one raw history entry
///
/// Returns `None` when the entry is unusable (not an object, bad version,
/// no installer files). Otherwise the release is returned with defaults
/// applied and `skip_update` decided, drawing from `rng` at most once.
pub fn validate_release<R: Rng>(entry: &Value, rng: &mut R) -> Option<CanonicalRelease> {
    let raw: RawRelease = match serde_json::from_value(entry.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            log::debug!("[Release] Dropping entry that is not a release object: {}", e);
            return None;
        }
    };

    let version = match raw.version {
        Some(v) if version::validate(&v) => v,
        other => {
            log::debug!("[Release] Dropping entry with invalid version {:?}", other);
            return None;
        }
    };

    let files: BTreeMap<String, String> = raw
        .files
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(platform, url)| match url {
            Value::String(url) if !url.is_empty() => Some((platform, url)),
            _ => None,
        })
        .collect();

    if files.is_empty() {
        log::debug!("[Release] Dropping {}: no installer files", version);
        return None;
    }

    let staggering = raw
        .staggering
        .as_ref()
        .map(parse_staggering)
        .unwrap_or(Some(DEFAULT_STAGGERING));

    let mut skip_update = match staggering {
        Some(percent) => !(0.0..=100.0).contains(&percent),
        None => true,
    };

    if !skip_update {
        let percent = staggering.unwrap_or(DEFAULT_STAGGERING);
        let sample: f64 = rng.gen();
        skip_update = sample > percent / 100.0;
    }

    let release = CanonicalRelease {
        version,
        files,
        staggering: staggering.unwrap_or(f64::NAN),
        is_prerelease: coerce_flag(raw.is_prerelease.as_ref()),
        is_mandatory: coerce_flag(raw.is_mandatory.as_ref()),
        skip_update,
    };

    log::debug!(
        "[Release] {} staggering={} mandatory={} prerelease={} skip={}",
        release.version,
        release.staggering,
        release.is_mandatory,
        release.is_prerelease,
        release.skip_update
    );

    Some(release)
}

/// Parse a rollout percentage such as "20%", "12.5 %" or a bare number
pub fn parse_staggering(value: &Value) -> Option<f64> {
    let percent = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_suffix('%').unwrap_or(s).trim_end();
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };

    percent.is_finite().then_some(percent)
}

/// Read a flag that may be a JSON boolean or the text "true"/"false"
pub fn coerce_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
