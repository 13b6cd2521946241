//! Outbound key derivation

use crate::domain::{ObjectKey, PipelineError};

/// Extensions replaced by `.json`; anything else gets `.json` appended
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["hl7", "er7", "txt", "msg"];

/// Derive the staging key for an inbound object
///
/// Directories of the inbound key are kept and `prefix`, if any, is put in
/// front of them.
///
/// # Errors
///
/// Returns [`PipelineError::Fetch`] when the key has no file name, e.g. a
/// directory placeholder such as `raw/`.
///
/// # Examples
///
/// ```
/// use hl7stage::core::pipeline::keys::derive_outbound_key;
/// use hl7stage::domain::ObjectKey;
///
/// let inbound = ObjectKey::new("2024/adt.HL7").unwrap();
/// assert_eq!(derive_outbound_key(&inbound, None).unwrap().as_str(), "2024/adt.json");
///
/// let inbound = ObjectKey::new("adt.v2").unwrap();
/// assert_eq!(
///     derive_outbound_key(&inbound, Some("staged")).unwrap().as_str(),
///     "staged/adt.v2.json"
/// );
/// ```
pub fn derive_outbound_key(
    inbound: &ObjectKey,
    prefix: Option<&str>,
) -> Result<ObjectKey, PipelineError> {
    let key = inbound.as_str();
    let file_name = inbound.file_name();
    if file_name.trim().is_empty() {
        return Err(PipelineError::Fetch(format!(
            "inbound key '{key}' does not name an object"
        )));
    }

    let directory = &key[..key.len() - file_name.len()];
    let stem = match file_name.rsplit_once('.') {
        Some((stem, extension))
            if !stem.is_empty()
                && RECOGNIZED_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(extension)) =>
        {
            stem
        }
        _ => file_name,
    };

    let mut derived = String::with_capacity(key.len() + 6);
    if let Some(prefix) = prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        derived.push_str(prefix);
        derived.push('/');
    }
    derived.push_str(directory);
    derived.push_str(stem);
    derived.push_str(".json");

    ObjectKey::new(derived).map_err(PipelineError::Fetch)
}
