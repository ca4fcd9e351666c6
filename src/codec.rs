use base64::{Engine, engine::general_purpose::URL_SAFE};

/// Marker prepended to every value written by `encode`.
///
/// Values without the marker are treated as legacy plaintext written before
/// obfuscation existed and are returned verbatim by `decode`.
pub const MARKER: &str = "sc_";

/// encode
///
/// Obfuscates a value for persistence: the UTF-8 bytes are rendered as URL-safe
/// base64 and prefixed with [`MARKER`].
///
/// This is NOT encryption. Anyone with access to the storage can reverse it;
/// it only keeps identity fields out of casual plaintext inspection.
pub fn encode(value: &str) -> String {
    format!("{MARKER}{}", URL_SAFE.encode(value.as_bytes()))
}

/// decode
///
/// Reverses `encode`. Never fails:
/// - no marker: the input is legacy plaintext and comes back unchanged.
/// - malformed payload (bad base64, non UTF-8 bytes): the original stored string
///   comes back unchanged so the caller never ends up with half-decoded state.
pub fn decode(stored: &str) -> String {
    let Some(payload) = stored.strip_prefix(MARKER) else {
        return stored.to_string();
    };

    match URL_SAFE.decode(payload) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(value) => value,
            Err(_) => {
                tracing::debug!("obfuscated value is not valid UTF-8, returning it verbatim");
                stored.to_string()
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, "obfuscated value failed to decode, returning it verbatim");
            stored.to_string()
        }
    }
}

/// is_encoded
///
/// True when the stored value carries the obfuscation marker.
pub fn is_encoded(stored: &str) -> bool {
    stored.starts_with(MARKER)
}
