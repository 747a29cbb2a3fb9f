//! Template name validation for filesystem safety.
//!
//! Template names double as file stems (`<name>.json` inside the store
//! root), so they must never carry path separators or other characters
//! that could escape the store directory when joined into a path.

use crate::MaquetteError;

/// Maximum accepted template name length, in characters.
///
/// Keeps `<name>.json` and `history/<name>/<revision>.json` comfortably
/// below common filesystem limits.
pub const MAX_NAME_LEN: usize = 64;

/// Allowed characters in a template name: alphanumeric, underscores,
/// hyphens, and interior spaces.
fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' '
}

/// Validate that `name` is safe to use as a file stem.
///
/// Returns the name unchanged if valid.
/// Returns `MaquetteError::Validation` (path `name`) if it is empty,
/// too long, carries a disallowed character, or starts/ends with a space.
pub fn validate_template_name(name: &str) -> Result<&str, MaquetteError> {
    if name.is_empty() {
        return Err(MaquetteError::validation(
            "name",
            "template name cannot be empty",
        ));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(MaquetteError::validation(
            "name",
            format!("template name exceeds {} characters", MAX_NAME_LEN),
        ));
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err(MaquetteError::validation(
            "name",
            format!("invalid template name '{}': leading or trailing space", name),
        ));
    }

    if !name.chars().all(is_valid_name_char) {
        return Err(MaquetteError::validation(
            "name",
            format!(
                "invalid template name '{}': only alphanumerics, underscores, hyphens and spaces are allowed",
                name
            ),
        ));
    }

    Ok(name)
}
