//! Version arithmetic on `<namespace>;<version>` model identifiers.

use crate::core::error::MigrationError;

const VERSION_SEPARATOR: char = ';';

/// Split an identifier into its namespace and numeric version.
pub fn split_version(model_id: &str) -> Result<(&str, u64), MigrationError> {
    let (namespace, version_text) = model_id
        .rsplit_once(VERSION_SEPARATOR)
        .ok_or_else(|| MigrationError::invalid_identifier(model_id, "missing ';' version separator"))?;

    if version_text.is_empty() {
        return Err(MigrationError::invalid_identifier(
            model_id,
            "version is empty",
        ));
    }
    // `u64::from_str` accepts a leading '+', which is not a valid version.
    if !version_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MigrationError::invalid_identifier(
            model_id,
            format!("version '{}' is not a non-negative integer", version_text),
        ));
    }
    let version = version_text.parse::<u64>().map_err(|err| {
        MigrationError::invalid_identifier(
            model_id,
            format!("version '{}' is out of range: {}", version_text, err),
        )
    })?;
    Ok((namespace, version))
}

/// Identifier of the model version immediately preceding `model_id`.
///
/// `"dtmi:ex:room;2"` resolves to `"dtmi:ex:room;1"`. Version 0 has no
/// predecessor and is rejected, as is anything not shaped like
/// `<namespace>;<digits>`.
pub fn predecessor_of(model_id: &str) -> Result<String, MigrationError> {
    let (namespace, version) = split_version(model_id)?;
    if version == 0 {
        return Err(MigrationError::invalid_identifier(
            model_id,
            "version 0 has no predecessor",
        ));
    }
    Ok(format!("{}{}{}", namespace, VERSION_SEPARATOR, version - 1))
}
