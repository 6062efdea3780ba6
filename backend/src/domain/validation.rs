use super::errors::{DomainError, DomainResult};
use super::game_config::MAX_TITLE_LENGTH;

/// Trims a title or name and checks it is non-empty and within the length limit
pub fn validate_title(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{} cannot be empty", field)));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(DomainError::Validation(format!(
            "{} cannot exceed {} characters",
            field, MAX_TITLE_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Empty descriptions are stored as absent
pub fn normalize_description(value: Option<String>) -> Option<String> {
    value
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_trimmed_and_bounded() {
        assert_eq!(validate_title("Title", "  Run 5k ").unwrap(), "Run 5k");
        assert!(matches!(validate_title("Title", "   "), Err(DomainError::Validation(_))));
        assert!(validate_title("Title", &"x".repeat(MAX_TITLE_LENGTH)).is_ok());
        assert!(validate_title("Title", &"x".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_blank_description_is_dropped() {
        assert_eq!(normalize_description(Some("  ".to_string())), None);
        assert_eq!(normalize_description(Some(" notes ".to_string())), Some("notes".to_string()));
        assert_eq!(normalize_description(None), None);
    }
}
