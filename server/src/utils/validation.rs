use validator::ValidationError;

/// Rejects strings that are empty once trimmed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Trimmed optional text, with blanks treated as absent.
pub fn optional_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Ana").is_ok());
        assert!(not_blank(" \t ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(&Some("  Pucón ".to_string())), Some("Pucón"));
        assert_eq!(optional_text(&Some("   ".to_string())), None);
        assert_eq!(optional_text(&None), None);
    }
}
