use ammonia::clean;

use crate::errors::MindtrackError;

pub trait SanitizeDescription {
    fn sanitize(&mut self) -> Result<(), MindtrackError>;
}

impl SanitizeDescription for Option<String> {
    fn sanitize(&mut self) -> Result<(), MindtrackError> {
        if let Some(description) = &self {
            if description.len() > u16::MAX as usize {
                return Err(MindtrackError::Forbidden(
                    "Description is too long. It can contain max 65535 characters".to_string(),
                ));
            }

            *self = Some(clean(description));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let mut description = Some("<p>hello</p><script>alert(1)</script>".to_string());

        description.sanitize().unwrap();

        let sanitized = description.unwrap();
        assert!(sanitized.contains("<p>hello</p>"));
        assert!(!sanitized.contains("script"));
    }

    #[test]
    fn rejects_oversized_descriptions() {
        let mut description = Some("a".repeat(u16::MAX as usize + 1));

        assert!(description.sanitize().is_err());
    }

    #[test]
    fn leaves_missing_descriptions_alone() {
        let mut description: Option<String> = None;

        description.sanitize().unwrap();

        assert!(description.is_none());
    }
}
