use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid API key format. It should start with '{expected}'. Please check and try again.")]
    CredentialFormat { expected: &'static str },
    #[error("Failed to initialize model client. Please verify your API key: {0}")]
    ClientInit(String),
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Validation(String),
    #[error("{action}: {cause:#}")]
    Generation {
        action: &'static str,
        cause: anyhow::Error,
    },
}

impl AppError {
    pub fn generation(action: &'static str, cause: anyhow::Error) -> Self {
        AppError::Generation { action, cause }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_message_names_prefix() {
        let e = AppError::CredentialFormat { expected: "gsk_" };
        assert!(e.to_string().contains("'gsk_'"));
    }

    #[test]
    fn generation_message_keeps_cause() {
        let e = AppError::generation("Error generating suggestions", anyhow::anyhow!("timed out"));
        assert_eq!(e.to_string(), "Error generating suggestions: timed out");
    }
}
