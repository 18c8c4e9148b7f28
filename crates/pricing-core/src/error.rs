use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_upstream_detail() {
        let err = PricingError::Repository("week w2 unavailable".to_string());
        assert_eq!(err.to_string(), "Repository error: week w2 unavailable");

        let err = PricingError::Serialization("invalid utf-8".to_string());
        assert_eq!(err.to_string(), "Serialization error: invalid utf-8");
    }
}
