use thiserror::Error;

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 500;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid wallet address format: {0}")]
    InvalidWalletAddress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// EVM address: `0x` followed by 20 hex-encoded bytes.
pub fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::MissingParameter("wallet_address".to_string()));
    }

    let body = match address.strip_prefix("0x") {
        Some(body) => body,
        None => return Err(ValidationError::InvalidWalletAddress(address.to_string())),
    };

    let decoded = match hex::decode(body) {
        Ok(bytes) => bytes,
        Err(_) => return Err(ValidationError::InvalidWalletAddress(address.to_string())),
    };

    if decoded.len() != 20 {
        return Err(ValidationError::InvalidWalletAddress(address.to_string()));
    }

    Ok(())
}

pub fn validate_required(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingParameter(name.to_string()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    validate_required("email", email)?;

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidParameter(format!("Invalid email: {}", email))),
    }
}

pub fn validate_offset(offset: Option<&str>) -> Result<i64, ValidationError> {
    let Some(raw) = offset else {
        return Ok(0);
    };

    match raw.parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(ValidationError::InvalidParameter(format!(
            "offset must be a non-negative integer, got '{}'",
            raw
        ))),
    }
}

pub fn validate_limit(limit: Option<&str>) -> Result<i64, ValidationError> {
    let Some(raw) = limit else {
        return Ok(DEFAULT_PAGE_LIMIT);
    };

    match raw.parse::<i64>() {
        Ok(value) if (1..=MAX_PAGE_LIMIT).contains(&value) => Ok(value),
        _ => Err(ValidationError::InvalidParameter(format!(
            "limit must be between 1 and {}, got '{}'",
            MAX_PAGE_LIMIT, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_checksummed_and_lowercase_addresses() {
        assert!(validate_wallet_address("0x52908400098527886E0F7030069857D2E4169EE7").is_ok());
        assert!(validate_wallet_address("0xde709f2102306220921060314715629080e2fb77").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(matches!(
            validate_wallet_address(""),
            Err(ValidationError::MissingParameter(_))
        ));
        // no prefix
        assert!(validate_wallet_address("de709f2102306220921060314715629080e2fb77").is_err());
        // too short
        assert!(validate_wallet_address("0xde709f21").is_err());
        // not hex
        assert!(validate_wallet_address("0xzz709f2102306220921060314715629080e2fb77").is_err());
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        assert_eq!(validate_offset(None).unwrap(), 0);
        assert_eq!(validate_limit(None).unwrap(), DEFAULT_PAGE_LIMIT);
        assert_eq!(validate_limit(Some("10")).unwrap(), 10);
        assert!(validate_offset(Some("-1")).is_err());
        assert!(validate_limit(Some("0")).is_err());
        assert!(validate_limit(Some("501")).is_err());
        assert!(validate_limit(Some("ten")).is_err());
    }

    #[test]
    fn email_needs_local_part_and_domain() {
        assert!(validate_email("ada@uni.edu").is_ok());
        assert!(validate_email("ada.uni.edu").is_err());
        assert!(validate_email("@uni.edu").is_err());
        assert!(validate_email("ada@localhost").is_err());
    }
}
