//! Pure validation rules
//!
//! Each rule is side-effect free and returns a human-readable message on
//! failure. [`Validator`] applies rules against a [`Policy`] and collects
//! every violation.

use crate::chain::Coin;
use crate::config::Policy;
use crate::crypto::decode_address;
use crate::validation::errors::ValidationErrors;
use regex::RegexSet;
use std::sync::OnceLock;

/// Which bech32 prefix an address field must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Account,
    Validator,
}

fn injection_patterns() -> &'static RegexSet {
    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        RegexSet::new([
            r"(?i)</?[a-z!?]",
            r"(?i)javascript\s*:",
            r"(?i)vbscript\s*:",
            r"(?i)data\s*:\s*text/html",
            r"(?i)\bon[a-z]+\s*=",
        ])
        .expect("injection patterns are valid regexes")
    })
}

/// Check a bech32 address against the prefix for `kind`
pub fn check_address(value: &str, kind: AddressKind, policy: &Policy) -> Result<(), String> {
    let prefix = match kind {
        AddressKind::Account => &policy.account_prefix,
        AddressKind::Validator => &policy.validator_prefix,
    };
    decode_address(value, prefix)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Decode a hex public key and check its byte length
pub fn check_public_key(value: &str, policy: &Policy) -> Result<Vec<u8>, String> {
    let bytes = hex::decode(value).map_err(|_| "public key is not valid hex".to_string())?;
    if bytes.len() < policy.public_key_min_bytes || bytes.len() > policy.public_key_max_bytes {
        return Err(format!(
            "public key must be {}..={} bytes, got {}",
            policy.public_key_min_bytes,
            policy.public_key_max_bytes,
            bytes.len()
        ));
    }
    Ok(bytes)
}

/// Parse a base-unit amount: digits only, bounded by `max`
pub fn parse_amount(value: &str, max: u128) -> Result<u128, String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("amount '{}' is not a non-negative integer", value));
    }
    let amount: u128 = value
        .parse()
        .map_err(|_| format!("amount '{}' is out of range", value))?;
    if amount > max {
        return Err(format!("amount {} exceeds maximum {}", amount, max));
    }
    Ok(amount)
}

/// Check a free-text field for length and script-injection patterns
pub fn check_text(value: &str, max_len: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len > max_len {
        return Err(format!("must be at most {} characters, got {}", max_len, len));
    }
    if injection_patterns().is_match(value) {
        return Err("contains disallowed markup or script content".to_string());
    }
    Ok(())
}

/// Trim and HTML-entity-escape text for storage
pub fn sanitize_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.trim().chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Applies rules against a policy and accumulates violations
pub struct Validator<'a> {
    policy: &'a Policy,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self {
            policy,
            errors: ValidationErrors::new(),
        }
    }

    pub fn policy(&self) -> &Policy {
        self.policy
    }

    /// Record a violation unless `ok`
    pub fn ensure(&mut self, ok: bool, field: &str, message: impl Into<String>) -> bool {
        if !ok {
            self.errors.push(field, message);
        }
        ok
    }

    pub fn address(&mut self, field: &str, value: &str, kind: AddressKind) -> bool {
        match check_address(value, kind, self.policy) {
            Ok(()) => true,
            Err(msg) => self.ensure(false, field, msg),
        }
    }

    pub fn public_key(&mut self, field: &str, value: &str) -> Option<Vec<u8>> {
        match check_public_key(value, self.policy) {
            Ok(bytes) => Some(bytes),
            Err(msg) => {
                self.errors.push(field, msg);
                None
            }
        }
    }

    /// Amount must parse, be on the denomination allow-list, and be positive
    pub fn coin(&mut self, field: &str, coin: &Coin) -> Option<u128> {
        let denom_ok = self.policy.is_allowed_denom(&coin.denom);
        self.ensure(
            denom_ok,
            field,
            format!("denomination '{}' is not allowed", coin.denom),
        );
        match parse_amount(&coin.amount, self.policy.max_amount) {
            Ok(0) => {
                self.errors.push(field, "amount must be positive");
                None
            }
            Ok(amount) if denom_ok => Some(amount),
            Ok(_) => None,
            Err(msg) => {
                self.errors.push(field, msg);
                None
            }
        }
    }

    /// Free text; `required` additionally rejects empty/blank values
    pub fn text(&mut self, field: &str, value: &str, max_len: usize, required: bool) -> bool {
        if required && value.trim().is_empty() {
            return self.ensure(false, field, "must not be empty");
        }
        match check_text(value, max_len) {
            Ok(()) => true,
            Err(msg) => self.ensure(false, field, msg),
        }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }
}
