// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::AccessConfig;
use crate::error::{CoreError, Result};

/// Static allow-list check. An empty list admits everyone.
pub fn ensure_allowed(cfg: &AccessConfig, email: Option<&str>) -> Result<()> {
    if cfg.allowed_emails.is_empty() {
        return Ok(());
    }
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Err(CoreError::invalid("user", "an allowed e-mail is required"));
    };
    if cfg
        .allowed_emails
        .iter()
        .any(|allowed| allowed.trim().eq_ignore_ascii_case(email))
    {
        Ok(())
    } else {
        Err(CoreError::invalid(
            "user",
            format!("{} is not on the allow-list", email),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_open() {
        assert!(ensure_allowed(&AccessConfig::default(), None).is_ok());
    }

    #[test]
    fn match_ignores_case() {
        let cfg = AccessConfig {
            allowed_emails: vec!["Ana@Example.com".into()],
        };
        assert!(ensure_allowed(&cfg, Some("ana@example.com")).is_ok());
        assert!(ensure_allowed(&cfg, Some("luis@example.com")).is_err());
        assert!(ensure_allowed(&cfg, None).is_err());
    }
}
