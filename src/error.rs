// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{what} is not configured")]
    NotConfigured { what: String },

    #[error("expected exactly one {what}, found {count}")]
    Ambiguous { what: String, count: usize },

    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("{source_name} unavailable: {message}")]
    Upstream { source_name: String, message: String },

    #[error("invalid {what} '{value}'")]
    Parse { what: String, value: String },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound { what: what.into() }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn parse(what: impl Into<String>, value: impl Into<String>) -> Self {
        CoreError::Parse {
            what: what.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
