// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Types
 * Error handling for probes, scanners, the findings store and the job queue
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

/// Main scanner error type
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// HTTP-related errors
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Findings store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Job queue errors
    #[error("Queue error: {0}")]
    Queue(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors (bad domain, malformed request)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Timeout errors
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// A scanner returned an error or panicked
    #[error("Scanner {scanner} failed: {reason}")]
    ScannerFailed { scanner: String, reason: String },

    /// General errors
    #[error("Scanner error: {0}")]
    General(String),
}

/// Network-specific errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection timeout after {timeout:?} to {url}")]
    ConnectionTimeout { url: String, timeout: Duration },

    #[error("DNS resolution failed for {host}: {reason}")]
    DnsResolutionFailed { host: String, reason: String },

    #[error("TLS handshake failed for {host}: {reason}")]
    TlsHandshakeFailed { host: String, reason: String },

    /// The server refused every protocol version from TLS 1.2 up
    #[error("{host} offers no protocol newer than TLS 1.1: {reason}")]
    LegacyTlsOnly { host: String, reason: String },

    #[error("Connection refused for {url}")]
    ConnectionRefused { url: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Network error: {0}")]
    Other(String),
}

/// HTTP-specific errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP {status_code} Client Error for {url}: {message}")]
    ClientError {
        status_code: u16,
        url: String,
        message: String,
    },

    #[error("HTTP {status_code} Server Error for {url}: {message}")]
    ServerError {
        status_code: u16,
        url: String,
        message: String,
    },

    #[error("No usable HTTP response from {host}: {reason}")]
    Unreachable { host: String, reason: String },

    #[error("HTTP error: {0}")]
    Other(String),
}

/// Findings store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Scan execution not found: {scan_id}")]
    ExecutionNotFound { scan_id: String },

    #[error("Invalid status transition for {scan_id}: {from} -> {to}")]
    InvalidTransition {
        scan_id: String,
        from: String,
        to: String,
    },

    #[error("Query failed: {0}")]
    Query(String),
}

impl ScannerError {
    /// Whether a scan job failing with this error should be attempted again.
    /// Only bad input and bad configuration are permanent.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ScannerError::Validation(_)
                | ScannerError::Configuration(_)
                | ScannerError::Store(StoreError::InvalidTransition { .. })
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ScannerError::Timeout { .. }
                | ScannerError::Network(NetworkError::ConnectionTimeout { .. })
        )
    }
}

/// Convert reqwest errors to our error types
impl From<reqwest::Error> for ScannerError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();

        if err.is_timeout() {
            ScannerError::Network(NetworkError::ConnectionTimeout {
                url,
                timeout: Duration::from_secs(10),
            })
        } else if err.is_connect() {
            ScannerError::Network(NetworkError::ConnectionRefused { url })
        } else if let Some(status) = err.status() {
            if status.is_client_error() {
                ScannerError::Http(HttpError::ClientError {
                    status_code: status.as_u16(),
                    url,
                    message: err.to_string(),
                })
            } else {
                ScannerError::Http(HttpError::ServerError {
                    status_code: status.as_u16(),
                    url,
                    message: err.to_string(),
                })
            }
        } else {
            ScannerError::Http(HttpError::Other(err.to_string()))
        }
    }
}

/// Convert tokio-postgres errors to our error types
impl From<tokio_postgres::Error> for ScannerError {
    fn from(err: tokio_postgres::Error) -> Self {
        ScannerError::Store(StoreError::Query(err.to_string()))
    }
}

/// Convert deadpool errors to our error types
impl From<deadpool_postgres::PoolError> for ScannerError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        ScannerError::Store(StoreError::ConnectionFailed {
            reason: err.to_string(),
        })
    }
}

impl From<redis::RedisError> for ScannerError {
    fn from(err: redis::RedisError) -> Self {
        ScannerError::Queue(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for ScannerError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        ScannerError::Queue(format!("pool: {}", err))
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        ScannerError::Validation(format!("malformed payload: {}", err))
    }
}

/// Result type for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;
