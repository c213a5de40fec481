// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;
pub mod loader;
pub mod validation;

pub use core::{
    default_dkim_selectors, AppConfig, DatabaseConfig, EngineConfig, JobRetryConfig,
    ObservabilityConfig, QueueConfig,
};

pub use loader::{ConfigFormat, ConfigLoader};

pub use validation::{parse_dns_server, ConfigValidator};
