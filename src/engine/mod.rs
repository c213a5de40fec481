// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Engine Module
 * Domain normalization, scanner fan-out and the synchronous scan entry point
 *
 * © 2025 Bountyy Oy
 */

pub mod domain;
pub mod orchestrator;

pub use domain::normalize_domain;
pub use orchestrator::{execute_scan, ScanOrchestrator};
