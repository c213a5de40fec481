// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Worker Module
 * Scan job lifecycle and the queue consumer
 *
 * © 2025 Bountyy Oy
 */

pub mod job_runner;
pub mod scanner_worker;

pub use job_runner::{JobOutcome, JobRunner};
pub use scanner_worker::{ScannerWorker, WorkerMetrics};
