// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod pool;
pub mod runner;
pub mod steps;

pub use pool::{PoolIdentity, resolve_pool};
pub use runner::{
    ErrorKind, WorkflowPlan, WorkflowResult, WorkflowRunner, WorkflowState, WorkflowStep,
};
pub use steps::SwapIntent;
