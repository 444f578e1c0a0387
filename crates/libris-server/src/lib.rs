// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Libris server library.
//!
//! - [`actions`]: the handler boundary every presentation layer calls into
//! - [`bootstrap`]: operator tasks run from the command line
//! - [`version`]: build information

pub mod actions;
pub mod bootstrap;
pub mod version;

pub use actions::{ActionContext, ActionError, ActionOutcome, ActionResult};
pub use bootstrap::{create_admin, AdminRequest, BootstrapError};
