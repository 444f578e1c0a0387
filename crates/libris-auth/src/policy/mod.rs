// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access policy.
//!
//! Two permission sets gate every protected action:
//!
//! | Set | Roles |
//! |---|---|
//! | `Management` | admin, staff |
//! | `AdminOnly` | admin |
//!
//! On top of that, plain staff may only act on member accounts. The rule is
//! enforced twice: [`authorize_user_target`] denies an edit aimed at a
//! non-member, and [`enforce_role_on_save`] forces whatever a staff principal
//! saves back to the member role.

mod engine;
mod fields;
mod types;

pub use engine::{authorize, authorize_user_target, can_view_user};
pub use fields::{allowed_user_fields, enforce_role_on_save, UserFieldSet};
pub use types::{Action, Decision, DenyReason, PermissionSet, Requirement, UserTarget};
