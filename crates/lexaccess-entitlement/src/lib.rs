#![deny(missing_docs)]

//! # lexaccess-entitlement: Access Decisions
//!
//! Decides whether a principal reads a premium document in full or only its
//! preview, and whether individual purchase is offered instead.
//!
//! - [`predicates`]: named authorization checks over an explicit context.
//! - [`coverage`]: institution subscription lifecycle classification.
//! - [`seats`]: seat-limit accounting per member type.
//! - [`evaluator`]: the precedence-ordered [`AccessPolicyEvaluator`].
//! - [`decision`]: the [`Decision`] value and its caller mapping.
//!
//! A denial is a [`Decision`]. `Err` is reserved for "could not decide".

pub mod coverage;
pub mod decision;
pub mod evaluator;
pub mod predicates;
pub mod seats;

pub use coverage::{CoverageDecision, InstitutionCoverageGuard};
pub use decision::{CallerAction, Decision, PurchaseOffer};
pub use evaluator::AccessPolicyEvaluator;
pub use predicates::{
    approved_user, can_approve_institution_users, global_admin, has_permission,
    institution_admin, AuthzContext, PolicyRegistry, APPROVE_USERS_PERMISSION,
};
pub use seats::{allocate_seat, seat_position, SeatAllocation};
