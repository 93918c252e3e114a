//! Seat-limit accounting for institution members.
//!
//! Seats of one member type are handed out in approval order: the earliest
//! approved members hold the seats, later ones queue behind the limit.
//! Members with no approval timestamp sort after all timestamped ones, and
//! the principal id breaks ties.

use serde::{Deserialize, Serialize};

use lexaccess_core::{
    EngineError, Institution, MemberType, Membership, MembershipStore, PrincipalId, ReadBudget,
};

/// A member's place relative to the institution's seat limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAllocation {
    /// Seat kind.
    pub member_type: MemberType,
    /// Configured limit; `None` is unlimited.
    pub limit: Option<u32>,
    /// Zero-based position in seat order; `None` when no limit applies.
    pub position: Option<usize>,
    /// Members of this type in good standing.
    pub occupied: usize,
}

impl SeatAllocation {
    fn unlimited(member_type: MemberType) -> Self {
        Self {
            member_type,
            limit: None,
            position: None,
            occupied: 0,
        }
    }

    /// Whether the member holds a seat.
    pub fn has_seat(&self) -> bool {
        match (self.limit, self.position) {
            (Some(limit), Some(position)) => position < limit as usize,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

/// Zero-based seat position of `principal_id` among `members`.
///
/// Only approved and active memberships count.
pub fn seat_position(members: &[Membership], principal_id: PrincipalId) -> Option<usize> {
    let mut seated: Vec<&Membership> = members
        .iter()
        .filter(|member| member.is_in_good_standing())
        .collect();
    seated.sort_by_key(|m| (m.approved_at.is_none(), m.approved_at, m.principal_id));
    seated.iter().position(|m| m.principal_id == principal_id)
}

/// Place `membership` against its institution's limit for its member type.
///
/// Reads the membership store only when a limit is configured.
///
/// # Errors
///
/// [`EngineError`] when the store read fails or the budget is spent.
pub fn allocate_seat<S>(
    store: &S,
    institution: &Institution,
    membership: &Membership,
    budget: &ReadBudget,
) -> Result<SeatAllocation, EngineError>
where
    S: ?Sized + MembershipStore,
{
    let member_type = membership.member_type;
    let Some(limit) = institution.seat_limit(member_type) else {
        return Ok(SeatAllocation::unlimited(member_type));
    };

    budget.check("seat membership lookup")?;
    let members = store.memberships_of_type(institution.id, member_type)?;
    let occupied = members.iter().filter(|m| m.is_in_good_standing()).count();
    let position = seat_position(&members, membership.principal_id);
    Ok(SeatAllocation {
        member_type,
        limit: Some(limit),
        position,
        occupied,
    })
}
