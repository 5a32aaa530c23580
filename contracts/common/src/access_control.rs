//! Access Control Module
//!
//! Guards for the few privileged setters: the pool's team, the feed's
//! admin and operator, and the share token's minter.

use tracing::warn;

use crate::errors::{ExaError, ExaResult};
use crate::types::Address;
use crate::check;
use crate::validation::require_address;

/// Caller must be the current team
pub fn require_team(team: &Address, caller: &Address) -> ExaResult<()> {
    if caller != team {
        warn!(caller = %hex::encode(caller), "team-only call rejected");
        return Err(ExaError::SenderIsNotTeam);
    }
    Ok(())
}

/// Hand the team role to `new_team`, returning the previous team
///
/// # Errors
/// - `SenderIsNotTeam` if `caller` is not the current team
/// - `AddressZero` if `new_team` is the null address
pub fn rotate_team(team: &mut Address, caller: &Address, new_team: &Address) -> ExaResult<Address> {
    // 1. Only the team can hand over
    require_team(team, caller)?;

    // 2. Never to the null address
    require_address(new_team)?;

    let old = *team;
    *team = *new_team;
    Ok(old)
}

/// Caller must be the admin
pub fn require_admin(admin: &Address, caller: &Address) -> ExaResult<()> {
    check!(caller == admin, ExaError::AdminOnly);
    Ok(())
}

/// Caller must be exactly `expected`
pub fn require_caller(expected: &Address, caller: &Address) -> ExaResult<()> {
    check!(
        caller == expected,
        ExaError::Unauthorized {
            expected: *expected,
            actual: *caller,
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Address {
        [1u8; 32]
    }

    fn stranger() -> Address {
        [2u8; 32]
    }

    #[test]
    fn test_require_team() {
        assert!(require_team(&team(), &team()).is_ok());
        assert_eq!(require_team(&team(), &stranger()), Err(ExaError::SenderIsNotTeam));
    }

    #[test]
    fn test_rotate_team() {
        let mut current = team();
        let old = rotate_team(&mut current, &team(), &stranger()).unwrap();
        assert_eq!(old, team());
        assert_eq!(current, stranger());

        // previous team has lost the role
        assert_eq!(
            rotate_team(&mut current, &team(), &team()),
            Err(ExaError::SenderIsNotTeam)
        );
    }

    #[test]
    fn test_rotate_team_rejects_zero_address() {
        let mut current = team();
        assert_eq!(
            rotate_team(&mut current, &team(), &[0u8; 32]),
            Err(ExaError::AddressZero)
        );
        assert_eq!(current, team());
    }

    #[test]
    fn test_rotate_team_checks_sender_first() {
        let mut current = team();
        assert_eq!(
            rotate_team(&mut current, &stranger(), &[0u8; 32]),
            Err(ExaError::SenderIsNotTeam)
        );
    }

    #[test]
    fn test_require_admin_and_caller() {
        assert!(require_admin(&team(), &team()).is_ok());
        assert_eq!(require_admin(&team(), &stranger()), Err(ExaError::AdminOnly));
        assert!(matches!(
            require_caller(&team(), &stranger()),
            Err(ExaError::Unauthorized { .. })
        ));
    }
}
