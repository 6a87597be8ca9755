//! Role-based access policy
//!
//! Handlers consult [`authorize`] before dispatching to a service, so the
//! rules live in one place and do not depend on the HTTP layer.

use crate::{error::AppError, models::user::Role};

/// Operations guarded by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadCatalog,
    ManageCatalog,
    BorrowBooks,
    ReadOwnBorrows,
    ReadAnyBorrows,
    ReadStatistics,
    ManageUsers,
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Action::ReadCatalog => "read the catalog",
            Action::ManageCatalog => "manage the catalog",
            Action::BorrowBooks => "borrow books",
            Action::ReadOwnBorrows => "read own borrow records",
            Action::ReadAnyBorrows => "read borrow records of other users",
            Action::ReadStatistics => "read statistics",
            Action::ManageUsers => "manage users",
        }
    }

    fn allowed_for(&self, role: Role) -> bool {
        match self {
            Action::ReadCatalog | Action::BorrowBooks | Action::ReadOwnBorrows => true,
            Action::ManageCatalog
            | Action::ReadAnyBorrows
            | Action::ReadStatistics
            | Action::ManageUsers => role == Role::Admin,
        }
    }
}

/// Check whether `role` may perform `action`
pub fn authorize(role: Role, action: Action) -> Result<(), AppError> {
    if action.allowed_for(role) {
        Ok(())
    } else {
        Err(AppError::Authorization(format!(
            "Insufficient rights to {}",
            action.describe()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_ONLY: [Action; 4] = [
        Action::ManageCatalog,
        Action::ReadAnyBorrows,
        Action::ReadStatistics,
        Action::ManageUsers,
    ];

    #[test]
    fn members_can_browse_and_borrow() {
        for action in [Action::ReadCatalog, Action::BorrowBooks, Action::ReadOwnBorrows] {
            assert!(authorize(Role::Member, action).is_ok(), "{:?}", action);
        }
    }

    #[test]
    fn members_are_denied_admin_actions() {
        for action in ADMIN_ONLY {
            let err = authorize(Role::Member, action).unwrap_err();
            assert!(matches!(err, AppError::Authorization(_)));
        }
    }

    #[test]
    fn admins_can_do_everything() {
        for action in ADMIN_ONLY {
            assert!(authorize(Role::Admin, action).is_ok());
        }
        assert!(authorize(Role::Admin, Action::BorrowBooks).is_ok());
    }
}
