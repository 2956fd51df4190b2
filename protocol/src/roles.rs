//! Administrative roles.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use puddel_types::Address;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Grants and revokes roles; sets hard ceilings and destinations.
    Admin,
    /// Tunes emission rate, decay, fee splits and activity bonuses.
    Operations,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operations => "operations",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    members: BTreeMap<Role, BTreeSet<Address>>,
}

impl RoleSet {
    /// `admin` holds every role.
    pub fn genesis(admin: Address) -> Self {
        let mut roles = Self::default();
        roles.grant(admin, Role::Admin);
        roles.grant(admin, Role::Operations);
        roles
    }

    pub fn has(&self, account: &Address, role: Role) -> bool {
        self.members
            .get(&role)
            .is_some_and(|members| members.contains(account))
    }

    /// Returns `false` if `account` already held `role`.
    pub fn grant(&mut self, account: Address, role: Role) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Returns `false` if `account` did not hold `role`.
    pub fn revoke(&mut self, account: &Address, role: Role) -> bool {
        self.members
            .get_mut(&role)
            .is_some_and(|members| members.remove(account))
    }

    pub fn members(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.members.get(&role).into_iter().flatten()
    }
}
