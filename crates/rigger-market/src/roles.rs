use rigger_core::ids::RoleId;

pub const ROLE_CONTROLLER: RoleId = RoleId::new("ROLE_CONTROLLER");
pub const MARKET_MGR_ROLE: RoleId = RoleId::new("MARKET_MGR_ROLE");
pub const VAULT_MGR_ROLE: RoleId = RoleId::new("VAULT_MGR_ROLE");
pub const GLOBAL_MGR_ROLE: RoleId = RoleId::new("GLOBAL_MGR_ROLE");
