//! Accounts: residents, technicians, vendor owners, and staff.

mod domain;
mod forms;
mod router;
mod service;

pub use domain::{Account, AccountId, AccountView, NewAccount, ProfileUpdate};
pub use forms::{ProfileUpdateForm, SignUpForm};
pub use router::account_router;
pub use service::{require_account, require_staff, resolve_actor, AccountRole, AccountService};
