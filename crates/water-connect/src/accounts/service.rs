use std::sync::Arc;

use chrono::Utc;

use super::domain::{Account, AccountId, AccountView};
use super::forms::{ProfileUpdateForm, SignUpForm};
use crate::error::ServiceError;
use crate::store::AccountRepository;

/// Resolves the claimed actor; an id that matches no account is rejected.
pub fn resolve_actor<R>(repository: &R, actor: Option<AccountId>) -> Result<Option<Account>, ServiceError>
where
    R: AccountRepository + ?Sized,
{
    match actor {
        None => Ok(None),
        Some(id) => repository
            .fetch_account(id)?
            .map(Some)
            .ok_or(ServiceError::Unauthenticated),
    }
}

/// Like [`resolve_actor`] but anonymous callers are rejected too.
pub fn require_account<R>(repository: &R, actor: Option<AccountId>) -> Result<Account, ServiceError>
where
    R: AccountRepository + ?Sized,
{
    resolve_actor(repository, actor)?.ok_or(ServiceError::Unauthenticated)
}

pub fn require_staff<R>(repository: &R, actor: Option<AccountId>) -> Result<Account, ServiceError>
where
    R: AccountRepository + ?Sized,
{
    let account = require_account(repository, actor)?;
    if account.is_staff {
        Ok(account)
    } else {
        Err(ServiceError::PermissionDenied("Staff access required."))
    }
}

/// Elevated flags for accounts created from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountRole {
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Sign-up and self-service profile management.
pub struct AccountService<R> {
    repository: Arc<R>,
}

impl<R> AccountService<R>
where
    R: AccountRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn signup(&self, form: SignUpForm) -> Result<AccountView, ServiceError> {
        self.create(form, AccountRole::default())
    }

    /// Registers an account with the given role; superusers are always staff.
    pub fn create(&self, form: SignUpForm, role: AccountRole) -> Result<AccountView, ServiceError> {
        let mut account = form.clean(Utc::now())?;
        account.is_superuser = role.is_superuser;
        account.is_staff = role.is_staff || role.is_superuser;

        let stored = self.repository.insert_account(account)?;
        tracing::info!(account_id = %stored.id, username = %stored.username, "account created");
        Ok(stored.view())
    }

    pub fn profile(&self, actor: Option<AccountId>) -> Result<AccountView, ServiceError> {
        Ok(require_account(self.repository.as_ref(), actor)?.view())
    }

    pub fn update_profile(
        &self,
        actor: Option<AccountId>,
        form: ProfileUpdateForm,
    ) -> Result<AccountView, ServiceError> {
        let mut account = require_account(self.repository.as_ref(), actor)?;
        let update = form.clean()?;
        account.first_name = update.first_name;
        account.last_name = update.last_name;
        account.email = update.email;

        self.repository.update_account(account.clone())?;
        Ok(account.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AccountService<MemoryStore> {
        AccountService::new(Arc::new(MemoryStore::new()))
    }

    fn form(username: &str) -> SignUpForm {
        SignUpForm {
            username: Some(username.to_string()),
            email: Some(format!("{username}@example.org")),
            ..SignUpForm::default()
        }
    }

    #[test]
    fn unknown_actor_is_unauthenticated() {
        let store = MemoryStore::new();
        assert!(resolve_actor(&store, None).expect("anonymous").is_none());
        assert!(matches!(
            resolve_actor(&store, Some(AccountId(99))),
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[test]
    fn duplicate_signup_conflicts() {
        let service = service();
        service.signup(form("kamau")).expect("first signup");
        assert!(matches!(
            service.signup(form("KAMAU")),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn superuser_role_implies_staff() {
        let service = service();
        let view = service
            .create(
                form("root"),
                AccountRole {
                    is_staff: false,
                    is_superuser: true,
                },
            )
            .expect("created");
        assert!(view.is_staff);
    }

    #[test]
    fn profile_update_changes_own_names() {
        let service = service();
        let view = service.signup(form("achieng")).expect("signup");
        let updated = service
            .update_profile(
                Some(view.id),
                ProfileUpdateForm {
                    first_name: Some("Achieng".to_string()),
                    last_name: Some("Odhiambo".to_string()),
                    email: Some("achieng@example.org".to_string()),
                },
            )
            .expect("update");
        assert_eq!(updated.last_name, "Odhiambo");
        assert!(matches!(
            service.profile(None),
            Err(ServiceError::Unauthenticated)
        ));
    }
}
