use log::info;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;

use super::{Bootstrapper, SeedError};
use crate::models::user::{Role, UserForm, UserStatus};

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedAccounts {
    pub admin_id: i64,
    pub commenter_id: i64,
}

/// Throwaway password for an account that is never logged into.
fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

impl Bootstrapper {
    /// Create the administrator and the default commenter.
    pub fn provision_accounts(&self) -> Result<ProvisionedAccounts, SeedError> {
        let admin = UserForm {
            email: self.settings.admin_email.clone(),
            display_name: self.settings.admin_name.clone(),
            password: self.settings.admin_password.clone(),
            role: Role::Admin,
            status: UserStatus::Active,
        };
        let admin_id = self.provision(&admin)?;

        let commenter = UserForm {
            email: self.settings.commenter_email.clone(),
            display_name: self.settings.commenter_name.clone(),
            password: random_password(),
            role: Role::DefaultCommenter,
            status: UserStatus::NoLogin,
        };
        let commenter_id = self.provision(&commenter)?;

        Ok(ProvisionedAccounts {
            admin_id,
            commenter_id,
        })
    }

    fn provision(&self, form: &UserForm) -> Result<i64, SeedError> {
        let fail = |reason: String| SeedError::Provisioning {
            email: form.email.clone(),
            reason,
        };

        if self.settings.skip_existing {
            if let Some(existing) = self.store.user_get_by_email(&form.email) {
                if existing.role != form.role {
                    return Err(fail(format!(
                        "already exists with role {}",
                        existing.role.as_str()
                    )));
                }
                info!("Account {} already exists (#{}), skipping", existing.email, existing.id);
                return Ok(existing.id);
            }
        }

        let id = self.store.user_create(form).map_err(fail)?;
        info!("Created {} account {} (#{})", form.role.as_str(), form.email, id);
        Ok(id)
    }
}
