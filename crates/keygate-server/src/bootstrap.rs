//! Startup seeding of the initial administrator account.

use std::sync::Arc;

use keygate_auth::{AuthError, AuthResult, NewUser, UserStorage, hash_password};

use crate::config::BootstrapConfig;

/// Ensures an administrator account exists before the server takes traffic.
///
/// With a `[bootstrap.admin_user]` section the named account is created if
/// missing, and reruns are no-ops. Without one the store is only inspected:
/// a warning is logged when no admin exists at all, since every admin-only
/// endpoint would be unreachable.
pub async fn seed_admin_user(
    users: &Arc<dyn UserStorage>,
    config: &BootstrapConfig,
) -> AuthResult<()> {
    let Some(admin) = &config.admin_user else {
        if users.find_any_admin().await?.is_none() {
            tracing::warn!(
                "no administrator account exists and [bootstrap.admin_user] is not configured; \
                 admin-only endpoints will be unusable"
            );
        }
        return Ok(());
    };

    if users.find_by_username(&admin.username).await?.is_some() {
        tracing::info!(
            username = %admin.username,
            "bootstrap admin already present, skipping seed"
        );
        return Ok(());
    }

    let password_hash = hash_password(&admin.password)
        .map_err(|e| AuthError::internal(format!("Failed to hash bootstrap password: {e}")))?;

    let created = users
        .insert(&NewUser {
            username: admin.username.clone(),
            password_hash,
            display_name: admin.display_name.clone(),
            is_admin: true,
            group: 0,
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!(
                username = %user.username,
                user_id = user.id,
                "bootstrap admin created"
            );
            Ok(())
        }
        // Lost a race against another replica seeding the same account.
        Err(AuthError::Conflict { .. }) => {
            tracing::info!(
                username = %admin.username,
                "bootstrap admin already present, skipping seed"
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminUserConfig;
    use keygate_auth::{MemoryUserStorage, verify_password};

    fn config_with_admin() -> BootstrapConfig {
        BootstrapConfig {
            admin_user: Some(AdminUserConfig {
                username: "root".to_string(),
                password: "rootpass".to_string(),
                display_name: Some("Administrator".to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn test_seeds_admin_with_working_password() {
        let users: Arc<dyn UserStorage> = Arc::new(MemoryUserStorage::new());

        seed_admin_user(&users, &config_with_admin()).await.unwrap();

        let admin = users.find_by_username("root").await.unwrap().unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.display_name.as_deref(), Some("Administrator"));
        assert!(verify_password("rootpass", &admin.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let users: Arc<dyn UserStorage> = Arc::new(MemoryUserStorage::new());

        seed_admin_user(&users, &config_with_admin()).await.unwrap();
        let first_hash = users
            .find_by_username("root")
            .await
            .unwrap()
            .unwrap()
            .password_hash;

        seed_admin_user(&users, &config_with_admin()).await.unwrap();
        let second_hash = users
            .find_by_username("root")
            .await
            .unwrap()
            .unwrap()
            .password_hash;

        // Re-seeding must not rotate the stored credential.
        assert_eq!(first_hash, second_hash);
    }

    #[tokio::test]
    async fn test_existing_account_is_never_promoted() {
        let users: Arc<dyn UserStorage> = Arc::new(MemoryUserStorage::new());
        users
            .insert(&NewUser {
                username: "root".to_string(),
                password_hash: hash_password("old-secret").unwrap(),
                display_name: None,
                is_admin: false,
                group: 0,
            })
            .await
            .unwrap();

        seed_admin_user(&users, &config_with_admin()).await.unwrap();

        let existing = users.find_by_username("root").await.unwrap().unwrap();
        assert!(!existing.is_admin);
        assert!(verify_password("old-secret", &existing.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_without_config_only_inspects_the_store() {
        let users: Arc<dyn UserStorage> = Arc::new(MemoryUserStorage::new());

        seed_admin_user(&users, &BootstrapConfig::default())
            .await
            .unwrap();

        assert!(users.find_any_admin().await.unwrap().is_none());
    }
}
