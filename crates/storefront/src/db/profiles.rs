//! Profile repository for the `users` collection.

use oussaili_core::{Email, Role, UserId, UserProfile};
use serde_json::Value;
use tracing::instrument;

use super::{RepositoryError, decode, not_found};
use crate::documents::{Collection, DocumentStore, Fields, Query, to_fields};

/// Repository for profile documents keyed by the auth provider's uid.
pub struct ProfileRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get a profile by uid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        self.store
            .get(Collection::Users, id.as_str())
            .await?
            .map(decode)
            .transpose()
    }

    /// Load the profile for a signed-in account, creating a customer
    /// profile on first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read or write fails.
    #[instrument(skip(self, email, display_name, photo_url), fields(user_id = %id))]
    pub async fn ensure(
        &self,
        id: &UserId,
        email: &Email,
        display_name: Option<String>,
        photo_url: Option<String>,
    ) -> Result<UserProfile, RepositoryError> {
        if let Some(profile) = self.get(id).await? {
            return Ok(profile);
        }

        let profile = UserProfile::new_customer(id.clone(), email.clone(), display_name, photo_url);
        self.save(&profile).await?;
        tracing::info!("Created customer profile on first sign-in");
        Ok(profile)
    }

    /// Write the whole profile document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn save(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        let mut fields = to_fields(profile)?;
        fields.remove("id");
        self.store
            .set(Collection::Users, profile.id.as_str(), fields)
            .await?;
        Ok(())
    }

    /// Every profile, sorted by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let mut profiles = self
            .store
            .list(Collection::Users, &Query::all())
            .await?
            .into_iter()
            .map(decode::<UserProfile>)
            .collect::<Result<Vec<_>, _>>()?;
        profiles.sort_by(|a, b| a.email.as_str().cmp(b.email.as_str()));
        Ok(profiles)
    }

    /// Find a profile by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        let query = Query::all().where_eq("email", email.as_str());
        self.store
            .list(Collection::Users, &query)
            .await?
            .into_iter()
            .next()
            .map(decode)
            .transpose()
    }

    /// Change a profile's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    #[instrument(skip(self), fields(user_id = %id, role = %role))]
    pub async fn set_role(&self, id: &UserId, role: Role) -> Result<(), RepositoryError> {
        self.update_field(id, "role", role.as_str()).await?;
        tracing::info!("Role changed");
        Ok(())
    }

    /// Change a profile's display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    #[instrument(skip(self, display_name), fields(user_id = %id))]
    pub async fn set_display_name(
        &self,
        id: &UserId,
        display_name: &str,
    ) -> Result<(), RepositoryError> {
        self.update_field(id, "displayName", display_name).await
    }

    async fn update_field(
        &self,
        id: &UserId,
        field: &str,
        value: &str,
    ) -> Result<(), RepositoryError> {
        let mut fields = Fields::new();
        fields.insert(field.to_string(), Value::String(value.to_string()));
        self.store
            .update(Collection::Users, id.as_str(), fields)
            .await
            .map_err(not_found)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::documents::MemoryDocumentStore;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_ensure_creates_once() {
        let store = MemoryDocumentStore::new();
        let repo = ProfileRepository::new(&store);
        let id = UserId::new("uid-1");

        let created = repo.ensure(&id, &email("a@b.co"), None, None).await.unwrap();
        assert_eq!(created.role, Role::Customer);
        assert_eq!(created.display_name(), "User");

        repo.set_role(&id, Role::Admin).await.unwrap();
        let again = repo
            .ensure(&id, &email("a@b.co"), Some("Other".into()), None)
            .await
            .unwrap();
        assert_eq!(again.role, Role::Admin);
        assert_eq!(again.display_name(), "User");
    }

    #[tokio::test]
    async fn test_stored_profile_has_no_id_field() {
        let store = MemoryDocumentStore::new();
        let repo = ProfileRepository::new(&store);
        let id = UserId::new("uid-1");
        repo.ensure(&id, &email("a@b.co"), Some("Awa".into()), None).await.unwrap();
        let raw = store.get(Collection::Users, "uid-1").await.unwrap().unwrap();
        assert!(raw.fields.get("id").is_none());
        assert_eq!(raw.fields["displayName"], "Awa");
    }

    #[tokio::test]
    async fn test_find_by_email_and_rename() {
        let store = MemoryDocumentStore::new();
        let repo = ProfileRepository::new(&store);
        repo.ensure(&UserId::new("u1"), &email("a@b.co"), None, None).await.unwrap();
        repo.ensure(&UserId::new("u2"), &email("c@d.co"), None, None).await.unwrap();

        let found = repo.find_by_email(&email("c@d.co")).await.unwrap().unwrap();
        assert_eq!(found.id.as_str(), "u2");

        repo.set_display_name(&found.id, "Kofi").await.unwrap();
        assert_eq!(repo.get(&found.id).await.unwrap().unwrap().display_name(), "Kofi");
        assert_eq!(repo.list().await.unwrap().len(), 2);

        assert!(matches!(
            repo.set_role(&UserId::new("ghost"), Role::Admin).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
