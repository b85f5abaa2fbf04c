// src/remote/users.rs

use serde::Deserialize;

use crate::client::RemoteClient;
use crate::errors::Result;
use crate::models::{ListQuery, RegistrationForm, User};
use crate::remote::UserDirectory;

/// Talks to the users resource of the remote API.
#[derive(Clone, Debug)]
pub struct HttpUserDirectory {
    client: RemoteClient,
    users_path: String,
}

/// Listing bodies come either bare or wrapped in `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserPage {
    Bare(Vec<User>),
    Wrapped { data: Vec<User> },
}

impl HttpUserDirectory {
    pub fn new(client: RemoteClient, users_path: impl Into<String>) -> Self {
        Self {
            client,
            users_path: users_path.into(),
        }
    }

    pub fn users_path(&self) -> &str {
        &self.users_path
    }
}

impl UserDirectory for HttpUserDirectory {
    async fn create_user(&self, form: &RegistrationForm) -> Result<User> {
        self.client.post_json(&self.users_path, form).await
    }

    async fn list_users(&self, query: &ListQuery) -> Result<Vec<User>> {
        let page: UserPage = self.client.get_json(&self.users_path, query).await?;
        Ok(match page {
            UserPage::Bare(users) => users,
            UserPage::Wrapped { data } => data,
        })
    }
}
