use chrono::Utc;
use uuid::Uuid;

use crate::db::ListUsersArgs;
use crate::errors::AppError;
use crate::models::{NewUser, User};
use crate::pagination::UserFilter;

use super::{MarketEngine, Page};

#[derive(Debug, Clone, Default)]
pub struct ListUsersRequest {
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

impl MarketEngine {
    pub async fn create_user(&self, new_user: Option<NewUser>) -> Result<User, AppError> {
        let new_user = new_user.ok_or_else(|| AppError::invalid("user is required"))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            centipoints: new_user.centipoints,
            created_at: now,
            updated_at: now,
        };
        user.validate()?;

        self.repo.create_user(&user).await?;

        tracing::info!(user_id = %user.id, centipoints = user.centipoints, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {id} not found")))
    }

    pub async fn list_users(&self, req: ListUsersRequest) -> Result<Page<User>, AppError> {
        let filter = UserFilter::default();
        let cursor = self.tokens.resume(req.page_token.as_deref(), &filter)?;
        let limit = self.page_sizes.resolve(req.page_size);

        let (users, has_more) = self
            .repo
            .list_users(&ListUsersArgs {
                greater_than_id: cursor,
                limit,
            })
            .await?;

        let next_page_token = match users.last() {
            Some(last) if has_more => self.tokens.encode(last.id, &filter)?,
            _ => String::new(),
        };
        Ok(Page {
            items: users,
            next_page_token,
        })
    }
}
