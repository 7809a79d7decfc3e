use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{News, NewsRequest, NewsView},
    repository::{CrudRepository, Repositories},
};

/// NewsService
///
/// Announcements shown on the public site. Reads are ordered newest first.
#[derive(Clone)]
pub struct NewsService {
    news: Arc<dyn CrudRepository<News>>,
}

impl NewsService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            news: repos.news.clone(),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<NewsView>> {
        let mut items = self.news.get_all().await?;
        items.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(items.iter().map(NewsView::from).collect())
    }

    pub async fn get(&self, id: i32) -> AppResult<NewsView> {
        self.news
            .get_by_id(id)
            .await?
            .map(|news| NewsView::from(&news))
            .ok_or_else(|| AppError::not_found("News", id))
    }

    pub async fn create(&self, request: &NewsRequest) -> AppResult<NewsView> {
        let news = self.news.add(request.to_draft()).await?;
        tracing::info!(id = news.id, "news created");
        Ok(NewsView::from(&news))
    }

    pub async fn update(&self, id: i32, request: &NewsRequest) -> AppResult<NewsView> {
        let news = self
            .news
            .update(id, request.to_draft())
            .await?
            .ok_or_else(|| AppError::not_found("News", id))?;
        tracing::info!(id, "news updated");
        Ok(NewsView::from(&news))
    }

    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        self.news.delete(id).await
    }
}
