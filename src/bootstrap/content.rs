use log::info;
use serde::Serialize;

use super::{Bootstrapper, SeedError};
use crate::models::article::{ArticleForm, EditorType};
use crate::models::option::ID_STATISTIC_ARTICLE_COUNT;
use crate::models::user::User;

pub const WELCOME_TITLE: &str = "The forum is live &hearts;";
const WELCOME_TAGS: &str = "Forum, Rust, Q&A, Announcement";
const WELCOME_CONTENT: &str = "Read [About](/about) to find out what this place is about ;-p";

pub const MOCK_TITLE_PREFIX: &str = "Hello, world!";
const MOCK_TAG_PREFIX: &str = "Forum, Rust, ";
const MOCK_CONTENT: &str = "Test content";

/// What a mock run covered. Indices are the numbers in the article titles.
#[derive(Debug, Clone, Serialize)]
pub struct MockBatch {
    pub first_index: u64,
    pub last_index: u64,
    pub article_ids: Vec<i64>,
    pub failed_index: Option<u64>,
}

impl MockBatch {
    pub fn inserted(&self) -> usize {
        self.article_ids.len()
    }
}

/// Inclusive index range for a run that starts from a persisted article count:
/// `count + 1 ..= count + 1 + span`, which is `span + 1` articles.
pub fn mock_range(article_count: u64, span: u32) -> (u64, u64) {
    let start = article_count + 1;
    (start, start + u64::from(span))
}

fn mock_article(index: u64, author: &User) -> ArticleForm {
    ArticleForm {
        title: format!("{} ({})", MOCK_TITLE_PREFIX, index),
        tags: format!("{}{}", MOCK_TAG_PREFIX, index),
        content: MOCK_CONTENT.to_string(),
        editor_type: EditorType::Markdown,
        author_id: author.id,
        author_email: author.email.clone(),
    }
}

impl Bootstrapper {
    /// Insert the fixed welcome article, authored by the administrator.
    pub fn create_welcome_article(&self) -> Result<i64, SeedError> {
        let admin = self.store.user_get_admin().ok_or(SeedError::MissingAdmin)?;

        if self.settings.skip_existing {
            if let Some(existing) = self.store.article_find_by_slug(&slug::slugify(WELCOME_TITLE)) {
                info!("Welcome article already exists (#{}), skipping", existing.id);
                return Ok(existing.id);
            }
        }

        let form = ArticleForm {
            title: WELCOME_TITLE.to_string(),
            tags: WELCOME_TAGS.to_string(),
            content: WELCOME_CONTENT.to_string(),
            editor_type: EditorType::Markdown,
            author_id: admin.id,
            author_email: admin.email.clone(),
        };
        let id = self.store.article_create(&form).map_err(SeedError::Content)?;
        info!("Created welcome article #{}", id);
        Ok(id)
    }

    /// Append `batch_span + 1` numbered articles, continuing from the persisted
    /// article counter. Each insert bumps that counter itself. Stops at the first
    /// failure; earlier inserts stay.
    pub fn generate_mock_articles(&self) -> Result<MockBatch, SeedError> {
        let admin = self.store.user_get_admin().ok_or(SeedError::MissingAdmin)?;
        let counter = self
            .store
            .option_get(ID_STATISTIC_ARTICLE_COUNT)
            .ok_or(SeedError::MissingCounter(ID_STATISTIC_ARTICLE_COUNT))?;

        let (first_index, last_index) = mock_range(counter.value_u64(), self.mock.batch_span);
        let mut batch = MockBatch {
            first_index,
            last_index,
            article_ids: Vec::with_capacity((last_index - first_index + 1) as usize),
            failed_index: None,
        };

        for i in first_index..=last_index {
            match self.store.article_create(&mock_article(i, &admin)) {
                Ok(id) => {
                    batch.article_ids.push(id);
                    info!("Generated article ({})", i);
                }
                Err(reason) => {
                    batch.failed_index = Some(i);
                    return Err(SeedError::PartialBatch { batch, reason });
                }
            }
        }

        Ok(batch)
    }
}
