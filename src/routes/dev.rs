//! Development-only seeding endpoints. No authentication is applied here;
//! mount them only where `dev.enabled` is set.

use std::sync::Arc;

use log::{error, info};
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;

use crate::bootstrap::Bootstrapper;
use crate::config::AppConfig;
use crate::store::Store;

/// Create tables, seed counters, provision accounts and post the welcome article.
#[get("/db/table/gen")]
pub fn gen_tables(store: &State<Arc<dyn Store>>, config: &State<AppConfig>) -> Result<Redirect, Status> {
    let seeder = Bootstrapper::new(store.inner().clone(), config);
    match seeder.run() {
        Ok(report) => {
            info!(
                "Database initialized: {} table(s), welcome article #{}",
                report.tables.len(),
                report.welcome_article_id
            );
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            error!("Database initialization failed: {}", e);
            Err(Status::InternalServerError)
        }
    }
}

/// Append a batch of numbered mock articles.
#[get("/article/gen")]
pub fn gen_articles(store: &State<Arc<dyn Store>>, config: &State<AppConfig>) -> Result<Redirect, Status> {
    let seeder = Bootstrapper::new(store.inner().clone(), config);
    match seeder.generate_mock_articles() {
        Ok(batch) => {
            info!(
                "Generated {} mock article(s) ({}..={})",
                batch.inserted(),
                batch.first_index,
                batch.last_index
            );
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            error!("Mock article generation failed: {}", e);
            Err(Status::InternalServerError)
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![gen_tables, gen_articles]
}
