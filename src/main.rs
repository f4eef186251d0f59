#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};

mod bootstrap;
mod config;
mod db;
mod models;
mod routes;
mod store;

#[cfg(test)]
mod tests;

use config::AppConfig;
use store::sqlite::SqliteStore;
use store::Store;

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Page not found.</p><a href='/'>← Home</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Initialization failed. See the server log.</p><a href='/'>← Home</a></body></html>".to_string())
}

/// Assemble the Rocket instance around an already-opened store.
pub fn build_rocket(config: AppConfig, store: Arc<dyn Store>) -> Rocket<Build> {
    let dev_enabled = config.dev.enabled;

    let mut app = rocket::build()
        .manage(store)
        .manage(config)
        .mount("/", routes::public::routes())
        .register("/", catchers![not_found, server_error]);

    if dev_enabled {
        app = app.mount("/dev", routes::dev::routes());
    } else {
        log::info!("dev.enabled is false, seeding routes not mounted");
    }

    app
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let config = AppConfig::load().expect("Failed to load configuration");
    let store = SqliteStore::new_at(&config.database.path, config.database.pool_size)
        .expect("Failed to initialize database pool")
        .with_bcrypt_cost(config.bootstrap.bcrypt_cost);

    build_rocket(config, Arc::new(store) as Arc<dyn Store>)
}
