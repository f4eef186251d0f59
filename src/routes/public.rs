use std::sync::Arc;

use rocket::response::content::RawHtml;
use rocket::State;

use crate::models::option::{
    ID_STATISTIC_ARTICLE_COUNT, ID_STATISTIC_CMT_COUNT, ID_STATISTIC_MEMBER_COUNT,
    ID_STATISTIC_TAG_COUNT,
};
use crate::store::Store;

/// Escape markup characters but keep `&` so stored entities like `&hearts;` render.
fn escape_text(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

// ── Homepage ───────────────────────────────────────────

#[get("/")]
pub fn homepage(store: &State<Arc<dyn Store>>) -> RawHtml<String> {
    let stat = |id: &str| {
        store
            .option_get(id)
            .map(|o| o.value_u64())
            .unwrap_or(0)
    };

    let total = store.article_count();
    let latest = store.article_list(20, (total - 20).max(0));
    let items: String = latest
        .iter()
        .rev()
        .map(|a| format!("<li>{} <small>{}</small></li>", escape_text(&a.title), escape_text(&a.tags)))
        .collect();

    RawHtml(format!(
        "<html><body style='font-family:sans-serif;padding:40px'>\
         <p>{} members · {} articles · {} comments · {} tags</p>\
         <ul>{}</ul></body></html>",
        stat(ID_STATISTIC_MEMBER_COUNT),
        stat(ID_STATISTIC_ARTICLE_COUNT),
        stat(ID_STATISTIC_CMT_COUNT),
        stat(ID_STATISTIC_TAG_COUNT),
        items
    ))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![homepage]
}
