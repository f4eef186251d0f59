pub mod article;
pub mod option;
pub mod tag;
pub mod user;
