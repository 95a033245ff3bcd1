pub mod article;
pub mod category;
pub mod comment;
pub mod reporter;
pub mod tag;
