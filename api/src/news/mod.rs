pub mod comment;
pub mod models;
pub mod page;
pub mod pages;
pub mod routes;
