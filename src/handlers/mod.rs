pub mod admin;
pub mod auth;
pub mod comment;
pub mod error;
pub mod flatpage;
pub mod follow;
pub mod health;
pub mod post;
pub mod profile;
