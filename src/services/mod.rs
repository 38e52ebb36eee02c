pub mod admin;
pub mod auth;
pub mod bootstrap_admin;
pub mod cache;
pub mod comment;
pub mod flatpage;
pub mod follow;
pub mod group;
pub mod media;
pub mod post;
pub mod user;
