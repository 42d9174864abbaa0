//! Content module - posts, pages, settings and the store that persists them

mod post;
mod slug;
mod store;

pub use post::{
    split_tags, unique_categories, Page, PageInput, Post, PostInput, Settings, SettingsInput,
};
pub use slug::generate_slug;
pub use store::{or_empty, ContentStore, Dashboard, DASHBOARD_RECENT};
