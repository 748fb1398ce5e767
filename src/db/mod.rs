mod fetch;
mod migrate;
mod save;

pub use fetch::fetch_world;
pub use migrate::migrate;
pub use save::save_world;
