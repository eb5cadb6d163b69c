mod page;
mod table;

pub use page::{Page, resolve};
pub use table::{RouteConfigEntry, entries, lookup, lookup_code};
