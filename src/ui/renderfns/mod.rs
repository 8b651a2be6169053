pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{capitalize, cell_text, is_truncated, truncate, value_text, MAX_CHAR_LENGTH};
