mod command_input;
mod input;
mod key_result;
mod pagination_bar;
mod resource_table;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use pagination_bar::draw_pagination;
pub use resource_table::{overflow_values, resource_table};
pub use search_input::{render_input_overlay, SearchEvent, SearchInput};
