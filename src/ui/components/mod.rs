mod command_input;
pub mod confirm_modal;
mod filter_bar;
mod input;
mod key_result;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use filter_bar::{FilterBar, FilterBarEvent};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
