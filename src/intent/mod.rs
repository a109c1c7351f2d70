pub mod keys;
pub mod parser;
pub mod types;

pub use keys::{Key, normalize_key_name, resolve_keys};
pub use parser::{ACTION_EXAMPLES, DEFAULT_SCROLL_COUNT, IntentParser, format_examples, interpret};
pub use types::{ActionDescriptor, MouseButton, ScrollDirection};
