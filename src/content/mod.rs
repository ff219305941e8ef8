pub mod debounce;
pub mod script;

pub use debounce::{MutationDebouncer, DEFAULT_DEBOUNCE};
pub use script::{ContentScript, ContentScriptOptions};
