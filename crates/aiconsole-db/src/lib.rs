pub mod conversation_store;

pub use conversation_store::{
    ConversationEntry, ConversationStore, DEFAULT_CONTEXT_LIMIT, DEFAULT_HISTORY_LIMIT,
};
