pub mod types;

pub mod emit;
pub mod label;
pub mod tokenize;

pub use emit::emit;
pub use label::collect as collect_labels;
pub use tokenize::Tokenizer;
