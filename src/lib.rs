pub mod decompose;
pub mod engine;
pub mod format;
pub mod rules;
pub mod signature;
pub mod tokenize;
pub mod tree;
pub mod walk;
