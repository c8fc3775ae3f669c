pub mod clause;
pub mod dialect;
pub mod lexer;
pub mod placeholders;
pub mod raw;
pub mod renderer;
