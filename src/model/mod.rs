// File: ./src/model/mod.rs
pub mod display;
pub mod filter;
pub mod item;
pub mod matcher;
pub mod parser;
pub mod status;

pub use item::{
    DateKind, FrontMatter, Position, Priority, SectionRef, Status, TaskRecord,
};
pub use parser::{LineContext, extract_annotations, parse_line};
pub use status::{StatusOrder, classify};
