//! Database query functions organized by table.

pub mod settings;
pub mod slots;
