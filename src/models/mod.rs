mod kind;
mod record;

pub use kind::{EntityKind, FieldInput, FieldSpec};
pub use record::Record;
