use std::collections::BTreeMap;

pub mod balance;
pub mod board;
pub mod form;
pub mod policy;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

/// Field-scoped validation messages, keyed by the wire name of the field.
/// `general` holds errors that belong to no single field.
pub type FieldErrors = BTreeMap<&'static str, String>;
