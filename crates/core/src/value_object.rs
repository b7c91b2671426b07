//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: identity does
/// not matter, only the attribute values do. `Cpf("11144477735")` equals any
/// other `Cpf` holding the same digits; an `Enrollment` with the same fields
/// but a different id is a different record.
///
/// Once created a value object does not change: to "modify" one, parse a new
/// one from the raw input. The enrollment wizard leans on this by re-deriving
/// the CPF from raw user input on every keystroke rather than patching it in
/// place.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
