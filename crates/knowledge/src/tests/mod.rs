//! Cross-module integration tests.

mod end_to_end;
