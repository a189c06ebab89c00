//! Integration tests driving the dbt-release binary against fake tools

#![cfg(unix)]

mod helpers;
mod test_doctor;
mod test_formula;
mod test_release;
