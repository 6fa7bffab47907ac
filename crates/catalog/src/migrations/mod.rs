//! Versioned migrations, oldest first.
//!
//! Each file freezes the schema as it stood at its version. Do not edit a
//! migration once it has been applied anywhere: the checksum of its SQL is
//! recorded and checked on every run. To change a table, change its entity
//! descriptor and add a new file whose target matches it.

use crate::Migration;

mod m2022_07_05_145139_initial;

/// Every migration, in no particular order.
pub fn all() -> Vec<Migration> {
    vec![m2022_07_05_145139_initial::migration()]
}
