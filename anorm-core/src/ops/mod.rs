mod delete;
mod insert;
mod select;
mod select_count;
mod update;

pub use delete::*;
pub use insert::*;
pub use select::*;
pub use select_count::*;
pub use update::*;

use crate::Predicate;

/// `only` replaces everything else when not empty, otherwise the accumulated
/// `wheres` are followed by the derived predicates.
pub(crate) fn where_predicate(
    only: Vec<Predicate>,
    wheres: Vec<Predicate>,
    derived: impl FnOnce() -> Vec<Predicate>,
) -> Predicate {
    if !only.is_empty() {
        return Predicate::And(only);
    }
    let mut wheres = wheres;
    wheres.extend(derived());
    Predicate::And(wheres)
}
