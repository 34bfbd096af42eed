/// How physical objects are removed when their registry rows go away.
///
/// Each lifecycle operation picks one explicitly:
/// entity deletion is `Strict` or `Deferred` depending on the caller's flag,
/// body edits likewise, and the purge sweep is always `BestEffort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalDeletion {
    /// Delete every object first; any failure aborts before the registry changes.
    Strict,
    /// Registry rows only. Objects are left in storage.
    Deferred,
    /// Delete each object independently; failures are logged and the row is kept.
    BestEffort,
}

impl PhysicalDeletion {
    /// Policy for a caller-supplied "delete physically" flag.
    pub fn from_flag(delete_physically: bool) -> Self {
        if delete_physically {
            PhysicalDeletion::Strict
        } else {
            PhysicalDeletion::Deferred
        }
    }

    pub fn deletes_objects(&self) -> bool {
        !matches!(self, PhysicalDeletion::Deferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_maps_to_strict_or_deferred() {
        assert_eq!(PhysicalDeletion::from_flag(true), PhysicalDeletion::Strict);
        assert_eq!(PhysicalDeletion::from_flag(false), PhysicalDeletion::Deferred);
        assert!(PhysicalDeletion::BestEffort.deletes_objects());
        assert!(!PhysicalDeletion::Deferred.deletes_objects());
    }
}
