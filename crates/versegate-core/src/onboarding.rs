//! First-run flag deciding which top-level flow the presentation layer shows.

use crate::error::StoreError;
use crate::storage::{get_json, keys, put_json, KvStore};

pub fn is_completed<S: KvStore + ?Sized>(store: &S) -> bool {
    get_json(store, keys::ONBOARDING_COMPLETED).unwrap_or(false)
}

pub fn set_completed<S: KvStore + ?Sized>(store: &S, completed: bool) -> Result<(), StoreError> {
    put_json(store, keys::ONBOARDING_COMPLETED, &completed)?;
    tracing::info!(completed, "onboarding flag updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn defaults_to_not_completed() {
        let db = Database::open_memory().unwrap();
        assert!(!is_completed(&db));
    }

    #[test]
    fn flag_round_trips() {
        let db = Database::open_memory().unwrap();
        set_completed(&db, true).unwrap();
        assert!(is_completed(&db));
        set_completed(&db, false).unwrap();
        assert!(!is_completed(&db));
    }

    #[test]
    fn garbage_reads_as_not_completed() {
        let db = Database::open_memory().unwrap();
        db.put(keys::ONBOARDING_COMPLETED, b"yes please").unwrap();
        assert!(!is_completed(&db));
    }
}
