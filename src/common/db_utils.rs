// src/common/db_utils.rs

use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Helpers de erro do Postgres
// ---

/// Converte violações de UNIQUE em erros de domínio.
/// `on_constraint` recebe o nome da constraint e decide o erro; se devolver `None`
/// (ou se não for violação de unicidade) o erro segue como `DatabaseError`.
pub(crate) fn map_unique_violation<F>(e: sqlx::Error, on_constraint: F) -> AppError
where
    F: FnOnce(&str) -> Option<AppError>,
{
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(mapped) = db_err.constraint().and_then(on_constraint) {
                return mapped;
            }
        }
    }
    e.into()
}

/// `true` quando o erro é uma violação de chave estrangeira (ex.: DELETE bloqueado por RESTRICT).
pub(crate) fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Remove ids repetidos preservando a ordem da primeira ocorrência.
pub(crate) fn distinct_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_ids_keeps_first_occurrence_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(distinct_ids(&[b, a, b, a]), vec![b, a]);
        assert!(distinct_ids(&[]).is_empty());
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_unique_violation(sqlx::Error::RowNotFound, |_| Some(AppError::EmailAlreadyExists));
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
        assert!(!is_foreign_key_violation(&sqlx::Error::RowNotFound));
    }
}
