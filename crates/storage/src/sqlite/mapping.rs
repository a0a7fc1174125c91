use tryout_core::model::{BlockId, OptionId, PackageId, QuestionId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Stored columns failed domain validation.
pub(crate) fn invalid<E: Into<tryout_core::Error>>(e: E) -> StorageError {
    StorageError::from(e.into())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn usize_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn package_id_from_i64(v: i64) -> Result<PackageId, StorageError> {
    Ok(PackageId::new(i64_to_u64("package_id", v)?))
}

pub(crate) fn block_id_from_i64(v: i64) -> Result<BlockId, StorageError> {
    Ok(BlockId::new(i64_to_u64("block_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn option_id_from_i64(v: i64) -> Result<OptionId, StorageError> {
    Ok(OptionId::new(i64_to_u64("option_id", v)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(question_id_from_i64(-1).is_err());
        assert_eq!(option_id_from_i64(4).unwrap(), OptionId::new(4));
        assert!(id_i64("package_id", u64::MAX).is_err());
    }
}
