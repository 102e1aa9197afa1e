use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::list_tables::ListTablesError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use std::error::Error as StdError;
use std::fmt;

use crate::schema::KeyRole;

type DynamoPutError = SdkError<PutItemError, Response>;
type DynamoGetError = SdkError<GetItemError, Response>;
type DynamoDeleteItemError = SdkError<DeleteItemError, Response>;
type DynamoBatchGetItemError = SdkError<BatchGetItemError, Response>;
type DynamoBatchWriteItemError = SdkError<BatchWriteItemError, Response>;
type DynamoCreateTableError = SdkError<CreateTableError, Response>;
type DynamoDeleteTableError = SdkError<DeleteTableError, Response>;
type DynamoListTablesError = SdkError<ListTablesError, Response>;
type DynamoDescribeTableError = SdkError<DescribeTableError, Response>;

/// Partitioned adapter operation error
#[derive(Debug)]
pub enum Error {
    /// Schema builder received a key type outside string/number/binary
    InvalidKeyType {
        /// Which key carried the bad type
        role: KeyRole,
        /// The offending type name
        value: String,
    },
    /// A physical hash value carried no `.N` partition suffix to decode
    MissingPartitionSuffix(String),
    /// A batch call exceeded the store's per-call item ceiling
    BatchTooLarge {
        /// Items requested in the call
        requested: usize,
        /// The store's per-call ceiling
        limit: usize,
    },
    /// Positional range key values did not line up with the requested ids
    MismatchedRangeKeys {
        /// Number of ids requested
        ids: usize,
        /// Number of range key values supplied
        range_keys: usize,
    },
    /// An item lacked a usable scalar value for the table's key attribute
    MissingKeyAttribute(String),
    /// Operation referenced a table the store does not have
    TableNotFound(String),
    /// Batch items still unprocessed after retries were exhausted
    UnprocessedItems(usize),
    /// DynamoDB request builder error
    BuildError(BuildError),
    /// DynamoDB PutItem operation error
    DynamoPutError(DynamoPutError),
    /// DynamoDB GetItem operation error
    DynamoGetError(DynamoGetError),
    /// DynamoDB DeleteItem operation error
    DynamoDeleteItemError(DynamoDeleteItemError),
    /// DynamoDB BatchGetItem operation error
    DynamoBatchGetItemError(DynamoBatchGetItemError),
    /// DynamoDB BatchWriteItem operation error
    DynamoBatchWriteItemError(DynamoBatchWriteItemError),
    /// DynamoDB CreateTable operation error
    DynamoCreateTableError(DynamoCreateTableError),
    /// DynamoDB DeleteTable operation error
    DynamoDeleteTableError(DynamoDeleteTableError),
    /// DynamoDB ListTables operation error
    DynamoListTablesError(DynamoListTablesError),
    /// DynamoDB DescribeTable operation error
    DynamoDescribeTableError(DynamoDescribeTableError),
}

impl Error {
    /// Check if the error is a client-side validation failure
    ///
    /// Returns `true` for errors raised before any store call was issued
    /// (bad key types, malformed physical keys, oversized batches,
    /// misaligned range keys, missing key attributes). These are never
    /// worth retrying.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidKeyType { .. }
                | Error::MissingPartitionSuffix(_)
                | Error::BatchTooLarge { .. }
                | Error::MismatchedRangeKeys { .. }
                | Error::MissingKeyAttribute(_)
        )
    }

    /// Check if the error means the target table does not exist
    ///
    /// Covers both the in-memory store's [`Error::TableNotFound`] and the
    /// DynamoDB `ResourceNotFoundException` surfaced through DescribeTable.
    pub fn is_table_missing(&self) -> bool {
        match self {
            Error::TableNotFound(_) => true,
            Error::DynamoDescribeTableError(e) => matches!(
                e.as_service_error(),
                Some(DescribeTableError::ResourceNotFoundException(_))
            ),
            _ => false,
        }
    }
}

macro_rules! impl_from_error {
    ($name:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$name(e)
            }
        }
    };
}

impl_from_error!(BuildError);
impl_from_error!(DynamoPutError);
impl_from_error!(DynamoGetError);
impl_from_error!(DynamoDeleteItemError);
impl_from_error!(DynamoBatchGetItemError);
impl_from_error!(DynamoBatchWriteItemError);
impl_from_error!(DynamoCreateTableError);
impl_from_error!(DynamoDeleteTableError);
impl_from_error!(DynamoListTablesError);
impl_from_error!(DynamoDescribeTableError);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidKeyType { role, value } => {
                write!(
                    f,
                    "invalid {} key type {:?}, expected string, number or binary",
                    role, value
                )
            }
            Error::MissingPartitionSuffix(value) => {
                write!(f, "physical key {:?} has no partition suffix", value)
            }
            Error::BatchTooLarge { requested, limit } => {
                write!(
                    f,
                    "too many items requested for one batch call: {} exceeds the limit of {}",
                    requested, limit
                )
            }
            Error::MismatchedRangeKeys { ids, range_keys } => {
                write!(
                    f,
                    "range key count {} does not match id count {}",
                    range_keys, ids
                )
            }
            Error::MissingKeyAttribute(attr) => {
                write!(f, "item is missing key attribute {:?}", attr)
            }
            Error::TableNotFound(name) => write!(f, "table not found: {}", name),
            Error::UnprocessedItems(count) => {
                write!(f, "{} batch items remained unprocessed after retries", count)
            }
            Error::BuildError(e) => write!(f, "DynamoDB request builder error: {}", e),
            Error::DynamoPutError(e) => {
                write!(f, "DynamoDB PutItem operation failed: {}", e)
            }
            Error::DynamoGetError(e) => {
                write!(f, "DynamoDB GetItem operation failed: {}", e)
            }
            Error::DynamoDeleteItemError(e) => {
                write!(f, "DynamoDB DeleteItem operation failed: {}", e)
            }
            Error::DynamoBatchGetItemError(e) => {
                write!(f, "DynamoDB BatchGetItem operation failed: {}", e)
            }
            Error::DynamoBatchWriteItemError(e) => {
                write!(f, "DynamoDB BatchWriteItem operation failed: {}", e)
            }
            Error::DynamoCreateTableError(e) => {
                write!(f, "DynamoDB CreateTable operation failed: {}", e)
            }
            Error::DynamoDeleteTableError(e) => {
                write!(f, "DynamoDB DeleteTable operation failed: {}", e)
            }
            Error::DynamoListTablesError(e) => {
                write!(f, "DynamoDB ListTables operation failed: {}", e)
            }
            Error::DynamoDescribeTableError(e) => {
                write!(f, "DynamoDB DescribeTable operation failed: {}", e)
            }
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_type_display() {
        let err = Error::InvalidKeyType {
            role: KeyRole::Hash,
            value: "float".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid hash key type \"float\", expected string, number or binary"
        );
    }

    #[test]
    fn test_missing_suffix_display() {
        let err = Error::MissingPartitionSuffix("plain".to_string());
        assert_eq!(
            err.to_string(),
            "physical key \"plain\" has no partition suffix"
        );
    }

    #[test]
    fn test_is_validation() {
        let err = Error::BatchTooLarge {
            requested: 101,
            limit: 100,
        };
        assert!(err.is_validation());
        assert!(!Error::TableNotFound("t".to_string()).is_validation());
    }

    #[test]
    fn test_is_table_missing() {
        assert!(Error::TableNotFound("t".to_string()).is_table_missing());
        assert!(!Error::UnprocessedItems(3).is_table_missing());
    }

    #[test]
    fn test_error_conversion() {
        let build_err = BuildError::other("test");
        let err: Error = build_err.into();
        assert!(matches!(err, Error::BuildError(_)));
    }
}
