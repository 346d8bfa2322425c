pub mod db;
pub mod store;

pub use db::{
    create_account, create_data_import, create_db, delete_data_import, get_account_by_name,
    get_all_accounts, get_data_imports_for_account, get_transactions_for_account,
    insert_transaction, transaction_exists, DataImport, DbError, DbPool,
};
pub use store::SqliteStore;
