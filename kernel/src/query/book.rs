use std::str::FromStr;

use error_stack::Report;

use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Book, BookId, SelectLimit, SelectOffset};
use crate::KernelError;

/// Catalog search criteria. Every `Some` field narrows the result.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BookFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Case-insensitive substring of the author.
    pub author: Option<String>,
    /// Exact ISBN.
    pub isbn: Option<String>,
    /// Case-insensitive substring of title, author, ISBN or description.
    pub search: Option<String>,
    pub available_only: bool,
    /// Newest first when unset. Ties always fall back to newest first.
    pub order: Option<BookOrder>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BookOrderKey {
    Title,
    Author,
    AvailableCopies,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BookOrder {
    pub key: BookOrderKey,
    pub descending: bool,
}

/// `title`, `author` or `available_copies`, with a leading `-` for descending.
impl FromStr for BookOrder {
    type Err = Report<KernelError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, key) = match s.strip_prefix('-') {
            Some(key) => (true, key),
            None => (false, s),
        };
        let key = match key {
            "title" => BookOrderKey::Title,
            "author" => BookOrderKey::Author,
            "available_copies" => BookOrderKey::AvailableCopies,
            _ => {
                return Err(Report::new(KernelError::InvalidInput).attach_printable(format!(
                    "Cannot order books by {s:?}; use title, author or available_copies"
                )))
            }
        };
        Ok(Self { key, descending })
    }
}

#[async_trait::async_trait]
pub trait BookQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError>;

    /// Like [`BookQuery::find_by_id`], but the row stays locked until `con` ends.
    async fn find_by_id_for_update(
        &self,
        con: &mut Self::Transaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError>;

    async fn find_all(
        &self,
        con: &mut Self::Transaction,
        filter: &BookFilter,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError>;
}

pub trait DependOnBookQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type BookQuery: BookQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn book_query(&self) -> &Self::BookQuery;
}
