mod author_repository;
mod history_repository;
mod nickname_repository;
mod publication_repository;
mod publist_repository;

pub use author_repository::{AuthorRepository, SqliteAuthorRepository};
pub use history_repository::{HistoryRepository, SqliteHistoryRepository};
pub use nickname_repository::{NicknameRepository, SqliteNicknameRepository};
pub use publication_repository::{PublicationRepository, SqlitePublicationRepository};
pub use publist_repository::{PublistRepository, SqlitePublistRepository};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn save(&self, entity: &Self::Entity) -> Result<()>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
