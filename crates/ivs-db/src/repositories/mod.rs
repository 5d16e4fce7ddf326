// All repository functions are generic over `E: Executor<'e, Database = Postgres>`
// so they accept both a `&PgPool` (direct query) and a `&mut Transaction` (atomic operations).

pub mod answer;
pub mod favorite;
pub mod mistake;
pub mod mock_interview;
pub mod practice_set;
pub mod question;
pub mod resume;
pub mod statistics;
pub mod token;
pub mod user;
