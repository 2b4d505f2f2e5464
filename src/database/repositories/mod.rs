// 用户存储库
// 定义存储接口，并提供 PostgreSQL 与内存两种实现

pub mod memory;
pub mod user;

pub use memory::MemoryUserRepository;
pub use user::{PgUserRepository, UserRepository};
