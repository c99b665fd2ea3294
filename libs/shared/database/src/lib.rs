pub mod storage;
pub mod supabase;

pub use storage::{PhotoKind, PhotoStorage};
pub use supabase::SupabaseClient;
