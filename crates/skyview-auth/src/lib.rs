pub mod error;
pub mod gateway;
pub mod provider;
pub mod storage;
pub mod supabase;
pub mod types;

pub use error::AuthError;
pub use gateway::IdentityGateway;
pub use provider::IdentityProvider;
pub use storage::SessionStore;
pub use supabase::SupabaseAuth;
pub use types::{AuthEvent, ProviderAuth, ProviderUser, Session, SessionChange, User};
