pub mod account;
pub mod campaign;
pub mod invite;
pub mod order;
pub mod profile;
pub mod share;

pub use account::AccountRepository;
pub use campaign::{CampaignRepository, UpdateCampaign};
pub use invite::{InviteInsert, ProfileInviteRepository};
pub use order::{OrderRepository, UpdateOrder};
pub use profile::ProfileRepository;
pub use share::ProfileShareRepository;
