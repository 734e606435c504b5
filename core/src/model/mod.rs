pub mod coach;
pub mod download;
pub mod profile;
pub mod util;

pub use coach::{Coach, Specialty};
pub use download::DownloadFile;
pub use profile::UserProfile;
