//! API data models.
//!
//! These types are what the JSON API sends and receives. Ledger and day-end
//! types come from `booklist_core`; everything else in the back-office lives
//! here.

pub mod catalogue;
pub mod outlet;
pub mod redemption;
pub mod session;
pub mod user;

pub use catalogue::{
    Booklist, BooklistItem, NewBooklist, NewBooklistItem, OptionItem, OptionItemUpdate, School,
};
pub use outlet::{Location, NewOutlet, Outlet, OutletUpdate};
pub use redemption::{NewRedemption, Redemption};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User, UserUpdate};
