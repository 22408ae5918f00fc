pub mod auth;
pub mod google;
pub mod layout;
pub mod source;

pub use auth::{ServiceAccountAuth, ServiceAccountKey};
pub use google::{GoogleSheetsClient, SheetCredentials};
pub use layout::{RosterBlock, SheetLayout};
pub use source::{SheetError, SheetRows, SheetSource, StaticSheets};
