pub mod cnb;
pub mod pse;
pub mod stooq;
pub mod util;

pub use cnb::CnbProvider;
pub use pse::PseProvider;
pub use stooq::StooqProvider;
