pub mod ids;
pub mod pair;
pub mod price;

pub use ids::RunId;
pub use pair::Pair;
pub use price::{Price, COMPOSITE_CURRENCY};
