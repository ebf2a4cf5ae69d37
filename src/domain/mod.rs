mod budget;
mod category;
mod clock;
mod expense;
mod insight;
mod installment;
mod money;
mod period;
mod query;
mod salary;
mod scope;
mod stats;
mod trend;

pub use budget::*;
pub use category::*;
pub use clock::*;
pub use expense::*;
pub use insight::*;
pub use installment::*;
pub use money::*;
pub use period::*;
pub use query::*;
pub use salary::*;
pub use scope::*;
pub use stats::*;
pub use trend::*;
