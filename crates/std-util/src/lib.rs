pub mod float;
pub mod result;
pub mod slice;

pub mod prelude {
    pub use crate::{assert_approx_eq, assert_empty, assert_err, assert_ok};
}
