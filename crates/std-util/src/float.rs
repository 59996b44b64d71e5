/// Asserts two `f64` values are within `1e-9` of each other.
#[macro_export]
macro_rules! assert_approx_eq {
    ($actual:expr, $expected:expr) => {{
        let actual: f64 = $actual;
        let expected: f64 = $expected;
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}; actual={actual}"
        );
    }};
}
