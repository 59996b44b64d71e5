#[macro_export]
macro_rules! assert_empty {
    ($e:expr) => {{
        let collection = &$e;
        assert!(
            collection.is_empty(),
            "expected empty; len={}",
            collection.len()
        );
    }};
}
