/// Declares async test functions, each run against a fresh in-memory SQLite
/// database on its own runtime.
#[macro_export]
macro_rules! tests {
    (
        $(
            $( #[$attrs:meta] )*
            $f:ident
        ),+ $(,)?
    ) => {
        mod sqlite {
            $(
                #[test]
                $( #[$attrs] )*
                fn $f() {
                    $crate::DbTest::run(|mut test| async move {
                        super::$f(&mut test).await;
                    });
                }
            )*
        }
    };
}
