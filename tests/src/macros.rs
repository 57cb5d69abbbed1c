/// Builds a store builder registering the given schemas.
#[macro_export]
macro_rules! models {
    (
        $( $schema:expr ),* $(,)?
    ) => {{
        let mut builder = strata::Store::builder();
        $( builder.register(::std::clone::Clone::clone(&*$schema)); )*
        builder
    }};
}

/// Wraps `async fn(&mut DbTest)` test bodies into tokio tests.
#[macro_export]
macro_rules! tests {
    (
        $(
            $( #[$attrs:meta] )*
            $f:ident
        ),+ $(,)?
    ) => {
        mod memory {
            $(
                #[tokio::test]
                $( #[$attrs] )*
                async fn $f() {
                    let mut test = $crate::DbTest::new();
                    super::$f(&mut test).await;
                }
            )*
        }
    };
}
