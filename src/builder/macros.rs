//! Macros for ergonomic context construction.

/// Build a [`Context`](crate::core::Context) from `key => value` pairs.
///
/// Values are converted with `serde_json::Value::from`.
///
/// # Example
///
/// ```
/// use statepath::context;
///
/// let ctx = context! {
///     "user" => "ann",
///     "retries" => 3,
///     "admin" => false,
/// };
/// assert_eq!(ctx["user"], "ann");
/// assert_eq!(ctx.len(), 3);
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::core::Context::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut context = $crate::core::Context::new();
        $(
            context.insert(
                ::std::string::String::from($key),
                $crate::__private::Value::from($value),
            );
        )+
        context
    }};
}
