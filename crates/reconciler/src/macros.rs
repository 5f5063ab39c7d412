//! Macros for building props and handlers inline

/// Build a [`Props`](crate::Props) map from `key => value` pairs
///
/// Values go through `Into<PropValue>`, so strings, numbers, booleans and
/// [`EventHandler`](crate::EventHandler)s can be mixed freely.
///
/// # Examples
///
/// ```ignore
/// use reconciler::{props, create_element};
///
/// let link = create_element("a", props! { "href" => "/docs", "tabindex" => 2 }, ["Docs"]);
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::Props::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::Props::new();
        $(props.insert($key, $value);)+
        props
    }};
}

/// Create an [`EventHandler`](crate::EventHandler) from a closure
///
/// # Examples
///
/// ```ignore
/// use reconciler::handler;
///
/// // Without captures
/// let log_click = handler!(|ctx| log::info!("clicked {:?}", ctx.node));
///
/// // Cloning captured values into the handler
/// let on_click = handler!([set_count], |_ctx| set_count.update(|count| count + 1));
/// ```
#[macro_export]
macro_rules! handler {
    // Closure without captures
    (|$ctx:ident| $body:expr) => {
        $crate::EventHandler::new(move |$ctx: &$crate::EventContext| {
            $body;
        })
    };

    // Closure with captures
    ([$($capture:ident),*], |$ctx:ident| $body:expr) => {{
        $(let $capture = ::std::clone::Clone::clone(&$capture);)*
        $crate::EventHandler::new(move |$ctx: &$crate::EventContext| {
            $body;
        })
    }};
}
