//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block body
///
/// The body is wrapped in `async move { ... }` and must evaluate to
/// `Option<Action>`.
///
/// # Example
///
/// ```rust,ignore
/// use composable_todo_core::async_effect;
///
/// async_effect! {
///     match gateway.write(revision, &snapshot).await {
///         Ok(_) => Some(TodoAction::TodosSaved { revision }),
///         Err(error) => Some(TodoAction::SaveFailed { revision, error: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Loaded { count: usize },
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::Loaded { count: 3 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_async_effect_macro_resolves() {
        let captured = 7;
        let effect = async_effect! {
            Some(TestAction::Loaded { count: captured })
        };

        let Effect::Future(fut) = effect else {
            unreachable!("async_effect! always builds Effect::Future");
        };
        let action = tokio_test::block_on(fut);
        assert_eq!(action, Some(TestAction::Loaded { count: 7 }));
    }
}
