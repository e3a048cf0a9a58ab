#[cfg(test)]
mod environment_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use rox::environment::{Env, Environment};
    use rox::token::Token;
    use rox::value::Value;

    fn name(lexeme: &str) -> Token {
        Token::synthetic(lexeme, 7)
    }

    fn root() -> Env {
        Rc::new(RefCell::new(Environment::new()))
    }

    #[test]
    fn test_lookup_walks_outward() {
        let globals = root();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::child_of(&Environment::child_of(&globals));

        assert_eq!(inner.borrow().get(&name("a")).ok(), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_assign_updates_defining_frame() {
        let globals = root();
        globals.borrow_mut().define("a", Value::Nil);

        let inner = Environment::child_of(&globals);
        inner
            .borrow_mut()
            .assign(&name("a"), Value::Bool(true))
            .expect("assign");

        assert_eq!(globals.borrow().get(&name("a")).ok(), Some(Value::Bool(true)));
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let globals = root();

        let err = globals.borrow().get(&name("nope")).unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'nope'.\n[line 7]");

        let err = globals
            .borrow_mut()
            .assign(&name("nope"), Value::Nil)
            .unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'nope'.\n[line 7]");
    }

    #[test]
    fn test_distance_lookup_uses_exact_frame() {
        let globals = root();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let block = Environment::child_of(&globals);
        block.borrow_mut().define("a", Value::Number(2.0));

        let inner = Environment::child_of(&block);

        assert_eq!(
            Environment::get_at(&inner, 1, &name("a")).ok(),
            Some(Value::Number(2.0))
        );
        assert_eq!(
            Environment::get_at(&inner, 2, &name("a")).ok(),
            Some(Value::Number(1.0))
        );

        Environment::assign_at(&inner, 2, &name("a"), Value::Number(3.0)).expect("assign_at");
        assert_eq!(globals.borrow().get(&name("a")).ok(), Some(Value::Number(3.0)));
        assert_eq!(block.borrow().get(&name("a")).ok(), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_distance_lookup_fails_loudly() {
        let globals = root();
        globals.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::child_of(&globals);

        // Present one frame further out, but not at distance 0.
        assert!(Environment::get_at(&inner, 0, &name("a")).is_err());
        assert!(Environment::assign_at(&inner, 0, &name("a"), Value::Nil).is_err());

        // Past the outermost frame.
        assert!(Environment::get_at(&inner, 5, &name("a")).is_err());
        assert!(Environment::ancestor(&inner, 2).is_none());
    }

    #[test]
    fn test_constants_are_tracked_per_frame() {
        let globals = root();
        globals
            .borrow_mut()
            .define_constant("limit", Value::Number(10.0));
        globals.borrow_mut().define("plain", Value::Nil);

        assert!(globals.borrow().is_constant("limit"));
        assert!(!globals.borrow().is_constant("plain"));

        // A later `var` of the same name is an ordinary binding again.
        globals.borrow_mut().define("limit", Value::Nil);
        assert!(!globals.borrow().is_constant("limit"));
    }
}
