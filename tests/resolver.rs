#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{NodeIds, Stmt};
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::resolver::{Resolution, Resolver};
    use rox::scanner::scan_tokens;

    fn parse(source: &str) -> Vec<Stmt> {
        parse_with(&mut NodeIds::new(), source)
    }

    fn parse_with(ids: &mut NodeIds, source: &str) -> Vec<Stmt> {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty(), "unexpected scan errors: {:?}", errors);

        match Parser::new(tokens, ids).parse() {
            Ok(statements) => statements,
            Err(errors) => panic!("parse failed: {:?}", errors),
        }
    }

    fn resolve(source: &str) -> Result<Resolution, Vec<LoxError>> {
        Resolver::new().resolve(&parse(source))
    }

    fn resolve_ok(source: &str) -> Resolution {
        match resolve(source) {
            Ok(resolution) => resolution,
            Err(errors) => panic!("resolve failed for {:?}: {:?}", source, errors),
        }
    }

    fn resolve_errors(source: &str) -> Vec<String> {
        match resolve(source) {
            Ok(resolution) => panic!("expected errors, got {:?}", resolution),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn distances(resolution: &Resolution) -> Vec<usize> {
        let mut entries: Vec<_> = resolution.locals.iter().collect();
        entries.sort();
        entries.into_iter().map(|(_, depth)| *depth).collect()
    }

    #[test]
    fn test_globals_are_not_recorded() {
        let resolution = resolve_ok("var a = 1; print a; a = 2;");

        assert!(resolution.locals.is_empty());
        assert!(resolution.constants.is_empty());
    }

    #[test]
    fn test_distance_counts_scopes() {
        let resolution = resolve_ok("{ var a = 1; { { print a; } } }");

        assert_eq!(distances(&resolution), vec![2]);
    }

    #[test]
    fn test_innermost_binding_wins() {
        let resolution = resolve_ok("{ var a = 1; { var a = 2; print a; } }");

        assert_eq!(distances(&resolution), vec![0]);
    }

    #[test]
    fn test_closure_captures_by_scope() {
        let resolution = resolve_ok(
            "fun outer() { var x = 1; fun inner() { return x; } return inner; }",
        );

        // `x` inside inner is one function scope out; `inner` is in the
        // scope it was declared in.
        assert_eq!(distances(&resolution), vec![1, 0]);
    }

    #[test]
    fn test_this_and_super_distances() {
        let resolution = resolve_ok(
            "class A { m() {} } class B < A { m() { super.m(); return this; } }",
        );

        // `A` as superclass is global. `super` lives two scopes out of the
        // method body, `this` one.
        assert_eq!(distances(&resolution), vec![2, 1]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let source = "fun f(a) { var b = a; { var c = b; print c + a; } } \
                      class K { init() { this.v = 1; } }";

        assert_eq!(resolve_ok(source), resolve_ok(source));
    }

    #[test]
    fn test_local_constant_assignment_is_recorded() {
        let resolution = resolve_ok("{ const a = 1; { a = 2; } }");

        assert_eq!(resolution.constants.values().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_local_variable_assignment_is_not_constant() {
        let resolution = resolve_ok("{ var a = 1; a = 2; }");

        assert!(resolution.constants.is_empty());
        assert_eq!(distances(&resolution), vec![0]);
    }

    #[test]
    fn test_shadowing_variable_hides_constant() {
        let resolution = resolve_ok("{ const a = 1; { var a = 2; a = 3; } }");

        assert!(resolution.constants.is_empty());
    }

    #[test]
    fn test_merge_keeps_both_passes() {
        let mut ids = NodeIds::new();
        let first_program = parse_with(&mut ids, "{ var a = 1; print a; }");
        let second_program = parse_with(&mut ids, "{ const b = 1; { b = 2; } }");

        let mut first = Resolver::new().resolve(&first_program).expect("first pass");
        let second = Resolver::new().resolve(&second_program).expect("second pass");

        first.merge(second);
        assert_eq!(first.locals.len(), 2);
        assert_eq!(first.constants.len(), 1);
    }

    #[test]
    fn test_return_at_top_level() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            resolve_errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );

        resolve_ok("class A { init() { return; } }");
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            resolve_errors("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );

        // Globals may refer to themselves; that fails, if at all, at runtime.
        resolve_ok("var a = a;");
    }

    #[test]
    fn test_duplicate_local() {
        assert_eq!(
            resolve_errors("fun f() { var a; const a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );

        resolve_ok("var a; var a;");
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            resolve_errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_super_misuse() {
        assert_eq!(
            resolve_errors("fun f() { super.m(); }"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            resolve_errors("class A { m() { super.m(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_inherit_from_itself() {
        assert_eq!(
            resolve_errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_constant_missing_initializer() {
        assert_eq!(
            resolve_errors("const a;"),
            vec!["[line 1] Error at 'a': Constant missing initializer."]
        );
    }

    #[test]
    fn test_all_errors_are_reported() {
        let errors = resolve_errors("return;\nprint this;\n{ var b = b; }");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'this': Can't use 'this' outside of a class.",
                "[line 3] Error at 'b': Can't read local variable in its own initializer.",
            ]
        );
    }
}
