use std::fs;

use spinel::{
    error::{Error, ParseError, ResourceLimit, RuntimeError},
    execute,
};
use walkdir::WalkDir;

/// Every fenced `spinel` code block in the book must produce its paired
/// fenced `output` block byte for byte — the same contract a grading caller
/// relies on.
#[test]
fn book_examples_produce_their_shown_output() {
    let mut count = 0;

    for entry in WalkDir::new("book/src")
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
    {
        let path = entry.path();
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        for (i, (code, expected)) in extract_examples(&content).into_iter().enumerate() {
            count += 1;
            match execute(&code) {
                Ok(output) => assert_eq!(
                    output,
                    expected,
                    "example {} in {:?} printed the wrong output:\n{}",
                    i + 1,
                    path,
                    code
                ),
                Err(e) => panic!("example {} in {:?} failed:\n{}\nError: {}", i + 1, path, code, e),
            }
        }
    }

    assert!(count > 0, "No examples found in book/src");
}

/// Collects `(code, expected_output)` pairs: each fenced `spinel` block
/// paired with the `output` block that follows it.
fn extract_examples(content: &str) -> Vec<(String, String)> {
    let mut blocks = Vec::new();
    let mut fence: Option<String> = None;
    let mut buf = String::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        match &fence {
            None => {
                if let Some(language) = trimmed.strip_prefix("```") {
                    if !language.is_empty() {
                        fence = Some(language.to_string());
                        buf.clear();
                    }
                }
            },
            Some(language) => {
                if trimmed.starts_with("```") {
                    blocks.push((language.clone(), buf.clone()));
                    fence = None;
                } else {
                    buf.push_str(line);
                    buf.push('\n');
                }
            },
        }
    }

    let mut pairs = Vec::new();
    let mut i = 0;
    while i < blocks.len() {
        if blocks[i].0 == "spinel" && i + 1 < blocks.len() && blocks[i + 1].0 == "output" {
            pairs.push((blocks[i].1.clone(), blocks[i + 1].1.clone()));
            i += 2;
        } else {
            i += 1;
        }
    }
    pairs
}

fn assert_output(src: &str, expected: &str) {
    match execute(src) {
        Ok(output) => assert_eq!(output, expected, "program:\n{src}"),
        Err(e) => panic!("Script failed: {e}\nprogram:\n{src}"),
    }
}

fn runtime_error(src: &str) -> (RuntimeError, String) {
    match execute(src) {
        Ok(output) => panic!("Script succeeded but was expected to fail. Output: {output:?}"),
        Err(e) => match e.error {
            Error::Runtime(error) => (error, e.output),
            Error::Parse(error) => panic!("Expected a runtime error, got a parse error: {error}"),
        },
    }
}

fn parse_error(src: &str) -> ParseError {
    match execute(src) {
        Ok(output) => panic!("Script parsed but was expected to fail. Output: {output:?}"),
        Err(e) => match e.error {
            Error::Parse(error) => error,
            Error::Runtime(error) => {
                panic!("Expected a parse error, got a runtime error: {error}")
            },
        },
    }
}

#[test]
fn output_statements_have_distinct_formatting() {
    assert_output("puts 42", "42\n");
    assert_output("puts \"hi\"", "hi\n");
    assert_output("p \"hi\"", "\"hi\"\n");
    assert_output("print \"a\"\nprint \"b\"", "ab");
    assert_output("puts", "\n");
    assert_output("puts 1, 2", "1\n2\n");
    assert_output("puts [1, 2, 3]", "[1, 2, 3]\n");
    assert_output("p [1, 2, 3]", "[1, 2, 3]\n");
    assert_output("puts nil", "\n");
    assert_output("p nil", "nil\n");
    assert_output("p :sym", ":sym\n");
    assert_output("p {name: \"Ada\", \"x\" => 1}", "{:name=>\"Ada\", \"x\"=>1}\n");
}

#[test]
fn arithmetic_follows_floor_semantics() {
    assert_output("puts 10 + 20", "30\n");
    assert_output("puts 8 * 7", "56\n");
    assert_output("puts 10 / 4", "2\n");
    assert_output("puts -7 / 2", "-4\n");
    assert_output("puts 7 / -2", "-4\n");
    assert_output("puts -7 % 3", "2\n");
    assert_output("puts 7 % -3", "-2\n");
    assert_output("puts 17 % 5", "2\n");
    assert_output("puts 2 ** 10", "1024\n");
    assert_output("puts 10.0 / 4", "2.5\n");
    assert_output("puts 7.divmod(2)", "[3, 1]\n");
    assert_output("puts -7.divmod(2)", "[-4, 1]\n");
}

#[test]
fn division_by_zero_is_reported() {
    let (error, _) = runtime_error("puts 1 / 0");
    assert!(matches!(error, RuntimeError::DivisionByZero { line: 1 }));

    let (error, _) = runtime_error("puts 1.0 / 0");
    assert!(matches!(error, RuntimeError::DivisionByZero { .. }));

    let (error, _) = runtime_error("puts 5 % 0");
    assert!(matches!(error, RuntimeError::DivisionByZero { .. }));
}

#[test]
fn text_coercion_and_repetition() {
    assert_output("puts \"ab\" * 3", "ababab\n");
    assert_output("puts \"n=\" + 5", "n=5\n");
    assert_output("puts 5 + \"!\"", "5!\n");
}

#[test]
fn truthiness_only_excludes_nil_and_false() {
    assert_output("puts 0 ? \"t\" : \"f\"", "t\n");
    assert_output("puts \"\" ? \"t\" : \"f\"", "t\n");
    assert_output("puts [] ? \"t\" : \"f\"", "t\n");
    assert_output("puts nil ? \"t\" : \"f\"", "f\n");
    assert_output("puts false ? \"t\" : \"f\"", "f\n");
    assert_output("puts !nil", "true\n");
    assert_output("puts !0", "false\n");
    assert_output("puts true && false", "false\n");
    assert_output("puts false || true", "true\n");
}

#[test]
fn interpolation_splices_expressions() {
    assert_output("name = \"Sam\"\nputs \"Hi #{name}\"", "Hi Sam\n");
    assert_output("puts \"2 + 2 = #{2 + 2}\"", "2 + 2 = 4\n");
    assert_output("puts \"#{\"#{1 + 1}\"}\"", "2\n");
    assert_output("puts \"len: #{[1, 2].length}\"", "len: 2\n");
    assert_output("puts 'no #{interpolation} here'", "no #{interpolation} here\n");
}

#[test]
fn while_loop_counts() {
    assert_output("i = 0\nwhile i < 3\n  puts i\n  i += 1\nend", "0\n1\n2\n");
}

#[test]
fn until_loop_runs_while_falsy() {
    assert_output("i = 0\nuntil i == 3\n  print i\n  i += 1\nend", "012");
}

#[test]
fn break_and_next_unwind_one_loop() {
    assert_output(
        "i = 0\nwhile true\n  i += 1\n  break if i == 3\nend\nputs i",
        "3\n",
    );
    assert_output(
        "i = 0\nwhile i < 5\n  i += 1\n  next if i == 3\n  print i\nend",
        "1245",
    );
    // break in an inner loop must not end the outer one
    assert_output(
        "total = 0\nfor i in 1..3\n  for j in 1..10\n    break if j == 2\n    total += 1\n  end\nend\nputs total",
        "3\n",
    );
}

#[test]
fn loop_control_outside_loop_is_a_runtime_error() {
    let (error, output) = runtime_error("puts 1\nbreak");
    assert!(matches!(error, RuntimeError::LoopControlOutsideLoop { line: 2, .. }));
    assert_eq!(output, "1\n");

    let (error, _) = runtime_error("next");
    assert!(matches!(error, RuntimeError::LoopControlOutsideLoop { .. }));

    // reaching the signal inside a method body without a loop is the same error
    let (error, _) = runtime_error("def f\n  break\nend\nf()");
    assert!(matches!(error, RuntimeError::LoopControlOutsideLoop { .. }));
}

#[test]
fn infinite_loop_trips_the_guard() {
    let (error, _) = runtime_error("while true\nend");
    assert!(matches!(
        error,
        RuntimeError::ResourceExceeded { limit: ResourceLimit::Operations, .. }
    ));
    assert!(error.is_resource_exceeded());
}

#[test]
fn for_loops_iterate_ranges_and_arrays() {
    assert_output("for i in 1..3\n  puts i\nend", "1\n2\n3\n");
    assert_output("for i in 1...3\n  puts i\nend", "1\n2\n");
    assert_output("for x in [10, 20]\n  puts x\nend", "10\n20\n");
    // the loop variable stays visible after the loop
    assert_output("for i in 1..3\nend\nputs i", "3\n");
}

#[test]
fn conditionals_choose_the_first_truthy_branch() {
    let program = "score = 85\nif score >= 90\n  puts \"A\"\nelsif score >= 80\n  puts \"B\"\nelse\n  puts \"C\"\nend";
    assert_output(program, "B\n");
    assert_output("unless false\n  puts \"yes\"\nend", "yes\n");
    assert_output("unless true\n  puts \"no\"\nelse\n  puts \"else\"\nend", "else\n");
    assert_output("puts \"big\" if 10 > 5", "big\n");
    assert_output("puts \"skip\" unless 10 > 5\nputs \"done\"", "done\n");
}

#[test]
fn case_compares_for_equality_in_order() {
    let program = "x = 2\ncase x\nwhen 1\n  puts \"one\"\nwhen 2, 3\n  puts \"few\"\nelse\n  puts \"many\"\nend";
    assert_output(program, "few\n");

    let fallthrough = "case \"z\"\nwhen \"a\"\n  puts \"a\"\nelse\n  puts \"other\"\nend";
    assert_output(fallthrough, "other\n");
}

#[test]
fn method_definition_and_calls() {
    assert_output("def add(a, b)\n  a + b\nend\nputs add(2, 3)", "5\n");
    // implicit return of the last statement value
    assert_output("def sign(n)\n  if n < 0\n    \"neg\"\n  else\n    \"pos\"\n  end\nend\nputs sign(-2)", "neg\n");
    // explicit return unwinds to the call boundary
    assert_output(
        "def early(n)\n  return \"neg\" if n < 0\n  \"pos\"\nend\nputs early(-5)",
        "neg\n",
    );
    // return at top level ends the program
    assert_output("puts 1\nreturn\nputs 2", "1\n");
}

#[test]
fn arity_mismatch_is_an_argument_error_with_no_output() {
    let (error, output) = runtime_error("def add(a, b)\n  a + b\nend\nputs add(2)");
    assert!(matches!(error, RuntimeError::ArgumentCountMismatch { given: 1, .. }));
    assert_eq!(output, "");
}

#[test]
fn optional_rest_and_keyword_parameters() {
    // defaults are evaluated lazily, in the callee scope
    assert_output("def f(a, b = a + 1)\n  b\nend\nputs f(2)\nputs f(2, 10)", "3\n10\n");
    assert_output("def f(first, *rest)\n  rest.length\nend\nputs f(1, 2, 3)", "2\n");
    assert_output(
        "def greet(name:, punct: \"!\")\n  name + punct\nend\nputs greet(name: \"Ada\")\nputs greet(name: \"Bo\", punct: \"?\")",
        "Ada!\nBo?\n",
    );

    let (error, _) = runtime_error("def greet(name:)\n  name\nend\nputs greet()");
    assert!(matches!(error, RuntimeError::MissingKeywordArgument { .. }));
}

#[test]
fn undefined_names_raise_name_errors() {
    let (error, output) = runtime_error("puts 1\nputs missing");
    assert!(matches!(error, RuntimeError::UnknownVariable { line: 2, .. }));
    assert_eq!(output, "1\n", "partial output must be preserved");

    let (error, _) = runtime_error("nope(1)");
    assert!(matches!(error, RuntimeError::UnknownMethod { .. }));
}

#[test]
fn unknown_builtin_is_a_no_method_error_naming_the_kind() {
    let (error, _) = runtime_error("puts 5.upcase");
    match error {
        RuntimeError::NoMethodFor { name, kind, .. } => {
            assert_eq!(name, "upcase");
            assert_eq!(kind, "Integer");
        },
        other => panic!("expected NoMethodFor, got {other}"),
    }
}

#[test]
fn arrays_transform_with_real_blocks() {
    assert_output("puts [1, 2, 3].map { |n| n * 2 }", "[2, 4, 6]\n");
    assert_output("puts [1, 2, 3, 4].select { |n| n > 2 }", "[3, 4]\n");
    assert_output("puts [1, 2, 3, 4].reject { |n| n.even? }", "[1, 3]\n");
    assert_output("puts [1, 2, 3, 4].find { |n| n > 2 }", "3\n");
    assert_output("puts [1, 2, 3].any? { |n| n > 2 }", "true\n");
    assert_output("puts [1, 2, 3].all? { |n| n > 2 }", "false\n");
    assert_output("puts [1, 2, 3].none? { |n| n > 5 }", "true\n");
}

#[test]
fn array_round_trips() {
    assert_output("a = [3, 1, 2]\nputs a.reverse.reverse == a", "true\n");
    assert_output("a = [3, 1, 2]\nputs a.sort.sort == a.sort", "true\n");
    assert_output("puts [3, 1, 2].sort", "[1, 2, 3]\n");
    assert_output("puts [3.5, 1, 2].sort", "[1, 2, 3.5]\n");
    assert_output("puts [\"pear\", \"fig\"].sort", "[fig, pear]\n");
    assert_output("puts [1, 2, 2, 3, 1].uniq", "[1, 2, 3]\n");
    assert_output("puts [[1, 2], [3, [4]]].flatten", "[1, 2, 3, 4]\n");
    assert_output("puts [1, nil, 2, nil].compact", "[1, 2]\n");
    assert_output("puts [1, 2, 3].sum", "6\n");
    assert_output("puts [4, 9, 2].min", "2\n");
    assert_output("puts [4, 9, 2].max", "9\n");
    assert_output("puts [1, 2, 3].join(\"-\")", "1-2-3\n");
}

#[test]
fn mutating_array_methods_share_identity() {
    assert_output("a = [1, 2]\nb = a\nb << 3\nputs a.length", "3\n");
    assert_output("a = [1, 2]\na.push(3, 4)\nputs a", "[1, 2, 3, 4]\n");
    assert_output("a = [1, 2]\nputs a.pop\nputs a", "2\n[1]\n");
    assert_output("a = [1, 2]\nputs a.shift\nputs a", "1\n[2]\n");
    assert_output("a = [2, 3]\na.unshift(1)\nputs a", "[1, 2, 3]\n");
    // dup is an explicit copy: the original stays untouched
    assert_output("a = [1, 2]\nc = a.dup\nc << 9\nputs a.length\nputs c.length", "2\n3\n");
}

#[test]
fn array_access_is_lenient() {
    assert_output("a = [1, 2, 3]\nputs a[0]\nputs a[2]", "1\n3\n");
    assert_output("a = [1, 2, 3]\nputs a[-1]", "3\n");
    assert_output("a = [1, 2, 3]\np a[10]", "nil\n");
    assert_output("a = [1, 2, 3]\na[0] = 9\nputs a", "[9, 2, 3]\n");
    assert_output("m = [[1, 2], [3, 4]]\nputs m[1][0]", "3\n");
}

#[test]
fn iteration_entry_points_bind_the_loop_variable() {
    assert_output("3.times { |i| print i }", "012");
    assert_output("3.times do |i|\n  puts i\nend", "0\n1\n2\n");
    assert_output("1.upto(3) do |i|\n  print i\nend", "123");
    assert_output("3.downto(1) do |i|\n  print i\nend", "321");
    assert_output("0.step(10, 5) do |i|\n  puts i\nend", "0\n5\n10\n");
    assert_output("[10, 20].each { |x| puts x }", "10\n20\n");
    assert_output("[\"a\", \"b\"].each_with_index { |item, i| puts \"#{i}: #{item}\" }", "0: a\n1: b\n");
    assert_output("\"abc\".each_char { |c| print c.upcase }", "ABC");
}

#[test]
fn return_escapes_an_iteration_block_to_the_method_boundary() {
    let program = "def first_even(numbers)\n  numbers.each do |n|\n    return n if n.even?\n  end\n  nil\nend\nputs first_even([1, 3, 4, 5])\np first_even([1, 3, 5])";
    assert_output(program, "4\nnil\n");
}

#[test]
fn text_methods() {
    assert_output("puts \"hello\".upcase", "HELLO\n");
    assert_output("puts \"HELLO\".downcase", "hello\n");
    assert_output("puts \"ada lovelace\".capitalize", "Ada lovelace\n");
    assert_output("puts \"MiXeD\".swapcase", "mIxEd\n");
    assert_output("puts \"  pad  \".strip", "pad\n");
    assert_output("puts \"hello\".length", "5\n");
    assert_output("puts \"hello\".reverse", "olleh\n");
    assert_output("puts \"hello\".include?(\"ell\")", "true\n");
    assert_output("puts \"hello\".start_with?(\"he\")", "true\n");
    assert_output("puts \"hello\".end_with?(\"lo\")", "true\n");
    assert_output("p \"a,b,c\".split(\",\")", "[\"a\", \"b\", \"c\"]\n");
    assert_output("p \"one two\".split", "[\"one\", \"two\"]\n");
    assert_output("puts \"banana\".sub(\"an\", \"x\")", "bxana\n");
    assert_output("puts \"banana\".gsub(\"an\", \"x\")", "bxxa\n");
    assert_output("puts \"42abc\".to_i + 1", "43\n");
    assert_output("puts \"abc\".to_i", "0\n");
    assert_output("puts \"3.5kg\".to_f", "3.5\n");
    assert_output("p \"ab\".chars", "[\"a\", \"b\"]\n");
    assert_output("p \"name\".to_sym", ":name\n");
}

#[test]
fn numeric_predicates_and_rounding() {
    assert_output("puts 4.even?", "true\n");
    assert_output("puts 4.odd?", "false\n");
    assert_output("puts 0.zero?", "true\n");
    assert_output("puts 5.positive?", "true\n");
    assert_output("puts -5.abs", "5\n");
    assert_output("puts 3.7.round", "4\n");
    assert_output("puts 3.7.floor", "3\n");
    assert_output("puts 3.2.ceil", "4\n");
    assert_output("puts 41.succ", "42\n");
    assert_output("puts 3.9.to_i", "3\n");
    assert_output("puts 3.to_f", "3\n");
}

#[test]
fn mappings_preserve_insertion_order_and_key_kinds() {
    assert_output("h = {name: \"Ada\", \"job\" => \"math\"}\nputs h[:name]\nputs h[\"job\"]", "Ada\nmath\n");
    assert_output("h = {a: 1}\nh[:b] = 2\nputs h.size\np h.keys", "2\n[:a, :b]\n");
    assert_output("h = {a: 1, b: 2}\np h.values", "[1, 2]\n");
    assert_output("h = {a: 1}\nputs h.key?(:a)\nputs h.key?(:z)", "true\nfalse\n");
    assert_output("h = {a: 1}\nputs h.value?(1)", "true\n");
    assert_output("a = {x: 1, y: 2}\nb = {y: 20, z: 30}\np a.merge(b)", "{:x=>1, :y=>20, :z=>30}\n");
    assert_output("h = {a: 1, b: 2}\nh.each { |k, v| puts \"#{k} #{v}\" }", ":a 1\n:b 2\n");
    assert_output("p({})", "{}\n");
    // missing keys read as nil
    assert_output("h = {a: 1}\np h[:zzz]", "nil\n");
}

#[test]
fn ranges_materialize_under_the_guard() {
    assert_output("p (1..5).to_a", "[1, 2, 3, 4, 5]\n");
    assert_output("p (1...4).to_a", "[1, 2, 3]\n");
    assert_output("puts (1..4).sum", "10\n");
    assert_output("puts (1..10).include?(5)", "true\n");
    assert_output("puts (1...5).include?(5)", "false\n");
    assert_output("puts (1..5).size", "5\n");
    assert_output("(1..3).each { |i| print i }", "123");
    assert_output("puts 1..3", "1..3\n");

    // a pathologically large range cannot run unbounded inside one call
    let (error, _) = runtime_error("(1..100000000).to_a");
    assert!(error.is_resource_exceeded());
}

#[test]
fn classes_and_modules_hold_methods() {
    let program = "class Calc\n  def double(x)\n    x * 2\n  end\nend\nputs Calc.double(5)";
    assert_output(program, "10\n");

    let module_program = "module MathUtils\n  def square(x)\n    x * x\n  end\nend\nputs MathUtils.square(6)";
    assert_output(module_program, "36\n");

    // sibling methods are reachable without a receiver
    let sibling = "class Greeter\n  def greeting(name)\n    \"Hello, \" + name\n  end\n\n  def shout(name)\n    greeting(name).upcase\n  end\nend\nputs Greeter.shout(\"ada\")";
    assert_output(sibling, "HELLO, ADA\n");

    let (error, _) = runtime_error("class Calc\nend\nCalc.nope(1)");
    assert!(matches!(error, RuntimeError::NoMethodFor { .. }));
}

#[test]
fn scopes_nest_and_assign_outward() {
    // blocks see and update enclosing variables
    assert_output("total = 0\n[1, 2, 3].each { |n| total += n }\nputs total", "6\n");
    // block parameters live in their own frame
    assert_output("n = 99\n[1, 2].each { |n| print n }\nputs n", "1299\n");
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    assert_output("# leading comment\n\nputs 1 # trailing comment\n# done", "1\n");
    assert_output("puts \"# not a comment\"", "# not a comment\n");
}

#[test]
fn structural_errors_are_parse_errors() {
    assert!(matches!(
        parse_error("if true\nputs 1"),
        ParseError::MissingEnd { .. }
    ));
    assert!(matches!(
        parse_error("while true\n  if 1 == 1\nend"),
        ParseError::MissingEnd { .. }
    ));
    assert!(matches!(parse_error("end"), ParseError::DanglingKeyword { .. }));
    assert!(matches!(parse_error("else"), ParseError::DanglingKeyword { .. }));
    assert!(matches!(parse_error("puts \"unclosed"), ParseError::UnterminatedText { .. }));
    assert!(matches!(
        parse_error("def f(a = 1, b)\nend"),
        ParseError::InvalidParameter { .. }
    ));
}

#[test]
fn equality_is_structural() {
    assert_output("puts [1, [2, 3]] == [1, [2, 3]]", "true\n");
    assert_output("puts {a: 1} == {a: 1}", "true\n");
    assert_output("puts {a: 1} == {a: 2}", "false\n");
    assert_output("puts :a == :a", "true\n");
    assert_output("puts 2 == 2.0", "true\n");
    assert_output("puts \"a\" == \"b\"", "false\n");
    assert_output("puts 1 != 2", "true\n");
}

#[test]
fn lambdas_are_values_with_call() {
    assert_output("double = ->(x) { x * 2 }\nputs double.call(4)", "8\n");
    assert_output("greet = -> { \"hi\" }\nputs greet.call", "hi\n");
    // a lambda body is a method boundary for `return`
    assert_output("f = ->(n) { return 0 if n < 0\nn }\nputs f.call(-3)\nputs f.call(3)", "0\n3\n");
    // lambdas are reference values: two names, one lambda
    assert_output("f = ->(x) { x + 1 }\ng = f\nputs f == g", "true\n");
    assert_output("p ->(x) { x }", "#<block>\n");

    let (error, _) = runtime_error("f = ->(x) { x }\nf.nope");
    assert!(matches!(error, RuntimeError::NoMethodFor { .. }));
}

#[test]
fn ternary_and_comparison_chains() {
    assert_output("label = 5 > 3 ? \"yes\" : \"no\"\nputs label", "yes\n");
    assert_output("puts 1 < 2 ? (2 < 3 ? \"both\" : \"first\") : \"neither\"", "both\n");
    assert_output("puts \"abc\" < \"abd\"", "true\n");
}
