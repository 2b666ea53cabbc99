use crate::template_lexer::TemplateTokenKind;
use crate::template_lexer::find_matching_close;
use crate::template_lexer::find_spreads;
use crate::template_lexer::tokenize;

fn kinds(source: &str) -> Vec<TemplateTokenKind> {
    tokenize(source).into_iter().map(|token| token.kind).collect()
}

fn spread_paths(source: &str) -> Vec<String> {
    find_spreads(source, &tokenize(source))
        .into_iter()
        .map(|spread| spread.path)
        .collect()
}

#[test]
fn lexes_names_variables_and_punctuators() {
    assert_eq!(kinds("post(id: $id) { ...x }"), vec![
        TemplateTokenKind::Name,
        TemplateTokenKind::Punctuator('('),
        TemplateTokenKind::Name,
        TemplateTokenKind::Punctuator(':'),
        TemplateTokenKind::Variable,
        TemplateTokenKind::Punctuator(')'),
        TemplateTokenKind::Punctuator('{'),
        TemplateTokenKind::Ellipsis,
        TemplateTokenKind::Name,
        TemplateTokenKind::Punctuator('}'),
    ]);
}

#[test]
fn strings_and_comments_hide_their_contents() {
    let source = "a(s: \"$nope ...x {\") # $also ...not\n\"\"\"block $x \\\"\"\" ...y\"\"\" b";
    let tokens = tokenize(source);
    assert!(tokens.iter().all(|token| token.kind != TemplateTokenKind::Variable));
    assert!(tokens.iter().all(|token| token.kind != TemplateTokenKind::Ellipsis));
    assert_eq!(tokens.last().unwrap().text(source), "b");
}

#[test]
fn variable_name_excludes_dollar_sign() {
    let source = "$user_id";
    let tokens = tokenize(source);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].variable_name(source), "user_id");
}

#[test]
fn matching_close_skips_nested_groups() {
    let source = "{ a(x: [1, 2]) { b } }";
    let tokens = tokenize(source);
    let close_idx = find_matching_close(&tokens, 0).unwrap();
    assert_eq!(close_idx, tokens.len() - 1);
}

#[test]
fn unbalanced_group_has_no_match() {
    let tokens = tokenize("{ a { b }");
    assert_eq!(find_matching_close(&tokens, 0), None);
}

#[test]
fn finds_dotted_spreads_with_and_without_space() {
    assert_eq!(
        spread_paths("{ ...auth.user ... auth.error ...user }"),
        vec!["auth.user", "auth.error", "user"],
    );
}

#[test]
fn inline_fragments_are_not_spreads() {
    assert!(spread_paths("{ ... on User { name } ... @include(if: $x) { id } }").is_empty());
}

#[test]
fn spread_path_stops_at_whitespace_before_dot() {
    assert_eq!(spread_paths("{ ...auth .user }"), vec!["auth"]);
}
