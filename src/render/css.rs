//! Just enough CSS parsing to inline style rules: selector groups and
//! declaration blocks. At-rules (`@media`, `@font-face`, …) are skipped
//! because they cannot be expressed as a `style` attribute.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
}

/// `(ids, classes/attributes/pseudo-classes, type selectors)`
pub type Specificity = (u32, u32, u32);

pub fn parse_stylesheet(css: &str) -> Vec<Rule> {
    let css = strip_comments(css).replace("<!--", "").replace("-->", "");
    let mut rules = Vec::new();
    let mut rest = css.as_str();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        if rest.starts_with('@') {
            rest = skip_at_rule(rest);
            continue;
        }

        let Some(open) = rest.find('{') else {
            break;
        };
        let prelude = &rest[..open];
        let after = &rest[open + 1..];
        let close = after.find('}').unwrap_or(after.len());
        let body = &after[..close];
        rest = after.get(close + 1..).unwrap_or("");

        let selectors: Vec<String> = split_top_level(prelude, ',')
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let declarations = parse_declarations(body);

        if !selectors.is_empty() && !declarations.is_empty() {
            rules.push(Rule {
                selectors,
                declarations,
            });
        }
    }

    rules
}

/// Parse the inside of a declaration block or a `style` attribute.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    split_top_level(block, ';')
        .into_iter()
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let mut value = value.trim();
            let mut important = false;

            if let Some(bang) = value.rfind('!') {
                if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
                    important = true;
                    value = value[..bang].trim_end();
                }
            }

            if property.is_empty() || value.is_empty() {
                return None;
            }

            Some(Declaration {
                property,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

/// Approximate selector specificity, good enough to order rules.
pub fn specificity(selector: &str) -> Specificity {
    let (mut ids, mut classes, mut types) = (0, 0, 0);
    let chars: Vec<char> = selector.chars().collect();
    let mut i = 0;
    let mut at_compound_start = true;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '#' => {
                ids += 1;
                i = skip_ident(&chars, i + 1);
                at_compound_start = false;
            }
            '.' => {
                classes += 1;
                i = skip_ident(&chars, i + 1);
                at_compound_start = false;
            }
            '[' => {
                classes += 1;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                i += 1;
                at_compound_start = false;
            }
            ':' => {
                if chars.get(i + 1) == Some(&':') {
                    types += 1;
                    i = skip_ident(&chars, i + 2);
                } else {
                    classes += 1;
                    i = skip_ident(&chars, i + 1);
                }
                if chars.get(i) == Some(&'(') {
                    let mut depth = 0;
                    while i < chars.len() {
                        match chars[i] {
                            '(' => depth += 1,
                            ')' => {
                                depth -= 1;
                                if depth == 0 {
                                    i += 1;
                                    break;
                                }
                            }
                            _ => {}
                        }
                        i += 1;
                    }
                }
                at_compound_start = false;
            }
            ' ' | '>' | '+' | '~' | '\t' | '\n' => {
                at_compound_start = true;
                i += 1;
            }
            '*' => {
                at_compound_start = false;
                i += 1;
            }
            _ if at_compound_start && (c.is_alphanumeric() || c == '-' || c == '_') => {
                types += 1;
                i = skip_ident(&chars, i);
                at_compound_start = false;
            }
            _ => i += 1,
        }
    }

    (ids, classes, types)
}

fn skip_ident(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '-' || chars[i] == '_') {
        i += 1;
    }
    i
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn skip_at_rule(css: &str) -> &str {
    let semicolon = css.find(';');
    let open = css.find('{');

    match (semicolon, open) {
        (Some(s), Some(o)) if s < o => &css[s + 1..],
        (Some(s), None) => &css[s + 1..],
        (_, Some(o)) => {
            let mut depth = 0;
            for (i, c) in css[o..].char_indices() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return &css[o + i + 1..];
                        }
                    }
                    _ => {}
                }
            }
            ""
        }
        (None, None) => "",
    }
}

/// Split on `sep` outside quotes and parentheses.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, c) if c == sep && depth <= 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}
